//! Plain data written by the render system and read by the GPU backend.

mod camera;
mod light;
mod material;
mod mesh;
mod scene;

pub use camera::{
    CameraCullType, CameraMatrices, CameraTargetType, EnvironmentBackground,
    MAX_CAMERA_COLOR_TARGETS, RenderCamera, RenderCameraEnvironment, RenderCameraFlags,
    RenderCameraFog, RenderPipelineType,
};
pub use light::{
    RenderLight, RenderLightFlags, ShadowQuality, ShadowSmoothness, ShadowType, ShadowTypes,
};
pub use material::{
    InputMaterialUniforms, MAX_MATERIAL_TEXTURE_COUNT, MaterialHandles, MaterialShader,
    MaterialTextureSlot, MaterialTextureUniform, MaterialType, RenderMaterial,
    RenderMaterialData, RenderMaterialFlags,
};
pub use mesh::{
    IndexBufferBinding, MAX_VERTEX_BUFFERS, RenderDrawCommand, RenderMeshData,
    RenderSkinJointMatrices, RenderSubmesh, RenderSubmeshFlags, VertexBufferBinding,
};
pub use scene::{RenderScene, SceneRenderDataStoreNames};
