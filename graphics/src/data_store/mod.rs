//! Render data stores.
//!
//! The render system writes one frame worth of data into four stores
//! (scene, camera, light, material) plus a POD store for small named
//! settings blobs. Every `add_*` method returns an index that stays valid
//! until the next `clear`.

mod camera;
mod light;
mod manager;
mod material;
mod pod;
mod scene;

use lumen_core::math::Mat4;

use crate::error::GraphicsError;
use crate::handle::RenderHandleReference;
use crate::render_data::{
    RenderCamera, RenderLight, RenderMaterial, RenderMeshData, RenderScene,
    RenderSkinJointMatrices, RenderSubmesh, ShadowTypes,
};

pub use camera::DefaultCameraDataStore;
pub use light::DefaultLightDataStore;
pub use manager::{RenderDataStoreManager, ResolvedDataStores};
pub use material::DefaultMaterialDataStore;
pub use pod::DefaultPodDataStore;
pub use scene::DefaultSceneDataStore;

/// Scene-level frame data.
pub trait SceneDataStore: Send + Sync {
    fn name(&self) -> &str;
    fn clear(&mut self);
    fn set_scene(&mut self, scene: RenderScene);
    fn scene(&self) -> &RenderScene;
}

/// Cameras of a frame.
pub trait CameraDataStore: Send + Sync {
    fn name(&self) -> &str;
    fn clear(&mut self);
    /// Appends `camera` and returns its index.
    fn add_camera(&mut self, camera: RenderCamera) -> u32;
    fn cameras(&self) -> &[RenderCamera];

    fn camera_count(&self) -> u32 {
        self.cameras().len() as u32
    }
}

/// Lights of a frame and the shared shadow settings.
pub trait LightDataStore: Send + Sync {
    fn name(&self) -> &str;
    /// Removes all lights. Shadow settings are kept.
    fn clear(&mut self);
    fn add_light(&mut self, light: RenderLight) -> u32;
    fn lights(&self) -> &[RenderLight];
    fn set_shadow_types(&mut self, shadow_types: ShadowTypes);
    fn shadow_types(&self) -> ShadowTypes;
    /// Shadow map size for the current shadow quality.
    fn shadow_quality_resolution(&self) -> [u32; 2];
}

/// Materials, mesh instances and draw units of a frame.
pub trait MaterialDataStore: Send + Sync {
    fn name(&self) -> &str;
    fn clear(&mut self);

    fn add_mesh_data(&mut self, mesh_data: RenderMeshData) -> u32;
    fn mesh_data(&self) -> &[RenderMeshData];

    fn add_submesh(&mut self, submesh: RenderSubmesh);
    fn submeshes(&self) -> &[RenderSubmesh];

    fn add_skin_joint_matrices(&mut self, matrices: &[Mat4], prev_matrices: &[Mat4]) -> u32;
    fn skin_joint_matrices(&self) -> &[RenderSkinJointMatrices];

    /// Adds `material` unless a material with the same id was already added
    /// this frame. Returns the material index either way.
    fn add_material_data(&mut self, material: RenderMaterial) -> u32;
    /// Always appends `material`, even if its id is known.
    fn add_material_instance_data(&mut self, material: RenderMaterial) -> u32;
    /// Index of the first material added for `id`.
    fn material_index(&self, id: u64) -> Option<u32>;
    fn materials(&self) -> &[RenderMaterial];

    /// Adds custom resources for material `id` once per frame.
    fn add_material_custom_resources(
        &mut self,
        id: u64,
        resources: Vec<RenderHandleReference>,
    ) -> u32;
    fn material_custom_resource_index(&self, id: u64) -> Option<u32>;
    fn material_custom_resources(&self) -> &[Vec<RenderHandleReference>];
}

/// Named plain-old-data blobs.
pub trait PodDataStore: Send + Sync {
    fn name(&self) -> &str;
    /// Creates entry `name`. Fails if it already exists.
    fn create_pod(&mut self, type_name: &str, name: &str, data: &[u8])
    -> Result<(), GraphicsError>;
    fn get(&self, name: &str) -> Option<&[u8]>;
    /// Overwrites entry `name` in place. Returns `false` if it does not
    /// exist or has a different byte size.
    fn set(&mut self, name: &str, data: &[u8]) -> bool;
    fn destroy_pod(&mut self, type_name: &str, name: &str) -> bool;
}
