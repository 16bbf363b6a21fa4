//! Scene component kinds.
//!
//! Hierarchy kinds (node, transform, world matrices, name) live in
//! `lumen_ecs`; this module adds everything that references GPU handles or
//! other entities. [`register_scene_components`] registers both sets.

mod animation;
mod camera;
mod environment;
mod light;
mod material;
mod mesh;
mod post_process;
mod reflection;
mod render_configuration;
mod resources;
mod skin;

pub use animation::{
    AnimationComponent, AnimationInputComponent, AnimationInterpolation, AnimationOutputComponent,
    AnimationPath, AnimationTrackComponent,
};
pub use camera::{CameraComponent, CameraPipelineFlags, CameraProjection, CameraSceneFlags};
pub use environment::{EnvironmentComponent, FogComponent};
pub use light::{LightComponent, LightType};
pub use material::{
    MaterialAlphaMode, MaterialComponent, MaterialLightingFlags, MaterialShaderRef,
    MaterialTexture, TextureTransform,
};
pub use mesh::{
    DEFAULT_RENDER_SORT_LAYER, MeshComponent, RenderMeshBatchComponent, RenderMeshBatchType,
    RenderMeshComponent, Submesh,
};
pub use post_process::{PostProcessComponent, PostProcessConfiguration, PostProcessEnableFlags};
pub use reflection::{PlanarReflectionComponent, PlanarReflectionFlags};
pub use render_configuration::RenderConfigurationComponent;
pub use resources::{
    LAYER_ALL, LAYER_DEFAULT, LAYER_NONE, LayerComponent, RenderHandleComponent, UriComponent,
};
pub use skin::{
    JointMatricesComponent, PreviousJointMatricesComponent, SkinComponent, SkinIbmComponent,
};

use lumen_ecs::{
    NameComponent, NodeComponent, PreviousWorldMatrixComponent, TransformComponent,
    WorldMatrixComponent, World,
};

/// Registers every component kind the render system and importer use.
pub fn register_scene_components(world: &mut World) {
    world.register_component::<NodeComponent>();
    world.register_component::<TransformComponent>();
    world.register_component::<WorldMatrixComponent>();
    world.register_component::<PreviousWorldMatrixComponent>();
    world.register_component::<NameComponent>();

    world.register_component::<UriComponent>();
    world.register_component::<LayerComponent>();
    world.register_component::<RenderHandleComponent>();
    world.register_component::<RenderConfigurationComponent>();
    world.register_component::<CameraComponent>();
    world.register_component::<LightComponent>();
    world.register_component::<MeshComponent>();
    world.register_component::<RenderMeshComponent>();
    world.register_component::<RenderMeshBatchComponent>();
    world.register_component::<MaterialComponent>();
    world.register_component::<EnvironmentComponent>();
    world.register_component::<FogComponent>();
    world.register_component::<PostProcessComponent>();
    world.register_component::<PlanarReflectionComponent>();
    world.register_component::<JointMatricesComponent>();
    world.register_component::<PreviousJointMatricesComponent>();
    world.register_component::<SkinComponent>();
    world.register_component::<SkinIbmComponent>();
    world.register_component::<AnimationComponent>();
    world.register_component::<AnimationTrackComponent>();
    world.register_component::<AnimationInputComponent>();
    world.register_component::<AnimationOutputComponent>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut world = World::new();
        register_scene_components(&mut world);
        register_scene_components(&mut world);
        assert!(world.is_component_registered::<CameraComponent>());
        assert!(world.is_component_registered::<NodeComponent>());
    }
}
