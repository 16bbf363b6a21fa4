use lumen_core::math::{Mat4, Quat, Vec4};
use lumen_ecs::{
    ComponentStore, Entity, NameComponent, NodeComponent, World, WorldMatrixComponent,
};
use lumen_graphics::GpuResourceManager;
use lumen_graphics::data_store::ResolvedDataStores;
use lumen_graphics::render_data::{
    CameraMatrices, CameraTargetType, RenderCamera, RenderCameraEnvironment, RenderCameraFlags,
    RenderCameraFog, RenderPipelineType,
};
use nalgebra::UnitQuaternion;

use super::{FrameState, RenderSystem, handle_of, is_enabled, read, world_matrix_of};
use crate::components::{
    CameraComponent, CameraPipelineFlags, CameraProjection, CameraSceneFlags,
    EnvironmentComponent, FogComponent, RenderHandleComponent,
};

/// Id of the derived color pre-pass camera. Never collides with entity ids,
/// whose generation half is small.
pub const COLOR_PRE_PASS_CAMERA_ID: u64 = u64::MAX - 1;

const COLOR_PRE_PASS_CAMERA_NAME: &str = "ColorPrePassCamera";

/// Matrices a camera used in the frame it was last seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviousCameraData {
    pub view: Mat4,
    pub proj: Mat4,
    pub last_frame: u64,
}

/// Lookups shared by every camera of a frame.
pub(super) struct CameraLookups<'a> {
    pub names: Option<&'a ComponentStore<NameComponent>>,
    pub environments: Option<&'a ComponentStore<EnvironmentComponent>>,
    pub fogs: Option<&'a ComponentStore<FogComponent>>,
    pub handles: Option<&'a ComponentStore<RenderHandleComponent>>,
}

impl RenderSystem {
    /// Returns the view and projection passed for `id` on the previous call
    /// and records the current ones. The first call for an id returns the
    /// current matrices.
    pub fn update_and_get_previous_frame_camera_data(
        &mut self,
        id: u64,
        view: &Mat4,
        proj: &Mat4,
    ) -> (Mat4, Mat4) {
        let current = PreviousCameraData {
            view: *view,
            proj: *proj,
            last_frame: self.frame_index,
        };
        match self.camera_data.insert(id, current) {
            Some(previous) => (previous.view, previous.proj),
            None => (*view, *proj),
        }
    }

    /// Drops cached matrices of cameras not seen this frame.
    pub(super) fn prune_camera_data(&mut self) {
        let frame_index = self.frame_index;
        self.camera_data
            .retain(|_, data| data.last_frame == frame_index);
    }

    pub(super) fn process_cameras(
        &mut self,
        world: &World,
        stores: &mut ResolvedDataStores<'_>,
        frame: &mut FrameState,
    ) {
        lumen_core::profile_scope!("process_cameras");

        let Some(cameras) = read::<CameraComponent>(world) else {
            return;
        };
        let nodes = read::<NodeComponent>(world);
        let world_matrices = read::<WorldMatrixComponent>(world);
        let environments = read::<EnvironmentComponent>(world);
        let fogs = read::<FogComponent>(world);
        let handles = read::<RenderHandleComponent>(world);
        let names = read::<NameComponent>(world);
        let lookups = CameraLookups {
            names: names.as_deref(),
            environments: environments.as_deref(),
            fogs: fogs.as_deref(),
            handles: handles.as_deref(),
        };

        for (entity, camera) in cameras.iter() {
            let is_main = frame.main_camera == Some(entity);
            if !is_main && !camera.scene_flags.contains(CameraSceneFlags::ACTIVE_RENDER) {
                continue;
            }
            if !is_enabled(nodes.as_deref(), entity) {
                continue;
            }

            let world_matrix = world_matrix_of(world_matrices.as_deref(), entity);
            let render_camera =
                self.render_camera(entity, camera, &world_matrix, is_main, frame, &lookups);
            stores.camera.add_camera(render_camera.clone());

            if is_main {
                if camera.pipeline_flags.contains(CameraPipelineFlags::COLOR_PRE_PASS) {
                    let explicit = camera.pre_pass_camera.and_then(|e| cameras.get(e));
                    stores
                        .camera
                        .add_camera(color_pre_pass_camera(&render_camera, explicit));
                }
                frame.main_render_camera = Some(render_camera);
            }
        }
    }

    fn render_camera(
        &mut self,
        entity: Entity,
        camera: &CameraComponent,
        world_matrix: &Mat4,
        is_main: bool,
        frame: &FrameState,
        lookups: &CameraLookups<'_>,
    ) -> RenderCamera {
        let view = world_matrix.try_inverse().unwrap_or_else(Mat4::identity);
        let proj = camera
            .projection
            .matrix(camera.render_resolution, camera.z_near, camera.z_far);

        let mut inverse_winding = world_matrix.determinant() < 0.0;
        if matches!(camera.projection, CameraProjection::Custom(_)) && proj.determinant() < 0.0 {
            inverse_winding = !inverse_winding;
        }

        let (view_prev, proj_prev) =
            self.update_and_get_previous_frame_camera_data(entity.id(), &view, &proj);

        let mut flags = RenderCameraFlags::empty();
        flags.set(RenderCameraFlags::MAIN, is_main);
        flags.set(RenderCameraFlags::INVERSE_WINDING, inverse_winding);
        let pipeline_flags = camera.pipeline_flags;
        flags.set(
            RenderCameraFlags::CLEAR_DEPTH,
            pipeline_flags.contains(CameraPipelineFlags::CLEAR_DEPTH),
        );
        flags.set(
            RenderCameraFlags::CLEAR_COLOR,
            pipeline_flags.contains(CameraPipelineFlags::CLEAR_COLOR),
        );
        flags.set(RenderCameraFlags::MSAA, pipeline_flags.contains(CameraPipelineFlags::MSAA));
        flags.set(
            RenderCameraFlags::HISTORY,
            pipeline_flags.contains(CameraPipelineFlags::HISTORY),
        );
        flags.set(
            RenderCameraFlags::JITTER,
            pipeline_flags.contains(CameraPipelineFlags::JITTER),
        );
        flags.set(
            RenderCameraFlags::REQUEST_COLOR_PRE_PASS,
            is_main && pipeline_flags.contains(CameraPipelineFlags::COLOR_PRE_PASS),
        );

        let target_type = if camera.has_custom_targets() {
            self.validate_custom_targets(entity, camera);
            CameraTargetType::Custom
        } else {
            CameraTargetType::Default
        };

        let environment_entity = camera.environment.or(frame.configuration.environment);
        let fog_entity = camera.fog.or(frame.configuration.fog);

        RenderCamera {
            id: entity.id(),
            main_camera_id: frame.main_camera.map_or(u64::MAX, |e| e.id()),
            name: lookups
                .names
                .and_then(|names| names.get(entity))
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            layer_mask: camera.layer_mask,
            matrices: CameraMatrices {
                view,
                proj,
                view_prev,
                proj_prev,
            },
            world_position: world_matrix.column(3).xyz(),
            viewport: camera.viewport,
            scissor: camera.scissor,
            render_resolution: camera.render_resolution,
            z_near: camera.z_near,
            z_far: camera.z_far,
            clear_color: camera.clear_color,
            clear_depth: camera.clear_depth,
            clear_stencil: 0,
            flags,
            cull_type: camera.culling,
            pipeline_type: camera.pipeline,
            target_type,
            color_targets: camera.color_targets.clone(),
            depth_target: camera.depth_target.clone(),
            custom_render_node_graph: camera.custom_render_node_graph.clone(),
            post_process_name: self.post_process_name(camera.post_process),
            environment: self.environment_snapshot(environment_entity, lookups),
            fog: fog_snapshot(fog_entity, lookups.fogs),
        }
    }

    /// Custom targets that are not live images are still assigned; the
    /// backend falls back on its own.
    fn validate_custom_targets(&self, entity: Entity, camera: &CameraComponent) {
        let invalid = invalid_custom_targets(self.context.gpu.as_ref(), camera);
        if !invalid.is_empty() {
            self.log_once.error(
                &format!("camera_targets_{}", entity.id()),
                format_args!(
                    "RenderSystem: camera {entity:?} has custom targets that are not valid GPU images: {}",
                    invalid.join(", ")
                ),
            );
        }
    }

    fn environment_snapshot(
        &self,
        entity: Option<Entity>,
        lookups: &CameraLookups<'_>,
    ) -> RenderCameraEnvironment {
        let Some((entity, environment)) =
            entity.and_then(|e| lookups.environments.and_then(|s| s.get(e)).map(|c| (e, c)))
        else {
            return RenderCameraEnvironment::default();
        };

        let radiance_cubemap = handle_of(lookups.handles, environment.radiance_cubemap);
        let radiance_cubemap_mip_count = if environment.radiance_cubemap_mip_count > 0 {
            environment.radiance_cubemap_mip_count
        } else {
            self.context
                .gpu
                .image_desc(radiance_cubemap.handle())
                .map_or(0, |desc| desc.mip_count)
        };

        let mut shading_coefficients = [Vec4::zeros(); 9];
        for (dst, src) in shading_coefficients
            .iter_mut()
            .zip(environment.irradiance_coefficients.iter())
        {
            *dst = Vec4::new(src.x, src.y, src.z, 1.0);
        }

        RenderCameraEnvironment {
            id: entity.id(),
            background: environment.background,
            indirect_diffuse_factor: environment.indirect_diffuse_factor,
            indirect_specular_factor: environment.indirect_specular_factor,
            env_map_factor: environment.env_map_factor,
            radiance_cubemap,
            radiance_cubemap_mip_count,
            env_map: handle_of(lookups.handles, environment.env_map),
            env_map_lod_level: environment.env_map_lod_level,
            shading_coefficients,
            rotation: rotation_matrix(&environment.rotation),
        }
    }
}

/// Labels of the assigned custom targets that are not live GPU images,
/// `depth` and `color N`. An unassigned depth target is not reported.
fn invalid_custom_targets(gpu: &dyn GpuResourceManager, camera: &CameraComponent) -> Vec<String> {
    let mut invalid = Vec::new();
    if camera.depth_target.is_valid() && !gpu.is_gpu_image(camera.depth_target.handle()) {
        invalid.push("depth".to_string());
    }
    for (index, target) in camera.color_targets.iter().enumerate() {
        if !gpu.is_gpu_image(target.handle()) {
            invalid.push(format!("color {index}"));
        }
    }
    invalid
}

fn rotation_matrix(rotation: &Quat) -> Mat4 {
    UnitQuaternion::from_quaternion(*rotation).to_homogeneous()
}

fn fog_snapshot(
    entity: Option<Entity>,
    fogs: Option<&ComponentStore<FogComponent>>,
) -> RenderCameraFog {
    let Some((entity, fog)) = entity.and_then(|e| fogs.and_then(|s| s.get(e)).map(|c| (e, c)))
    else {
        return RenderCameraFog::default();
    };
    RenderCameraFog {
        id: entity.id(),
        first_layer: Vec4::new(
            fog.density,
            fog.height_falloff,
            fog.start_distance,
            fog.max_opacity,
        ),
        second_layer: Vec4::new(
            fog.second_density,
            fog.second_height_falloff,
            fog.height_offset,
            0.0,
        ),
        base_factors: fog.base_factors,
        inscattering_color: fog.inscattering_color,
        env_map_factor: fog.env_map_factor,
    }
}

/// Opaque-only camera rendered before the main camera. Half the main
/// resolution unless `explicit` provides one. Custom targets are never used.
fn color_pre_pass_camera(main: &RenderCamera, explicit: Option<&CameraComponent>) -> RenderCamera {
    let render_resolution = match explicit {
        Some(camera) if camera.render_resolution[0] > 0 && camera.render_resolution[1] > 0 => {
            camera.render_resolution
        }
        _ => [
            (main.render_resolution[0] / 2).max(1),
            (main.render_resolution[1] / 2).max(1),
        ],
    };
    let pipeline_type = match main.pipeline_type {
        RenderPipelineType::Forward => RenderPipelineType::Forward,
        _ => RenderPipelineType::LightForward,
    };
    let mut flags = RenderCameraFlags::COLOR_PRE_PASS
        | RenderCameraFlags::OPAQUE_ONLY
        | RenderCameraFlags::CLEAR_DEPTH
        | RenderCameraFlags::CLEAR_COLOR;
    flags.set(
        RenderCameraFlags::INVERSE_WINDING,
        main.flags.contains(RenderCameraFlags::INVERSE_WINDING),
    );

    RenderCamera {
        id: COLOR_PRE_PASS_CAMERA_ID,
        main_camera_id: main.id,
        name: COLOR_PRE_PASS_CAMERA_NAME.to_string(),
        render_resolution,
        flags,
        pipeline_type,
        target_type: CameraTargetType::Default,
        color_targets: Vec::new(),
        depth_target: Default::default(),
        custom_render_node_graph: Default::default(),
        post_process_name: String::new(),
        ..main.clone()
    }
}

#[cfg(test)]
mod tests {
    use lumen_graphics::dummy::DummyGpuResourceManager;
    use lumen_graphics::{
        Format, GpuImageDesc, RenderHandle, RenderHandleReference, RenderHandleType,
    };

    use super::*;

    #[test]
    fn pre_pass_is_half_resolution_and_opaque() {
        let main = RenderCamera {
            id: 3,
            render_resolution: [1280, 720],
            pipeline_type: RenderPipelineType::Deferred,
            flags: RenderCameraFlags::MAIN | RenderCameraFlags::MSAA,
            color_targets: vec![Default::default()],
            target_type: CameraTargetType::Custom,
            ..Default::default()
        };
        let pre_pass = color_pre_pass_camera(&main, None);
        assert_eq!(pre_pass.id, COLOR_PRE_PASS_CAMERA_ID);
        assert_eq!(pre_pass.main_camera_id, 3);
        assert_eq!(pre_pass.render_resolution, [640, 360]);
        assert_eq!(pre_pass.pipeline_type, RenderPipelineType::LightForward);
        assert_eq!(pre_pass.target_type, CameraTargetType::Default);
        assert!(pre_pass.color_targets.is_empty());
        assert!(pre_pass.flags.contains(RenderCameraFlags::OPAQUE_ONLY));
        assert!(!pre_pass.flags.contains(RenderCameraFlags::MAIN));
        assert!(!pre_pass.flags.contains(RenderCameraFlags::MSAA));
    }

    #[test]
    fn explicit_pre_pass_camera_sets_resolution() {
        let main = RenderCamera {
            render_resolution: [1280, 720],
            pipeline_type: RenderPipelineType::Forward,
            ..Default::default()
        };
        let explicit = CameraComponent {
            render_resolution: [256, 256],
            ..Default::default()
        };
        let pre_pass = color_pre_pass_camera(&main, Some(&explicit));
        assert_eq!(pre_pass.render_resolution, [256, 256]);
        assert_eq!(pre_pass.pipeline_type, RenderPipelineType::Forward);
    }

    #[test]
    fn every_dead_custom_target_is_reported() {
        let gpu = DummyGpuResourceManager::new();
        let live = gpu
            .create_image("Target", &GpuImageDesc::new_2d(4, 4, Format::R8G8B8A8Unorm))
            .unwrap();
        let dead = RenderHandleReference::new(RenderHandle::new(RenderHandleType::GpuImage, 999));

        let mut camera = CameraComponent {
            color_targets: vec![live.clone()],
            depth_target: live.clone(),
            ..Default::default()
        };
        assert!(invalid_custom_targets(&gpu, &camera).is_empty());

        camera.depth_target = dead.clone();
        assert_eq!(invalid_custom_targets(&gpu, &camera), vec!["depth"]);

        camera.depth_target = RenderHandleReference::default();
        camera.color_targets = vec![live, dead.clone(), RenderHandleReference::default()];
        assert_eq!(
            invalid_custom_targets(&gpu, &camera),
            vec!["color 1", "color 2"]
        );

        camera.color_targets.clear();
        camera.depth_target = dead;
        assert_eq!(invalid_custom_targets(&gpu, &camera), vec!["depth"]);
    }

    #[test]
    fn fog_layers_are_packed() {
        let mut store = ComponentStore::new();
        let entity = Entity::from_id(9);
        store.set(entity, FogComponent::default());
        let fog = fog_snapshot(Some(entity), Some(&store));
        assert_eq!(fog.id, 9);
        assert_eq!(fog.first_layer.x, FogComponent::default().density);
        assert_eq!(fog_snapshot(None, Some(&store)).id, u64::MAX);
    }
}
