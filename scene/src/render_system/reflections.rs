//! Planar reflections.
//!
//! Each active reflection plane adds a camera mirroring the main camera
//! across the plane and owns a color/depth target pair sized relative to the
//! main camera. The plane's material samples the color target through the
//! clearcoat roughness slot, whose factor carries
//! `(mip count, screen percentage, width, height)`.

use lumen_core::math::{Mat4, Vec3, Vec4, reflection_matrix, transform_point};
use lumen_ecs::{ComponentStore, Entity, NodeComponent, World, WorldMatrixComponent};
use lumen_graphics::data_store::ResolvedDataStores;
use lumen_graphics::render_data::{
    CameraCullType, CameraMatrices, CameraTargetType, MaterialTextureSlot, RenderCamera,
    RenderCameraFlags, RenderPipelineType,
};
use lumen_graphics::types::full_mip_count;
use lumen_graphics::{Format, GpuImageDesc, ImageUsage, RenderHandleReference};

use super::{FrameState, RenderSystem, is_enabled, read, world_matrix_of};
use crate::components::{
    MaterialComponent, MeshComponent, PlanarReflectionComponent, PlanarReflectionFlags,
    RenderHandleComponent, RenderMeshComponent,
};

/// Target decision for one reflection plane in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectionTargetUpdate {
    pub entity: Entity,
    /// The color and depth targets were created this frame.
    pub recreated: bool,
    pub resolution: [u32; 2],
    pub mip_count: u32,
}

impl RenderSystem {
    pub(super) fn process_reflections(
        &mut self,
        world: &World,
        stores: &mut ResolvedDataStores<'_>,
        frame: &FrameState,
    ) {
        lumen_core::profile_scope!("process_reflections");

        self.reflection_updates.clear();
        let Some(main) = frame.main_render_camera.clone() else {
            return;
        };

        self.queries.reflections.execute(world);
        let entities = self.queries.reflections.results().to_vec();
        if entities.is_empty() {
            return;
        }

        let nodes = read::<NodeComponent>(world);
        let world_matrices = read::<WorldMatrixComponent>(world);
        let render_meshes = read::<RenderMeshComponent>(world);
        let meshes = read::<MeshComponent>(world);
        let Ok(mut reflections) = world.write::<PlanarReflectionComponent>() else {
            return;
        };
        let mut materials = world.write::<MaterialComponent>().ok();
        let mut handles = world.write::<RenderHandleComponent>().ok();

        for entity in entities {
            if !is_enabled(nodes.as_deref(), entity) {
                continue;
            }
            let Some(reflection) = reflections.get_mut(entity) else {
                continue;
            };
            if !reflection.flags.contains(PlanarReflectionFlags::ACTIVE_RENDER) {
                continue;
            }

            let world_matrix = world_matrix_of(world_matrices.as_deref(), entity);
            let Some(plane) = reflection_plane(&world_matrix, reflection.clip_offset) else {
                continue;
            };

            let update = self.update_reflection_targets(entity, reflection, &main);
            if update.recreated {
                let material_entity = plane_material(
                    entity,
                    materials.as_deref(),
                    render_meshes.as_deref(),
                    meshes.as_deref(),
                );
                if let (Some(material_entity), Some(materials)) =
                    (material_entity, materials.as_deref_mut())
                    && let Some(material) = materials.get_mut(material_entity)
                {
                    let slot = material.texture_mut(MaterialTextureSlot::ClearcoatRoughness);
                    slot.image = Some(entity);
                    slot.factor = Vec4::new(
                        update.mip_count as f32,
                        reflection.screen_percentage,
                        update.resolution[0] as f32,
                        update.resolution[1] as f32,
                    );
                }
                if let Some(handles) = handles.as_deref_mut() {
                    handles.set(
                        entity,
                        RenderHandleComponent::new(reflection.color_render_target.clone()),
                    );
                }
            }

            let camera = self.reflection_camera(entity, reflection, &main, &plane);
            stores.camera.add_camera(camera);
            self.reflection_updates.push(update);
        }
    }

    /// Creates the plane's targets when missing or when the required
    /// resolution changed.
    fn update_reflection_targets(
        &self,
        entity: Entity,
        reflection: &mut PlanarReflectionComponent,
        main: &RenderCamera,
    ) -> ReflectionTargetUpdate {
        let resolution = reflection_resolution(main.render_resolution, reflection.screen_percentage);
        let mip_count = self
            .config
            .reflection_mip_count
            .min(full_mip_count(resolution[0], resolution[1]))
            .max(self.config.min_reflection_mip_count);

        let gpu = &self.context.gpu;
        let targets_alive = gpu.is_gpu_image(reflection.color_render_target.handle())
            && gpu.is_gpu_image(reflection.depth_render_target.handle());
        if targets_alive && reflection.render_target_resolution == resolution {
            return ReflectionTargetUpdate {
                entity,
                recreated: false,
                resolution,
                mip_count: reflection.mip_count,
            };
        }

        let color_desc = GpuImageDesc::new_2d(resolution[0], resolution[1], Format::B10G11R11Ufloat)
            .with_mip_count(mip_count)
            .with_usage(ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED);
        let depth_desc = GpuImageDesc::new_2d(resolution[0], resolution[1], Format::D16Unorm)
            .with_usage(ImageUsage::DEPTH_STENCIL_ATTACHMENT);

        reflection.color_render_target =
            self.create_target(&format!("ReflectionColor_{}", entity.id()), &color_desc);
        reflection.depth_render_target =
            self.create_target(&format!("ReflectionDepth_{}", entity.id()), &depth_desc);
        reflection.render_target_resolution = resolution;
        reflection.mip_count = mip_count;
        log::debug!(
            "RenderSystem: reflection targets of {entity:?} created at {}x{} with {mip_count} mips",
            resolution[0],
            resolution[1]
        );

        ReflectionTargetUpdate {
            entity,
            recreated: true,
            resolution,
            mip_count,
        }
    }

    fn create_target(&self, name: &str, desc: &GpuImageDesc) -> RenderHandleReference {
        match self.context.gpu.create_image(name, desc) {
            Ok(handle) => handle,
            Err(e) => {
                self.log_once.error(
                    name,
                    format_args!("RenderSystem: cannot create reflection target {name}: {e}"),
                );
                RenderHandleReference::default()
            }
        }
    }

    fn reflection_camera(
        &mut self,
        entity: Entity,
        reflection: &PlanarReflectionComponent,
        main: &RenderCamera,
        plane: &Vec4,
    ) -> RenderCamera {
        let mirror = reflection_matrix(plane);
        let view = main.matrices.view * mirror;
        let proj = main.matrices.proj;
        let (view_prev, proj_prev) =
            self.update_and_get_previous_frame_camera_data(entity.id(), &view, &proj);

        RenderCamera {
            id: entity.id(),
            main_camera_id: main.id,
            name: format!("ReflectionCamera_{}", entity.id()),
            layer_mask: reflection.layer_mask,
            matrices: CameraMatrices {
                view,
                proj,
                view_prev,
                proj_prev,
            },
            world_position: transform_point(&mirror, &main.world_position),
            render_resolution: reflection.render_target_resolution,
            z_near: main.z_near,
            z_far: main.z_far,
            clear_color: main.clear_color,
            clear_depth: main.clear_depth,
            clear_stencil: main.clear_stencil,
            flags: RenderCameraFlags::REFLECTION
                | RenderCameraFlags::INVERSE_WINDING
                | RenderCameraFlags::CLEAR_DEPTH
                | RenderCameraFlags::CLEAR_COLOR,
            cull_type: CameraCullType::ViewFrustum,
            pipeline_type: RenderPipelineType::LightForward,
            target_type: CameraTargetType::Custom,
            color_targets: vec![reflection.color_render_target.clone()],
            depth_target: reflection.depth_render_target.clone(),
            environment: main.environment.clone(),
            fog: main.fog,
            ..Default::default()
        }
    }
}

/// Plane `(n, -dot(n, p) - clip_offset)` from the node's Y axis and origin.
fn reflection_plane(world_matrix: &Mat4, clip_offset: f32) -> Option<Vec4> {
    let normal: Vec3 = world_matrix.column(1).xyz().try_normalize(f32::EPSILON)?;
    let position: Vec3 = world_matrix.column(3).xyz();
    Some(Vec4::new(
        normal.x,
        normal.y,
        normal.z,
        -normal.dot(&position) - clip_offset,
    ))
}

fn reflection_resolution(main: [u32; 2], screen_percentage: f32) -> [u32; 2] {
    let scale = |size: u32| ((size as f32 * screen_percentage) as u32).max(1);
    [scale(main[0]), scale(main[1])]
}

/// Material receiving the reflection: the plane's own, else the first
/// submesh material of its mesh.
fn plane_material(
    entity: Entity,
    materials: Option<&ComponentStore<MaterialComponent>>,
    render_meshes: Option<&ComponentStore<RenderMeshComponent>>,
    meshes: Option<&ComponentStore<MeshComponent>>,
) -> Option<Entity> {
    if materials.is_some_and(|m| m.contains(entity)) {
        return Some(entity);
    }
    let mesh = render_meshes?.get(entity)?.mesh?;
    meshes?.get(mesh)?.submeshes.first()?.material
}
