//! Mesh instances and instancing batches.
//!
//! Every enabled render mesh emits one mesh data record and one
//! [`RenderSubmesh`] per submesh and material. Members of an instancing batch
//! are collected during the scan and flushed afterwards in chunks of at most
//! [`RenderSystemConfig::max_batch_instances`](super::RenderSystemConfig):
//! the first instance of a chunk carries the draw with an instance count and
//! bounds covering the whole chunk, the others only add their transform and
//! a material instance record.

use lumen_core::math::Aabb;
use lumen_ecs::{
    ComponentStore, Entity, NodeComponent, PreviousWorldMatrixComponent, World,
    WorldMatrixComponent,
};
use lumen_graphics::data_store::{MaterialDataStore, ResolvedDataStores};
use lumen_graphics::render_data::{
    RenderDrawCommand, RenderMeshData, RenderSubmesh, RenderSubmeshFlags,
};

use super::materials::MaterialSource;
use super::{BatchAabbMode, FrameState, MeshInstance, RenderSystem, is_enabled, read, world_matrix_of};
use crate::components::{
    JointMatricesComponent, LAYER_DEFAULT, LAYER_NONE, LayerComponent, MaterialComponent,
    MeshComponent, PreviousJointMatricesComponent, RenderHandleComponent,
    RenderMeshBatchComponent, RenderMeshComponent,
};

/// World bounds used for the submeshes of one processed instance.
enum SubmeshBounds {
    /// Each submesh's own box transformed by the instance matrix.
    Own,
    /// One box for every submesh.
    Shared(Aabb),
    /// One box per submesh, in submesh order.
    PerSubmesh(Vec<Aabb>),
}

struct MeshLookups<'a> {
    meshes: &'a ComponentStore<MeshComponent>,
    joints: Option<&'a ComponentStore<JointMatricesComponent>>,
    prev_joints: Option<&'a ComponentStore<PreviousJointMatricesComponent>>,
    materials: MaterialSource<'a>,
}

impl RenderSystem {
    pub(super) fn process_renderables(
        &mut self,
        world: &World,
        stores: &mut ResolvedDataStores<'_>,
        frame: &mut FrameState,
    ) {
        lumen_core::profile_scope!("process_renderables");

        self.queries.renderables.execute(world);
        let entities = self.queries.renderables.results().to_vec();

        let Some(meshes) = read::<MeshComponent>(world) else {
            return;
        };
        let Some(render_meshes) = read::<RenderMeshComponent>(world) else {
            return;
        };
        let nodes = read::<NodeComponent>(world);
        let world_matrices = read::<WorldMatrixComponent>(world);
        let prev_world_matrices = read::<PreviousWorldMatrixComponent>(world);
        let layers = read::<LayerComponent>(world);
        let batches = read::<RenderMeshBatchComponent>(world);
        let joints = read::<JointMatricesComponent>(world);
        let prev_joints = read::<PreviousJointMatricesComponent>(world);
        let materials = read::<MaterialComponent>(world);
        let handles = read::<RenderHandleComponent>(world);

        let lookups = MeshLookups {
            meshes: &*meshes,
            joints: joints.as_deref(),
            prev_joints: prev_joints.as_deref(),
            materials: MaterialSource {
                materials: materials.as_deref(),
                handles: handles.as_deref(),
            },
        };

        for entity in entities {
            let Some(render_mesh) = render_meshes.get(entity) else {
                continue;
            };
            let layer_mask = layers
                .as_deref()
                .and_then(|l| l.get(entity))
                .map_or(LAYER_DEFAULT, |l| l.layer_mask);
            if layer_mask == LAYER_NONE || !is_enabled(nodes.as_deref(), entity) {
                continue;
            }
            let Some(mesh) = render_mesh.mesh else {
                continue;
            };

            let world_matrix = world_matrix_of(world_matrices.as_deref(), entity);
            let instance = MeshInstance {
                entity,
                mesh,
                layer_mask,
                joints: lookups
                    .joints
                    .is_some_and(|j| j.contains(entity))
                    .then_some(entity),
                world: world_matrix,
                prev_world: prev_world_matrices
                    .as_deref()
                    .and_then(|m| m.get(entity))
                    .map_or(world_matrix, |m| m.matrix),
                custom_data: render_mesh.custom_data,
            };

            if let Some(batch) = render_mesh.render_mesh_batch
                && batches.as_deref().is_some_and(|b| b.contains(batch))
            {
                self.batches
                    .entry(batch.id())
                    .or_insert_with(|| (batch, Vec::new()))
                    .1
                    .push(instance);
                continue;
            }

            if let Some(mesh) = meshes.get(mesh) {
                process_mesh(
                    &mut *stores.material,
                    &lookups,
                    &instance,
                    mesh,
                    SubmeshBounds::Own,
                    1,
                    &mut frame.submesh_bounds,
                );
            }
        }

        self.process_batch_renderables(&mut *stores.material, &lookups, frame);
    }

    /// Flushes the batch lists collected this frame. Batches without members
    /// are dropped; the others keep their list allocation for the next frame.
    fn process_batch_renderables(
        &mut self,
        store: &mut dyn MaterialDataStore,
        lookups: &MeshLookups<'_>,
        frame: &mut FrameState,
    ) {
        lumen_core::profile_scope!("process_batch_renderables");

        let chunk_size = self.config.max_batch_instances.max(1);
        let mode = self.config.batch_aabb_mode;
        self.batches.retain(|_, (_, instances)| !instances.is_empty());

        for (_, instances) in self.batches.values_mut() {
            for chunk in instances.chunks(chunk_size) {
                let leader = &chunk[0];
                let Some(mesh) = lookups.meshes.get(leader.mesh) else {
                    continue;
                };
                process_mesh(
                    store,
                    lookups,
                    leader,
                    mesh,
                    chunk_bounds(mesh, chunk, mode),
                    chunk.len() as u32,
                    &mut frame.submesh_bounds,
                );
                for follower in &chunk[1..] {
                    store.add_mesh_data(mesh_data(follower));
                    for material in mesh.submeshes.iter().flat_map(|s| s.materials()) {
                        lookups.materials.add_render_material_instance(store, material);
                    }
                }
            }
            instances.clear();
        }
    }
}

fn mesh_data(instance: &MeshInstance) -> RenderMeshData {
    let mut data = RenderMeshData::new(
        instance.entity.id(),
        instance.mesh.id(),
        instance.world,
        instance.prev_world,
    );
    data.custom_data = instance.custom_data;
    data
}

/// Bounds of a batch chunk: every instance's matrix applied to the mesh box,
/// or to each submesh box.
fn chunk_bounds(mesh: &MeshComponent, chunk: &[MeshInstance], mode: BatchAabbMode) -> SubmeshBounds {
    match mode {
        BatchAabbMode::AllSubmeshes => {
            let mut local = Aabb::empty();
            for submesh in &mesh.submeshes {
                local.extend(&submesh.aabb);
            }
            SubmeshBounds::Shared(union_transformed(&local, chunk))
        }
        BatchAabbMode::PerSubmesh => SubmeshBounds::PerSubmesh(
            mesh.submeshes
                .iter()
                .map(|submesh| union_transformed(&submesh.aabb, chunk))
                .collect(),
        ),
    }
}

fn union_transformed(local: &Aabb, chunk: &[MeshInstance]) -> Aabb {
    let mut union = Aabb::empty();
    for instance in chunk {
        union.extend(&local.transformed(&instance.world));
    }
    union
}

/// Emits the mesh data record, skin joints and one draw per submesh and
/// material of `instance`.
fn process_mesh(
    store: &mut dyn MaterialDataStore,
    lookups: &MeshLookups<'_>,
    instance: &MeshInstance,
    mesh: &MeshComponent,
    bounds: SubmeshBounds,
    instance_count: u32,
    submesh_bounds: &mut Vec<Aabb>,
) {
    let mesh_data_index = store.add_mesh_data(mesh_data(instance));

    let joints = instance
        .joints
        .and_then(|e| lookups.joints.and_then(|j| j.get(e)).map(|j| (e, j)));
    let skin_joint_index = joints.map(|(entity, joints)| {
        let prev = lookups
            .prev_joints
            .and_then(|p| p.get(entity))
            .filter(|p| p.matrices.len() == joints.matrices.len())
            .map_or(joints.matrices.as_slice(), |p| p.matrices.as_slice());
        store.add_skin_joint_matrices(&joints.matrices, prev)
    });
    let skinned_bounds = joints
        .map(|(_, joints)| joints.joints_aabb)
        .filter(Aabb::is_valid);
    let inverse_winding = instance.world.determinant() < 0.0;

    for (index, submesh) in mesh.submeshes.iter().enumerate() {
        let aabb = match (&bounds, skinned_bounds) {
            (_, Some(skinned)) => skinned,
            (SubmeshBounds::Own, None) => submesh.aabb.transformed(&instance.world),
            (SubmeshBounds::Shared(aabb), None) => *aabb,
            (SubmeshBounds::PerSubmesh(boxes), None) => boxes[index],
        };
        let (world_center, world_radius) = if aabb.is_valid() {
            submesh_bounds.push(aabb);
            let center = aabb.center();
            (center, (aabb.max - center).norm())
        } else {
            (instance.world.column(3).xyz(), 0.0)
        };

        let mut flags = submesh.flags;
        flags.set(RenderSubmeshFlags::SKIN, skin_joint_index.is_some());
        flags.set(RenderSubmeshFlags::INVERSE_WINDING, inverse_winding);

        for material in submesh.materials() {
            let material_index = lookups.materials.add_render_material(store, material);
            let custom_resource_index = lookups.materials.add_custom_resources(store, material);
            store.add_submesh(RenderSubmesh {
                render_mesh_id: instance.entity.id(),
                mesh_id: instance.mesh.id(),
                submesh_index: index as u32,
                layer_mask: instance.layer_mask,
                render_sort_layer: submesh.render_sort_layer,
                render_sort_layer_order: submesh.render_sort_layer_order,
                mesh_data_index,
                skin_joint_index,
                world_center,
                world_radius,
                vertex_buffers: submesh.vertex_buffers.clone(),
                index_buffer: submesh.index_buffer.clone(),
                indirect_args_buffer: submesh.indirect_args_buffer.clone(),
                flags,
                draw: RenderDrawCommand {
                    vertex_count: submesh.vertex_count,
                    index_count: submesh.index_count,
                    instance_count: submesh.instance_count * instance_count,
                },
                material_index,
                custom_resource_index,
            });
        }
    }
}
