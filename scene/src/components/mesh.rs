//! Mesh resources and their placement in the scene.
//!
//! A [`MeshComponent`] lives on a resource entity and owns GPU geometry
//! bindings. Scene entities reference it through a [`RenderMeshComponent`].

use lumen_core::math::{Aabb, Vec4};
use lumen_ecs::Entity;
use lumen_graphics::RenderHandleReference;
use lumen_graphics::render_data::{
    IndexBufferBinding, RenderSubmeshFlags, VertexBufferBinding,
};

/// Default render sort layer of submeshes.
pub const DEFAULT_RENDER_SORT_LAYER: u8 = 32;

/// One draw range of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    /// Base material. `None` renders with the default material.
    pub material: Option<Entity>,
    /// Each additional material draws the geometry once more.
    pub additional_materials: Vec<Entity>,
    /// Local-space bounds.
    pub aabb: Aabb,
    pub vertex_count: u32,
    pub index_count: u32,
    pub instance_count: u32,
    pub vertex_buffers: Vec<VertexBufferBinding>,
    pub index_buffer: Option<IndexBufferBinding>,
    pub indirect_args_buffer: Option<RenderHandleReference>,
    pub flags: RenderSubmeshFlags,
    pub render_sort_layer: u8,
    pub render_sort_layer_order: u8,
    pub morph_target_count: u32,
}

impl Default for Submesh {
    fn default() -> Self {
        Self {
            material: None,
            additional_materials: Vec::new(),
            aabb: Aabb::empty(),
            vertex_count: 0,
            index_count: 0,
            instance_count: 1,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            indirect_args_buffer: None,
            flags: RenderSubmeshFlags::empty(),
            render_sort_layer: DEFAULT_RENDER_SORT_LAYER,
            render_sort_layer_order: 0,
            morph_target_count: 0,
        }
    }
}

impl Submesh {
    /// Submesh bounded by `aabb` drawing `vertex_count` vertices with `material`.
    pub fn new(aabb: Aabb, vertex_count: u32, material: Option<Entity>) -> Self {
        Self {
            material,
            aabb,
            vertex_count,
            ..Default::default()
        }
    }

    /// Base material followed by the additional ones.
    pub fn materials(&self) -> impl Iterator<Item = Option<Entity>> + '_ {
        std::iter::once(self.material).chain(self.additional_materials.iter().copied().map(Some))
    }
}

/// Geometry resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshComponent {
    pub submeshes: Vec<Submesh>,
    /// Union of the submesh bounds.
    pub aabb: Aabb,
    /// Per-joint bounds for skinned meshes.
    pub joint_bounds: Vec<Aabb>,
}

impl MeshComponent {
    /// Mesh from `submeshes`, with the overall bounds computed from them.
    pub fn from_submeshes(submeshes: Vec<Submesh>) -> Self {
        let mut aabb = Aabb::empty();
        for submesh in &submeshes {
            aabb.extend(&submesh.aabb);
        }
        Self {
            submeshes,
            aabb,
            joint_bounds: Vec::new(),
        }
    }
}

/// Places a mesh in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMeshComponent {
    pub mesh: Option<Entity>,
    /// Batch entity this instance is merged into.
    pub render_mesh_batch: Option<Entity>,
    /// Forwarded to the shader with the instance transform.
    pub custom_data: Vec4,
}

impl Default for RenderMeshComponent {
    fn default() -> Self {
        Self {
            mesh: None,
            render_mesh_batch: None,
            custom_data: Vec4::zeros(),
        }
    }
}

impl RenderMeshComponent {
    pub fn new(mesh: Entity) -> Self {
        Self {
            mesh: Some(mesh),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_batch(mut self, batch: Entity) -> Self {
        self.render_mesh_batch = Some(batch);
        self
    }
}

/// How a batch merges its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMeshBatchType {
    #[default]
    GpuInstancing,
}

/// Marks an entity as a batch that render meshes can join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMeshBatchComponent {
    pub batch_type: RenderMeshBatchType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::Vec3;

    #[test]
    fn mesh_bounds_cover_submeshes() {
        let a = Submesh::new(Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)), 3, None);
        let b = Submesh::new(Aabb::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::zeros()), 3, None);
        let mesh = MeshComponent::from_submeshes(vec![a, b]);
        assert_eq!(mesh.aabb.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(mesh.aabb.max, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn materials_lists_base_first() {
        let base = Entity::from_id(1);
        let extra = Entity::from_id(2);
        let submesh = Submesh {
            material: Some(base),
            additional_materials: vec![extra],
            ..Default::default()
        };
        let materials: Vec<_> = submesh.materials().collect();
        assert_eq!(materials, vec![Some(base), Some(extra)]);
    }
}
