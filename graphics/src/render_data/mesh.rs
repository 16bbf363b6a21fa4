//! Per-frame draw units and instance transforms.

use bitflags::bitflags;
use lumen_core::math::{Mat4, Vec3, Vec4};

use crate::handle::RenderHandleReference;
use crate::types::IndexType;

/// Maximum number of vertex buffer bindings per submesh.
pub const MAX_VERTEX_BUFFERS: usize = 8;

bitflags! {
    /// Geometry feature bits of a submesh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderSubmeshFlags: u32 {
        const TANGENTS = 1 << 0;
        const VERTEX_COLORS = 1 << 1;
        const SKIN = 1 << 2;
        const SECOND_TEXCOORD = 1 << 3;
        const INVERSE_WINDING = 1 << 4;
    }
}

/// Vertex buffer binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBufferBinding {
    pub buffer: RenderHandleReference,
    pub byte_offset: u32,
    pub byte_size: u32,
}

/// Index buffer binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexBufferBinding {
    pub buffer: RenderHandleReference,
    pub byte_offset: u32,
    pub byte_size: u32,
    pub index_type: IndexType,
}

/// Draw call parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderDrawCommand {
    pub vertex_count: u32,
    pub index_count: u32,
    pub instance_count: u32,
}

impl Default for RenderDrawCommand {
    fn default() -> Self {
        Self {
            vertex_count: 0,
            index_count: 0,
            instance_count: 1,
        }
    }
}

/// One draw unit: a submesh drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSubmesh {
    pub render_mesh_id: u64,
    pub mesh_id: u64,
    pub submesh_index: u32,
    pub layer_mask: u64,
    pub render_sort_layer: u8,
    pub render_sort_layer_order: u8,
    /// Index into the frame's [`RenderMeshData`] list.
    pub mesh_data_index: u32,
    /// Index into the frame's skin joint list.
    pub skin_joint_index: Option<u32>,
    pub world_center: Vec3,
    pub world_radius: f32,
    pub vertex_buffers: Vec<VertexBufferBinding>,
    pub index_buffer: Option<IndexBufferBinding>,
    pub indirect_args_buffer: Option<RenderHandleReference>,
    pub flags: RenderSubmeshFlags,
    pub draw: RenderDrawCommand,
    /// Index into the frame's material list.
    pub material_index: u32,
    pub custom_resource_index: Option<u32>,
}

impl Default for RenderSubmesh {
    fn default() -> Self {
        Self {
            render_mesh_id: u64::MAX,
            mesh_id: u64::MAX,
            submesh_index: 0,
            layer_mask: u64::MAX,
            render_sort_layer: 32,
            render_sort_layer_order: 0,
            mesh_data_index: 0,
            skin_joint_index: None,
            world_center: Vec3::zeros(),
            world_radius: 0.0,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            indirect_args_buffer: None,
            flags: RenderSubmeshFlags::empty(),
            draw: RenderDrawCommand::default(),
            material_index: 0,
            custom_resource_index: None,
        }
    }
}

/// Transform record of one rendered mesh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderMeshData {
    pub world: Mat4,
    /// Inverse transpose of `world`.
    pub normal_world: Mat4,
    pub prev_world: Mat4,
    pub id: u64,
    pub mesh_id: u64,
    pub custom_data: Vec4,
}

impl Default for RenderMeshData {
    fn default() -> Self {
        Self {
            world: Mat4::identity(),
            normal_world: Mat4::identity(),
            prev_world: Mat4::identity(),
            id: u64::MAX,
            mesh_id: u64::MAX,
            custom_data: Vec4::zeros(),
        }
    }
}

impl RenderMeshData {
    /// Record for `world`, with the normal matrix derived from it.
    pub fn new(id: u64, mesh_id: u64, world: Mat4, prev_world: Mat4) -> Self {
        let normal_world = world
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or(world);
        Self {
            world,
            normal_world,
            prev_world,
            id,
            mesh_id,
            custom_data: Vec4::zeros(),
        }
    }
}

/// Joint matrices of one skinned mesh instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSkinJointMatrices {
    pub matrices: Vec<Mat4>,
    pub prev_matrices: Vec<Mat4>,
}
