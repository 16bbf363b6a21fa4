//! Worker-thread decoding.
//!
//! Everything here reads only the source model and resolved buffers, so it
//! is safe to run off the owning thread.

use std::sync::Arc;

use lumen_core::gltf::{
    AccessorData, ComponentType, DecodedImage, GltfData, GltfError, decode_image,
    load_accessor_data, load_image_bytes, read_f32, read_mat4,
};
use lumen_core::math::{Aabb, Mat4, Vec3};
use lumen_graphics::IndexType;
use lumen_graphics::render_data::RenderSubmeshFlags;

use super::conversions::{validate_indices, vertex_format};
use lumen_graphics::Format;

/// Byte range inside a gathered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteRange {
    pub offset: u32,
    pub size: u32,
}

/// Decoded draw range of one primitive.
#[derive(Debug, Clone)]
pub(crate) struct GatheredPrimitive {
    pub aabb: Aabb,
    pub vertex_count: u32,
    pub index_count: u32,
    pub index_type: IndexType,
    /// Attribute streams in binding order inside the vertex data.
    pub vertex_streams: Vec<ByteRange>,
    pub indices: Option<ByteRange>,
    pub material: Option<usize>,
    pub flags: RenderSubmeshFlags,
    pub morph_target_count: u32,
}

/// Decoded mesh, ready for upload.
#[derive(Debug, Clone, Default)]
pub(crate) struct GatheredMesh {
    pub vertex_data: Vec<u8>,
    pub index_data: Vec<u8>,
    pub primitives: Vec<GatheredPrimitive>,
    /// Bounds of the vertices influenced by each joint, in mesh space.
    pub joint_bounds: Vec<Aabb>,
}

/// Decoded keyframe times or values.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyframeData {
    pub components: usize,
    pub values: Vec<f32>,
}

/// Decoded faces of a radiance cubemap, mip by mip, six faces per mip.
#[derive(Debug, Clone)]
pub(crate) struct GatheredCubemap {
    pub size: u32,
    pub mip_count: u32,
    pub pixels: Vec<u8>,
}

fn accessor(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    index: usize,
) -> Result<AccessorData, GltfError> {
    load_accessor_data(data, buffers, index).into_result()
}

fn align_to_four(bytes: &mut Vec<u8>) {
    bytes.resize(bytes.len().next_multiple_of(4), 0);
}

fn append(bytes: &mut Vec<u8>, data: &[u8]) -> ByteRange {
    align_to_four(bytes);
    let range = ByteRange {
        offset: bytes.len() as u32,
        size: data.len() as u32,
    };
    bytes.extend_from_slice(data);
    range
}

/// Attribute accessor of a primitive, checked to have a GPU format and one
/// element per vertex.
fn attribute(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    index: usize,
    label: &str,
    vertex_count: usize,
) -> Result<AccessorData, GltfError> {
    let loaded = accessor(data, buffers, index)?;
    if vertex_format(loaded.component_type, loaded.component_count, loaded.normalized)
        == Format::Undefined
    {
        return Err(GltfError::UnsupportedComponentType(format!(
            "{label} uses {:?} x{} (normalized: {}), which has no vertex format",
            loaded.component_type, loaded.component_count, loaded.normalized
        )));
    }
    if loaded.element_count != vertex_count {
        return Err(GltfError::AccessorError(format!(
            "{label} has {} elements for {vertex_count} vertices",
            loaded.element_count
        )));
    }
    Ok(loaded)
}

/// Float stream of `components` per element, padding missing components
/// with `fill`.
fn float_stream(
    loaded: &AccessorData,
    components: usize,
    fill: f32,
) -> Result<Vec<f32>, GltfError> {
    let values = read_f32(loaded)?;
    if loaded.component_count == components {
        return Ok(values);
    }
    let source = loaded.component_count.max(1);
    let mut out = Vec::with_capacity(loaded.element_count * components);
    for element in values.chunks_exact(source) {
        for c in 0..components {
            out.push(element.get(c).copied().unwrap_or(fill));
        }
    }
    Ok(out)
}

/// Decodes every primitive of mesh `mesh_index`.
pub(crate) fn gather_mesh(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    mesh_index: usize,
) -> Result<GatheredMesh, GltfError> {
    let mesh = data
        .meshes
        .get(mesh_index)
        .ok_or_else(|| GltfError::AccessorError(format!("mesh {mesh_index} does not exist")))?;
    let mut gathered = GatheredMesh::default();

    for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
        let label = |attribute: &str| format!("primitive {primitive_index} {attribute}");
        let position_index = primitive.position.ok_or(GltfError::MissingPositions {
            mesh: mesh_index,
            primitive: primitive_index,
        })?;
        let positions = accessor(data, buffers, position_index)?;
        let vertex_count = positions.element_count;
        let positions = float_stream(&positions, 3, 0.0)?;

        let mut aabb = Aabb::empty();
        for p in positions.chunks_exact(3) {
            aabb.extend_point(&Vec3::new(p[0], p[1], p[2]));
        }

        let mut flags = RenderSubmeshFlags::empty();
        let mut streams = vec![append(
            &mut gathered.vertex_data,
            bytemuck::cast_slice(&positions),
        )];

        if let Some(index) = primitive.normal {
            let normals = attribute(data, buffers, index, &label("NORMAL"), vertex_count)?;
            let normals = float_stream(&normals, 3, 0.0)?;
            streams.push(append(&mut gathered.vertex_data, bytemuck::cast_slice(&normals)));
        }
        if let Some(index) = primitive.tangent {
            let tangents = attribute(data, buffers, index, &label("TANGENT"), vertex_count)?;
            let tangents = float_stream(&tangents, 4, 1.0)?;
            streams.push(append(&mut gathered.vertex_data, bytemuck::cast_slice(&tangents)));
            flags |= RenderSubmeshFlags::TANGENTS;
        }
        for (set, &index) in primitive.tex_coords.iter().take(2).enumerate() {
            let uvs = attribute(data, buffers, index, &label("TEXCOORD"), vertex_count)?;
            let uvs = float_stream(&uvs, 2, 0.0)?;
            streams.push(append(&mut gathered.vertex_data, bytemuck::cast_slice(&uvs)));
            if set == 1 {
                flags |= RenderSubmeshFlags::SECOND_TEXCOORD;
            }
        }
        if let Some(index) = primitive.color {
            let colors = attribute(data, buffers, index, &label("COLOR_0"), vertex_count)?;
            let colors = float_stream(&colors, 4, 1.0)?;
            streams.push(append(&mut gathered.vertex_data, bytemuck::cast_slice(&colors)));
            flags |= RenderSubmeshFlags::VERTEX_COLORS;
        }
        if let (Some(joints_index), Some(weights_index)) = (primitive.joints, primitive.weights) {
            let joints = attribute(data, buffers, joints_index, &label("JOINTS_0"), vertex_count)?;
            if !matches!(
                joints.component_type,
                ComponentType::UnsignedByte | ComponentType::UnsignedShort
            ) {
                return Err(GltfError::UnsupportedComponentType(format!(
                    "{} must be unsigned byte or short, found {:?}",
                    label("JOINTS_0"),
                    joints.component_type
                )));
            }
            let weights =
                attribute(data, buffers, weights_index, &label("WEIGHTS_0"), vertex_count)?;
            let weights = float_stream(&weights, 4, 0.0)?;
            extend_joint_bounds(&mut gathered.joint_bounds, &joints, &weights, &positions)?;
            streams.push(append(&mut gathered.vertex_data, &joints.data));
            streams.push(append(&mut gathered.vertex_data, bytemuck::cast_slice(&weights)));
            flags |= RenderSubmeshFlags::SKIN;
        }

        let (indices, index_count, index_type) = match primitive.indices {
            Some(index) => {
                let loaded = accessor(data, buffers, index)?;
                let wide = loaded.component_type == ComponentType::UnsignedInt;
                let values = validate_indices(&loaded, vertex_count)?;
                let range = if wide {
                    append(&mut gathered.index_data, bytemuck::cast_slice(&values))
                } else {
                    let narrow: Vec<u16> = values.iter().map(|&v| v as u16).collect();
                    append(&mut gathered.index_data, bytemuck::cast_slice(&narrow))
                };
                let index_type = if wide {
                    IndexType::Uint32
                } else {
                    IndexType::Uint16
                };
                (Some(range), values.len() as u32, index_type)
            }
            None => (None, 0, IndexType::Uint32),
        };

        gathered.primitives.push(GatheredPrimitive {
            aabb,
            vertex_count: vertex_count as u32,
            index_count,
            index_type,
            vertex_streams: streams,
            indices,
            material: primitive.material,
            flags,
            morph_target_count: primitive.targets.len() as u32,
        });
    }
    Ok(gathered)
}

fn extend_joint_bounds(
    bounds: &mut Vec<Aabb>,
    joints: &AccessorData,
    weights: &[f32],
    positions: &[f32],
) -> Result<(), GltfError> {
    let joint_values = float_stream(joints, 4, 0.0)?;
    for (vertex, (joint_set, weight_set)) in joint_values
        .chunks_exact(4)
        .zip(weights.chunks_exact(4))
        .enumerate()
    {
        let Some(p) = positions.get(vertex * 3..vertex * 3 + 3) else {
            break;
        };
        let position = Vec3::new(p[0], p[1], p[2]);
        for (&joint, &weight) in joint_set.iter().zip(weight_set) {
            if weight <= 0.0 {
                continue;
            }
            let joint = joint as usize;
            if bounds.len() <= joint {
                bounds.resize(joint + 1, Aabb::empty());
            }
            bounds[joint].extend_point(&position);
        }
    }
    Ok(())
}

/// Inverse bind matrices of skin `skin_index`, identity when the skin has
/// no accessor.
pub(crate) fn gather_skin(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    skin_index: usize,
) -> Result<Vec<Mat4>, GltfError> {
    let skin = data
        .skins
        .get(skin_index)
        .ok_or_else(|| GltfError::AccessorError(format!("skin {skin_index} does not exist")))?;
    let Some(index) = skin.inverse_bind_matrices else {
        return Ok(vec![Mat4::identity(); skin.joints.len()]);
    };
    let matrices: Vec<Mat4> = read_mat4(&accessor(data, buffers, index)?)?
        .iter()
        .map(|m| Mat4::from_column_slice(m))
        .collect();
    if matrices.len() < skin.joints.len() {
        return Err(GltfError::AccessorError(format!(
            "{} inverse bind matrices for {} joints",
            matrices.len(),
            skin.joints.len()
        )));
    }
    Ok(matrices)
}

/// Keyframe floats of accessor `index`.
pub(crate) fn gather_keyframes(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    index: usize,
) -> Result<KeyframeData, GltfError> {
    let loaded = accessor(data, buffers, index)?;
    Ok(KeyframeData {
        components: loaded.component_count,
        values: read_f32(&loaded)?,
    })
}

/// Decoded pixels of image `index`.
pub(crate) fn gather_image(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    index: usize,
) -> Result<DecodedImage, GltfError> {
    decode_image(&load_image_bytes(data, buffers, index)?)
}

/// Decoded faces of image based light `index`.
pub(crate) fn gather_cubemap(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    index: usize,
) -> Result<GatheredCubemap, GltfError> {
    let light = data.image_based_lights.get(index).ok_or_else(|| {
        GltfError::ImageDecode(format!("image based light {index} does not exist"))
    })?;
    if light.specular_images.is_empty() || light.specular_image_size == 0 {
        return Err(GltfError::ImageDecode(format!(
            "image based light {index} has no specular images"
        )));
    }

    let mut pixels = Vec::new();
    for (mip, faces) in light.specular_images.iter().enumerate() {
        let expected = (light.specular_image_size >> mip).max(1);
        for &face in faces {
            let image = gather_image(data, buffers, face)?;
            if image.width != expected || image.height != expected {
                return Err(GltfError::ImageDecode(format!(
                    "cubemap face {face} is {}x{}, expected {expected}x{expected} at mip {mip}",
                    image.width, image.height
                )));
            }
            pixels.extend_from_slice(&image.pixels);
        }
    }
    Ok(GatheredCubemap {
        size: light.specular_image_size,
        mip_count: light.specular_images.len() as u32,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use lumen_core::gltf::{
        ElementType, GltfAccessor, GltfBuffer, GltfBufferView, GltfMesh, GltfPrimitive, GltfSkin,
    };

    use super::*;

    /// Mesh with one triangle whose index buffer is `indices`.
    fn triangle(indices: &[u16]) -> (GltfData, Vec<Arc<[u8]>>) {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, -1.0];
        let mut bytes: Vec<u8> = bytemuck::cast_slice(&positions).to_vec();
        let index_offset = bytes.len();
        bytes.extend(indices.iter().flat_map(|i| i.to_le_bytes()));

        let mut data = GltfData::new("mem/triangle.gltf");
        data.buffers.push(GltfBuffer {
            uri: None,
            byte_length: bytes.len(),
            data: Some(Arc::from(bytes.as_slice())),
        });
        data.buffer_views.push(GltfBufferView {
            buffer: 0,
            byte_offset: 0,
            byte_length: index_offset,
            byte_stride: None,
        });
        data.buffer_views.push(GltfBufferView {
            buffer: 0,
            byte_offset: index_offset,
            byte_length: indices.len() * 2,
            byte_stride: None,
        });
        data.accessors.push(GltfAccessor {
            buffer_view: Some(0),
            component_type: ComponentType::Float,
            element_type: ElementType::Vec3,
            count: 3,
            ..Default::default()
        });
        data.accessors.push(GltfAccessor {
            buffer_view: Some(1),
            component_type: ComponentType::UnsignedShort,
            element_type: ElementType::Scalar,
            count: indices.len(),
            ..Default::default()
        });
        data.meshes.push(GltfMesh {
            name: None,
            primitives: vec![GltfPrimitive {
                position: Some(0),
                indices: Some(1),
                material: Some(0),
                ..Default::default()
            }],
            weights: Vec::new(),
        });
        let buffers = vec![Arc::from(bytes.as_slice())];
        (data, buffers)
    }

    #[test]
    fn triangle_gathers_bounds_and_indices() {
        let (data, buffers) = triangle(&[0, 1, 2]);
        let mesh = gather_mesh(&data, &buffers, 0).unwrap();
        let primitive = &mesh.primitives[0];
        assert_eq!(primitive.vertex_count, 3);
        assert_eq!(primitive.index_count, 3);
        assert_eq!(primitive.index_type, IndexType::Uint16);
        assert_eq!(primitive.aabb.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(primitive.aabb.max, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(primitive.vertex_streams.len(), 1);
        assert_eq!(mesh.vertex_data.len(), 36);
        assert_eq!(mesh.index_data.len(), 6);
        assert_eq!(primitive.material, Some(0));
    }

    #[test]
    fn out_of_range_index_fails_the_mesh() {
        let (data, buffers) = triangle(&[0, 1, 3]);
        assert!(matches!(
            gather_mesh(&data, &buffers, 0),
            Err(GltfError::InvalidIndex {
                index: 3,
                vertex_count: 3
            })
        ));
    }

    #[test]
    fn primitive_without_positions_fails() {
        let (mut data, buffers) = triangle(&[0, 1, 2]);
        data.meshes[0].primitives[0].position = None;
        assert!(matches!(
            gather_mesh(&data, &buffers, 0),
            Err(GltfError::MissingPositions {
                mesh: 0,
                primitive: 0
            })
        ));
    }

    #[test]
    fn skin_without_matrices_uses_identity() {
        let mut data = GltfData::new("mem/skin.gltf");
        data.skins.push(GltfSkin {
            joints: vec![1, 2, 3],
            ..Default::default()
        });
        let matrices = gather_skin(&data, &[], 0).unwrap();
        assert_eq!(matrices, vec![Mat4::identity(); 3]);
    }

    #[test]
    fn float_stream_pads_components() {
        let loaded = AccessorData {
            success: true,
            error: String::new(),
            component_type: ComponentType::Float,
            element_type: ElementType::Vec3,
            component_count: 3,
            element_size: 12,
            element_count: 1,
            normalized: false,
            data: bytemuck::cast_slice(&[0.5f32, 0.25, 0.125]).to_vec(),
            min: Vec::new(),
            max: Vec::new(),
        };
        assert_eq!(float_stream(&loaded, 4, 1.0).unwrap(), vec![0.5, 0.25, 0.125, 1.0]);
    }
}
