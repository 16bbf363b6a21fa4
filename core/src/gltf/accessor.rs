//! Accessor decoding.
//!
//! [`load_accessor_data`] copies an accessor's elements out of their buffer
//! view into a tightly packed byte array. The `read_*` helpers then convert
//! those bytes into floats or indices.

use std::sync::Arc;

use super::data::{ComponentType, ElementType, GltfData};
use super::error::GltfError;

/// Upper bound for the zero-filled data of an accessor without a buffer view.
pub const MAX_ZERO_FILLED_ACCESSOR_BYTES: usize = 256 * 1024 * 1024;

/// Result of loading one accessor.
///
/// On failure `success` is `false`, `error` holds a message and `data` is
/// empty; the type information is still filled in when known.
#[derive(Debug, Clone)]
pub struct AccessorData {
    pub success: bool,
    pub error: String,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    /// Components per element.
    pub component_count: usize,
    /// Bytes per element (`component_count * component size`).
    pub element_size: usize,
    /// Number of elements.
    pub element_count: usize,
    pub normalized: bool,
    /// Tightly packed little-endian element bytes.
    pub data: Vec<u8>,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl AccessorData {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            error,
            component_type: ComponentType::Float,
            element_type: ElementType::Scalar,
            component_count: 0,
            element_size: 0,
            element_count: 0,
            normalized: false,
            data: Vec::new(),
            min: Vec::new(),
            max: Vec::new(),
        }
    }

    /// Converts a failed load into an error.
    pub fn into_result(self) -> Result<Self, GltfError> {
        if self.success {
            Ok(self)
        } else {
            Err(GltfError::AccessorError(self.error))
        }
    }
}

/// Loads accessor `index` out of the resolved `buffers`.
pub fn load_accessor_data(data: &GltfData, buffers: &[Arc<[u8]>], index: usize) -> AccessorData {
    let Some(accessor) = data.accessors.get(index) else {
        return AccessorData::failed(format!("accessor {index} does not exist"));
    };

    let component_count = accessor.element_type.component_count();
    let element_size = component_count * accessor.component_type.size();
    let mut result = AccessorData {
        success: true,
        error: String::new(),
        component_type: accessor.component_type,
        element_type: accessor.element_type,
        component_count,
        element_size,
        element_count: accessor.count,
        normalized: accessor.normalized,
        data: Vec::new(),
        min: accessor.min.clone(),
        max: accessor.max.clone(),
    };

    if accessor.sparse {
        result.success = false;
        result.error = GltfError::SparseAccessor(index).to_string();
        return result;
    }

    let Some(view_index) = accessor.buffer_view else {
        match element_size.checked_mul(accessor.count) {
            Some(size) if size <= MAX_ZERO_FILLED_ACCESSOR_BYTES => result.data = vec![0; size],
            _ => {
                result.success = false;
                result.error = GltfError::AccessorError(format!(
                    "accessor {index}: {} elements of {element_size} bytes exceed the zero-fill limit",
                    accessor.count
                ))
                .to_string();
            }
        }
        return result;
    };

    match copy_elements(data, buffers, view_index, accessor.byte_offset, element_size, accessor.count) {
        Ok(bytes) => result.data = bytes,
        Err(e) => {
            result.success = false;
            result.error = format!("accessor {index}: {e}");
        }
    }
    result
}

fn copy_elements(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    view_index: usize,
    byte_offset: usize,
    element_size: usize,
    count: usize,
) -> Result<Vec<u8>, GltfError> {
    let view = data.buffer_views.get(view_index).ok_or_else(|| {
        GltfError::AccessorError(format!("buffer view {view_index} does not exist"))
    })?;
    let buffer = buffers.get(view.buffer).ok_or_else(|| {
        GltfError::BufferError(format!("buffer {} is not loaded", view.buffer))
    })?;
    let stride = view.byte_stride.unwrap_or(element_size).max(element_size);

    if count == 0 {
        return Ok(Vec::new());
    }
    let overflow = || {
        GltfError::AccessorError(format!(
            "{count} elements with stride {stride} overflow buffer view {view_index}"
        ))
    };
    let span = stride
        .checked_mul(count - 1)
        .and_then(|s| s.checked_add(element_size))
        .ok_or_else(overflow)?;
    let view_end = byte_offset.checked_add(span).ok_or_else(overflow)?;
    if view_end > view.byte_length {
        return Err(GltfError::AccessorError(format!(
            "elements exceed buffer view {view_index} ({view_end} > {})",
            view.byte_length
        )));
    }
    let start = view
        .byte_offset
        .checked_add(byte_offset)
        .ok_or_else(overflow)?;
    let end = start.checked_add(span).ok_or_else(overflow)?;
    if end > buffer.len() {
        return Err(GltfError::BufferError(format!(
            "buffer view {view_index} exceeds buffer {} ({end} > {})",
            view.buffer,
            buffer.len()
        )));
    }

    let mut bytes = Vec::with_capacity(element_size * count);
    for i in 0..count {
        let offset = start + i * stride;
        bytes.extend_from_slice(&buffer[offset..offset + element_size]);
    }
    Ok(bytes)
}

/// Normalized signed byte to float, clamped to `-1.0`.
pub fn normalize_i8(value: i8) -> f32 {
    (value as f32 / 127.0).max(-1.0)
}

/// Normalized unsigned byte to float.
pub fn normalize_u8(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Normalized signed short to float with an optional explicit divisor,
/// clamped to `-1.0`.
pub fn normalize_i16(value: i16, scale: Option<f32>) -> f32 {
    (value as f32 / scale.unwrap_or(32767.0)).max(-1.0)
}

/// Normalized unsigned short to float.
pub fn normalize_u16(value: u16) -> f32 {
    value as f32 / 65535.0
}

/// Converts every component to `f32`.
///
/// Normalized accessors use the fixed glTF divisors; plain integer
/// accessors are cast. Normalized 32-bit integers are rejected.
pub fn read_f32(accessor: &AccessorData) -> Result<Vec<f32>, GltfError> {
    read_f32_scaled(accessor, None)
}

/// Like [`read_f32`], with an explicit divisor for normalized signed shorts.
pub fn read_f32_scaled(accessor: &AccessorData, short_scale: Option<f32>) -> Result<Vec<f32>, GltfError> {
    let bytes = &accessor.data;
    let normalized = accessor.normalized;
    let values = match accessor.component_type {
        ComponentType::Float => bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect(),
        ComponentType::Byte => bytes
            .iter()
            .map(|&b| {
                let v = b as i8;
                if normalized { normalize_i8(v) } else { v as f32 }
            })
            .collect(),
        ComponentType::UnsignedByte => bytes
            .iter()
            .map(|&b| if normalized { normalize_u8(b) } else { b as f32 })
            .collect(),
        ComponentType::Short => bytes
            .chunks_exact(2)
            .map(|c| {
                let v = i16::from_le_bytes([c[0], c[1]]);
                if normalized { normalize_i16(v, short_scale) } else { v as f32 }
            })
            .collect(),
        ComponentType::UnsignedShort => bytes
            .chunks_exact(2)
            .map(|c| {
                let v = u16::from_le_bytes([c[0], c[1]]);
                if normalized { normalize_u16(v) } else { v as f32 }
            })
            .collect(),
        ComponentType::Int | ComponentType::UnsignedInt if normalized => {
            return Err(GltfError::UnsupportedComponentType(format!(
                "normalized {:?} cannot be converted to float",
                accessor.component_type
            )));
        }
        ComponentType::Int => bytes
            .chunks_exact(4)
            .map(|c| bytemuck::pod_read_unaligned::<i32>(c) as f32)
            .collect(),
        ComponentType::UnsignedInt => bytes
            .chunks_exact(4)
            .map(|c| bytemuck::pod_read_unaligned::<u32>(c) as f32)
            .collect(),
    };
    Ok(values)
}

/// Reads a MAT4 accessor as column-major matrices.
pub fn read_mat4(accessor: &AccessorData) -> Result<Vec<[f32; 16]>, GltfError> {
    if accessor.element_type != ElementType::Mat4 {
        return Err(GltfError::AccessorError(format!(
            "expected MAT4 accessor, found {:?}",
            accessor.element_type
        )));
    }
    let values = read_f32(accessor)?;
    Ok(values
        .chunks_exact(16)
        .map(|c| {
            let mut m = [0.0f32; 16];
            m.copy_from_slice(c);
            m
        })
        .collect())
}

/// Reads an index accessor. Only unsigned 8/16/32-bit scalars are accepted.
pub fn read_indices(accessor: &AccessorData) -> Result<Vec<u32>, GltfError> {
    if accessor.component_count != 1 {
        return Err(GltfError::AccessorError(format!(
            "index accessor must be scalar, found {:?}",
            accessor.element_type
        )));
    }
    let bytes = &accessor.data;
    match accessor.component_type {
        ComponentType::UnsignedByte => Ok(bytes.iter().map(|&b| b as u32).collect()),
        ComponentType::UnsignedShort => Ok(bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
            .collect()),
        ComponentType::UnsignedInt => Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()),
        other => Err(GltfError::UnsupportedComponentType(format!(
            "{other:?} is not a valid index type"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::data::{GltfAccessor, GltfBuffer, GltfBufferView};
    use rstest::rstest;

    fn data_with(bytes: &[u8], view: GltfBufferView, accessor: GltfAccessor) -> (GltfData, Vec<Arc<[u8]>>) {
        let mut data = GltfData::new("test.gltf");
        data.buffers.push(GltfBuffer {
            uri: None,
            byte_length: bytes.len(),
            data: Some(Arc::from(bytes)),
        });
        data.buffer_views.push(view);
        data.accessors.push(accessor);
        let buffers = vec![Arc::from(bytes)];
        (data, buffers)
    }

    #[rstest]
    #[case(127, 1.0)]
    #[case(-127, -1.0)]
    #[case(-128, -1.0)]
    #[case(0, 0.0)]
    fn signed_byte_normalization(#[case] value: i8, #[case] expected: f32) {
        assert_eq!(normalize_i8(value), expected);
    }

    #[rstest]
    #[case(255, 1.0)]
    #[case(0, 0.0)]
    fn unsigned_byte_normalization(#[case] value: u8, #[case] expected: f32) {
        assert_eq!(normalize_u8(value), expected);
    }

    #[test]
    fn signed_short_normalization_clamps_and_scales() {
        assert_eq!(normalize_i16(-32768, None), -1.0);
        assert_eq!(normalize_i16(32767, None), 1.0);
        assert_eq!(normalize_i16(100, Some(200.0)), 0.5);
        assert_eq!(normalize_u16(65535), 1.0);
    }

    #[test]
    fn strided_elements_are_packed() {
        // Two u16 scalars with a stride of 4 bytes.
        let bytes = [1u8, 0, 0xAA, 0xAA, 2, 0, 0xBB, 0xBB];
        let (data, buffers) = data_with(
            &bytes,
            GltfBufferView {
                buffer: 0,
                byte_offset: 0,
                byte_length: 8,
                byte_stride: Some(4),
            },
            GltfAccessor {
                buffer_view: Some(0),
                component_type: ComponentType::UnsignedShort,
                element_type: ElementType::Scalar,
                count: 2,
                ..Default::default()
            },
        );
        let loaded = load_accessor_data(&data, &buffers, 0);
        assert!(loaded.success, "{}", loaded.error);
        assert_eq!(loaded.data, vec![1, 0, 2, 0]);
        assert_eq!(read_indices(&loaded).unwrap(), vec![1, 2]);
    }

    #[test]
    fn out_of_bounds_accessor_fails() {
        let bytes = [0u8; 8];
        let (data, buffers) = data_with(
            &bytes,
            GltfBufferView {
                buffer: 0,
                byte_offset: 0,
                byte_length: 8,
                byte_stride: None,
            },
            GltfAccessor {
                buffer_view: Some(0),
                component_type: ComponentType::Float,
                element_type: ElementType::Vec3,
                count: 1,
                ..Default::default()
            },
        );
        let loaded = load_accessor_data(&data, &buffers, 0);
        assert!(!loaded.success);
        assert!(loaded.data.is_empty());
    }

    #[test]
    fn signed_index_type_is_rejected() {
        let bytes = [1u8, 0];
        let (data, buffers) = data_with(
            &bytes,
            GltfBufferView {
                buffer: 0,
                byte_offset: 0,
                byte_length: 2,
                byte_stride: None,
            },
            GltfAccessor {
                buffer_view: Some(0),
                component_type: ComponentType::Short,
                element_type: ElementType::Scalar,
                count: 1,
                ..Default::default()
            },
        );
        let loaded = load_accessor_data(&data, &buffers, 0);
        assert!(read_indices(&loaded).is_err());
    }

    #[test]
    fn normalized_int_is_unsupported() {
        let loaded = AccessorData {
            success: true,
            error: String::new(),
            component_type: ComponentType::Int,
            element_type: ElementType::Scalar,
            component_count: 1,
            element_size: 4,
            element_count: 1,
            normalized: true,
            data: vec![0; 4],
            min: Vec::new(),
            max: Vec::new(),
        };
        assert!(matches!(
            read_f32(&loaded),
            Err(GltfError::UnsupportedComponentType(_))
        ));
    }

    #[rstest]
    #[case(1 << 62)]
    #[case(usize::MAX)]
    fn huge_element_count_fails_without_panicking(#[case] count: usize) {
        let bytes = [0u8; 36];
        let (data, buffers) = data_with(
            &bytes,
            GltfBufferView {
                buffer: 0,
                byte_offset: 0,
                byte_length: 36,
                byte_stride: None,
            },
            GltfAccessor {
                buffer_view: Some(0),
                component_type: ComponentType::Float,
                element_type: ElementType::Vec3,
                count,
                ..Default::default()
            },
        );
        let loaded = load_accessor_data(&data, &buffers, 0);
        assert!(!loaded.success);
        assert!(loaded.data.is_empty());
    }

    #[test]
    fn huge_offsets_fail_without_panicking() {
        let bytes = [0u8; 12];
        let (mut data, buffers) = data_with(
            &bytes,
            GltfBufferView {
                buffer: 0,
                byte_offset: usize::MAX - 4,
                byte_length: usize::MAX,
                byte_stride: None,
            },
            GltfAccessor {
                buffer_view: Some(0),
                component_type: ComponentType::Float,
                element_type: ElementType::Vec3,
                count: 1,
                ..Default::default()
            },
        );
        assert!(!load_accessor_data(&data, &buffers, 0).success);

        data.accessors[0].byte_offset = usize::MAX;
        assert!(!load_accessor_data(&data, &buffers, 0).success);
    }

    #[test]
    fn missing_view_with_huge_count_is_rejected() {
        let mut data = GltfData::new("test.gltf");
        data.accessors.push(GltfAccessor {
            component_type: ComponentType::Float,
            element_type: ElementType::Vec4,
            count: 1 << 62,
            ..Default::default()
        });
        let loaded = load_accessor_data(&data, &[], 0);
        assert!(!loaded.success);
        assert!(loaded.error.contains("zero-fill limit"));
        assert!(loaded.data.is_empty());
    }

    #[test]
    fn missing_view_reads_as_zeros() {
        let mut data = GltfData::new("test.gltf");
        data.accessors.push(GltfAccessor {
            component_type: ComponentType::Float,
            element_type: ElementType::Vec2,
            count: 3,
            ..Default::default()
        });
        let loaded = load_accessor_data(&data, &[], 0);
        assert!(loaded.success);
        assert_eq!(read_f32(&loaded).unwrap(), vec![0.0; 6]);
    }
}
