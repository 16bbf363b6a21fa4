//! Buffer and image byte resolution.
//!
//! These functions do file IO and decoding, so the importer runs them on
//! worker threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;

use super::data::{GltfData, GltfImageSource};
use super::error::GltfError;

/// Decoded RGBA8 image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data, row-major.
    pub pixels: Vec<u8>,
}

/// Decode a `data:` URI. Returns `None` for anything else.
pub fn parse_data_uri(uri: &str) -> Option<Result<Vec<u8>, GltfError>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return Some(Err(GltfError::BufferError(format!(
            "data URI without base64 encoding: {header}"
        ))));
    }
    Some(
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| GltfError::BufferError(format!("invalid base64 payload: {e}"))),
    )
}

/// Resolve `uri` relative to the directory of `filepath`.
pub fn resolve_relative_path(filepath: &str, uri: &str) -> PathBuf {
    let base = Path::new(filepath).parent().unwrap_or_else(|| Path::new(""));
    base.join(percent_decode(uri))
}

fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let Ok(digits) = std::str::from_utf8(&bytes[i + 1..i + 3])
            && let Ok(hex) = u8::from_str_radix(digits, 16)
        {
            out.push(hex);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn load_uri(filepath: &str, uri: &str) -> Result<Vec<u8>, GltfError> {
    if let Some(decoded) = parse_data_uri(uri) {
        return decoded;
    }
    let path = resolve_relative_path(filepath, uri);
    std::fs::read(&path).map_err(|source| GltfError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Resolve every buffer of `data` into bytes.
///
/// Buffers that already carry data are shared, data URIs are decoded and
/// other URIs are read from disk relative to `data.filepath`.
pub fn resolve_buffers(data: &GltfData) -> Result<Vec<Arc<[u8]>>, GltfError> {
    data.buffers
        .iter()
        .enumerate()
        .map(|(index, buffer)| {
            if let Some(bytes) = &buffer.data {
                return Ok(Arc::clone(bytes));
            }
            let uri = buffer.uri.as_deref().ok_or_else(|| {
                GltfError::BufferError(format!(
                    "buffer {index} references the binary chunk but none is present"
                ))
            })?;
            let bytes = load_uri(&data.filepath, uri)?;
            if bytes.len() < buffer.byte_length {
                return Err(GltfError::BufferError(format!(
                    "buffer {index} is {} bytes, expected {}",
                    bytes.len(),
                    buffer.byte_length
                )));
            }
            Ok(Arc::from(bytes))
        })
        .collect()
}

/// Encoded bytes of image `index`.
pub fn load_image_bytes(
    data: &GltfData,
    buffers: &[Arc<[u8]>],
    index: usize,
) -> Result<Vec<u8>, GltfError> {
    let image = data
        .images
        .get(index)
        .ok_or_else(|| GltfError::ImageDecode(format!("image {index} does not exist")))?;
    match &image.source {
        GltfImageSource::Uri { uri, .. } => load_uri(&data.filepath, uri),
        GltfImageSource::BufferView { view, .. } => {
            let buffer_view = data.buffer_views.get(*view).ok_or_else(|| {
                GltfError::ImageDecode(format!("image {index} buffer view {view} does not exist"))
            })?;
            let buffer = buffers.get(buffer_view.buffer).ok_or_else(|| {
                GltfError::BufferError(format!("buffer {} is not loaded", buffer_view.buffer))
            })?;
            let start = buffer_view.byte_offset;
            let end = start + buffer_view.byte_length;
            buffer
                .get(start..end)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    GltfError::BufferError(format!("image {index} view exceeds its buffer"))
                })
        }
    }
}

/// Decode PNG/JPEG bytes into RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, GltfError> {
    let img = image::load_from_memory(bytes).map_err(|e| GltfError::ImageDecode(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::data::GltfBuffer;

    #[test]
    fn data_uri_decodes() {
        let uri = "data:application/octet-stream;base64,AQID";
        let data = parse_data_uri(uri).unwrap().unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn non_data_uri_is_none() {
        assert!(parse_data_uri("textures/albedo.png").is_none());
    }

    #[test]
    fn relative_paths_resolve_against_asset_directory() {
        let path = resolve_relative_path("assets/models/car.gltf", "car%20body.bin");
        assert_eq!(path, PathBuf::from("assets/models/car body.bin"));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut data = GltfData::new("mem.gltf");
        data.buffers.push(GltfBuffer {
            uri: Some("data:application/octet-stream;base64,AQID".into()),
            byte_length: 16,
            data: None,
        });
        assert!(resolve_buffers(&data).is_err());
    }

    #[test]
    fn png_decodes_to_rgba() {
        let mut encoded = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image(&encoded).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 3));
        assert_eq!(&decoded.pixels[0..4], &[10, 20, 30, 255]);
    }
}
