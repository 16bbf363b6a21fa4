//! glTF 2.0 source data.
//!
//! [`parse_gltf`] turns `.gltf`/`.glb` bytes into an index-based
//! [`GltfData`] model. Buffer payloads are resolved separately with
//! [`resolve_buffers`] and individual accessors are copied out with
//! [`load_accessor_data`], so the expensive parts can run off the owning
//! thread.
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::gltf::{parse_gltf, resolve_buffers, load_accessor_data, read_f32};
//!
//! let bytes = std::fs::read("model.gltf")?;
//! let data = parse_gltf(&bytes, "model.gltf")?;
//! let buffers = resolve_buffers(&data)?;
//! let positions = load_accessor_data(&data, &buffers, 0).into_result()?;
//! let floats = read_f32(&positions)?;
//! ```

mod accessor;
mod data;
mod error;
mod parse;
mod resources;
#[cfg(test)]
mod tests;

pub use accessor::{
    AccessorData, load_accessor_data, normalize_i8, normalize_i16, normalize_u8, normalize_u16,
    read_f32, read_f32_scaled, read_indices, read_mat4,
};
pub use data::*;
pub use error::GltfError;
pub use parse::parse_gltf;
pub use resources::{
    DecodedImage, decode_image, load_image_bytes, parse_data_uri, resolve_buffers,
    resolve_relative_path,
};
