//! # Lumen Graphics
//!
//! Contracts between the Lumen scene layer and a GPU backend.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderHandle`] / [`RenderHandleReference`] - opaque resource tokens
//! - [`managers`] - GPU resource, shader and render-node-graph manager traits
//! - [`render_data`] - plain per-frame records (cameras, lights, submeshes, materials)
//! - [`data_store`] - the render data stores those records are written into
//! - [`dummy`] - a recording backend for tests (feature `dummy`)
//!
//! ## Example
//!
//! ```
//! use lumen_graphics::data_store::RenderDataStoreManager;
//! use lumen_graphics::render_data::{RenderCamera, SceneRenderDataStoreNames};
//!
//! let names = SceneRenderDataStoreNames::default();
//! let mut manager = RenderDataStoreManager::with_default_stores(&names);
//! let stores = manager.resolve_mut(&names).unwrap();
//! let index = stores.camera.add_camera(RenderCamera::default());
//! assert_eq!(index, 0);
//! ```

pub mod data_store;
#[cfg(feature = "dummy")]
pub mod dummy;
pub mod error;
pub mod handle;
pub mod managers;
pub mod render_data;
pub mod render_node_graph;
pub mod types;

pub use error::GraphicsError;
pub use handle::{RenderHandle, RenderHandleReference, RenderHandleType};
pub use managers::{GpuResourceManager, RenderNodeGraphManager, ShaderManager};
pub use render_node_graph::{RenderNodeGraphDesc, RenderNodeGraphUsage};
pub use types::{
    AddressMode, BufferUsage, Filter, Format, GpuBufferDesc, GpuImageDesc, GpuSamplerDesc,
    ImageType, ImageUsage, IndexType,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
