//! GPU-side manager contracts.
//!
//! The scene layer never talks to a device directly. It creates resources
//! through these traits and keeps the returned handles. Implementations must
//! be callable from the owning thread through a shared reference; their
//! internal synchronisation is their own business.

use crate::error::GraphicsError;
use crate::handle::{RenderHandle, RenderHandleReference};
use crate::render_node_graph::{RenderNodeGraphDesc, RenderNodeGraphUsage};
use crate::types::{GpuBufferDesc, GpuImageDesc, GpuSamplerDesc};

/// Creates and describes GPU images, buffers and samplers.
pub trait GpuResourceManager: Send + Sync {
    /// Creates an image without initial data.
    fn create_image(
        &self,
        name: &str,
        desc: &GpuImageDesc,
    ) -> Result<RenderHandleReference, GraphicsError>;

    /// Creates an image and uploads `data` into mip 0.
    fn create_image_with_data(
        &self,
        name: &str,
        desc: &GpuImageDesc,
        data: &[u8],
    ) -> Result<RenderHandleReference, GraphicsError>;

    /// Creates a buffer and uploads `data` into it.
    fn create_buffer(
        &self,
        name: &str,
        desc: &GpuBufferDesc,
        data: &[u8],
    ) -> Result<RenderHandleReference, GraphicsError>;

    fn create_sampler(
        &self,
        name: &str,
        desc: &GpuSamplerDesc,
    ) -> Result<RenderHandleReference, GraphicsError>;

    /// Descriptor of a live image.
    fn image_desc(&self, handle: RenderHandle) -> Option<GpuImageDesc>;

    /// Returns `true` if `handle` refers to a live resource.
    fn is_valid(&self, handle: RenderHandle) -> bool;

    /// Returns `true` if `handle` refers to a live image.
    fn is_gpu_image(&self, handle: RenderHandle) -> bool {
        self.image_desc(handle).is_some()
    }

    /// Named image registered by the backend, e.g. default fallbacks.
    fn image_by_name(&self, name: &str) -> Option<RenderHandleReference>;
}

/// Looks up shaders and graphics states by path.
pub trait ShaderManager: Send + Sync {
    fn shader(&self, path: &str) -> Option<RenderHandleReference>;
    fn graphics_state(&self, path: &str) -> Option<RenderHandleReference>;
}

/// Creates render node graphs.
pub trait RenderNodeGraphManager: Send + Sync {
    fn create(
        &self,
        usage: RenderNodeGraphUsage,
        desc: &RenderNodeGraphDesc,
        scene_name: &str,
    ) -> Result<RenderHandleReference, GraphicsError>;
}
