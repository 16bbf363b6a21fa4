//! Dummy GPU backend for testing and development.
//!
//! These managers hand out valid handles without touching a GPU and record
//! every creation call, so tests can assert how often resources and graphs
//! were (re)created.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::handle::{RenderHandle, RenderHandleReference, RenderHandleType};
use crate::managers::{GpuResourceManager, RenderNodeGraphManager, ShaderManager};
use crate::render_node_graph::{RenderNodeGraphDesc, RenderNodeGraphUsage};
use crate::types::{GpuBufferDesc, GpuImageDesc, GpuSamplerDesc};

/// A creation call seen by [`DummyGpuResourceManager`].
#[derive(Debug, Clone, PartialEq)]
pub enum DummyCreation {
    Image { name: String, desc: GpuImageDesc },
    Buffer { name: String, desc: GpuBufferDesc },
    Sampler { name: String, desc: GpuSamplerDesc },
}

impl DummyCreation {
    /// Name passed to the creation call.
    pub fn name(&self) -> &str {
        match self {
            Self::Image { name, .. } | Self::Buffer { name, .. } | Self::Sampler { name, .. } => {
                name
            }
        }
    }
}

#[derive(Default)]
struct DummyGpuState {
    next_index: u64,
    images: HashMap<RenderHandle, GpuImageDesc>,
    buffers: HashMap<RenderHandle, GpuBufferDesc>,
    samplers: HashMap<RenderHandle, GpuSamplerDesc>,
    named_images: HashMap<String, RenderHandleReference>,
    creations: Vec<DummyCreation>,
}

impl DummyGpuState {
    fn allocate(&mut self, handle_type: RenderHandleType) -> RenderHandle {
        let handle = RenderHandle::new(handle_type, self.next_index);
        self.next_index += 1;
        handle
    }
}

/// Dummy [`GpuResourceManager`].
#[derive(Default)]
pub struct DummyGpuResourceManager {
    state: Mutex<DummyGpuState>,
}

impl DummyGpuResourceManager {
    /// Create a new dummy resource manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    /// Registers a named image, as a backend would for its default images.
    pub fn register_named_image(&self, name: &str, desc: GpuImageDesc) -> RenderHandleReference {
        let mut state = self.state.lock();
        let handle = state.allocate(RenderHandleType::GpuImage);
        state.images.insert(handle, desc);
        let reference = RenderHandleReference::new(handle);
        state.named_images.insert(name.to_string(), reference.clone());
        reference
    }

    /// All creation calls so far, in call order.
    pub fn creations(&self) -> Vec<DummyCreation> {
        self.state.lock().creations.clone()
    }

    /// Number of images created with exactly `name`.
    pub fn image_creation_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .creations
            .iter()
            .filter(|c| matches!(c, DummyCreation::Image { name: n, .. } if n == name))
            .count()
    }
}

impl GpuResourceManager for DummyGpuResourceManager {
    fn create_image(
        &self,
        name: &str,
        desc: &GpuImageDesc,
    ) -> Result<RenderHandleReference, GraphicsError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "image `{name}` has zero size"
            )));
        }
        log::trace!(
            "DummyBackend: creating image {name} ({}x{}, {} mips, {:?})",
            desc.width,
            desc.height,
            desc.mip_count,
            desc.format
        );
        let mut state = self.state.lock();
        let handle = state.allocate(RenderHandleType::GpuImage);
        state.images.insert(handle, desc.clone());
        state.creations.push(DummyCreation::Image {
            name: name.to_string(),
            desc: desc.clone(),
        });
        Ok(RenderHandleReference::new(handle))
    }

    fn create_image_with_data(
        &self,
        name: &str,
        desc: &GpuImageDesc,
        data: &[u8],
    ) -> Result<RenderHandleReference, GraphicsError> {
        let expected = desc.base_level_size();
        if (data.len() as u64) < expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "image `{name}` data is {} bytes, expected {expected}",
                data.len()
            )));
        }
        self.create_image(name, desc)
    }

    fn create_buffer(
        &self,
        name: &str,
        desc: &GpuBufferDesc,
        data: &[u8],
    ) -> Result<RenderHandleReference, GraphicsError> {
        if (data.len() as u64) > desc.byte_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer `{name}` data exceeds its size"
            )));
        }
        log::trace!("DummyBackend: creating buffer {name} (size: {})", desc.byte_size);
        let mut state = self.state.lock();
        let handle = state.allocate(RenderHandleType::GpuBuffer);
        state.buffers.insert(handle, desc.clone());
        state.creations.push(DummyCreation::Buffer {
            name: name.to_string(),
            desc: desc.clone(),
        });
        Ok(RenderHandleReference::new(handle))
    }

    fn create_sampler(
        &self,
        name: &str,
        desc: &GpuSamplerDesc,
    ) -> Result<RenderHandleReference, GraphicsError> {
        log::trace!("DummyBackend: creating sampler {name}");
        let mut state = self.state.lock();
        let handle = state.allocate(RenderHandleType::GpuSampler);
        state.samplers.insert(handle, *desc);
        state.creations.push(DummyCreation::Sampler {
            name: name.to_string(),
            desc: *desc,
        });
        Ok(RenderHandleReference::new(handle))
    }

    fn image_desc(&self, handle: RenderHandle) -> Option<GpuImageDesc> {
        self.state.lock().images.get(&handle).cloned()
    }

    fn is_valid(&self, handle: RenderHandle) -> bool {
        let state = self.state.lock();
        state.images.contains_key(&handle)
            || state.buffers.contains_key(&handle)
            || state.samplers.contains_key(&handle)
    }

    fn image_by_name(&self, name: &str) -> Option<RenderHandleReference> {
        self.state.lock().named_images.get(name).cloned()
    }
}

#[derive(Default)]
struct DummyShaderState {
    next_index: u64,
    shaders: HashMap<String, RenderHandleReference>,
    graphics_states: HashMap<String, RenderHandleReference>,
}

/// Dummy [`ShaderManager`]: every path resolves to a stable handle.
#[derive(Default)]
pub struct DummyShaderManager {
    state: Mutex<DummyShaderState>,
}

impl DummyShaderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths resolved as shaders so far.
    pub fn shader_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().shaders.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl ShaderManager for DummyShaderManager {
    fn shader(&self, path: &str) -> Option<RenderHandleReference> {
        if path.is_empty() {
            return None;
        }
        let mut state = self.state.lock();
        if let Some(handle) = state.shaders.get(path) {
            return Some(handle.clone());
        }
        let handle =
            RenderHandleReference::new(RenderHandle::new(RenderHandleType::Shader, state.next_index));
        state.next_index += 1;
        state.shaders.insert(path.to_string(), handle.clone());
        Some(handle)
    }

    fn graphics_state(&self, path: &str) -> Option<RenderHandleReference> {
        if path.is_empty() {
            return None;
        }
        let mut state = self.state.lock();
        if let Some(handle) = state.graphics_states.get(path) {
            return Some(handle.clone());
        }
        let handle = RenderHandleReference::new(RenderHandle::new(
            RenderHandleType::GraphicsState,
            state.next_index,
        ));
        state.next_index += 1;
        state.graphics_states.insert(path.to_string(), handle.clone());
        Some(handle)
    }
}

/// Dummy [`RenderNodeGraphManager`] recording every created description.
#[derive(Default)]
pub struct DummyRenderNodeGraphManager {
    created: Mutex<Vec<RenderNodeGraphDesc>>,
}

impl DummyRenderNodeGraphManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptions of all graphs created so far, in call order.
    pub fn created(&self) -> Vec<RenderNodeGraphDesc> {
        self.created.lock().clone()
    }

    /// Number of graphs created so far.
    pub fn creation_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl RenderNodeGraphManager for DummyRenderNodeGraphManager {
    fn create(
        &self,
        usage: RenderNodeGraphUsage,
        desc: &RenderNodeGraphDesc,
        scene_name: &str,
    ) -> Result<RenderHandleReference, GraphicsError> {
        let mut created = self.created.lock();
        log::trace!(
            "DummyBackend: creating {usage:?} render node graph {} for scene {scene_name}",
            desc.name
        );
        let handle = RenderHandle::new(RenderHandleType::RenderNodeGraph, created.len() as u64);
        created.push(desc.clone());
        Ok(RenderHandleReference::new(handle))
    }
}

static_assertions::assert_impl_all!(DummyGpuResourceManager: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Format;

    #[test]
    fn images_are_described_and_counted() {
        let gpu = DummyGpuResourceManager::new();
        let image = gpu
            .create_image("color", &GpuImageDesc::new_2d(4, 2, Format::R8G8B8A8Unorm))
            .unwrap();
        assert!(gpu.is_gpu_image(image.handle()));
        assert_eq!(gpu.image_desc(image.handle()).unwrap().width, 4);
        assert_eq!(gpu.image_creation_count("color"), 1);
    }

    #[test]
    fn zero_sized_image_fails() {
        let gpu = DummyGpuResourceManager::new();
        assert!(
            gpu.create_image("bad", &GpuImageDesc::new_2d(0, 4, Format::R8Unorm))
                .is_err()
        );
    }

    #[test]
    fn shader_paths_resolve_to_stable_handles() {
        let shaders = DummyShaderManager::new();
        let a = shaders.shader("shaders://core3d_dm_fw.shader").unwrap();
        let b = shaders.shader("shaders://core3d_dm_fw.shader").unwrap();
        assert_eq!(a, b);
        assert!(shaders.shader("").is_none());
    }
}
