//! Buffer types and descriptors.

use bitflags::bitflags;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be used as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be used as a storage buffer.
        const STORAGE = 1 << 3;
        /// Buffer can be used as an indirect buffer.
        const INDIRECT = 1 << 4;
        /// Buffer can be copied to.
        const TRANSFER_DST = 1 << 5;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a GPU buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GpuBufferDesc {
    /// Size in bytes.
    pub byte_size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl GpuBufferDesc {
    /// Create a new buffer descriptor.
    pub fn new(byte_size: u64, usage: BufferUsage) -> Self {
        Self { byte_size, usage }
    }
}

/// Width of the indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    Uint16,
    #[default]
    Uint32,
}

impl IndexType {
    /// Size in bytes of one index.
    pub fn byte_size(&self) -> u32 {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}
