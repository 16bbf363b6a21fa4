//! Resource descriptors shared by the GPU manager contracts.

mod buffer;
mod format;
mod image;
mod sampler;

pub use buffer::{BufferUsage, GpuBufferDesc, IndexType};
pub use format::Format;
pub use image::{GpuImageDesc, ImageType, ImageUsage, full_mip_count};
pub use sampler::{AddressMode, Filter, GpuSamplerDesc};
