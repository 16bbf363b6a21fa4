//! Image types and descriptors.

use bitflags::bitflags;

use super::Format;

bitflags! {
    /// Usage flags for images.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        /// Image can be copied from.
        const TRANSFER_SRC = 1 << 0;
        /// Image can be copied to.
        const TRANSFER_DST = 1 << 1;
        /// Image can be sampled in a shader.
        const SAMPLED = 1 << 2;
        /// Image can be used as a storage image.
        const STORAGE = 1 << 3;
        /// Image can be used as a color attachment.
        const COLOR_ATTACHMENT = 1 << 4;
        /// Image can be used as a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
    }
}

impl Default for ImageUsage {
    fn default() -> Self {
        Self::SAMPLED | Self::TRANSFER_DST
    }
}

/// Image dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    #[default]
    Image2d,
    Cube,
}

/// Descriptor for creating a GPU image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GpuImageDesc {
    pub image_type: ImageType,
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    pub layer_count: u32,
    pub usage: ImageUsage,
}

impl Default for GpuImageDesc {
    fn default() -> Self {
        Self {
            image_type: ImageType::Image2d,
            format: Format::R8G8B8A8Srgb,
            width: 1,
            height: 1,
            mip_count: 1,
            layer_count: 1,
            usage: ImageUsage::default(),
        }
    }
}

impl GpuImageDesc {
    /// A sampled 2D image.
    pub fn new_2d(width: u32, height: u32, format: Format) -> Self {
        Self {
            format,
            width,
            height,
            ..Default::default()
        }
    }

    /// A sampled cube map with six layers.
    pub fn new_cube(size: u32, format: Format) -> Self {
        Self {
            image_type: ImageType::Cube,
            format,
            width: size,
            height: size,
            layer_count: 6,
            ..Default::default()
        }
    }

    /// Set the mip count.
    #[must_use]
    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    /// Set the usage flags.
    #[must_use]
    pub fn with_usage(mut self, usage: ImageUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Size in bytes of mip 0 across all layers.
    pub fn base_level_size(&self) -> u64 {
        self.width as u64
            * self.height as u64
            * self.layer_count as u64
            * self.format.byte_size() as u64
    }
}

/// Number of mip levels of a full chain for a `width` x `height` image.
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}
