//! Pixel and vertex attribute formats.

/// GPU data format.
///
/// Used both for image texels and for vertex attributes.
/// [`Format::Undefined`] marks "no valid format" rather than a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Undefined,

    // 8-bit components
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    R8G8Unorm,
    R8G8Snorm,
    R8G8Uint,
    R8G8Sint,
    R8G8B8Unorm,
    R8G8B8Snorm,
    R8G8B8Uint,
    R8G8B8Sint,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    R8G8B8A8Uint,
    R8G8B8A8Sint,
    R8G8B8A8Srgb,

    // 16-bit components
    R16Unorm,
    R16Snorm,
    R16Uint,
    R16Sint,
    R16G16Unorm,
    R16G16Snorm,
    R16G16Uint,
    R16G16Sint,
    R16G16B16Unorm,
    R16G16B16Snorm,
    R16G16B16Uint,
    R16G16B16Sint,
    R16G16B16A16Unorm,
    R16G16B16A16Snorm,
    R16G16B16A16Uint,
    R16G16B16A16Sint,
    R16G16B16A16Sfloat,

    // 32-bit components
    R32Uint,
    R32Sint,
    R32Sfloat,
    R32G32Uint,
    R32G32Sint,
    R32G32Sfloat,
    R32G32B32Uint,
    R32G32B32Sint,
    R32G32B32Sfloat,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    R32G32B32A32Sfloat,

    // Packed
    B10G11R11Ufloat,

    // Depth
    D16Unorm,
    D24UnormS8Uint,
    D32Sfloat,
}

impl Format {
    /// Returns true if this is a depth or depth/stencil format.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::D16Unorm | Self::D24UnormS8Uint | Self::D32Sfloat)
    }

    /// Size in bytes of one texel or vertex element. `0` for [`Format::Undefined`].
    pub fn byte_size(&self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::R8Unorm | Self::R8Snorm | Self::R8Uint | Self::R8Sint => 1,
            Self::R8G8Unorm
            | Self::R8G8Snorm
            | Self::R8G8Uint
            | Self::R8G8Sint
            | Self::R16Unorm
            | Self::R16Snorm
            | Self::R16Uint
            | Self::R16Sint
            | Self::D16Unorm => 2,
            Self::R8G8B8Unorm | Self::R8G8B8Snorm | Self::R8G8B8Uint | Self::R8G8B8Sint => 3,
            Self::R8G8B8A8Unorm
            | Self::R8G8B8A8Snorm
            | Self::R8G8B8A8Uint
            | Self::R8G8B8A8Sint
            | Self::R8G8B8A8Srgb
            | Self::R16G16Unorm
            | Self::R16G16Snorm
            | Self::R16G16Uint
            | Self::R16G16Sint
            | Self::R32Uint
            | Self::R32Sint
            | Self::R32Sfloat
            | Self::B10G11R11Ufloat
            | Self::D24UnormS8Uint
            | Self::D32Sfloat => 4,
            Self::R16G16B16Unorm
            | Self::R16G16B16Snorm
            | Self::R16G16B16Uint
            | Self::R16G16B16Sint => 6,
            Self::R16G16B16A16Unorm
            | Self::R16G16B16A16Snorm
            | Self::R16G16B16A16Uint
            | Self::R16G16B16A16Sint
            | Self::R16G16B16A16Sfloat
            | Self::R32G32Uint
            | Self::R32G32Sint
            | Self::R32G32Sfloat => 8,
            Self::R32G32B32Uint | Self::R32G32B32Sint | Self::R32G32B32Sfloat => 12,
            Self::R32G32B32A32Uint | Self::R32G32B32A32Sint | Self::R32G32B32A32Sfloat => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(Format::Undefined.byte_size(), 0);
        assert_eq!(Format::R16G16B16Snorm.byte_size(), 6);
        assert_eq!(Format::R32G32B32Sfloat.byte_size(), 12);
        assert!(Format::D32Sfloat.is_depth());
        assert!(!Format::R8G8B8A8Srgb.is_depth());
    }
}
