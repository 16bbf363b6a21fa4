use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

bitflags! {
    /// Enabled post-process effects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PostProcessEnableFlags: u32 {
        const TONEMAP = 1 << 0;
        const VIGNETTE = 1 << 1;
        const DITHER = 1 << 2;
        const COLOR_CONVERSION = 1 << 3;
        const COLOR_FRINGE = 1 << 4;
        const BLOOM = 1 << 5;
        const FXAA = 1 << 6;
        const TAA = 1 << 7;
    }
}

/// Settings blob copied verbatim into the POD data store.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PostProcessConfiguration {
    /// [`PostProcessEnableFlags`] bits.
    pub enable_flags: u32,
    pub tonemap_type: u32,
    pub exposure: f32,
    pub bloom_threshold_hard: f32,
    pub bloom_threshold_soft: f32,
    pub bloom_amount: f32,
    pub vignette_coefficient: f32,
    pub vignette_power: f32,
    pub color_fringe_coefficient: f32,
    pub dither_amount: f32,
    pub fxaa_sharpness: f32,
    pub taa_sharpness: f32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<PostProcessConfiguration>(), 48);

impl Default for PostProcessConfiguration {
    fn default() -> Self {
        Self {
            enable_flags: PostProcessEnableFlags::TONEMAP.bits(),
            tonemap_type: 0,
            exposure: 0.7,
            bloom_threshold_hard: 1.0,
            bloom_threshold_soft: 2.0,
            bloom_amount: 0.25,
            vignette_coefficient: 0.5,
            vignette_power: 0.4,
            color_fringe_coefficient: 1.0,
            dither_amount: 0.1,
            fxaa_sharpness: 1.0,
            taa_sharpness: 0.5,
        }
    }
}

impl PostProcessConfiguration {
    pub fn enable_flags(&self) -> PostProcessEnableFlags {
        PostProcessEnableFlags::from_bits_truncate(self.enable_flags)
    }
}

/// Post-process settings for the cameras referencing this entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostProcessComponent {
    pub configuration: PostProcessConfiguration,
}
