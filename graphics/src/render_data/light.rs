//! Per-frame light snapshot and shadow settings.

use bitflags::bitflags;
use lumen_core::math::Vec4;

bitflags! {
    /// Light kind and feature bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderLightFlags: u32 {
        const DIRECTIONAL = 1 << 0;
        const POINT = 1 << 1;
        const SPOT = 1 << 2;
        const SHADOW = 1 << 3;
    }
}

/// One light entry of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderLight {
    pub id: u64,
    pub layer_mask: u64,
    /// World position, `w = 1`.
    pub position: Vec4,
    /// World direction the light points at, `w = 0`.
    pub direction: Vec4,
    /// Linear color in `xyz`, intensity in `w`.
    pub color: Vec4,
    pub flags: RenderLightFlags,
    /// Inner cone angle in radians.
    pub spot_inner_angle: f32,
    /// Outer cone angle in radians.
    pub spot_outer_angle: f32,
    /// Attenuation range; never zero.
    pub range: f32,
    /// `x` strength, `y` depth bias, `z` normal bias, `w` unused.
    pub shadow_factors: Vec4,
    /// Index into the frame's camera list.
    pub shadow_camera_index: Option<u32>,
}

impl Default for RenderLight {
    fn default() -> Self {
        Self {
            id: u64::MAX,
            layer_mask: u64::MAX,
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            direction: Vec4::new(0.0, 0.0, -1.0, 0.0),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            flags: RenderLightFlags::empty(),
            spot_inner_angle: 0.0,
            spot_outer_angle: std::f32::consts::FRAC_PI_4,
            range: 0.0,
            shadow_factors: Vec4::zeros(),
            shadow_camera_index: None,
        }
    }
}

/// Shadow map filtering technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowType {
    #[default]
    Pcf,
    Vsm,
}

/// Shadow map resolution tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowQuality {
    Low,
    #[default]
    Normal,
    High,
    Ultra,
}

impl ShadowQuality {
    /// Square shadow-map edge length in pixels.
    pub fn resolution(&self) -> u32 {
        match self {
            Self::Low => 512,
            Self::Normal => 1024,
            Self::High => 2048,
            Self::Ultra => 4096,
        }
    }
}

/// Softness of shadow edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowSmoothness {
    Hard,
    #[default]
    Normal,
    Soft,
}

/// Shadow settings shared by all lights of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShadowTypes {
    pub shadow_type: ShadowType,
    pub shadow_quality: ShadowQuality,
    pub shadow_smoothness: ShadowSmoothness,
}
