use bitflags::bitflags;
use lumen_graphics::RenderHandleReference;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PlanarReflectionFlags: u32 {
        /// Render the reflection every frame.
        const ACTIVE_RENDER = 1 << 0;
    }
}

impl Default for PlanarReflectionFlags {
    fn default() -> Self {
        Self::ACTIVE_RENDER
    }
}

/// Mirror plane rendered through a reflected main camera. The plane normal
/// is the node's local Y axis.
///
/// The render system owns the target fields: it (re)creates the color and
/// depth images whenever the required resolution changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarReflectionComponent {
    /// Target size relative to the main camera resolution.
    pub screen_percentage: f32,
    /// Moves the reflection plane along its normal.
    pub clip_offset: f32,
    pub flags: PlanarReflectionFlags,
    pub layer_mask: u64,
    pub color_render_target: RenderHandleReference,
    pub depth_render_target: RenderHandleReference,
    pub render_target_resolution: [u32; 2],
    pub mip_count: u32,
}

impl Default for PlanarReflectionComponent {
    fn default() -> Self {
        Self {
            screen_percentage: 0.5,
            clip_offset: 0.0,
            flags: PlanarReflectionFlags::default(),
            layer_mask: super::LAYER_ALL,
            color_render_target: RenderHandleReference::default(),
            depth_render_target: RenderHandleReference::default(),
            render_target_resolution: [0, 0],
            mip_count: 0,
        }
    }
}
