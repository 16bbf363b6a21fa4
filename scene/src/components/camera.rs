//! Camera component.
//!
//! - [`CameraComponent`]: projection, viewport, targets and per-camera
//!   environment/fog/post-process references
//! - [`CameraProjection`]: perspective, orthographic or a custom matrix

use bitflags::bitflags;
use lumen_core::math::{Mat4, Vec4, flip_y, orthographic_rh, perspective_rh};
use lumen_ecs::Entity;
use lumen_graphics::RenderHandleReference;
use lumen_graphics::render_data::{CameraCullType, RenderPipelineType};

/// Projection mode for cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraProjection {
    Perspective {
        /// Vertical field of view in radians.
        y_fov: f32,
        /// Width over height. `0.0` derives it from the render resolution.
        aspect: f32,
    },
    Orthographic {
        /// Half-width of the view volume.
        x_mag: f32,
        /// Half-height of the view volume.
        y_mag: f32,
    },
    /// Used verbatim; no Y flip is applied.
    Custom(Mat4),
}

impl Default for CameraProjection {
    fn default() -> Self {
        Self::Perspective {
            y_fov: 60.0f32.to_radians(),
            aspect: 0.0,
        }
    }
}

impl CameraProjection {
    /// Projection matrix in the backend's clip convention: right-handed,
    /// depth in `[0, 1]`, Y pointing down.
    pub fn matrix(&self, render_resolution: [u32; 2], z_near: f32, z_far: f32) -> Mat4 {
        match *self {
            Self::Perspective { y_fov, aspect } => {
                let aspect = if aspect > 0.0 {
                    aspect
                } else if render_resolution[1] > 0 {
                    render_resolution[0] as f32 / render_resolution[1] as f32
                } else {
                    1.0
                };
                flip_y(&perspective_rh(y_fov, aspect, z_near, z_far))
            }
            Self::Orthographic { x_mag, y_mag } => {
                flip_y(&orthographic_rh(-x_mag, x_mag, -y_mag, y_mag, z_near, z_far))
            }
            Self::Custom(matrix) => matrix,
        }
    }
}

bitflags! {
    /// How the render system treats a camera.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CameraSceneFlags: u32 {
        /// The scene's main camera. The first camera with this flag wins.
        const MAIN_CAMERA = 1 << 0;
        /// Rendered every frame even when not the main camera.
        const ACTIVE_RENDER = 1 << 1;
    }
}

bitflags! {
    /// Per-camera pipeline features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CameraPipelineFlags: u32 {
        const CLEAR_DEPTH = 1 << 0;
        const CLEAR_COLOR = 1 << 1;
        const MSAA = 1 << 2;
        /// Keep a history target for temporal effects.
        const HISTORY = 1 << 3;
        const JITTER = 1 << 4;
        /// Render an extra color pre-pass before the main pass.
        const COLOR_PRE_PASS = 1 << 5;
    }
}

impl Default for CameraPipelineFlags {
    fn default() -> Self {
        Self::CLEAR_DEPTH | Self::CLEAR_COLOR
    }
}

/// A viewpoint the render system turns into a render camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    pub projection: CameraProjection,
    pub z_near: f32,
    pub z_far: f32,
    pub culling: CameraCullType,
    pub pipeline: RenderPipelineType,
    pub scene_flags: CameraSceneFlags,
    pub pipeline_flags: CameraPipelineFlags,
    /// Normalized viewport (x, y, width, height).
    pub viewport: Vec4,
    /// Normalized scissor (x, y, width, height).
    pub scissor: Vec4,
    pub render_resolution: [u32; 2],
    pub clear_color: Vec4,
    pub clear_depth: f32,
    pub layer_mask: u64,
    /// Entity carrying a post-process component for this camera.
    pub post_process: Option<Entity>,
    /// Overrides the scene environment when set.
    pub environment: Option<Entity>,
    /// Overrides the scene fog when set.
    pub fog: Option<Entity>,
    /// Camera whose settings drive the color pre-pass.
    pub pre_pass_camera: Option<Entity>,
    /// Custom color targets. Empty renders to the default target.
    pub color_targets: Vec<RenderHandleReference>,
    pub depth_target: RenderHandleReference,
    pub custom_render_node_graph: RenderHandleReference,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            projection: CameraProjection::default(),
            z_near: 0.3,
            z_far: 1000.0,
            culling: CameraCullType::ViewFrustum,
            pipeline: RenderPipelineType::LightForward,
            scene_flags: CameraSceneFlags::empty(),
            pipeline_flags: CameraPipelineFlags::default(),
            viewport: Vec4::new(0.0, 0.0, 1.0, 1.0),
            scissor: Vec4::new(0.0, 0.0, 1.0, 1.0),
            render_resolution: [0, 0],
            clear_color: Vec4::zeros(),
            clear_depth: 1.0,
            layer_mask: super::LAYER_ALL,
            post_process: None,
            environment: None,
            fog: None,
            pre_pass_camera: None,
            color_targets: Vec::new(),
            depth_target: RenderHandleReference::default(),
            custom_render_node_graph: RenderHandleReference::default(),
        }
    }
}

impl CameraComponent {
    /// Main camera rendering at `width` x `height`.
    pub fn main(width: u32, height: u32) -> Self {
        Self {
            scene_flags: CameraSceneFlags::MAIN_CAMERA | CameraSceneFlags::ACTIVE_RENDER,
            render_resolution: [width, height],
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_projection(mut self, projection: CameraProjection) -> Self {
        self.projection = projection;
        self
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: RenderPipelineType) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[must_use]
    pub fn with_pipeline_flags(mut self, flags: CameraPipelineFlags) -> Self {
        self.pipeline_flags = flags;
        self
    }

    #[must_use]
    pub fn with_post_process(mut self, entity: Entity) -> Self {
        self.post_process = Some(entity);
        self
    }

    /// Whether any custom color or depth target is assigned.
    pub fn has_custom_targets(&self) -> bool {
        !self.color_targets.is_empty() || self.depth_target.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_aspect_follows_resolution() {
        let projection = CameraProjection::Perspective {
            y_fov: 1.0,
            aspect: 0.0,
        };
        let wide = projection.matrix([200, 100], 0.1, 10.0);
        let square = projection.matrix([100, 100], 0.1, 10.0);
        assert!((wide[(0, 0)] * 2.0 - square[(0, 0)]).abs() < 1e-5);
        // Y is flipped for the backend convention.
        assert!(wide[(1, 1)] < 0.0);
    }

    #[test]
    fn custom_projection_is_verbatim() {
        let m = Mat4::new_scaling(2.0);
        assert_eq!(CameraProjection::Custom(m).matrix([1, 1], 0.1, 1.0), m);
    }
}
