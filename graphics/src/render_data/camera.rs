//! Per-frame camera snapshot.

use bitflags::bitflags;
use lumen_core::math::{Mat4, Vec3, Vec4};

use crate::handle::RenderHandleReference;

/// Maximum number of custom color targets per camera.
pub const MAX_CAMERA_COLOR_TARGETS: usize = 8;

bitflags! {
    /// Per-frame camera flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderCameraFlags: u32 {
        /// Clear depth before rendering.
        const CLEAR_DEPTH = 1 << 0;
        /// Clear color before rendering.
        const CLEAR_COLOR = 1 << 1;
        /// The scene's main camera.
        const MAIN = 1 << 2;
        /// Renders a shadow map.
        const SHADOW = 1 << 3;
        /// Renders a planar reflection.
        const REFLECTION = 1 << 4;
        /// Derived color pre-pass camera.
        const COLOR_PRE_PASS = 1 << 5;
        /// Multisampled rendering.
        const MSAA = 1 << 6;
        /// Keeps history for temporal effects.
        const HISTORY = 1 << 7;
        /// Applies sub-pixel jitter.
        const JITTER = 1 << 8;
        /// Flip triangle winding for everything drawn by this camera.
        const INVERSE_WINDING = 1 << 9;
        /// Renders opaque geometry only.
        const OPAQUE_ONLY = 1 << 10;
        /// A color pre-pass was requested for this camera.
        const REQUEST_COLOR_PRE_PASS = 1 << 11;
    }
}

/// Visibility culling applied by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraCullType {
    None,
    #[default]
    ViewFrustum,
}

/// Render pipeline a camera is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderPipelineType {
    Forward,
    #[default]
    LightForward,
    Deferred,
    Custom,
}

/// Where a camera renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraTargetType {
    /// Backend-provided default output.
    #[default]
    Default,
    /// Caller-provided color/depth images.
    Custom,
}

/// Current and previous frame matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_prev: Mat4,
    pub proj_prev: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            proj: Mat4::identity(),
            view_prev: Mat4::identity(),
            proj_prev: Mat4::identity(),
        }
    }
}

/// Environment lighting snapshot attached to a camera.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCameraEnvironment {
    /// Source entity id, `u64::MAX` when no environment is set.
    pub id: u64,
    pub background: EnvironmentBackground,
    pub indirect_diffuse_factor: Vec4,
    pub indirect_specular_factor: Vec4,
    pub env_map_factor: Vec4,
    pub radiance_cubemap: RenderHandleReference,
    pub radiance_cubemap_mip_count: u32,
    pub env_map: RenderHandleReference,
    pub env_map_lod_level: f32,
    /// Third-order spherical harmonics, one `xyz` triple per coefficient.
    pub shading_coefficients: [Vec4; 9],
    pub rotation: Mat4,
}

impl Default for RenderCameraEnvironment {
    fn default() -> Self {
        Self {
            id: u64::MAX,
            background: EnvironmentBackground::None,
            indirect_diffuse_factor: Vec4::repeat(1.0),
            indirect_specular_factor: Vec4::repeat(1.0),
            env_map_factor: Vec4::repeat(1.0),
            radiance_cubemap: RenderHandleReference::default(),
            radiance_cubemap_mip_count: 0,
            env_map: RenderHandleReference::default(),
            env_map_lod_level: 0.0,
            shading_coefficients: [Vec4::zeros(); 9],
            rotation: Mat4::identity(),
        }
    }
}

/// Environment background kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvironmentBackground {
    #[default]
    None,
    Image,
    Cubemap,
    Equirectangular,
}

/// Fog snapshot attached to a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCameraFog {
    /// Source entity id, `u64::MAX` when no fog is set.
    pub id: u64,
    /// `x` density, `y` height falloff, `z` start distance, `w` max opacity.
    pub first_layer: Vec4,
    pub second_layer: Vec4,
    pub base_factors: Vec4,
    pub inscattering_color: Vec4,
    pub env_map_factor: Vec4,
}

impl Default for RenderCameraFog {
    fn default() -> Self {
        Self {
            id: u64::MAX,
            first_layer: Vec4::zeros(),
            second_layer: Vec4::zeros(),
            base_factors: Vec4::zeros(),
            inscattering_color: Vec4::zeros(),
            env_map_factor: Vec4::zeros(),
        }
    }
}

/// One camera entry of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCamera {
    /// Unique within a frame. Entity id for authored cameras.
    pub id: u64,
    /// Id of the camera this one was derived from, `u64::MAX` if authored.
    pub main_camera_id: u64,
    pub name: String,
    pub layer_mask: u64,
    pub matrices: CameraMatrices,
    pub world_position: Vec3,
    /// `x, y, width, height` in normalized units.
    pub viewport: Vec4,
    pub scissor: Vec4,
    pub render_resolution: [u32; 2],
    pub z_near: f32,
    pub z_far: f32,
    pub clear_color: Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u32,
    pub flags: RenderCameraFlags,
    pub cull_type: CameraCullType,
    pub pipeline_type: RenderPipelineType,
    pub target_type: CameraTargetType,
    pub color_targets: Vec<RenderHandleReference>,
    pub depth_target: RenderHandleReference,
    /// Explicit graph replacing the automatically created one.
    pub custom_render_node_graph: RenderHandleReference,
    pub post_process_name: String,
    pub environment: RenderCameraEnvironment,
    pub fog: RenderCameraFog,
}

impl Default for RenderCamera {
    fn default() -> Self {
        Self {
            id: u64::MAX,
            main_camera_id: u64::MAX,
            name: String::new(),
            layer_mask: u64::MAX,
            matrices: CameraMatrices::default(),
            world_position: Vec3::zeros(),
            viewport: Vec4::new(0.0, 0.0, 1.0, 1.0),
            scissor: Vec4::new(0.0, 0.0, 1.0, 1.0),
            render_resolution: [1, 1],
            z_near: 0.1,
            z_far: 1000.0,
            clear_color: Vec4::zeros(),
            clear_depth: 1.0,
            clear_stencil: 0,
            flags: RenderCameraFlags::empty(),
            cull_type: CameraCullType::ViewFrustum,
            pipeline_type: RenderPipelineType::LightForward,
            target_type: CameraTargetType::Default,
            color_targets: Vec::new(),
            depth_target: RenderHandleReference::default(),
            custom_render_node_graph: RenderHandleReference::default(),
            post_process_name: String::new(),
            environment: RenderCameraEnvironment::default(),
            fog: RenderCameraFog::default(),
        }
    }
}

impl RenderCamera {
    /// Returns `true` for the scene's main camera.
    pub fn is_main(&self) -> bool {
        self.flags.contains(RenderCameraFlags::MAIN)
    }

    /// Returns `true` for shadow cameras.
    pub fn is_shadow(&self) -> bool {
        self.flags.contains(RenderCameraFlags::SHADOW)
    }
}
