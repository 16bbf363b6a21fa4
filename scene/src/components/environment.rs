use lumen_core::math::{Quat, Vec3, Vec4};
use lumen_ecs::Entity;
use lumen_graphics::render_data::EnvironmentBackground;

/// Image based lighting and background of a scene or camera.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentComponent {
    pub background: EnvironmentBackground,
    pub indirect_diffuse_factor: Vec4,
    pub indirect_specular_factor: Vec4,
    pub env_map_factor: Vec4,
    /// Entity carrying the radiance cubemap handle.
    pub radiance_cubemap: Option<Entity>,
    /// Mip levels of the radiance cubemap. `0` reads it from the image.
    pub radiance_cubemap_mip_count: u32,
    /// Entity carrying the background image handle.
    pub env_map: Option<Entity>,
    pub env_map_lod_level: f32,
    /// Spherical harmonics irradiance coefficients.
    pub irradiance_coefficients: [Vec3; 9],
    pub rotation: Quat,
    /// Entity carrying a render node graph handle that replaces the
    /// default scene graph.
    pub custom_render_node_graph: Option<Entity>,
}

impl Default for EnvironmentComponent {
    fn default() -> Self {
        Self {
            background: EnvironmentBackground::None,
            indirect_diffuse_factor: Vec4::repeat(1.0),
            indirect_specular_factor: Vec4::repeat(1.0),
            env_map_factor: Vec4::repeat(1.0),
            radiance_cubemap: None,
            radiance_cubemap_mip_count: 0,
            env_map: None,
            env_map_lod_level: 0.0,
            irradiance_coefficients: [Vec3::zeros(); 9],
            rotation: Quat::identity(),
            custom_render_node_graph: None,
        }
    }
}

/// Two-layer height fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogComponent {
    pub density: f32,
    pub height_falloff: f32,
    pub start_distance: f32,
    pub max_opacity: f32,
    pub second_density: f32,
    pub second_height_falloff: f32,
    pub height_offset: f32,
    pub inscattering_color: Vec4,
    pub env_map_factor: Vec4,
    pub base_factors: Vec4,
}

impl Default for FogComponent {
    fn default() -> Self {
        Self {
            density: 0.02,
            height_falloff: 0.1,
            start_distance: 1.0,
            max_opacity: 1.0,
            second_density: 0.0,
            second_height_falloff: 0.0,
            height_offset: 0.0,
            inscattering_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            env_map_factor: Vec4::zeros(),
            base_factors: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}
