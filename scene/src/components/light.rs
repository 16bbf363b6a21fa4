use lumen_core::math::Vec3;

/// Punctual light type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    #[default]
    Directional,
    Point,
    Spot,
}

/// A punctual light. Position and direction come from the node's world
/// matrix; lights shine along their local -Z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    pub light_type: LightType,
    pub color: Vec3,
    pub intensity: f32,
    /// Attenuation range. Values near zero derive a range from intensity.
    pub range: f32,
    /// Inner cone angle in radians.
    pub spot_inner_angle: f32,
    /// Outer cone angle in radians.
    pub spot_outer_angle: f32,
    pub shadow_enabled: bool,
    pub shadow_strength: f32,
    pub shadow_depth_bias: f32,
    pub shadow_normal_bias: f32,
    /// Near plane of the spot light shadow camera.
    pub near_plane: f32,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            range: 0.0,
            spot_inner_angle: 0.0,
            spot_outer_angle: std::f32::consts::FRAC_PI_4,
            shadow_enabled: false,
            shadow_strength: 1.0,
            shadow_depth_bias: 0.005,
            shadow_normal_bias: 0.025,
            near_plane: 0.5,
        }
    }
}

impl LightComponent {
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            color,
            intensity,
            ..Default::default()
        }
    }

    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            color,
            intensity,
            range,
            ..Default::default()
        }
    }

    pub fn spot(color: Vec3, intensity: f32, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            light_type: LightType::Spot,
            color,
            intensity,
            spot_inner_angle: inner_angle,
            spot_outer_angle: outer_angle,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_shadows(mut self) -> Self {
        self.shadow_enabled = true;
        self
    }
}
