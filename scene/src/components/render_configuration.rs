use lumen_ecs::Entity;
use lumen_graphics::render_data::{ShadowQuality, ShadowSmoothness, ShadowType, ShadowTypes};

/// Scene-wide render settings. The first enabled instance configures the
/// frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfigurationComponent {
    /// Default environment for cameras without their own.
    pub environment: Option<Entity>,
    /// Default fog for cameras without their own.
    pub fog: Option<Entity>,
    pub shadow_type: ShadowType,
    pub shadow_quality: ShadowQuality,
    pub shadow_smoothness: ShadowSmoothness,
    /// Create and order render node graphs automatically.
    pub create_render_node_graphs: bool,
}

impl Default for RenderConfigurationComponent {
    fn default() -> Self {
        Self {
            environment: None,
            fog: None,
            shadow_type: ShadowType::default(),
            shadow_quality: ShadowQuality::default(),
            shadow_smoothness: ShadowSmoothness::default(),
            create_render_node_graphs: true,
        }
    }
}

impl RenderConfigurationComponent {
    pub fn shadow_types(&self) -> ShadowTypes {
        ShadowTypes {
            shadow_type: self.shadow_type,
            shadow_quality: self.shadow_quality,
            shadow_smoothness: self.shadow_smoothness,
        }
    }
}
