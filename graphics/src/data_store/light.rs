use crate::render_data::{RenderLight, ShadowTypes};

use super::LightDataStore;

/// In-memory [`LightDataStore`].
#[derive(Debug, Default)]
pub struct DefaultLightDataStore {
    name: String,
    lights: Vec<RenderLight>,
    shadow_types: ShadowTypes,
}

impl DefaultLightDataStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl LightDataStore for DefaultLightDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) {
        self.lights.clear();
    }

    fn add_light(&mut self, light: RenderLight) -> u32 {
        self.lights.push(light);
        (self.lights.len() - 1) as u32
    }

    fn lights(&self) -> &[RenderLight] {
        &self.lights
    }

    fn set_shadow_types(&mut self, shadow_types: ShadowTypes) {
        self.shadow_types = shadow_types;
    }

    fn shadow_types(&self) -> ShadowTypes {
        self.shadow_types
    }

    fn shadow_quality_resolution(&self) -> [u32; 2] {
        let size = self.shadow_types.shadow_quality.resolution();
        [size, size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_data::ShadowQuality;
    use rstest::rstest;

    #[rstest]
    #[case(ShadowQuality::Low, 512)]
    #[case(ShadowQuality::Normal, 1024)]
    #[case(ShadowQuality::High, 2048)]
    #[case(ShadowQuality::Ultra, 4096)]
    fn shadow_resolution_follows_quality(#[case] quality: ShadowQuality, #[case] size: u32) {
        let mut store = DefaultLightDataStore::new("lights");
        store.set_shadow_types(ShadowTypes {
            shadow_quality: quality,
            ..Default::default()
        });
        assert_eq!(store.shadow_quality_resolution(), [size, size]);
    }

    #[test]
    fn clear_keeps_shadow_settings() {
        let mut store = DefaultLightDataStore::new("lights");
        store.set_shadow_types(ShadowTypes {
            shadow_quality: ShadowQuality::Ultra,
            ..Default::default()
        });
        store.add_light(RenderLight::default());
        store.clear();
        assert!(store.lights().is_empty());
        assert_eq!(store.shadow_types().shadow_quality, ShadowQuality::Ultra);
    }
}
