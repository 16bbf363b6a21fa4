//! Material component.
//!
//! Texture slots are indexed by [`MaterialTextureSlot`]. The base color
//! factor is stored premultiplied by its alpha.

use bitflags::bitflags;
use lumen_core::math::{Vec2, Vec4};
use lumen_ecs::Entity;
use lumen_graphics::render_data::{MAX_MATERIAL_TEXTURE_COUNT, MaterialTextureSlot, MaterialType};

/// UV transform of one texture slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub translation: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl TextureTransform {
    /// Exact comparison against identity. Any deviation, however small,
    /// selects the texture transform shader path.
    pub fn is_identity(&self) -> bool {
        self.translation.x == 0.0
            && self.translation.y == 0.0
            && self.rotation == 0.0
            && self.scale.x == 1.0
            && self.scale.y == 1.0
    }
}

/// One texture slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTexture {
    /// Entity carrying the image's render handle.
    pub image: Option<Entity>,
    /// Entity carrying the sampler's render handle.
    pub sampler: Option<Entity>,
    pub factor: Vec4,
    pub transform: TextureTransform,
    /// Texture coordinate set, 0 or 1.
    pub tex_coord: u32,
}

impl Default for MaterialTexture {
    fn default() -> Self {
        Self::with_factor(Vec4::new(1.0, 1.0, 1.0, 1.0))
    }
}

impl MaterialTexture {
    pub fn with_factor(factor: Vec4) -> Self {
        Self {
            image: None,
            sampler: None,
            factor,
            transform: TextureTransform::default(),
            tex_coord: 0,
        }
    }
}

/// Alpha handling of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialAlphaMode {
    #[default]
    Opaque,
    Mask,
    /// Drawn with the blend shader variant in the translucent queue.
    Blend,
}

bitflags! {
    /// Lighting interactions of a material.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialLightingFlags: u32 {
        const SHADOW_RECEIVER = 1 << 0;
        const SHADOW_CASTER = 1 << 1;
        const PUNCTUAL_LIGHT_RECEIVER = 1 << 2;
        const INDIRECT_LIGHT_RECEIVER = 1 << 3;
    }
}

impl Default for MaterialLightingFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Shader and graphics state overrides, each an entity carrying a render
/// handle. `None` uses the backend default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialShaderRef {
    pub shader: Option<Entity>,
    pub graphics_state: Option<Entity>,
}

/// Surface description used by every submesh referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialComponent {
    pub material_type: MaterialType,
    pub alpha_mode: MaterialAlphaMode,
    pub alpha_cutoff: f32,
    pub lighting_flags: MaterialLightingFlags,
    pub textures: [MaterialTexture; MAX_MATERIAL_TEXTURE_COUNT],
    /// Bit `i` is set when slot `i` has a non-identity transform.
    pub texture_transform_bits: u32,
    pub material_shader: MaterialShaderRef,
    pub depth_shader: MaterialShaderRef,
    pub render_sort_layer: u8,
    pub render_sort_layer_order: u8,
    pub custom_properties: Vec<u8>,
    /// Entities carrying extra render handles bound with the material.
    pub custom_resources: Vec<Entity>,
}

impl Default for MaterialComponent {
    fn default() -> Self {
        let mut textures: [MaterialTexture; MAX_MATERIAL_TEXTURE_COUNT] = Default::default();
        textures[MaterialTextureSlot::Emissive.index()].factor = Vec4::new(0.0, 0.0, 0.0, 1.0);
        textures[MaterialTextureSlot::Clearcoat.index()].factor = Vec4::zeros();
        textures[MaterialTextureSlot::ClearcoatRoughness.index()].factor = Vec4::zeros();
        textures[MaterialTextureSlot::Sheen.index()].factor = Vec4::zeros();
        textures[MaterialTextureSlot::Transmission.index()].factor = Vec4::zeros();
        Self {
            material_type: MaterialType::MetallicRoughness,
            alpha_mode: MaterialAlphaMode::Opaque,
            alpha_cutoff: 0.5,
            lighting_flags: MaterialLightingFlags::default(),
            textures,
            texture_transform_bits: 0,
            material_shader: MaterialShaderRef::default(),
            depth_shader: MaterialShaderRef::default(),
            render_sort_layer: super::DEFAULT_RENDER_SORT_LAYER,
            render_sort_layer_order: 0,
            custom_properties: Vec::new(),
            custom_resources: Vec::new(),
        }
    }
}

impl MaterialComponent {
    pub fn texture(&self, slot: MaterialTextureSlot) -> &MaterialTexture {
        &self.textures[slot.index()]
    }

    pub fn texture_mut(&mut self, slot: MaterialTextureSlot) -> &mut MaterialTexture {
        &mut self.textures[slot.index()]
    }

    /// Sets the base color factor, premultiplying rgb by alpha.
    pub fn set_base_color(&mut self, color: Vec4) {
        self.texture_mut(MaterialTextureSlot::BaseColor).factor =
            Vec4::new(color.x * color.w, color.y * color.w, color.z * color.w, color.w);
    }

    /// Recomputes [`texture_transform_bits`](Self::texture_transform_bits)
    /// from the slot transforms.
    pub fn update_texture_transform_bits(&mut self) {
        self.texture_transform_bits = self
            .textures
            .iter()
            .enumerate()
            .filter(|(_, texture)| !texture.transform.is_identity())
            .fold(0, |bits, (index, _)| bits | (1 << index));
    }

    /// Bit `i` is set when slot `i` samples the second texture coordinate set.
    pub fn texcoord_set_bits(&self) -> u32 {
        self.textures
            .iter()
            .enumerate()
            .filter(|(_, texture)| texture.tex_coord == 1)
            .fold(0, |bits, (index, _)| bits | (1 << index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_color_is_premultiplied() {
        let mut material = MaterialComponent::default();
        material.set_base_color(Vec4::new(1.0, 0.5, 0.25, 0.5));
        assert_eq!(
            material.texture(MaterialTextureSlot::BaseColor).factor,
            Vec4::new(0.5, 0.25, 0.125, 0.5)
        );
    }

    #[test]
    fn transform_bits_use_exact_comparison() {
        let mut material = MaterialComponent::default();
        material.texture_mut(MaterialTextureSlot::Normal).transform.scale.x = 1.0 + f32::EPSILON;
        material.update_texture_transform_bits();
        assert_eq!(
            material.texture_transform_bits,
            1 << MaterialTextureSlot::Normal.index()
        );
    }

    #[test]
    fn texcoord_bits_follow_slots() {
        let mut material = MaterialComponent::default();
        material.texture_mut(MaterialTextureSlot::Ao).tex_coord = 1;
        assert_eq!(material.texcoord_set_bits(), 1 << MaterialTextureSlot::Ao.index());
    }
}
