//! Material records.
//!
//! Materials are added once per entity and frame; every later reference
//! reuses the first index. Submeshes without a material, or whose material
//! entity has no [`MaterialComponent`], share the default record.

use lumen_core::math::Vec4;
use lumen_ecs::{ComponentStore, Entity};
use lumen_graphics::data_store::MaterialDataStore;
use lumen_graphics::render_data::{
    InputMaterialUniforms, MaterialHandles, MaterialShader, MaterialTextureSlot,
    MaterialTextureUniform, RenderMaterial, RenderMaterialData, RenderMaterialFlags,
};

use super::handle_of;
use crate::components::{
    MaterialAlphaMode, MaterialComponent, MaterialLightingFlags, MaterialShaderRef,
    RenderHandleComponent,
};

/// Id of the shared default material record.
pub const DEFAULT_MATERIAL_ID: u64 = u64::MAX;

/// Component stores a material record is built from.
#[derive(Clone, Copy)]
pub(super) struct MaterialSource<'a> {
    pub materials: Option<&'a ComponentStore<MaterialComponent>>,
    pub handles: Option<&'a ComponentStore<RenderHandleComponent>>,
}

impl MaterialSource<'_> {
    fn lookup(&self, entity: Option<Entity>) -> Option<(Entity, &MaterialComponent)> {
        let entity = entity?;
        let material = self.materials?.get(entity)?;
        Some((entity, material))
    }

    /// Material index of `entity`, adding the record on first use.
    pub fn add_render_material(
        &self,
        store: &mut dyn MaterialDataStore,
        entity: Option<Entity>,
    ) -> u32 {
        let Some((entity, material)) = self.lookup(entity) else {
            return add_default_material(store);
        };
        if let Some(index) = store.material_index(entity.id()) {
            return index;
        }
        let handles = self.material_handles(material);
        store.add_material_data(render_material(entity.id(), material, handles, self.handles))
    }

    /// Appends a fresh record for an instancing batch member. Texture handles
    /// are left unresolved; the batch leader's record provides them.
    pub fn add_render_material_instance(
        &self,
        store: &mut dyn MaterialDataStore,
        entity: Option<Entity>,
    ) -> u32 {
        match self.lookup(entity) {
            Some((entity, material)) => store.add_material_instance_data(render_material(
                entity.id(),
                material,
                MaterialHandles::default(),
                self.handles,
            )),
            None => add_default_material(store),
        }
    }

    /// Custom resource list index of `entity`'s material, if it has any.
    pub fn add_custom_resources(
        &self,
        store: &mut dyn MaterialDataStore,
        entity: Option<Entity>,
    ) -> Option<u32> {
        let (entity, material) = self.lookup(entity)?;
        if material.custom_resources.is_empty() {
            return None;
        }
        if let Some(index) = store.material_custom_resource_index(entity.id()) {
            return Some(index);
        }
        let resources = material
            .custom_resources
            .iter()
            .map(|&resource| handle_of(self.handles, Some(resource)))
            .collect();
        Some(store.add_material_custom_resources(entity.id(), resources))
    }

    fn material_handles(&self, material: &MaterialComponent) -> MaterialHandles {
        let mut handles = MaterialHandles::default();
        for (index, texture) in material.textures.iter().enumerate() {
            handles.images[index] = handle_of(self.handles, texture.image);
            handles.samplers[index] = handle_of(self.handles, texture.sampler);
        }
        handles
    }
}

fn add_default_material(store: &mut dyn MaterialDataStore) -> u32 {
    if let Some(index) = store.material_index(DEFAULT_MATERIAL_ID) {
        return index;
    }
    store.add_material_data(render_material(
        DEFAULT_MATERIAL_ID,
        &MaterialComponent::default(),
        MaterialHandles::default(),
        None,
    ))
}

fn render_material(
    id: u64,
    material: &MaterialComponent,
    handles: MaterialHandles,
    handle_store: Option<&ComponentStore<RenderHandleComponent>>,
) -> RenderMaterial {
    let shader = |reference: &MaterialShaderRef| MaterialShader {
        shader: handle_of(handle_store, reference.shader),
        graphics_state: handle_of(handle_store, reference.graphics_state),
    };
    RenderMaterial {
        data: RenderMaterialData {
            id,
            material_type: material.material_type,
            flags: material_flags(material),
            render_sort_layer: material.render_sort_layer,
            render_sort_layer_order: material.render_sort_layer_order,
            shader: shader(&material.material_shader),
            depth_shader: shader(&material.depth_shader),
            custom_properties: material.custom_properties.clone(),
        },
        uniforms: material_uniforms(id, material),
        handles,
    }
}

/// Uniform block of `material`. The base color factor is already
/// premultiplied on the component.
pub(super) fn material_uniforms(id: u64, material: &MaterialComponent) -> InputMaterialUniforms {
    let mut uniforms = InputMaterialUniforms {
        alpha_cutoff: material.alpha_cutoff,
        texcoord_set_bits: material.texcoord_set_bits(),
        texture_transform_bits: material.texture_transform_bits,
        id: (id & 0xffff_ffff) as u32,
        ..Default::default()
    };
    for (dst, texture) in uniforms.textures.iter_mut().zip(material.textures.iter()) {
        let t = &texture.transform;
        *dst = MaterialTextureUniform {
            factor: texture.factor.into(),
            transform: [t.translation.x, t.translation.y, t.scale.x, t.scale.y],
            rotation_texcoord: [t.rotation, texture.tex_coord as f32, 0.0, 0.0],
        };
    }
    uniforms
}

/// Feature bits derived from the material's slots and modes.
pub(super) fn material_flags(material: &MaterialComponent) -> RenderMaterialFlags {
    let factor = |slot: MaterialTextureSlot| material.texture(slot).factor;
    let mut flags = RenderMaterialFlags::empty();

    flags.set(
        RenderMaterialFlags::NORMAL_MAP,
        material.texture(MaterialTextureSlot::Normal).image.is_some(),
    );
    flags.set(
        RenderMaterialFlags::CLEARCOAT,
        factor(MaterialTextureSlot::Clearcoat).x > 0.0,
    );
    flags.set(
        RenderMaterialFlags::SHEEN,
        factor(MaterialTextureSlot::Sheen).xyz().max() > 0.0,
    );
    let specular = material.texture(MaterialTextureSlot::Specular);
    flags.set(
        RenderMaterialFlags::SPECULAR,
        specular.image.is_some() || specular.factor != Vec4::repeat(1.0),
    );
    if factor(MaterialTextureSlot::Transmission).x > 0.0 {
        flags |= RenderMaterialFlags::TRANSMISSION | RenderMaterialFlags::REQUIRES_COLOR_PRE_PASS;
    }
    flags.set(
        RenderMaterialFlags::SHADOW_ALPHA_DISCARD,
        material.alpha_mode == MaterialAlphaMode::Mask,
    );
    flags.set(
        RenderMaterialFlags::TEXTURE_TRANSFORM,
        material.texture_transform_bits != 0,
    );
    flags.set(
        RenderMaterialFlags::SHADOW_CASTER,
        material
            .lighting_flags
            .contains(MaterialLightingFlags::SHADOW_CASTER),
    );
    flags.set(
        RenderMaterialFlags::SHADOW_RECEIVER,
        material
            .lighting_flags
            .contains(MaterialLightingFlags::SHADOW_RECEIVER),
    );
    flags.set(
        RenderMaterialFlags::BLEND,
        material.alpha_mode == MaterialAlphaMode::Blend,
    );
    flags
}
