//! Source-to-engine conversions.
//!
//! Pure functions shared by the gather and import steps: vertex formats,
//! sampler descriptors, index validation and material translation.

use lumen_core::gltf::{
    AccessorData, ComponentType, GltfAlphaMode, GltfError, GltfFilter, GltfMaterial, GltfSampler,
    GltfTextureInfo, GltfWrapping, read_indices,
};
use lumen_core::math::{Vec2, Vec4};
use lumen_graphics::render_data::{MaterialTextureSlot, MaterialType};
use lumen_graphics::{AddressMode, Filter, Format, GpuSamplerDesc};

use super::result::TextureBinding;
use crate::components::{MaterialAlphaMode, MaterialComponent, MaterialLightingFlags, TextureTransform};

/// Forward shader of imported materials.
pub const MATERIAL_SHADER_PATH: &str = "shaders/lumen/forward.shader";
/// Depth-only shader of imported materials.
pub const DEPTH_SHADER_PATH: &str = "shaders/lumen/depth.shader";
pub const OPAQUE_GRAPHICS_STATE_PATH: &str = "states/lumen/opaque.state";
pub const OPAQUE_DOUBLE_SIDED_GRAPHICS_STATE_PATH: &str = "states/lumen/opaque_double_sided.state";
pub const BLEND_GRAPHICS_STATE_PATH: &str = "states/lumen/blend.state";
pub const BLEND_DOUBLE_SIDED_GRAPHICS_STATE_PATH: &str = "states/lumen/blend_double_sided.state";

/// GPU format of a vertex attribute.
///
/// Defined for every component type with one to four components.
/// Combinations without a GPU equivalent (normalized 32-bit integers,
/// normalized floats, more than four components) map to
/// [`Format::Undefined`].
pub fn vertex_format(component_type: ComponentType, count: usize, normalized: bool) -> Format {
    use ComponentType as C;
    use Format as F;

    let formats: [F; 4] = match (component_type, normalized) {
        (C::Byte, true) => [F::R8Snorm, F::R8G8Snorm, F::R8G8B8Snorm, F::R8G8B8A8Snorm],
        (C::Byte, false) => [F::R8Sint, F::R8G8Sint, F::R8G8B8Sint, F::R8G8B8A8Sint],
        (C::UnsignedByte, true) => [F::R8Unorm, F::R8G8Unorm, F::R8G8B8Unorm, F::R8G8B8A8Unorm],
        (C::UnsignedByte, false) => [F::R8Uint, F::R8G8Uint, F::R8G8B8Uint, F::R8G8B8A8Uint],
        (C::Short, true) => [
            F::R16Snorm,
            F::R16G16Snorm,
            F::R16G16B16Snorm,
            F::R16G16B16A16Snorm,
        ],
        (C::Short, false) => [F::R16Sint, F::R16G16Sint, F::R16G16B16Sint, F::R16G16B16A16Sint],
        (C::UnsignedShort, true) => [
            F::R16Unorm,
            F::R16G16Unorm,
            F::R16G16B16Unorm,
            F::R16G16B16A16Unorm,
        ],
        (C::UnsignedShort, false) => {
            [F::R16Uint, F::R16G16Uint, F::R16G16B16Uint, F::R16G16B16A16Uint]
        }
        (C::Int, false) => [F::R32Sint, F::R32G32Sint, F::R32G32B32Sint, F::R32G32B32A32Sint],
        (C::UnsignedInt, false) => {
            [F::R32Uint, F::R32G32Uint, F::R32G32B32Uint, F::R32G32B32A32Uint]
        }
        (C::Float, false) => [
            F::R32Sfloat,
            F::R32G32Sfloat,
            F::R32G32B32Sfloat,
            F::R32G32B32A32Sfloat,
        ],
        (C::Int | C::UnsignedInt | C::Float, true) => return F::Undefined,
    };
    match count {
        1..=4 => formats[count - 1],
        _ => F::Undefined,
    }
}

fn filter(filter: GltfFilter) -> Filter {
    match filter {
        GltfFilter::Nearest => Filter::Nearest,
        GltfFilter::Linear => Filter::Linear,
    }
}

fn address_mode(wrapping: GltfWrapping) -> AddressMode {
    match wrapping {
        GltfWrapping::ClampToEdge => AddressMode::ClampToEdge,
        GltfWrapping::MirroredRepeat => AddressMode::MirroredRepeat,
        GltfWrapping::Repeat => AddressMode::Repeat,
    }
}

/// Sampler descriptor of a glTF sampler. Without a mipmap filter, mips are
/// sampled nearest.
pub fn sampler_desc(sampler: &GltfSampler) -> GpuSamplerDesc {
    GpuSamplerDesc {
        mag_filter: filter(sampler.mag_filter),
        min_filter: filter(sampler.min_filter),
        mipmap_filter: sampler.mipmap_filter.map_or(Filter::Nearest, filter),
        address_mode_u: address_mode(sampler.wrap_s),
        address_mode_v: address_mode(sampler.wrap_t),
        address_mode_w: AddressMode::Repeat,
    }
}

/// Decodes an index accessor and checks every index against
/// `vertex_count`.
///
/// Only unsigned 8, 16 and 32-bit scalars are accepted.
pub fn validate_indices(accessor: &AccessorData, vertex_count: usize) -> Result<Vec<u32>, GltfError> {
    let indices = read_indices(accessor)?;
    if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertex_count) {
        return Err(GltfError::InvalidIndex {
            index,
            vertex_count,
        });
    }
    Ok(indices)
}

fn transmission_factor(material: &GltfMaterial) -> f32 {
    material.transmission.as_ref().map_or(0.0, |t| t.factor)
}

/// Graphics state of an imported material.
///
/// Blend materials and every material with transmission use the blend
/// variant, whatever their alpha mode.
pub fn material_graphics_state(material: &GltfMaterial) -> &'static str {
    let blend = material.alpha_mode == GltfAlphaMode::Blend || transmission_factor(material) > 0.0;
    match (blend, material.double_sided) {
        (false, false) => OPAQUE_GRAPHICS_STATE_PATH,
        (false, true) => OPAQUE_DOUBLE_SIDED_GRAPHICS_STATE_PATH,
        (true, false) => BLEND_GRAPHICS_STATE_PATH,
        (true, true) => BLEND_DOUBLE_SIDED_GRAPHICS_STATE_PATH,
    }
}

fn assign_texture(
    material: &mut MaterialComponent,
    slot: MaterialTextureSlot,
    info: Option<&GltfTextureInfo>,
    textures: &[TextureBinding],
) {
    let Some(info) = info else {
        return;
    };
    let binding = textures.get(info.index).copied().unwrap_or_default();
    let texture = material.texture_mut(slot);
    texture.image = binding.image;
    texture.sampler = binding.sampler;
    texture.tex_coord = info.tex_coord.min(1);
    if let Some(transform) = info.transform {
        texture.transform = TextureTransform {
            translation: Vec2::new(transform.offset[0], transform.offset[1]),
            rotation: transform.rotation,
            scale: Vec2::new(transform.scale[0], transform.scale[1]),
        };
    }
}

/// Material component of a glTF material, with texture slots bound to the
/// already imported `textures`. Shader references are left unset.
pub fn convert_material(source: &GltfMaterial, textures: &[TextureBinding]) -> MaterialComponent {
    use MaterialTextureSlot as Slot;

    let mut material = MaterialComponent {
        material_type: if source.unlit {
            MaterialType::Unlit
        } else {
            MaterialType::MetallicRoughness
        },
        alpha_mode: match source.alpha_mode {
            GltfAlphaMode::Opaque => MaterialAlphaMode::Opaque,
            GltfAlphaMode::Mask => MaterialAlphaMode::Mask,
            GltfAlphaMode::Blend => MaterialAlphaMode::Blend,
        },
        alpha_cutoff: source.alpha_cutoff,
        ..Default::default()
    };
    if source.alpha_mode == GltfAlphaMode::Blend {
        material
            .lighting_flags
            .remove(MaterialLightingFlags::SHADOW_CASTER);
    }

    let [r, g, b, a] = source.base_color_factor;
    material.set_base_color(Vec4::new(r, g, b, a));
    assign_texture(&mut material, Slot::BaseColor, source.base_color_texture.as_ref(), textures);

    material.texture_mut(Slot::Normal).factor.x = source.normal_scale;
    assign_texture(&mut material, Slot::Normal, source.normal_texture.as_ref(), textures);

    material.texture_mut(Slot::Material).factor =
        Vec4::new(1.0, source.roughness_factor, source.metallic_factor, 1.0);
    assign_texture(
        &mut material,
        Slot::Material,
        source.metallic_roughness_texture.as_ref(),
        textures,
    );

    let [er, eg, eb] = source.emissive_factor;
    let strength = source.emissive_strength;
    material.texture_mut(Slot::Emissive).factor =
        Vec4::new(er * strength, eg * strength, eb * strength, 1.0);
    assign_texture(&mut material, Slot::Emissive, source.emissive_texture.as_ref(), textures);

    material.texture_mut(Slot::Ao).factor.x = source.occlusion_strength;
    assign_texture(&mut material, Slot::Ao, source.occlusion_texture.as_ref(), textures);

    if let Some(clearcoat) = &source.clearcoat {
        material.texture_mut(Slot::Clearcoat).factor = Vec4::new(clearcoat.factor, 0.0, 0.0, 0.0);
        assign_texture(&mut material, Slot::Clearcoat, clearcoat.texture.as_ref(), textures);
        material.texture_mut(Slot::ClearcoatRoughness).factor =
            Vec4::new(0.0, clearcoat.roughness_factor, 0.0, 0.0);
        assign_texture(
            &mut material,
            Slot::ClearcoatRoughness,
            clearcoat.roughness_texture.as_ref(),
            textures,
        );
        material.texture_mut(Slot::ClearcoatNormal).factor.x = clearcoat.normal_scale;
        assign_texture(
            &mut material,
            Slot::ClearcoatNormal,
            clearcoat.normal_texture.as_ref(),
            textures,
        );
    }

    if let Some(sheen) = &source.sheen {
        let [sr, sg, sb] = sheen.color_factor;
        material.texture_mut(Slot::Sheen).factor = Vec4::new(sr, sg, sb, sheen.roughness_factor);
        assign_texture(&mut material, Slot::Sheen, sheen.color_texture.as_ref(), textures);
    }

    if let Some(transmission) = &source.transmission {
        material.texture_mut(Slot::Transmission).factor =
            Vec4::new(transmission.factor, 0.0, 0.0, 0.0);
        assign_texture(
            &mut material,
            Slot::Transmission,
            transmission.texture.as_ref(),
            textures,
        );
    }

    if let Some(specular) = &source.specular {
        let [cr, cg, cb] = specular.color_factor;
        material.texture_mut(Slot::Specular).factor = Vec4::new(cr, cg, cb, specular.factor);
        assign_texture(
            &mut material,
            Slot::Specular,
            specular.color_texture.as_ref().or(specular.texture.as_ref()),
            textures,
        );
    }

    material.update_texture_transform_bits();
    material
}
