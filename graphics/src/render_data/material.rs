//! Per-frame material records.
//!
//! A material is split into three parts the backend consumes separately:
//! [`RenderMaterialData`] selects shaders and feature bits,
//! [`InputMaterialUniforms`] is uploaded verbatim as a uniform block and
//! [`MaterialHandles`] lists the images and samplers to bind.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::handle::RenderHandleReference;

/// Number of texture slots of a material.
pub const MAX_MATERIAL_TEXTURE_COUNT: usize = 11;

/// Texture slot of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialTextureSlot {
    BaseColor = 0,
    Normal = 1,
    Material = 2,
    Emissive = 3,
    Ao = 4,
    Clearcoat = 5,
    ClearcoatRoughness = 6,
    ClearcoatNormal = 7,
    Sheen = 8,
    Transmission = 9,
    Specular = 10,
}

impl MaterialTextureSlot {
    /// All slots in index order.
    pub const ALL: [Self; MAX_MATERIAL_TEXTURE_COUNT] = [
        Self::BaseColor,
        Self::Normal,
        Self::Material,
        Self::Emissive,
        Self::Ao,
        Self::Clearcoat,
        Self::ClearcoatRoughness,
        Self::ClearcoatNormal,
        Self::Sheen,
        Self::Transmission,
        Self::Specular,
    ];

    /// Slot index.
    pub fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Derived material feature bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderMaterialFlags: u32 {
        const NORMAL_MAP = 1 << 0;
        const CLEARCOAT = 1 << 1;
        const SHEEN = 1 << 2;
        const SPECULAR = 1 << 3;
        const TRANSMISSION = 1 << 4;
        /// Alpha-tested geometry must discard in the shadow pass too.
        const SHADOW_ALPHA_DISCARD = 1 << 5;
        const TEXTURE_TRANSFORM = 1 << 6;
        const SHADOW_CASTER = 1 << 7;
        const SHADOW_RECEIVER = 1 << 8;
        /// Drawn in the translucent queue.
        const BLEND = 1 << 9;
        /// Samples scene color produced by the color pre-pass.
        const REQUIRES_COLOR_PRE_PASS = 1 << 10;
    }
}

/// Shading model of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialType {
    #[default]
    MetallicRoughness,
    SpecularGlossiness,
    Unlit,
    UnlitShadowAlpha,
    Custom,
}

/// Shader and graphics state used together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialShader {
    pub shader: RenderHandleReference,
    pub graphics_state: RenderHandleReference,
}

/// Factor and UV transform of one texture slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialTextureUniform {
    pub factor: [f32; 4],
    /// `xy` offset, `zw` scale.
    pub transform: [f32; 4],
    /// `x` rotation in radians, `y` texture coordinate set.
    pub rotation_texcoord: [f32; 4],
}

impl Default for MaterialTextureUniform {
    fn default() -> Self {
        Self {
            factor: [1.0; 4],
            transform: [0.0, 0.0, 1.0, 1.0],
            rotation_texcoord: [0.0; 4],
        }
    }
}

/// Uniform block of a material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InputMaterialUniforms {
    pub textures: [MaterialTextureUniform; MAX_MATERIAL_TEXTURE_COUNT],
    pub alpha_cutoff: f32,
    /// Bit per slot, set when the slot samples texture coordinate set 1.
    pub texcoord_set_bits: u32,
    /// Bit per slot, set when the slot has a non-identity UV transform.
    pub texture_transform_bits: u32,
    /// Low 32 bits of the source entity id.
    pub id: u32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<InputMaterialUniforms>(), 544);

impl Default for InputMaterialUniforms {
    fn default() -> Self {
        Self {
            textures: [MaterialTextureUniform::default(); MAX_MATERIAL_TEXTURE_COUNT],
            alpha_cutoff: 0.5,
            texcoord_set_bits: 0,
            texture_transform_bits: 0,
            id: u32::MAX,
        }
    }
}

/// Images and samplers bound for each texture slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialHandles {
    pub images: [RenderHandleReference; MAX_MATERIAL_TEXTURE_COUNT],
    pub samplers: [RenderHandleReference; MAX_MATERIAL_TEXTURE_COUNT],
}

impl Default for MaterialHandles {
    fn default() -> Self {
        Self {
            images: std::array::from_fn(|_| RenderHandleReference::default()),
            samplers: std::array::from_fn(|_| RenderHandleReference::default()),
        }
    }
}

/// Shader selection and feature bits of a material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMaterialData {
    /// Source entity id; `u64::MAX` for the shared default material.
    pub id: u64,
    pub material_type: MaterialType,
    pub flags: RenderMaterialFlags,
    pub render_sort_layer: u8,
    pub render_sort_layer_order: u8,
    pub shader: MaterialShader,
    pub depth_shader: MaterialShader,
    /// Opaque per-material blob forwarded to custom shaders.
    pub custom_properties: Vec<u8>,
}

/// Material record as stored in a material data store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMaterial {
    pub data: RenderMaterialData,
    pub uniforms: InputMaterialUniforms,
    pub handles: MaterialHandles,
}
