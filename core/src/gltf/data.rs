//! Source data model of a parsed glTF asset.
//!
//! Everything is index based, mirroring the glTF JSON layout. Buffers may be
//! unresolved (`data == None`); [`resolve_buffers`](super::resolve_buffers)
//! loads them, which the importer does on a worker thread.

use std::sync::Arc;

/// A parsed glTF asset.
#[derive(Debug, Clone, Default)]
pub struct GltfData {
    /// Path the asset was loaded from. Used for relative URIs and for
    /// synthesizing resource URIs.
    pub filepath: String,
    /// Resource namespace used when synthesizing resource URIs.
    pub default_resources_name: String,
    pub buffers: Vec<GltfBuffer>,
    pub buffer_views: Vec<GltfBufferView>,
    pub accessors: Vec<GltfAccessor>,
    pub samplers: Vec<GltfSampler>,
    pub images: Vec<GltfImage>,
    pub textures: Vec<GltfTexture>,
    pub materials: Vec<GltfMaterial>,
    pub meshes: Vec<GltfMesh>,
    pub nodes: Vec<GltfNode>,
    pub scenes: Vec<GltfScene>,
    /// Index of the default scene, if specified.
    pub default_scene: Option<usize>,
    pub skins: Vec<GltfSkin>,
    pub animations: Vec<GltfAnimation>,
    pub cameras: Vec<GltfCamera>,
    pub lights: Vec<GltfLight>,
    pub image_based_lights: Vec<GltfImageBasedLight>,
}

impl GltfData {
    /// Empty asset attributed to `filepath`.
    pub fn new(filepath: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            default_resources_name: String::from("resources"),
            ..Default::default()
        }
    }
}

/// One glTF buffer.
#[derive(Debug, Clone, Default)]
pub struct GltfBuffer {
    /// Data URI or path relative to the asset. `None` for the GLB chunk.
    pub uri: Option<String>,
    /// Declared byte length.
    pub byte_length: usize,
    /// Already available bytes (GLB chunk or programmatic data).
    pub data: Option<Arc<[u8]>>,
}

/// A view into a buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfBufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Stride between elements; tightly packed when `None`.
    pub byte_stride: Option<usize>,
}

/// Accessor component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }
}

/// Accessor element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Number of components per element.
    pub fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// A typed view over buffer data.
#[derive(Debug, Clone)]
pub struct GltfAccessor {
    pub name: Option<String>,
    /// Source view; `None` means all elements are zero.
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
    pub sparse: bool,
}

impl Default for GltfAccessor {
    fn default() -> Self {
        Self {
            name: None,
            buffer_view: None,
            byte_offset: 0,
            component_type: ComponentType::Float,
            element_type: ElementType::Scalar,
            count: 0,
            normalized: false,
            min: Vec::new(),
            max: Vec::new(),
            sparse: false,
        }
    }
}

/// Texture filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GltfFilter {
    Nearest,
    #[default]
    Linear,
}

/// Texture wrap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GltfWrapping {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

/// Texture sampler.
#[derive(Debug, Clone, Default)]
pub struct GltfSampler {
    pub name: Option<String>,
    pub mag_filter: GltfFilter,
    pub min_filter: GltfFilter,
    /// Mipmap filter; `None` disables mipmapping.
    pub mipmap_filter: Option<GltfFilter>,
    pub wrap_s: GltfWrapping,
    pub wrap_t: GltfWrapping,
}

/// Where an image's encoded bytes live.
#[derive(Debug, Clone)]
pub enum GltfImageSource {
    /// Data URI or path relative to the asset.
    Uri {
        uri: String,
        mime_type: Option<String>,
    },
    /// Bytes stored in a buffer view.
    BufferView { view: usize, mime_type: String },
}

/// Encoded image.
#[derive(Debug, Clone)]
pub struct GltfImage {
    pub name: Option<String>,
    pub source: GltfImageSource,
}

/// Image + sampler pair.
#[derive(Debug, Clone, Default)]
pub struct GltfTexture {
    pub name: Option<String>,
    pub image: Option<usize>,
    pub sampler: Option<usize>,
}

/// KHR_texture_transform parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GltfTextureTransform {
    pub offset: [f32; 2],
    pub rotation: f32,
    pub scale: [f32; 2],
}

impl Default for GltfTextureTransform {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            rotation: 0.0,
            scale: [1.0, 1.0],
        }
    }
}

/// Reference from a material slot to a texture.
#[derive(Debug, Clone, Default)]
pub struct GltfTextureInfo {
    pub index: usize,
    pub tex_coord: u32,
    pub transform: Option<GltfTextureTransform>,
}

/// Alpha blending mode of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GltfAlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// KHR_materials_clearcoat.
#[derive(Debug, Clone, Default)]
pub struct GltfClearcoat {
    pub factor: f32,
    pub texture: Option<GltfTextureInfo>,
    pub roughness_factor: f32,
    pub roughness_texture: Option<GltfTextureInfo>,
    pub normal_texture: Option<GltfTextureInfo>,
    pub normal_scale: f32,
}

/// KHR_materials_sheen.
#[derive(Debug, Clone, Default)]
pub struct GltfSheen {
    pub color_factor: [f32; 3],
    pub color_texture: Option<GltfTextureInfo>,
    pub roughness_factor: f32,
    pub roughness_texture: Option<GltfTextureInfo>,
}

/// KHR_materials_specular.
#[derive(Debug, Clone)]
pub struct GltfSpecular {
    pub factor: f32,
    pub texture: Option<GltfTextureInfo>,
    pub color_factor: [f32; 3],
    pub color_texture: Option<GltfTextureInfo>,
}

impl Default for GltfSpecular {
    fn default() -> Self {
        Self {
            factor: 1.0,
            texture: None,
            color_factor: [1.0; 3],
            color_texture: None,
        }
    }
}

/// KHR_materials_transmission.
#[derive(Debug, Clone, Default)]
pub struct GltfTransmission {
    pub factor: f32,
    pub texture: Option<GltfTextureInfo>,
}

/// PBR material.
#[derive(Debug, Clone)]
pub struct GltfMaterial {
    pub name: Option<String>,
    pub alpha_mode: GltfAlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
    pub unlit: bool,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<GltfTextureInfo>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<GltfTextureInfo>,
    pub normal_texture: Option<GltfTextureInfo>,
    pub normal_scale: f32,
    pub occlusion_texture: Option<GltfTextureInfo>,
    pub occlusion_strength: f32,
    pub emissive_texture: Option<GltfTextureInfo>,
    pub emissive_factor: [f32; 3],
    pub emissive_strength: f32,
    pub ior: f32,
    pub clearcoat: Option<GltfClearcoat>,
    pub sheen: Option<GltfSheen>,
    pub specular: Option<GltfSpecular>,
    pub transmission: Option<GltfTransmission>,
}

impl Default for GltfMaterial {
    fn default() -> Self {
        Self {
            name: None,
            alpha_mode: GltfAlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            unlit: false,
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            emissive_texture: None,
            emissive_factor: [0.0; 3],
            emissive_strength: 1.0,
            ior: 1.5,
            clearcoat: None,
            sheen: None,
            specular: None,
            transmission: None,
        }
    }
}

/// Primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GltfPrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Morph target accessors.
#[derive(Debug, Clone, Default)]
pub struct GltfMorphTarget {
    pub position: Option<usize>,
    pub normal: Option<usize>,
    pub tangent: Option<usize>,
}

/// One draw range of a mesh. Attribute fields hold accessor indices.
#[derive(Debug, Clone, Default)]
pub struct GltfPrimitive {
    pub position: Option<usize>,
    pub normal: Option<usize>,
    pub tangent: Option<usize>,
    /// TEXCOORD_n accessors, in set order.
    pub tex_coords: Vec<usize>,
    pub color: Option<usize>,
    pub joints: Option<usize>,
    pub weights: Option<usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: GltfPrimitiveMode,
    pub targets: Vec<GltfMorphTarget>,
}

/// Mesh.
#[derive(Debug, Clone, Default)]
pub struct GltfMesh {
    pub name: Option<String>,
    pub primitives: Vec<GltfPrimitive>,
    /// Default morph weights.
    pub weights: Vec<f32>,
}

/// Local transform of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GltfNodeTransform {
    /// Column-major 4x4 matrix.
    Matrix([f32; 16]),
    /// Translation, rotation (`[x, y, z, w]`), scale.
    Trs {
        translation: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
    },
}

impl Default for GltfNodeTransform {
    fn default() -> Self {
        Self::Trs {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

/// Scene graph node.
#[derive(Debug, Clone, Default)]
pub struct GltfNode {
    pub name: Option<String>,
    pub children: Vec<usize>,
    pub transform: GltfNodeTransform,
    pub mesh: Option<usize>,
    pub camera: Option<usize>,
    pub light: Option<usize>,
    pub skin: Option<usize>,
    pub weights: Vec<f32>,
}

/// Scene root list.
#[derive(Debug, Clone, Default)]
pub struct GltfScene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}

/// Skin.
#[derive(Debug, Clone, Default)]
pub struct GltfSkin {
    pub name: Option<String>,
    /// MAT4 accessor of inverse bind matrices; identity when absent.
    pub inverse_bind_matrices: Option<usize>,
    pub joints: Vec<usize>,
    pub skeleton: Option<usize>,
}

/// Animated property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GltfAnimationPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

/// Keyframe interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GltfInterpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

/// Keyframe source: input (time) and output (value) accessors.
#[derive(Debug, Clone)]
pub struct GltfAnimationSampler {
    pub input: usize,
    pub output: usize,
    pub interpolation: GltfInterpolation,
}

/// Binds a sampler to a node property.
#[derive(Debug, Clone)]
pub struct GltfAnimationChannel {
    pub sampler: usize,
    pub target_node: Option<usize>,
    pub path: GltfAnimationPath,
}

/// Animation clip.
#[derive(Debug, Clone, Default)]
pub struct GltfAnimation {
    pub name: Option<String>,
    pub channels: Vec<GltfAnimationChannel>,
    pub samplers: Vec<GltfAnimationSampler>,
}

/// Camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GltfProjection {
    Perspective {
        yfov: f32,
        aspect_ratio: Option<f32>,
        znear: f32,
        zfar: Option<f32>,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

/// Camera.
#[derive(Debug, Clone)]
pub struct GltfCamera {
    pub name: Option<String>,
    pub projection: GltfProjection,
}

/// Punctual light type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GltfLightKind {
    Directional,
    Point,
    Spot {
        inner_cone_angle: f32,
        outer_cone_angle: f32,
    },
}

/// KHR_lights_punctual light.
#[derive(Debug, Clone)]
pub struct GltfLight {
    pub name: Option<String>,
    pub kind: GltfLightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: Option<f32>,
}

/// Image-based light with a prefiltered specular radiance cubemap.
#[derive(Debug, Clone, Default)]
pub struct GltfImageBasedLight {
    pub name: Option<String>,
    pub rotation: [f32; 4],
    pub intensity: f32,
    /// Spherical harmonics irradiance coefficients.
    pub irradiance_coefficients: Vec<[f32; 3]>,
    /// Per mip level, the six face images (+X, -X, +Y, -Y, +Z, -Z).
    pub specular_images: Vec<[usize; 6]>,
    /// Edge length of mip level 0.
    pub specular_image_size: u32,
}
