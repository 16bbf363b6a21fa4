//! glTF resource import.
//!
//! [`GltfImporter`] turns the resources of a parsed [`GltfData`] into
//! entities: samplers, images and specular radiance cubemaps with GPU
//! handles, materials, keyframe data and animations, skins and meshes. Work
//! is split into tasks that run phase by phase; the decoding half of a task
//! runs on a worker pool and the half that writes to the world runs on the
//! thread calling [`GltfImporter::execute`].
//!
//! Every created resource entity carries a [`UriComponent`] with a uri
//! derived from the asset path, so importing the same asset twice reuses
//! the first import's entities.
//!
//! [`import_scene`] then instantiates a scene of the asset as node entities
//! referencing those resources.
//!
//! # Example
//!
//! ```ignore
//! let data = Arc::new(parse_gltf(&bytes, "models/helmet.gltf")?);
//! let mut importer = GltfImporter::new(gpu, shaders, ImporterConfig::default());
//! let result = importer.import_gltf(&mut world, Arc::clone(&data), ImportFlags::ALL);
//! let root = import_scene(&mut world, &data, result, None)?;
//! ```
//!
//! [`GltfData`]: lumen_core::gltf::GltfData
//! [`UriComponent`]: crate::components::UriComponent

mod conversions;
mod gather;
mod importer;
mod prepare;
mod result;
mod scene_importer;
mod tasks;

pub use conversions::{
    BLEND_DOUBLE_SIDED_GRAPHICS_STATE_PATH, BLEND_GRAPHICS_STATE_PATH, DEPTH_SHADER_PATH,
    MATERIAL_SHADER_PATH, OPAQUE_DOUBLE_SIDED_GRAPHICS_STATE_PATH, OPAQUE_GRAPHICS_STATE_PATH,
    convert_material, material_graphics_state, sampler_desc, validate_indices, vertex_format,
};
pub use importer::{GltfImporter, ImportFlags, ImportListener, ImporterConfig};
pub use result::{GltfImportResult, ImportError, TextureBinding};
pub use scene_importer::import_scene;
pub use tasks::{ImportPhase, TaskState};

/// Resource kinds that get a synthesized uri.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Sampler,
    Image,
    Cubemap,
    Material,
    AnimationInput,
    AnimationOutput,
    Animation,
    Skin,
    Mesh,
}

impl ResourceKind {
    /// Path segment of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sampler => "samplers",
            Self::Image => "images",
            Self::Cubemap => "cubemaps",
            Self::Material => "materials",
            Self::AnimationInput => "animation_inputs",
            Self::AnimationOutput => "animation_outputs",
            Self::Animation => "animations",
            Self::Skin => "skins",
            Self::Mesh => "meshes",
        }
    }
}

/// Uri of resource `index` of `kind` imported from the asset at `filepath`.
pub fn resource_uri(
    filepath: &str,
    resources_name: &str,
    kind: ResourceKind,
    index: usize,
) -> String {
    format!("{filepath}/{resources_name}/{}/{index}", kind.as_str())
}
