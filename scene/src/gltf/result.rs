//! Import results and task errors.

use std::fmt;

use lumen_core::compute::Cancelled;
use lumen_core::gltf::GltfError;
use lumen_ecs::{ComponentNotRegistered, Entity};
use lumen_graphics::GraphicsError;

/// Image and sampler pair produced for one glTF texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureBinding {
    pub image: Option<Entity>,
    pub sampler: Option<Entity>,
}

/// Entities created (or reused) by an import.
///
/// Every list is aligned to the source indices of its resource kind. An
/// entry stays `None` when its kind was not requested, its phase has not
/// run yet, or its task failed.
#[derive(Debug, Clone, Default)]
pub struct GltfImportResult {
    /// `false` once any task failed.
    pub success: bool,
    /// Messages of all failed tasks, newline separated.
    pub error: String,
    pub samplers: Vec<Option<Entity>>,
    pub images: Vec<Option<Entity>>,
    pub textures: Vec<TextureBinding>,
    pub materials: Vec<Option<Entity>>,
    pub meshes: Vec<Option<Entity>>,
    pub skins: Vec<Option<Entity>>,
    pub animations: Vec<Option<Entity>>,
    pub specular_radiance_cubemaps: Vec<Option<Entity>>,
}

impl GltfImportResult {
    /// Empty, successful result with one slot per source resource.
    pub(crate) fn sized_for(data: &lumen_core::gltf::GltfData) -> Self {
        Self {
            success: true,
            error: String::new(),
            samplers: vec![None; data.samplers.len()],
            images: vec![None; data.images.len()],
            textures: vec![TextureBinding::default(); data.textures.len()],
            materials: vec![None; data.materials.len()],
            meshes: vec![None; data.meshes.len()],
            skins: vec![None; data.skins.len()],
            animations: vec![None; data.animations.len()],
            specular_radiance_cubemaps: vec![None; data.image_based_lights.len()],
        }
    }

    /// Marks the import failed and appends `error` to the message list.
    pub(crate) fn push_error(&mut self, error: &ImportError) {
        self.success = false;
        if !self.error.is_empty() {
            self.error.push('\n');
        }
        self.error.push_str(&error.to_string());
    }
}

/// Why a single import task failed.
#[derive(Debug)]
pub enum ImportError {
    /// The task observed cancellation.
    Cancelled,
    /// Source data could not be read or is malformed.
    Source {
        /// Resource the task was producing, e.g. `mesh 3`.
        resource: String,
        source: GltfError,
    },
    /// The GPU backend refused a resource.
    Graphics {
        resource: String,
        source: GraphicsError,
    },
    /// A result of an earlier task this one needs is missing.
    MissingDependency {
        resource: String,
        dependency: String,
    },
    /// The gather step of a task panicked on its worker thread.
    Panicked { resource: String },
    /// A component store the importer writes to is not registered.
    Component(ComponentNotRegistered),
}

impl ImportError {
    pub(crate) fn gltf(resource: impl Into<String>, source: GltfError) -> Self {
        Self::Source {
            resource: resource.into(),
            source,
        }
    }

    pub(crate) fn gpu(resource: impl Into<String>, source: GraphicsError) -> Self {
        Self::Graphics {
            resource: resource.into(),
            source,
        }
    }

    pub(crate) fn missing(resource: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            resource: resource.into(),
            dependency: dependency.into(),
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "import cancelled"),
            Self::Source { resource, source } => write!(f, "{resource}: {source}"),
            Self::Graphics { resource, source } => write!(f, "{resource}: {source}"),
            Self::MissingDependency {
                resource,
                dependency,
            } => write!(f, "{resource}: {dependency} is not available"),
            Self::Panicked { resource } => write!(f, "{resource}: gather step panicked"),
            Self::Component(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source { source, .. } => Some(source),
            Self::Graphics { source, .. } => Some(source),
            Self::Component(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Cancelled> for ImportError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<ComponentNotRegistered> for ImportError {
    fn from(e: ComponentNotRegistered) -> Self {
        Self::Component(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_accumulate_newline_separated() {
        let mut result = GltfImportResult {
            success: true,
            ..Default::default()
        };
        result.push_error(&ImportError::missing("texture 0", "image 2"));
        result.push_error(&ImportError::gltf(
            "mesh 1",
            GltfError::InvalidIndex {
                index: 9,
                vertex_count: 3,
            },
        ));
        assert!(!result.success);
        assert_eq!(
            result.error,
            "texture 0: image 2 is not available\nmesh 1: index 9 out of range for 3 vertices"
        );
    }
}
