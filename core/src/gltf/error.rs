//! Error types for glTF parsing and accessor decoding.

/// Errors that can occur while reading glTF source data.
#[derive(Debug)]
pub enum GltfError {
    /// Failed to parse the glTF document.
    Parse(gltf_dep::Error),
    /// Failed to decode an image.
    ImageDecode(String),
    /// A buffer could not be resolved.
    BufferError(String),
    /// An external file could not be read.
    Io {
        /// Resolved path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Accessor data is missing or out of bounds.
    AccessorError(String),
    /// Sparse accessors are not supported.
    SparseAccessor(usize),
    /// A component type cannot be decoded the requested way.
    UnsupportedComponentType(String),
    /// A primitive is missing position data.
    MissingPositions {
        /// Mesh index in the glTF document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
    },
    /// An index refers past the end of the vertex data.
    InvalidIndex {
        /// Offending index value.
        index: u32,
        /// Number of loaded vertices.
        vertex_count: usize,
    },
}

impl std::fmt::Display for GltfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "glTF parse error: {e}"),
            Self::ImageDecode(msg) => write!(f, "image decode error: {msg}"),
            Self::BufferError(msg) => write!(f, "buffer error: {msg}"),
            Self::Io { path, source } => write!(f, "failed to read '{path}': {source}"),
            Self::AccessorError(msg) => write!(f, "accessor error: {msg}"),
            Self::SparseAccessor(index) => {
                write!(f, "accessor {index} is sparse, which is not supported")
            }
            Self::UnsupportedComponentType(msg) => write!(f, "unsupported component type: {msg}"),
            Self::MissingPositions { mesh, primitive } => {
                write!(
                    f,
                    "mesh {mesh} primitive {primitive} has no POSITION attribute"
                )
            }
            Self::InvalidIndex {
                index,
                vertex_count,
            } => write!(
                f,
                "index {index} out of range for {vertex_count} vertices"
            ),
        }
    }
}

impl std::error::Error for GltfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<gltf_dep::Error> for GltfError {
    fn from(e: gltf_dep::Error) -> Self {
        Self::Parse(e)
    }
}
