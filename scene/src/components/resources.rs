use lumen_graphics::RenderHandleReference;

/// Layer bit assigned to entities without a [`LayerComponent`].
pub const LAYER_DEFAULT: u64 = 1;
/// Matches no camera.
pub const LAYER_NONE: u64 = 0;
/// Matches every layer.
pub const LAYER_ALL: u64 = u64::MAX;

/// Render layer membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerComponent {
    pub layer_mask: u64,
}

impl Default for LayerComponent {
    fn default() -> Self {
        Self {
            layer_mask: LAYER_DEFAULT,
        }
    }
}

/// Identifies a resource entity by where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UriComponent {
    pub uri: String,
}

impl UriComponent {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// A GPU resource (image, sampler, shader, graphics state or render node
/// graph) owned by an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderHandleComponent {
    pub reference: RenderHandleReference,
}

impl RenderHandleComponent {
    pub fn new(reference: RenderHandleReference) -> Self {
        Self { reference }
    }
}
