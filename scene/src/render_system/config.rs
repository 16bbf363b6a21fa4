use lumen_graphics::render_data::SceneRenderDataStoreNames;

/// Per-object data budget of one instancing chunk: a 64 KiB uniform bind
/// range holding 1 KiB per instance.
pub const DEFAULT_MAX_BATCH_INSTANCES: usize = 64;

/// Lower bound of the planar reflection target mip chain.
pub const MIN_REFLECTION_MIP_COUNT: u32 = 1;

/// Mip levels requested for planar reflection targets before clamping.
pub const DEFAULT_REFLECTION_MIP_COUNT: u32 = 6;

/// Light ranges at or below this derive a range from the intensity.
pub const LIGHT_RANGE_EPSILON: f32 = 1e-4;

/// POD store name prefix of per-entity post-process settings.
pub const POST_PROCESS_NAME_PREFIX: &str = "RenderDataStorePod.PostProcess.";

/// POD store name of the scene's unnamed post-process settings.
pub const MAIN_POST_PROCESS_NAME: &str = "RenderDataStorePod.PostProcess.Main";

/// Type name the post-process POD entries are registered under.
pub const POST_PROCESS_POD_TYPE: &str = "PostProcess";

/// Bounds used for the first instance of a batch chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatchAabbMode {
    /// One box for the whole mesh, shared by all submeshes.
    #[default]
    AllSubmeshes,
    /// One box per submesh.
    PerSubmesh,
}

/// Render system settings.
///
/// # Example
///
/// ```
/// use lumen_scene::render_system::{BatchAabbMode, RenderSystemConfig};
///
/// let config = RenderSystemConfig::default()
///     .with_scene_name("level")
///     .with_max_batch_instances(16)
///     .with_batch_aabb_mode(BatchAabbMode::PerSubmesh);
/// assert_eq!(config.max_batch_instances, 16);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSystemConfig {
    /// Scene name passed to render node graph creation.
    pub scene_name: String,
    pub data_store_names: SceneRenderDataStoreNames,
    pub post_process_name_prefix: String,
    pub main_post_process_name: String,
    /// Maximum instances merged into one batched draw.
    pub max_batch_instances: usize,
    pub batch_aabb_mode: BatchAabbMode,
    pub min_reflection_mip_count: u32,
    pub reflection_mip_count: u32,
    pub light_range_epsilon: f32,
}

impl Default for RenderSystemConfig {
    fn default() -> Self {
        Self {
            scene_name: String::new(),
            data_store_names: SceneRenderDataStoreNames::default(),
            post_process_name_prefix: POST_PROCESS_NAME_PREFIX.to_string(),
            main_post_process_name: MAIN_POST_PROCESS_NAME.to_string(),
            max_batch_instances: DEFAULT_MAX_BATCH_INSTANCES,
            batch_aabb_mode: BatchAabbMode::default(),
            min_reflection_mip_count: MIN_REFLECTION_MIP_COUNT,
            reflection_mip_count: DEFAULT_REFLECTION_MIP_COUNT,
            light_range_epsilon: LIGHT_RANGE_EPSILON,
        }
    }
}

impl RenderSystemConfig {
    #[must_use]
    pub fn with_scene_name(mut self, name: impl Into<String>) -> Self {
        self.scene_name = name.into();
        self
    }

    #[must_use]
    pub fn with_data_store_names(mut self, names: SceneRenderDataStoreNames) -> Self {
        self.data_store_names = names;
        self
    }

    /// Clamped to at least one instance.
    #[must_use]
    pub fn with_max_batch_instances(mut self, count: usize) -> Self {
        self.max_batch_instances = count.max(1);
        self
    }

    #[must_use]
    pub fn with_batch_aabb_mode(mut self, mode: BatchAabbMode) -> Self {
        self.batch_aabb_mode = mode;
        self
    }

    #[must_use]
    pub fn with_reflection_mip_count(mut self, count: u32) -> Self {
        self.reflection_mip_count = count;
        self
    }
}
