//! Per-frame scene record.

use lumen_core::math::Vec3;

use crate::handle::RenderHandleReference;

/// Names of the data stores a scene renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneRenderDataStoreNames {
    pub scene: String,
    pub camera: String,
    pub light: String,
    pub material: String,
    pub pod: String,
}

impl Default for SceneRenderDataStoreNames {
    fn default() -> Self {
        Self {
            scene: "RenderDataStoreDefaultScene".into(),
            camera: "RenderDataStoreDefaultCamera".into(),
            light: "RenderDataStoreDefaultLight".into(),
            material: "RenderDataStoreDefaultMaterial".into(),
            pod: "RenderDataStorePod".into(),
        }
    }
}

/// Scene-level data of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScene {
    pub name: String,
    pub data_store_names: SceneRenderDataStoreNames,
    /// Graph from the scene environment, replacing the default scene graph.
    pub custom_render_node_graph: RenderHandleReference,
    pub world_scene_center: Vec3,
    pub world_scene_bounding_sphere_radius: f32,
    /// Frame counter modulo 2^32.
    pub frame_index: u32,
    /// Total time in seconds.
    pub total_time: f32,
    pub delta_time_ms: f32,
    pub delta_time_s: f32,
    /// Graphs to execute this frame, in execution order.
    pub render_node_graphs: Vec<RenderHandleReference>,
}
