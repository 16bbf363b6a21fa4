//! Render node graph ordering.
//!
//! Graphs execute in the order returned here: the scene graph, then
//! reflection cameras, then other cameras in encounter order, then the
//! color pre-pass and finally the main camera. Camera graphs are cached by
//! camera id and rebuilt only when MSAA, the post-process name or the
//! pipeline type changes.

use lumen_graphics::render_data::{RenderCamera, RenderCameraFlags, RenderScene};
use lumen_graphics::{RenderHandleReference, RenderNodeGraphDesc, RenderNodeGraphUsage};

use super::{COLOR_PRE_PASS_CAMERA_ID, CameraGraphEntry, RenderSystem};

/// Frames a cached camera graph survives without its camera.
const GRAPH_RETENTION_FRAMES: u64 = 2;

impl RenderSystem {
    pub(super) fn process_render_node_graphs(
        &mut self,
        cameras: &[RenderCamera],
        scene: &RenderScene,
    ) -> Vec<RenderHandleReference> {
        lumen_core::profile_scope!("process_render_node_graphs");

        let mut graphs = Vec::with_capacity(cameras.len() + 1);
        let scene_graph = self.scene_graph(scene);
        if scene_graph.is_valid() {
            graphs.push(scene_graph);
        }

        let mut pre_pass_graph = None;
        let mut main_graph = None;
        for camera in cameras.iter().filter(|camera| !camera.is_shadow()) {
            let graph = self.camera_graph(camera);
            if !graph.is_valid() {
                continue;
            }
            if camera.is_main() {
                main_graph = Some(graph);
            } else if camera.flags.contains(RenderCameraFlags::COLOR_PRE_PASS) {
                pre_pass_graph = Some(graph);
            } else if camera.flags.contains(RenderCameraFlags::REFLECTION) {
                graphs.insert(graphs.len().min(1), graph);
            } else {
                graphs.push(graph);
            }
        }
        graphs.extend(pre_pass_graph);
        graphs.extend(main_graph);

        self.purge_camera_graphs();
        graphs
    }

    /// The environment's custom graph, else the default scene graph created
    /// on first use.
    fn scene_graph(&mut self, scene: &RenderScene) -> RenderHandleReference {
        if scene.custom_render_node_graph.is_valid() {
            return scene.custom_render_node_graph.clone();
        }
        if !self.scene_graph.is_valid() {
            let desc = RenderNodeGraphDesc::scene(&self.config.scene_name);
            self.scene_graph = self.create_graph(&desc);
        }
        self.scene_graph.clone()
    }

    fn camera_graph(&mut self, camera: &RenderCamera) -> RenderHandleReference {
        if camera.custom_render_node_graph.is_valid() {
            return camera.custom_render_node_graph.clone();
        }

        let msaa = camera.flags.contains(RenderCameraFlags::MSAA);
        if let Some(entry) = self.graph_cache.get_mut(&camera.id)
            && entry.msaa == msaa
            && entry.post_process_name == camera.post_process_name
            && entry.pipeline_type == camera.pipeline_type
        {
            entry.last_frame = self.frame_index;
            return entry.graph.clone();
        }

        let desc = RenderNodeGraphDesc::camera(&self.config.scene_name, camera);
        let graph = self.create_graph(&desc);
        if graph.is_valid() {
            log::debug!(
                "RenderSystem: render node graph for camera {} ({:?})",
                camera.id,
                camera.pipeline_type
            );
            self.graph_cache.insert(
                camera.id,
                CameraGraphEntry {
                    graph: graph.clone(),
                    msaa,
                    post_process_name: camera.post_process_name.clone(),
                    pipeline_type: camera.pipeline_type,
                    last_frame: self.frame_index,
                    auto_destroy: camera.id != COLOR_PRE_PASS_CAMERA_ID,
                },
            );
        }
        graph
    }

    fn create_graph(&self, desc: &RenderNodeGraphDesc) -> RenderHandleReference {
        match self.context.render_node_graphs.create(
            RenderNodeGraphUsage::Dynamic,
            desc,
            &self.config.scene_name,
        ) {
            Ok(graph) => graph,
            Err(e) => {
                self.log_once.error(
                    &desc.name,
                    format_args!("RenderSystem: cannot create render node graph {}: {e}", desc.name),
                );
                RenderHandleReference::default()
            }
        }
    }

    /// Drops cached graphs of cameras unseen for more than
    /// [`GRAPH_RETENTION_FRAMES`]. The first two frames never purge.
    fn purge_camera_graphs(&mut self) {
        let frame_index = self.frame_index;
        if frame_index <= 1 {
            return;
        }
        self.graph_cache.retain(|_, entry| {
            !entry.auto_destroy || frame_index - entry.last_frame <= GRAPH_RETENTION_FRAMES
        });
    }

    /// Number of cached camera graphs.
    pub fn cached_camera_graph_count(&self) -> usize {
        self.graph_cache.len()
    }
}
