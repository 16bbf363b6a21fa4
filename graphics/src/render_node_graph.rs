//! Render node graph descriptions.
//!
//! A render node graph is the backend's list of GPU passes for the whole
//! scene or one camera. The scene layer only creates and orders graphs; the
//! backend executes them.

use crate::render_data::{RenderCamera, RenderCameraFlags, RenderPipelineType};

/// How often a graph is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderNodeGraphUsage {
    /// Executed once, then released.
    Single,
    /// Executed every frame it is listed.
    #[default]
    Dynamic,
}

/// Description of a render node graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderNodeGraphDesc {
    pub name: String,
    /// Ordered node type names.
    pub nodes: Vec<String>,
    /// Camera the graph renders, `None` for scene graphs.
    pub camera_id: Option<u64>,
    pub camera_name: String,
    pub pipeline_type: RenderPipelineType,
    pub msaa: bool,
    pub post_process_name: String,
}

impl RenderNodeGraphDesc {
    /// Scene-level graph: uploads per-frame scene, light and material data.
    pub fn scene(scene_name: &str) -> Self {
        Self {
            name: format!("{scene_name}_scene"),
            nodes: vec![
                "RenderNodeDefaultMaterialObjects".into(),
                "RenderNodeDefaultCameras".into(),
                "RenderNodeDefaultLights".into(),
                "RenderNodeDefaultShadowRenderSlot".into(),
            ],
            ..Default::default()
        }
    }

    /// Camera graph for `camera`'s pipeline, MSAA and post-process settings.
    pub fn camera(scene_name: &str, camera: &RenderCamera) -> Self {
        let msaa = camera.flags.contains(RenderCameraFlags::MSAA);
        let mut nodes: Vec<String> = vec!["RenderNodeDefaultCameraController".into()];
        match camera.pipeline_type {
            RenderPipelineType::Deferred => {
                nodes.push("RenderNodeCameraDeferredGbuffer".into());
                nodes.push("RenderNodeCameraDeferredShading".into());
            }
            RenderPipelineType::Custom => {}
            RenderPipelineType::Forward | RenderPipelineType::LightForward => {
                if camera.flags.contains(RenderCameraFlags::REQUEST_COLOR_PRE_PASS) {
                    nodes.push("RenderNodeCameraColorPrePass".into());
                }
                nodes.push(if msaa {
                    "RenderNodeCameraForwardMsaa".into()
                } else {
                    "RenderNodeCameraForward".into()
                });
            }
        }
        if !camera.post_process_name.is_empty() {
            nodes.push("RenderNodeCameraPostProcess".into());
        }
        Self {
            name: format!("{scene_name}_camera_{}", camera.id),
            nodes,
            camera_id: Some(camera.id),
            camera_name: camera.name.clone(),
            pipeline_type: camera.pipeline_type,
            msaa,
            post_process_name: camera.post_process_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_graph_reflects_settings() {
        let camera = RenderCamera {
            id: 5,
            flags: RenderCameraFlags::MSAA,
            post_process_name: "pp".into(),
            pipeline_type: RenderPipelineType::Forward,
            ..Default::default()
        };
        let desc = RenderNodeGraphDesc::camera("scene", &camera);
        assert_eq!(desc.camera_id, Some(5));
        assert!(desc.msaa);
        assert_eq!(
            desc.nodes.last().map(String::as_str),
            Some("RenderNodeCameraPostProcess")
        );
        assert!(desc.nodes.iter().any(|n| n == "RenderNodeCameraForwardMsaa"));
    }
}
