use crate::render_data::RenderCamera;

use super::CameraDataStore;

/// In-memory [`CameraDataStore`].
#[derive(Debug, Default)]
pub struct DefaultCameraDataStore {
    name: String,
    cameras: Vec<RenderCamera>,
}

impl DefaultCameraDataStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cameras: Vec::new(),
        }
    }
}

impl CameraDataStore for DefaultCameraDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) {
        self.cameras.clear();
    }

    fn add_camera(&mut self, camera: RenderCamera) -> u32 {
        if self.cameras.iter().any(|c| c.id == camera.id) {
            log::warn!(
                "Camera id {} added twice in one frame ({})",
                camera.id,
                camera.name
            );
        }
        self.cameras.push(camera);
        (self.cameras.len() - 1) as u32
    }

    fn cameras(&self) -> &[RenderCamera] {
        &self.cameras
    }
}
