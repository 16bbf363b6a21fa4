use crate::render_data::RenderScene;

use super::SceneDataStore;

/// In-memory [`SceneDataStore`].
#[derive(Debug, Default)]
pub struct DefaultSceneDataStore {
    name: String,
    scene: RenderScene,
}

impl DefaultSceneDataStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scene: RenderScene::default(),
        }
    }
}

impl SceneDataStore for DefaultSceneDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) {
        self.scene = RenderScene::default();
    }

    fn set_scene(&mut self, scene: RenderScene) {
        self.scene = scene;
    }

    fn scene(&self) -> &RenderScene {
        &self.scene
    }
}
