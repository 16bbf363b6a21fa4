use std::collections::HashMap;

use crate::error::GraphicsError;
use crate::render_data::SceneRenderDataStoreNames;

use super::{
    CameraDataStore, DefaultCameraDataStore, DefaultLightDataStore, DefaultMaterialDataStore,
    DefaultPodDataStore, DefaultSceneDataStore, LightDataStore, MaterialDataStore, PodDataStore,
    SceneDataStore,
};

/// Registry of render data stores, looked up by name.
///
/// # Example
///
/// ```
/// use lumen_graphics::data_store::RenderDataStoreManager;
/// use lumen_graphics::render_data::SceneRenderDataStoreNames;
///
/// let names = SceneRenderDataStoreNames::default();
/// let mut manager = RenderDataStoreManager::with_default_stores(&names);
/// let stores = manager.resolve_mut(&names).unwrap();
/// assert_eq!(stores.camera.camera_count(), 0);
/// ```
#[derive(Default)]
pub struct RenderDataStoreManager {
    scenes: HashMap<String, Box<dyn SceneDataStore>>,
    cameras: HashMap<String, Box<dyn CameraDataStore>>,
    lights: HashMap<String, Box<dyn LightDataStore>>,
    materials: HashMap<String, Box<dyn MaterialDataStore>>,
    pods: HashMap<String, Box<dyn PodDataStore>>,
}

/// Mutable access to the stores one scene renders into.
pub struct ResolvedDataStores<'a> {
    pub scene: &'a mut dyn SceneDataStore,
    pub camera: &'a mut dyn CameraDataStore,
    pub light: &'a mut dyn LightDataStore,
    pub material: &'a mut dyn MaterialDataStore,
    /// POD store, if registered.
    pub pod: Option<&'a mut dyn PodDataStore>,
}

impl RenderDataStoreManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with default in-memory stores registered under `names`.
    pub fn with_default_stores(names: &SceneRenderDataStoreNames) -> Self {
        let mut manager = Self::new();
        manager.register_scene_store(Box::new(DefaultSceneDataStore::new(&names.scene)));
        manager.register_camera_store(Box::new(DefaultCameraDataStore::new(&names.camera)));
        manager.register_light_store(Box::new(DefaultLightDataStore::new(&names.light)));
        manager.register_material_store(Box::new(DefaultMaterialDataStore::new(&names.material)));
        manager.register_pod_store(Box::new(DefaultPodDataStore::new(&names.pod)));
        manager
    }

    pub fn register_scene_store(&mut self, store: Box<dyn SceneDataStore>) {
        self.scenes.insert(store.name().to_string(), store);
    }

    pub fn register_camera_store(&mut self, store: Box<dyn CameraDataStore>) {
        self.cameras.insert(store.name().to_string(), store);
    }

    pub fn register_light_store(&mut self, store: Box<dyn LightDataStore>) {
        self.lights.insert(store.name().to_string(), store);
    }

    pub fn register_material_store(&mut self, store: Box<dyn MaterialDataStore>) {
        self.materials.insert(store.name().to_string(), store);
    }

    pub fn register_pod_store(&mut self, store: Box<dyn PodDataStore>) {
        self.pods.insert(store.name().to_string(), store);
    }

    pub fn scene_store(&self, name: &str) -> Option<&dyn SceneDataStore> {
        self.scenes.get(name).map(|s| s.as_ref())
    }

    pub fn camera_store(&self, name: &str) -> Option<&dyn CameraDataStore> {
        self.cameras.get(name).map(|s| s.as_ref())
    }

    pub fn light_store(&self, name: &str) -> Option<&dyn LightDataStore> {
        self.lights.get(name).map(|s| s.as_ref())
    }

    pub fn material_store(&self, name: &str) -> Option<&dyn MaterialDataStore> {
        self.materials.get(name).map(|s| s.as_ref())
    }

    pub fn pod_store(&self, name: &str) -> Option<&dyn PodDataStore> {
        self.pods.get(name).map(|s| s.as_ref())
    }

    pub fn pod_store_mut(&mut self, name: &str) -> Option<&mut dyn PodDataStore> {
        match self.pods.get_mut(name) {
            Some(store) => Some(store.as_mut()),
            None => None,
        }
    }

    /// Resolves the four frame stores named by `names`.
    ///
    /// The POD store is optional; every other store must be registered.
    pub fn resolve_mut(
        &mut self,
        names: &SceneRenderDataStoreNames,
    ) -> Result<ResolvedDataStores<'_>, GraphicsError> {
        let missing = |name: &str| GraphicsError::MissingDataStore(name.to_string());
        let scene = self
            .scenes
            .get_mut(&names.scene)
            .ok_or_else(|| missing(&names.scene))?;
        let camera = self
            .cameras
            .get_mut(&names.camera)
            .ok_or_else(|| missing(&names.camera))?;
        let light = self
            .lights
            .get_mut(&names.light)
            .ok_or_else(|| missing(&names.light))?;
        let material = self
            .materials
            .get_mut(&names.material)
            .ok_or_else(|| missing(&names.material))?;
        let pod = match self.pods.get_mut(&names.pod) {
            Some(store) => Some(store.as_mut() as &mut dyn PodDataStore),
            None => None,
        };
        Ok(ResolvedDataStores {
            scene: scene.as_mut(),
            camera: camera.as_mut(),
            light: light.as_mut(),
            material: material.as_mut(),
            pod,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_store_is_reported_by_name() {
        let names = SceneRenderDataStoreNames::default();
        let mut manager = RenderDataStoreManager::new();
        manager.register_scene_store(Box::new(DefaultSceneDataStore::new(&names.scene)));
        let err = manager.resolve_mut(&names).err().unwrap();
        assert_eq!(err, GraphicsError::MissingDataStore(names.camera.clone()));
    }

    #[test]
    fn pod_store_is_optional() {
        let names = SceneRenderDataStoreNames {
            pod: "absent".into(),
            ..Default::default()
        };
        let mut manager =
            RenderDataStoreManager::with_default_stores(&SceneRenderDataStoreNames::default());
        let stores = manager.resolve_mut(&names).unwrap();
        assert!(stores.pod.is_none());
    }
}
