use lumen_ecs::{Entity, World};
use lumen_graphics::data_store::{PodDataStore, ResolvedDataStores};

use super::{POST_PROCESS_POD_TYPE, RenderSystem, read};
use crate::components::{PostProcessComponent, PostProcessConfiguration};

impl RenderSystem {
    /// POD entry name of a post-process entity; the main name for `None`.
    pub(super) fn post_process_name(&self, entity: Option<Entity>) -> String {
        match entity {
            Some(entity) => format!("{}{}", self.config.post_process_name_prefix, entity.id()),
            None => self.config.main_post_process_name.clone(),
        }
    }

    /// Writes every post-process component into the POD store, plus a
    /// default entry under the main name for cameras without one. Entries
    /// are updated in place while their size matches and recreated
    /// otherwise.
    pub(super) fn process_post_processes(
        &mut self,
        world: &World,
        stores: &mut ResolvedDataStores<'_>,
    ) {
        lumen_core::profile_scope!("process_post_processes");

        let Some(pod) = stores.pod.as_deref_mut() else {
            return;
        };

        let main_name = self.post_process_name(None);
        if pod.get(&main_name).is_none() {
            self.write_post_process(&mut *pod, main_name, &PostProcessConfiguration::default());
        }

        let Some(post_processes) = read::<PostProcessComponent>(world) else {
            return;
        };
        for (entity, post_process) in post_processes.iter() {
            let name = self.post_process_name(Some(entity));
            self.write_post_process(&mut *pod, name, &post_process.configuration);
        }
    }

    fn write_post_process(
        &mut self,
        pod: &mut dyn PodDataStore,
        name: String,
        configuration: &PostProcessConfiguration,
    ) {
        let bytes = bytemuck::bytes_of(configuration);
        if pod.set(&name, bytes) {
            return;
        }

        pod.destroy_pod(POST_PROCESS_POD_TYPE, &name);
        match pod.create_pod(POST_PROCESS_POD_TYPE, &name, bytes) {
            Ok(()) => {
                if !self.pod_names.contains(&name) {
                    self.pod_names.push(name);
                }
            }
            Err(e) => self.log_once.error(
                &format!("post_process_{name}"),
                format_args!("RenderSystem: cannot create post-process entry {name}: {e}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lumen_graphics::data_store::RenderDataStoreManager;
    use lumen_graphics::dummy::{
        DummyGpuResourceManager, DummyRenderNodeGraphManager, DummyShaderManager,
    };
    use lumen_graphics::render_data::SceneRenderDataStoreNames;
    use parking_lot::Mutex;

    use super::*;
    use crate::render_system::{MAIN_POST_PROCESS_NAME, RenderContext, RenderSystemConfig};

    fn system() -> RenderSystem {
        let names = SceneRenderDataStoreNames::default();
        RenderSystem::new(
            RenderContext {
                gpu: Arc::new(DummyGpuResourceManager::new()),
                shaders: Arc::new(DummyShaderManager::new()),
                render_node_graphs: Arc::new(DummyRenderNodeGraphManager::new()),
                data_stores: Arc::new(Mutex::new(RenderDataStoreManager::with_default_stores(
                    &names,
                ))),
            },
            RenderSystemConfig::default(),
        )
    }

    #[test]
    fn names_follow_entity_ids() {
        let system = system();
        assert_eq!(system.post_process_name(None), MAIN_POST_PROCESS_NAME);
        assert_eq!(
            system.post_process_name(Some(Entity::from_id(42))),
            "RenderDataStorePod.PostProcess.42"
        );
    }
}
