//! Import task model.
//!
//! A task has an optional gather step, run on a worker thread with no
//! access to the world, and an optional import step, run on the owning
//! thread with an [`ImportContext`]. Gather results reach the import step
//! (and later tasks) through [`Slot`]s.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use lumen_ecs::{Entity, NameComponent, World};
use lumen_graphics::{GpuResourceManager, RenderHandleReference, ShaderManager};

use super::result::{GltfImportResult, ImportError};
use crate::components::{RenderHandleComponent, UriComponent};

/// Write-once value shared between a producing task and its dependents.
pub(crate) type Slot<T> = Arc<OnceLock<T>>;

pub(crate) fn slot<T>() -> Slot<T> {
    Arc::new(OnceLock::new())
}

/// Worker-thread step of a task.
pub(crate) type GatherFn = Box<dyn FnOnce() -> Result<(), ImportError> + Send>;

/// Owning-thread step of a task.
pub(crate) type ImportFn =
    Box<dyn FnOnce(&mut ImportContext<'_>) -> Result<(), ImportError> + Send>;

/// Boxes a gather step.
pub(crate) fn gather_fn(
    step: impl FnOnce() -> Result<(), ImportError> + Send + 'static,
) -> GatherFn {
    Box::new(step)
}

/// Boxes an import step.
pub(crate) fn import_fn(
    step: impl FnOnce(&mut ImportContext<'_>) -> Result<(), ImportError> + Send + 'static,
) -> ImportFn {
    Box::new(step)
}

/// Import phases, run strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportPhase {
    Buffers,
    Samplers,
    Images,
    Textures,
    Materials,
    AnimationSamplers,
    Animations,
    Skins,
    Meshes,
    Finished,
}

impl ImportPhase {
    /// Phase following this one. `Finished` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Buffers => Self::Samplers,
            Self::Samplers => Self::Images,
            Self::Images => Self::Textures,
            Self::Textures => Self::Materials,
            Self::Materials => Self::AnimationSamplers,
            Self::AnimationSamplers => Self::Animations,
            Self::Animations => Self::Skins,
            Self::Skins => Self::Meshes,
            Self::Meshes | Self::Finished => Self::Finished,
        }
    }
}

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Queued,
    Gather,
    Import,
    Finished,
}

pub(crate) struct ImporterTask {
    pub id: usize,
    pub name: String,
    pub phase: ImportPhase,
    pub state: TaskState,
    pub gather: Option<GatherFn>,
    pub import: Option<ImportFn>,
    pub success: bool,
}

/// Task list under construction.
#[derive(Default)]
pub(crate) struct TaskList {
    pub tasks: Vec<ImporterTask>,
}

impl TaskList {
    pub fn push(
        &mut self,
        name: impl Into<String>,
        phase: ImportPhase,
        gather: Option<GatherFn>,
        import: Option<ImportFn>,
    ) -> usize {
        let id = self.tasks.len();
        self.tasks.push(ImporterTask {
            id,
            name: name.into(),
            phase,
            state: TaskState::Queued,
            gather,
            import,
            success: false,
        });
        id
    }
}

/// Owning-thread state available to import steps.
pub(crate) struct ImportContext<'a> {
    pub world: &'a mut World,
    pub gpu: &'a dyn GpuResourceManager,
    pub shaders: &'a dyn ShaderManager,
    pub result: &'a mut GltfImportResult,
    /// Entities carrying shader and graphics state handles, by path.
    pub handle_entities: &'a mut HashMap<String, Entity>,
}

impl ImportContext<'_> {
    /// Spawns a resource entity identified by `uri`, named `name` or, when
    /// unnamed, by its uri.
    pub fn spawn_resource(&mut self, uri: &str, name: Option<&str>) -> Result<Entity, ImportError> {
        let entity = self.world.spawn();
        self.world.insert(entity, UriComponent::new(uri))?;
        self.world
            .insert(entity, NameComponent::new(name.unwrap_or(uri)))?;
        Ok(entity)
    }

    /// Entity carrying the handle at `path`, created on first use and
    /// shared by every later material. `None` when the backend does not
    /// know the path.
    pub fn handle_entity(
        &mut self,
        path: &str,
        resolve: impl FnOnce(&dyn ShaderManager, &str) -> Option<RenderHandleReference>,
    ) -> Result<Option<Entity>, ImportError> {
        if let Some(&entity) = self.handle_entities.get(path)
            && self.world.is_alive(entity)
        {
            return Ok(Some(entity));
        }
        let existing = self
            .world
            .read::<UriComponent>()?
            .iter()
            .find(|(_, uri)| uri.uri == path)
            .map(|(entity, _)| entity);
        let entity = match existing {
            Some(entity) => entity,
            None => {
                let Some(handle) = resolve(self.shaders, path) else {
                    log::warn!("glTF import: no shader resource at {path}");
                    return Ok(None);
                };
                let entity = self.spawn_resource(path, None)?;
                self.world.insert(entity, RenderHandleComponent::new(handle))?;
                entity
            }
        };
        self.handle_entities.insert(path.to_string(), entity);
        Ok(Some(entity))
    }
}
