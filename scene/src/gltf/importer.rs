//! Phase-ordered import engine.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use bitflags::bitflags;
use lumen_core::compute::{CancellationToken, Countdown, DEFAULT_WORKER_THREADS, WorkerPool};
use lumen_core::gltf::GltfData;
use lumen_ecs::{Entity, World};
use lumen_graphics::{GpuResourceManager, ShaderManager};
use parking_lot::Mutex;

use super::prepare::Preparation;
use super::result::{GltfImportResult, ImportError};
use super::tasks::{GatherFn, ImportContext, ImportPhase, ImporterTask, TaskState};
use crate::components::{UriComponent, register_scene_components};

bitflags! {
    /// Resource kinds an import produces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImportFlags: u32 {
        const SAMPLERS = 1 << 0;
        const IMAGES = 1 << 1;
        const TEXTURES = 1 << 2;
        const MATERIALS = 1 << 3;
        const ANIMATIONS = 1 << 4;
        const SKINS = 1 << 5;
        const MESHES = 1 << 6;
        const SPECULAR_RADIANCE_CUBEMAPS = 1 << 7;
        const ALL = Self::SAMPLERS.bits()
            | Self::IMAGES.bits()
            | Self::TEXTURES.bits()
            | Self::MATERIALS.bits()
            | Self::ANIMATIONS.bits()
            | Self::SKINS.bits()
            | Self::MESHES.bits()
            | Self::SPECULAR_RADIANCE_CUBEMAPS.bits();
    }
}

impl ImportFlags {
    /// Kinds whose tasks read buffer data.
    pub(crate) const BUFFER_READERS: Self = Self::IMAGES
        .union(Self::ANIMATIONS)
        .union(Self::SKINS)
        .union(Self::MESHES)
        .union(Self::SPECULAR_RADIANCE_CUBEMAPS);
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Importer settings.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Worker threads running gather steps.
    pub worker_threads: usize,
    /// Resource namespace of synthesized uris. `None` uses the asset's own
    /// default resources name.
    pub resources_name: Option<String>,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            resources_name: None,
        }
    }
}

/// Progress callbacks of an asynchronous import, invoked on the thread
/// calling [`GltfImporter::execute`].
pub trait ImportListener: Send + Sync {
    fn on_import_started(&self) {}

    /// `completed` of `total` tasks have finished, successfully or not.
    fn on_import_progressed(&self, _completed: usize, _total: usize) {}

    /// Every phase has run. Not called for a cancelled import.
    fn on_import_finished(&self, _result: &GltfImportResult) {}
}

type GatherOutcomes = Arc<Mutex<HashMap<usize, Result<(), ImportError>>>>;

/// Imports the resources of glTF assets into a [`World`].
///
/// One import runs at a time; starting another cancels the one in flight.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lumen_core::gltf::{GltfData, GltfSampler};
/// use lumen_ecs::World;
/// use lumen_graphics::dummy::{DummyGpuResourceManager, DummyShaderManager};
/// use lumen_scene::gltf::{GltfImporter, ImportFlags, ImporterConfig};
///
/// let mut data = GltfData::new("models/box.gltf");
/// data.samplers.push(GltfSampler::default());
///
/// let mut world = World::new();
/// let mut importer = GltfImporter::new(
///     Arc::new(DummyGpuResourceManager::new()),
///     Arc::new(DummyShaderManager::new()),
///     ImporterConfig::default(),
/// );
/// let result = importer.import_gltf(&mut world, Arc::new(data), ImportFlags::ALL);
/// assert!(result.success);
/// assert!(result.samplers[0].is_some());
/// ```
pub struct GltfImporter {
    gpu: Arc<dyn GpuResourceManager>,
    shaders: Arc<dyn ShaderManager>,
    config: ImporterConfig,
    pool: WorkerPool,
    cancellation: CancellationToken,
    countdown: Arc<Countdown>,
    outcomes: GatherOutcomes,
    tasks: Vec<ImporterTask>,
    phase: ImportPhase,
    import_queue: VecDeque<usize>,
    completed: usize,
    result: GltfImportResult,
    listener: Option<Arc<dyn ImportListener>>,
    handle_entities: HashMap<String, Entity>,
}

impl GltfImporter {
    pub fn new(
        gpu: Arc<dyn GpuResourceManager>,
        shaders: Arc<dyn ShaderManager>,
        config: ImporterConfig,
    ) -> Self {
        let pool = WorkerPool::new(config.worker_threads);
        Self {
            gpu,
            shaders,
            config,
            pool,
            cancellation: CancellationToken::new(),
            countdown: Arc::new(Countdown::new()),
            outcomes: Arc::new(Mutex::new(HashMap::new())),
            tasks: Vec::new(),
            phase: ImportPhase::Finished,
            import_queue: VecDeque::new(),
            completed: 0,
            result: GltfImportResult::default(),
            listener: None,
            handle_entities: HashMap::new(),
        }
    }

    /// Imports the `flags` kinds of `data`, blocking until every phase has
    /// run.
    pub fn import_gltf(
        &mut self,
        world: &mut World,
        data: Arc<GltfData>,
        flags: ImportFlags,
    ) -> &GltfImportResult {
        self.prepare(world, data, flags, None);
        self.execute(world, 0);
        &self.result
    }

    /// Starts importing the `flags` kinds of `data`. Nothing is imported
    /// until [`execute`](Self::execute) is called.
    pub fn import_gltf_async(
        &mut self,
        world: &mut World,
        data: Arc<GltfData>,
        flags: ImportFlags,
        listener: Option<Arc<dyn ImportListener>>,
    ) {
        self.prepare(world, data, flags, listener);
    }

    /// Advances the import. Returns `true` once every phase has run.
    ///
    /// Import steps run until `time_budget_us` microseconds have passed; a
    /// budget of zero runs every remaining phase, waiting for worker threads
    /// where needed.
    pub fn execute(&mut self, world: &mut World, time_budget_us: u64) -> bool {
        lumen_core::profile_scope!("gltf_import_execute");
        let start = Instant::now();
        let over_budget =
            || time_budget_us > 0 && start.elapsed().as_micros() >= u128::from(time_budget_us);

        loop {
            if self.phase == ImportPhase::Finished {
                return true;
            }
            self.harvest_gathers();
            while let Some(id) = self.import_queue.pop_front() {
                self.run_import(world, id);
                if over_budget() {
                    return false;
                }
            }
            let gathering = self
                .tasks
                .iter()
                .any(|t| t.phase == self.phase && t.state == TaskState::Gather);
            if gathering {
                if time_budget_us > 0 {
                    return false;
                }
                self.countdown.wait();
                continue;
            }
            self.advance_phase();
        }
    }

    /// Stops the import in flight.
    ///
    /// Waits for running gather steps, drops every task that has not run
    /// and marks the import finished without notifying the listener.
    /// Resources imported before the call stay in the world.
    pub fn cancel(&mut self) {
        if self.phase == ImportPhase::Finished {
            return;
        }
        self.cancellation.cancel();
        self.countdown.wait();
        self.countdown.take_finished();
        self.outcomes.lock().clear();
        self.import_queue.clear();
        self.tasks.clear();
        self.phase = ImportPhase::Finished;
        self.listener = None;
        self.result.push_error(&ImportError::Cancelled);
        log::info!("glTF import cancelled after {} tasks", self.completed);
    }

    /// Entities produced so far.
    pub fn result(&self) -> &GltfImportResult {
        &self.result
    }

    /// `true` when no import is in flight.
    pub fn is_completed(&self) -> bool {
        self.phase == ImportPhase::Finished
    }

    /// Phase the import in flight is in.
    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    fn prepare(
        &mut self,
        world: &mut World,
        data: Arc<GltfData>,
        flags: ImportFlags,
        listener: Option<Arc<dyn ImportListener>>,
    ) {
        self.cancel();
        self.cancellation.reset();
        register_scene_components(world);

        let existing: HashMap<String, Entity> = world
            .read::<UriComponent>()
            .map(|uris| uris.iter().map(|(e, u)| (u.uri.clone(), e)).collect())
            .unwrap_or_default();
        let resources_name = self
            .config
            .resources_name
            .clone()
            .unwrap_or_else(|| data.default_resources_name.clone());

        self.result = GltfImportResult::sized_for(&data);
        self.completed = 0;
        let filepath = data.filepath.clone();
        self.tasks = Preparation {
            data,
            flags,
            resources_name: &resources_name,
            existing: &existing,
        }
        .build(&mut self.result)
        .tasks;
        log::info!(
            "glTF import of {filepath} started: {} tasks ({flags:?})",
            self.tasks.len()
        );

        self.listener = listener;
        if let Some(listener) = &self.listener {
            listener.on_import_started();
        }
        self.phase = ImportPhase::Buffers;
        self.start_phase();
    }

    fn advance_phase(&mut self) {
        self.phase = self.phase.next();
        if self.phase == ImportPhase::Finished {
            self.finish();
        } else {
            log::debug!("glTF import: entering phase {:?}", self.phase);
            self.start_phase();
        }
    }

    /// Dispatches the gather steps of the current phase and queues tasks
    /// that only import.
    fn start_phase(&mut self) {
        let phase = self.phase;
        for index in 0..self.tasks.len() {
            let task = &mut self.tasks[index];
            if task.phase != phase || task.state != TaskState::Queued {
                continue;
            }
            match task.gather.take() {
                Some(gather) => {
                    task.state = TaskState::Gather;
                    let name = task.name.clone();
                    self.dispatch_gather(index, name, gather);
                }
                None => {
                    task.state = TaskState::Import;
                    self.import_queue.push_back(index);
                }
            }
        }
    }

    fn dispatch_gather(&self, id: usize, name: String, gather: GatherFn) {
        let token = self.cancellation.clone();
        let countdown = Arc::clone(&self.countdown);
        let outcomes = Arc::clone(&self.outcomes);
        countdown.add(1);
        self.pool.submit(Box::new(move || {
            lumen_core::profile_scope!("gltf_gather");
            let outcome = match token.check() {
                Ok(()) => std::panic::catch_unwind(AssertUnwindSafe(gather))
                    .unwrap_or_else(|_| Err(ImportError::Panicked { resource: name })),
                Err(cancelled) => Err(cancelled.into()),
            };
            outcomes.lock().insert(id, outcome);
            countdown.signal(id);
        }));
    }

    /// Moves gather steps finished on worker threads on to their import
    /// step.
    fn harvest_gathers(&mut self) {
        let finished = self.countdown.take_finished();
        if finished.is_empty() {
            return;
        }
        let outcomes: Vec<_> = {
            let mut outcomes = self.outcomes.lock();
            finished
                .into_iter()
                .map(|id| (id, outcomes.remove(&id)))
                .collect()
        };
        for (id, outcome) in outcomes {
            let Some(task) = self.tasks.get_mut(id) else {
                continue;
            };
            match outcome {
                Some(Ok(())) if task.import.is_some() => {
                    task.state = TaskState::Import;
                    self.import_queue.push_back(id);
                }
                Some(outcome) => self.finish_task(id, outcome),
                None => {
                    let resource = task.name.clone();
                    self.finish_task(id, Err(ImportError::Panicked { resource }));
                }
            }
        }
    }

    fn run_import(&mut self, world: &mut World, id: usize) {
        let Some(import) = self.tasks.get_mut(id).and_then(|t| t.import.take()) else {
            self.finish_task(id, Ok(()));
            return;
        };
        let outcome = match self.cancellation.check() {
            Ok(()) => {
                let mut ctx = ImportContext {
                    world,
                    gpu: self.gpu.as_ref(),
                    shaders: self.shaders.as_ref(),
                    result: &mut self.result,
                    handle_entities: &mut self.handle_entities,
                };
                import(&mut ctx)
            }
            Err(cancelled) => Err(cancelled.into()),
        };
        self.finish_task(id, outcome);
    }

    fn finish_task(&mut self, id: usize, outcome: Result<(), ImportError>) {
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        task.state = TaskState::Finished;
        task.success = outcome.is_ok();
        match outcome {
            Ok(()) => log::trace!("glTF import: {} done", task.name),
            Err(error) => {
                log::error!("glTF import: {} failed: {error}", task.name);
                self.result.push_error(&error);
            }
        }
        self.completed += 1;
        lumen_core::profile_plot!("gltf import tasks", self.completed);
        if let Some(listener) = &self.listener {
            listener.on_import_progressed(self.completed, self.tasks.len());
        }
    }

    fn finish(&mut self) {
        let failed = self.tasks.iter().filter(|t| !t.success).count();
        log::info!(
            "glTF import finished: {} tasks, {failed} failed",
            self.tasks.len()
        );
        self.tasks.clear();
        self.import_queue.clear();
        if let Some(listener) = self.listener.take() {
            listener.on_import_finished(&self.result);
        }
    }
}

impl Drop for GltfImporter {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::gltf::{GltfSampler, GltfTexture};
    use lumen_graphics::dummy::{DummyGpuResourceManager, DummyShaderManager};

    use super::*;

    fn importer() -> GltfImporter {
        GltfImporter::new(
            Arc::new(DummyGpuResourceManager::new()),
            Arc::new(DummyShaderManager::new()),
            ImporterConfig::default(),
        )
    }

    fn samplers_only() -> Arc<GltfData> {
        let mut data = GltfData::new("mem/samplers.gltf");
        data.samplers.push(GltfSampler::default());
        data.textures.push(GltfTexture {
            name: None,
            image: None,
            sampler: Some(0),
        });
        Arc::new(data)
    }

    #[test]
    fn idle_importer_is_completed() {
        let mut importer = importer();
        let mut world = World::new();
        assert!(importer.is_completed());
        assert!(importer.execute(&mut world, 0));
    }

    #[test]
    fn synchronous_import_runs_every_phase() {
        let mut importer = importer();
        let mut world = World::new();
        let result = importer
            .import_gltf(&mut world, samplers_only(), ImportFlags::ALL)
            .clone();
        assert!(result.success, "{}", result.error);
        assert!(result.samplers[0].is_some());
        assert_eq!(result.textures[0].sampler, result.samplers[0]);
        assert!(importer.is_completed());
    }

    #[test]
    fn cancel_marks_finished_and_failed() {
        let mut importer = importer();
        let mut world = World::new();
        importer.import_gltf_async(&mut world, samplers_only(), ImportFlags::ALL, None);
        assert!(!importer.is_completed());
        importer.cancel();
        assert!(importer.is_completed());
        assert!(!importer.result().success);
        assert_eq!(importer.result().samplers, vec![None]);
        assert!(importer.execute(&mut world, 0));
    }

    #[test]
    fn buffer_readers_exclude_import_only_kinds() {
        assert!(!ImportFlags::BUFFER_READERS.contains(ImportFlags::SAMPLERS));
        assert!(!ImportFlags::BUFFER_READERS.contains(ImportFlags::TEXTURES));
        assert!(!ImportFlags::BUFFER_READERS.contains(ImportFlags::MATERIALS));
        assert!(ImportFlags::ALL.contains(ImportFlags::BUFFER_READERS));
    }
}
