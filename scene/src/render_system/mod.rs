//! Per-frame scene extraction.
//!
//! [`RenderSystem::update`] walks the world once per frame and writes
//! cameras, lights, materials, mesh instances and the ordered list of render
//! node graphs into the render data stores. The steps run in a fixed order
//! because later steps consume earlier results:
//!
//! 1. resolve the active render configuration
//! 2. resolve the main camera and push shadow settings
//! 3. initialize the frame's [`RenderScene`]
//! 4. cameras, including a derived color pre-pass camera
//! 5. planar reflections
//! 6. post-process settings
//! 7. renderables and instancing batches
//! 8. scene bounding sphere
//! 9. lights and their shadow cameras
//! 10. render node graph ordering
//! 11. publish the scene and prune per-camera caches
//!
//! Cross-frame state (previous camera matrices, cached render node graphs,
//! batch accumulation lists and the smoothed scene sphere) lives on the
//! system itself.

mod cameras;
mod config;
mod lights;
mod materials;
mod post_process;
mod reflections;
mod render_node_graphs;
mod renderables;
mod scene_bounds;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lumen_core::log_once::LogOnce;
use lumen_core::math::{Aabb, Mat4, Vec4};
use lumen_ecs::hierarchy::is_effectively_enabled;
use lumen_ecs::{
    Component, ComponentQuery, ComponentRead, ComponentStore, Entity, NodeComponent, World,
    WorldMatrixComponent,
};
use lumen_graphics::data_store::{RenderDataStoreManager, ResolvedDataStores};
use lumen_graphics::render_data::{RenderCamera, RenderScene};
use lumen_graphics::{
    GpuResourceManager, RenderHandleReference, RenderNodeGraphManager, ShaderManager,
};
use parking_lot::Mutex;

use crate::components::{
    CameraComponent, CameraSceneFlags, EnvironmentComponent, LightComponent,
    PlanarReflectionComponent, RenderConfigurationComponent, RenderHandleComponent,
    RenderMeshComponent,
};

pub use cameras::{COLOR_PRE_PASS_CAMERA_ID, PreviousCameraData};
pub use config::{
    BatchAabbMode, DEFAULT_MAX_BATCH_INSTANCES, DEFAULT_REFLECTION_MIP_COUNT, LIGHT_RANGE_EPSILON,
    MAIN_POST_PROCESS_NAME, MIN_REFLECTION_MIP_COUNT, POST_PROCESS_NAME_PREFIX,
    POST_PROCESS_POD_TYPE, RenderSystemConfig,
};
pub use lights::safe_light_range;
pub use materials::DEFAULT_MATERIAL_ID;
pub use reflections::ReflectionTargetUpdate;
pub use scene_bounds::SceneBoundingSphere;

/// Collaborators the render system talks to. All of them must outlive the
/// system.
#[derive(Clone)]
pub struct RenderContext {
    pub gpu: Arc<dyn GpuResourceManager>,
    pub shaders: Arc<dyn ShaderManager>,
    pub render_node_graphs: Arc<dyn RenderNodeGraphManager>,
    pub data_stores: Arc<Mutex<RenderDataStoreManager>>,
}

/// Scratch state of one [`RenderSystem::update`] call.
#[derive(Default)]
pub(crate) struct FrameState {
    pub configuration: RenderConfigurationComponent,
    pub main_camera: Option<Entity>,
    pub main_render_camera: Option<RenderCamera>,
    /// World bounds of every submesh processed this frame.
    pub submesh_bounds: Vec<Aabb>,
}

/// Time inputs of one frame, in microseconds.
#[derive(Debug, Clone, Copy, Default)]
struct FrameTime {
    total_us: u64,
    delta_us: u64,
}

struct RenderQueries {
    renderables: ComponentQuery,
    lights: ComponentQuery,
    reflections: ComponentQuery,
}

impl RenderQueries {
    fn new() -> Self {
        Self {
            renderables: ComponentQuery::new()
                .with::<RenderMeshComponent>()
                .with::<NodeComponent>()
                .with::<WorldMatrixComponent>(),
            lights: ComponentQuery::new()
                .with::<LightComponent>()
                .with::<NodeComponent>()
                .with::<WorldMatrixComponent>(),
            reflections: ComponentQuery::new()
                .with::<PlanarReflectionComponent>()
                .with::<NodeComponent>()
                .with::<WorldMatrixComponent>(),
        }
    }

    fn set_listening(&mut self, listening: bool) {
        self.renderables.set_listening(listening);
        self.lights.set_listening(listening);
        self.reflections.set_listening(listening);
    }
}

/// Cached render node graph of one camera.
struct CameraGraphEntry {
    graph: RenderHandleReference,
    msaa: bool,
    post_process_name: String,
    pipeline_type: lumen_graphics::render_data::RenderPipelineType,
    last_frame: u64,
    auto_destroy: bool,
}

/// One placed mesh. Batch members wait as these until their batch is
/// flushed.
#[derive(Debug, Clone)]
struct MeshInstance {
    entity: Entity,
    mesh: Entity,
    layer_mask: u64,
    /// Entity carrying the joint matrices of a skinned instance.
    joints: Option<Entity>,
    world: Mat4,
    prev_world: Mat4,
    custom_data: Vec4,
}

/// Scene to render data extraction.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lumen_ecs::World;
/// use lumen_graphics::data_store::RenderDataStoreManager;
/// use lumen_graphics::dummy::{
///     DummyGpuResourceManager, DummyRenderNodeGraphManager, DummyShaderManager,
/// };
/// use lumen_graphics::render_data::SceneRenderDataStoreNames;
/// use lumen_scene::components::register_scene_components;
/// use lumen_scene::render_system::{RenderContext, RenderSystem, RenderSystemConfig};
///
/// let stores = RenderDataStoreManager::with_default_stores(&SceneRenderDataStoreNames::default());
/// let context = RenderContext {
///     gpu: Arc::new(DummyGpuResourceManager::new()),
///     shaders: Arc::new(DummyShaderManager::new()),
///     render_node_graphs: Arc::new(DummyRenderNodeGraphManager::new()),
///     data_stores: Arc::new(parking_lot::Mutex::new(stores)),
/// };
/// let mut system = RenderSystem::new(context, RenderSystemConfig::default());
///
/// let mut world = World::new();
/// register_scene_components(&mut world);
/// assert!(system.update(&world, true, 0, 16_000));
/// assert_eq!(system.frame_index(), 1);
/// ```
pub struct RenderSystem {
    context: RenderContext,
    config: RenderSystemConfig,
    active: bool,
    initialized: bool,
    frame_index: u64,
    log_once: LogOnce,
    queries: RenderQueries,
    camera_data: HashMap<u64, PreviousCameraData>,
    graph_cache: HashMap<u64, CameraGraphEntry>,
    scene_graph: RenderHandleReference,
    /// Keyed by batch entity id so flushing order is stable.
    batches: BTreeMap<u64, (Entity, Vec<MeshInstance>)>,
    scene_bounds: Option<SceneBoundingSphere>,
    pod_names: Vec<String>,
    reflection_updates: Vec<ReflectionTargetUpdate>,
}

impl RenderSystem {
    /// Creates an active, initialized system.
    pub fn new(context: RenderContext, config: RenderSystemConfig) -> Self {
        let mut system = Self {
            context,
            config,
            active: true,
            initialized: false,
            frame_index: 0,
            log_once: LogOnce::new(),
            queries: RenderQueries::new(),
            camera_data: HashMap::new(),
            graph_cache: HashMap::new(),
            scene_graph: RenderHandleReference::default(),
            batches: BTreeMap::new(),
            scene_bounds: None,
            pod_names: Vec::new(),
            reflection_updates: Vec::new(),
        };
        system.initialize();
        system
    }

    /// Enables incremental tracking on the component queries.
    pub fn initialize(&mut self) {
        self.queries.set_listening(true);
        self.initialized = true;
        log::debug!("RenderSystem: initialized");
    }

    /// Disables incremental tracking; queries rescan every frame.
    pub fn uninitialize(&mut self) {
        self.queries.set_listening(false);
        self.initialized = false;
        log::debug!("RenderSystem: uninitialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// While inactive, [`update`](Self::update) leaves the data stores untouched.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &RenderSystemConfig {
        &self.config
    }

    /// Number of frames extracted so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Smoothed scene bounding sphere, once any geometry was seen.
    pub fn scene_bounding_sphere(&self) -> Option<SceneBoundingSphere> {
        self.scene_bounds
    }

    /// Reflection target decisions of the last frame, one per processed
    /// reflection.
    pub fn reflection_updates(&self) -> &[ReflectionTargetUpdate] {
        &self.reflection_updates
    }

    /// Extracts one frame.
    ///
    /// Returns `false` without doing anything when rendering was not
    /// requested or the system is inactive. When the configured data stores
    /// are missing the frame is skipped with a one-time warning and `true`
    /// is returned.
    pub fn update(
        &mut self,
        world: &World,
        frame_rendering_queued: bool,
        total_time_us: u64,
        delta_time_us: u64,
    ) -> bool {
        lumen_core::profile_function!();

        if !frame_rendering_queued || !self.active {
            return false;
        }

        let data_stores = Arc::clone(&self.context.data_stores);
        let mut manager = data_stores.lock();
        let mut stores = match manager.resolve_mut(&self.config.data_store_names) {
            Ok(stores) => stores,
            Err(e) => {
                self.log_once.warn(
                    "render_system_data_stores",
                    format_args!("RenderSystem: {e}, skipping scene extraction"),
                );
                return true;
            }
        };
        self.log_once.reset("render_system_data_stores");

        stores.scene.clear();
        stores.camera.clear();
        stores.light.clear();
        stores.material.clear();

        self.fetch_full_scene(
            world,
            &mut stores,
            FrameTime {
                total_us: total_time_us,
                delta_us: delta_time_us,
            },
        );
        self.frame_index += 1;
        true
    }

    fn fetch_full_scene(
        &mut self,
        world: &World,
        stores: &mut ResolvedDataStores<'_>,
        time: FrameTime,
    ) {
        lumen_core::profile_function!();

        let mut frame = FrameState {
            configuration: resolve_configuration(world).unwrap_or_default(),
            main_camera: resolve_main_camera(world),
            ..Default::default()
        };
        stores
            .light
            .set_shadow_types(frame.configuration.shadow_types());

        let mut scene = self.init_render_scene(world, &frame.configuration, time);

        self.process_cameras(world, stores, &mut frame);
        self.process_reflections(world, stores, &frame);
        self.process_post_processes(world, stores);
        self.process_renderables(world, stores, &mut frame);

        let sphere = self.calculate_scene_bounds(&frame.submesh_bounds);
        scene.world_scene_center = sphere.center;
        scene.world_scene_bounding_sphere_radius = sphere.radius;

        self.process_lights(world, stores, &sphere);

        if frame.configuration.create_render_node_graphs {
            scene.render_node_graphs = self.process_render_node_graphs(stores.camera.cameras(), &scene);
        }

        log::trace!(
            "RenderSystem: frame {} with {} cameras, {} lights, {} submeshes",
            self.frame_index,
            stores.camera.camera_count(),
            stores.light.lights().len(),
            stores.material.submeshes().len()
        );

        stores.scene.set_scene(scene);
        self.prune_camera_data();
    }

    fn init_render_scene(
        &self,
        world: &World,
        configuration: &RenderConfigurationComponent,
        time: FrameTime,
    ) -> RenderScene {
        let handles = read::<RenderHandleComponent>(world);
        let custom_render_node_graph = configuration
            .environment
            .and_then(|e| world.get_cloned::<EnvironmentComponent>(e))
            .map(|environment| handle_of(handles.as_deref(), environment.custom_render_node_graph))
            .unwrap_or_default();

        RenderScene {
            name: self.config.scene_name.clone(),
            data_store_names: self.config.data_store_names.clone(),
            custom_render_node_graph,
            frame_index: (self.frame_index % (1u64 << 32)) as u32,
            total_time: time.total_us as f32 / 1_000_000.0,
            delta_time_ms: time.delta_us as f32 / 1000.0,
            delta_time_s: time.delta_us as f32 / 1_000_000.0,
            ..Default::default()
        }
    }
}

impl Drop for RenderSystem {
    fn drop(&mut self) {
        if self.pod_names.is_empty() {
            return;
        }
        let mut manager = self.context.data_stores.lock();
        if let Some(pod) = manager.pod_store_mut(&self.config.data_store_names.pod) {
            for name in self.pod_names.drain(..) {
                pod.destroy_pod(POST_PROCESS_POD_TYPE, &name);
            }
        }
    }
}

/// First render configuration whose node is effectively enabled.
fn resolve_configuration(world: &World) -> Option<RenderConfigurationComponent> {
    let configurations = read::<RenderConfigurationComponent>(world)?;
    let nodes = read::<NodeComponent>(world);
    configurations
        .iter()
        .find(|(entity, _)| is_enabled(nodes.as_deref(), *entity))
        .map(|(_, configuration)| configuration.clone())
}

/// First camera flagged as the main camera whose node is effectively
/// enabled.
fn resolve_main_camera(world: &World) -> Option<Entity> {
    let cameras = read::<CameraComponent>(world)?;
    let nodes = read::<NodeComponent>(world);
    cameras
        .iter()
        .find(|(entity, camera)| {
            camera.scene_flags.contains(CameraSceneFlags::MAIN_CAMERA)
                && is_enabled(nodes.as_deref(), *entity)
        })
        .map(|(entity, _)| entity)
}

/// Store guard, or `None` when the kind is not registered.
pub(crate) fn read<T: Component>(world: &World) -> Option<ComponentRead<'_, T>> {
    world.read::<T>().ok()
}

pub(crate) fn is_enabled(nodes: Option<&ComponentStore<NodeComponent>>, entity: Entity) -> bool {
    nodes.is_none_or(|nodes| is_effectively_enabled(nodes, entity))
}

pub(crate) fn world_matrix_of(
    matrices: Option<&ComponentStore<WorldMatrixComponent>>,
    entity: Entity,
) -> Mat4 {
    matrices
        .and_then(|m| m.get(entity))
        .map(|m| m.matrix)
        .unwrap_or_else(Mat4::identity)
}

/// Render handle carried by `entity`, or an invalid handle.
pub(crate) fn handle_of(
    handles: Option<&ComponentStore<RenderHandleComponent>>,
    entity: Option<Entity>,
) -> RenderHandleReference {
    entity
        .and_then(|e| handles.and_then(|h| h.get(e)))
        .map(|h| h.reference.clone())
        .unwrap_or_default()
}
