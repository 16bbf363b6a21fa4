mod common;

use std::sync::Arc;

use common::{Harness, spawn_mesh, spawn_node, world};
use lumen_core::math::{Mat4, Vec3};
use lumen_ecs::{NodeComponent, TransformComponent, WorldMatrixComponent};
use lumen_graphics::data_store::RenderDataStoreManager;
use lumen_graphics::dummy::{
    DummyGpuResourceManager, DummyRenderNodeGraphManager, DummyShaderManager,
};
use lumen_graphics::render_data::RenderCameraFlags;
use lumen_scene::components::{
    CameraComponent, CameraPipelineFlags, CameraProjection, LAYER_NONE, LayerComponent,
    LightComponent, MaterialComponent, PostProcessComponent, PostProcessConfiguration,
    RenderMeshBatchComponent, RenderMeshComponent,
};
use lumen_scene::render_system::{
    COLOR_PRE_PASS_CAMERA_ID, DEFAULT_MATERIAL_ID, MAIN_POST_PROCESS_NAME, RenderContext,
    RenderSystem, RenderSystemConfig,
};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Frame gating
// ---------------------------------------------------------------------------

#[test]
fn unqueued_or_inactive_frames_are_skipped() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let world = world();

    assert!(!harness.system.update(&world, false, 0, 16_000));
    harness.system.set_active(false);
    assert!(!harness.system.update(&world, true, 0, 16_000));
    assert_eq!(harness.system.frame_index(), 0);

    harness.system.set_active(true);
    harness.frame(&world);
    assert_eq!(harness.system.frame_index(), 1);
}

#[test]
fn uninitialized_system_still_sees_new_entities() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    assert!(harness.system.is_initialized());
    harness.system.uninitialize();
    assert!(!harness.system.is_initialized());
    assert!(harness.system.is_active());

    let mut world = world();
    harness.frame(&world);
    assert!(harness.cameras().is_empty());

    let main = spawn_node(&mut world, Vec3::zeros());
    world.insert(main, CameraComponent::main(640, 480)).unwrap();
    harness.frame(&world);
    assert_eq!(harness.cameras().len(), 1);

    harness.system.initialize();
    harness.frame(&world);
    assert_eq!(harness.cameras().len(), 1);
}

#[test]
fn missing_data_stores_skip_extraction() {
    common::init_logger();
    let mut system = RenderSystem::new(
        RenderContext {
            gpu: Arc::new(DummyGpuResourceManager::new()),
            shaders: Arc::new(DummyShaderManager::new()),
            render_node_graphs: Arc::new(DummyRenderNodeGraphManager::new()),
            data_stores: Arc::new(Mutex::new(RenderDataStoreManager::new())),
        },
        RenderSystemConfig::default(),
    );
    let world = world();

    assert!(system.update(&world, true, 0, 16_000));
    assert!(system.update(&world, true, 0, 16_000));
    assert_eq!(system.frame_index(), 0);
}

#[test]
fn scene_carries_frame_timing() {
    let mut harness = Harness::new(RenderSystemConfig::default().with_scene_name("level"));
    let world = world();
    assert!(harness.system.update(&world, true, 2_500_000, 20_000));

    let scene = harness.scene();
    assert_eq!(scene.name, "level");
    assert_eq!(scene.frame_index, 0);
    assert!((scene.total_time - 2.5).abs() < 1e-6);
    assert!((scene.delta_time_ms - 20.0).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Cameras
// ---------------------------------------------------------------------------

#[test]
fn previous_camera_matrices_lag_one_frame() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let camera = spawn_node(&mut world, Vec3::new(0.0, 0.0, 5.0));
    world.insert(camera, CameraComponent::main(800, 600)).unwrap();

    harness.frame(&world);
    let first = harness.cameras();
    assert_eq!(first.len(), 1);
    assert!(first[0].is_main());
    assert_eq!(first[0].matrices.view_prev, first[0].matrices.view);

    let moved = TransformComponent::from_position(Vec3::new(0.0, 0.0, 8.0));
    world
        .insert(
            camera,
            WorldMatrixComponent {
                matrix: moved.to_matrix(),
            },
        )
        .unwrap();
    harness.frame(&world);
    let second = harness.cameras();
    assert_eq!(second[0].matrices.view_prev, first[0].matrices.view);
    assert_ne!(second[0].matrices.view, first[0].matrices.view);
}

#[test]
fn inactive_non_main_camera_is_ignored() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let main = spawn_node(&mut world, Vec3::zeros());
    world.insert(main, CameraComponent::main(640, 480)).unwrap();
    let idle = spawn_node(&mut world, Vec3::zeros());
    world.insert(idle, CameraComponent::default()).unwrap();

    harness.frame(&world);
    assert_eq!(harness.cameras().len(), 1);
}

#[test]
fn disabled_main_camera_yields_to_the_next_enabled_one() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let hidden = spawn_node(&mut world, Vec3::zeros());
    world.insert(hidden, CameraComponent::main(640, 480)).unwrap();
    world
        .insert(
            hidden,
            NodeComponent {
                parent: None,
                enabled: false,
            },
        )
        .unwrap();

    harness.frame(&world);
    assert!(harness.cameras().is_empty());
    assert_eq!(harness.graph_cameras(), vec![None]);

    let fallback = spawn_node(&mut world, Vec3::new(0.0, 0.0, 3.0));
    world.insert(fallback, CameraComponent::main(320, 240)).unwrap();
    harness.frame(&world);
    let cameras = harness.cameras();
    assert_eq!(cameras.len(), 1);
    assert!(cameras[0].is_main());
    assert_eq!(cameras[0].id, fallback.id());
    assert_eq!(cameras[0].main_camera_id, fallback.id());
    assert_eq!(harness.graph_cameras(), vec![None, Some(fallback.id())]);
}

/// Whether the single main camera, placed by `world_matrix` and projecting
/// with `projection`, renders with inverted winding.
fn main_camera_winding(world_matrix: Mat4, projection: Option<CameraProjection>) -> bool {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let camera = spawn_node(&mut world, Vec3::zeros());
    world
        .insert(camera, WorldMatrixComponent { matrix: world_matrix })
        .unwrap();
    let mut component = CameraComponent::main(640, 480);
    if let Some(projection) = projection {
        component = component.with_projection(projection);
    }
    world.insert(camera, component).unwrap();

    harness.frame(&world);
    let cameras = harness.cameras();
    assert_eq!(cameras.len(), 1);
    cameras[0].flags.contains(RenderCameraFlags::INVERSE_WINDING)
}

#[test]
fn mirrored_camera_inverts_winding() {
    let mirrored = Mat4::new_nonuniform_scaling(&Vec3::new(-1.0, 1.0, 1.0));
    assert!(main_camera_winding(mirrored, None));
    assert!(!main_camera_winding(Mat4::identity(), None));
    assert!(!main_camera_winding(
        Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)),
        None
    ));
}

#[test]
fn negative_custom_projection_toggles_winding() {
    let flipped =
        CameraProjection::Custom(Mat4::new_nonuniform_scaling(&Vec3::new(1.0, -1.0, 1.0)));
    let mirrored = Mat4::new_nonuniform_scaling(&Vec3::new(-1.0, 1.0, 1.0));
    assert!(!main_camera_winding(mirrored, Some(flipped)));
    assert!(main_camera_winding(Mat4::identity(), Some(flipped)));

    let plain = CameraProjection::Custom(Mat4::new_scaling(2.0));
    assert!(main_camera_winding(mirrored, Some(plain)));
    assert!(!main_camera_winding(Mat4::identity(), Some(plain)));
}

#[test]
fn color_pre_pass_renders_before_main() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let main = spawn_node(&mut world, Vec3::zeros());
    let camera = CameraComponent::main(1280, 720)
        .with_pipeline_flags(CameraPipelineFlags::default() | CameraPipelineFlags::COLOR_PRE_PASS);
    world.insert(main, camera).unwrap();

    harness.frame(&world);
    let cameras = harness.cameras();
    assert_eq!(cameras.len(), 2);
    assert!(cameras[0].flags.contains(RenderCameraFlags::REQUEST_COLOR_PRE_PASS));
    assert_eq!(cameras[1].id, COLOR_PRE_PASS_CAMERA_ID);
    assert!(cameras[1].flags.contains(RenderCameraFlags::COLOR_PRE_PASS));

    assert_eq!(
        harness.graph_cameras(),
        vec![None, Some(COLOR_PRE_PASS_CAMERA_ID), Some(main.id())]
    );
}

// ---------------------------------------------------------------------------
// Render node graphs
// ---------------------------------------------------------------------------

#[test]
fn camera_graphs_are_cached_across_frames() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let main = spawn_node(&mut world, Vec3::zeros());
    world.insert(main, CameraComponent::main(800, 600)).unwrap();

    harness.frame(&world);
    let created = harness.graphs.creation_count();
    assert_eq!(created, 2);
    harness.frame(&world);
    harness.frame(&world);
    assert_eq!(harness.graphs.creation_count(), created);
    assert_eq!(harness.system.cached_camera_graph_count(), 1);
}

#[test]
fn msaa_change_rebuilds_the_camera_graph() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let main = spawn_node(&mut world, Vec3::zeros());
    world.insert(main, CameraComponent::main(800, 600)).unwrap();
    harness.frame(&world);
    let before = harness.graphs.creation_count();

    let msaa = CameraComponent::main(800, 600)
        .with_pipeline_flags(CameraPipelineFlags::default() | CameraPipelineFlags::MSAA);
    world.insert(main, msaa).unwrap();
    harness.frame(&world);
    assert_eq!(harness.graphs.creation_count(), before + 1);
    assert!(harness.graphs.created().last().unwrap().msaa);
}

#[test]
fn graphs_of_removed_cameras_are_purged() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let main = spawn_node(&mut world, Vec3::zeros());
    world.insert(main, CameraComponent::main(800, 600)).unwrap();
    harness.frame(&world);
    assert_eq!(harness.system.cached_camera_graph_count(), 1);

    world.remove::<CameraComponent>(main);
    harness.frame(&world);
    harness.frame(&world);
    assert_eq!(harness.system.cached_camera_graph_count(), 1);
    harness.frame(&world);
    assert_eq!(harness.system.cached_camera_graph_count(), 0);
}

// ---------------------------------------------------------------------------
// Renderables
// ---------------------------------------------------------------------------

#[test]
fn submesh_draws_follow_materials() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let material = world.spawn();
    world.insert(material, MaterialComponent::default()).unwrap();
    let mesh = spawn_mesh(&mut world, &[Some(material), None]);
    let node = spawn_node(&mut world, Vec3::zeros());
    world.insert(node, RenderMeshComponent::new(mesh)).unwrap();

    harness.frame(&world);
    let submeshes = harness.submeshes();
    assert_eq!(submeshes.len(), 2);
    assert_eq!(harness.mesh_data_count(), 1);
    let ids = harness.material_ids();
    assert_eq!(ids, vec![material.id(), DEFAULT_MATERIAL_ID]);
    assert_eq!(submeshes[0].material_index, 0);
    assert_eq!(submeshes[1].material_index, 1);
}

#[test]
fn disabled_and_hidden_nodes_are_not_rendered() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let mesh = spawn_mesh(&mut world, &[None]);

    let parent = spawn_node(&mut world, Vec3::zeros());
    world
        .insert(
            parent,
            NodeComponent {
                parent: None,
                enabled: false,
            },
        )
        .unwrap();
    let child = spawn_node(&mut world, Vec3::zeros());
    world.insert(child, NodeComponent::with_parent(parent)).unwrap();
    world.insert(child, RenderMeshComponent::new(mesh)).unwrap();

    let hidden = spawn_node(&mut world, Vec3::zeros());
    world.insert(hidden, RenderMeshComponent::new(mesh)).unwrap();
    world
        .insert(hidden, LayerComponent { layer_mask: LAYER_NONE })
        .unwrap();

    harness.frame(&world);
    assert!(harness.submeshes().is_empty());
    assert!(harness.system.scene_bounding_sphere().is_none());
}

#[test]
fn batch_members_are_drawn_in_chunks() {
    let mut harness = Harness::new(RenderSystemConfig::default().with_max_batch_instances(2));
    let mut world = world();
    let mesh = spawn_mesh(&mut world, &[None]);
    let batch = world.spawn();
    world.insert(batch, RenderMeshBatchComponent::default()).unwrap();
    for i in 0..5 {
        let node = spawn_node(&mut world, Vec3::new(i as f32 * 3.0, 0.0, 0.0));
        world
            .insert(node, RenderMeshComponent::new(mesh).with_batch(batch))
            .unwrap();
    }

    harness.frame(&world);
    let submeshes = harness.submeshes();
    let counts: Vec<u32> = submeshes.iter().map(|s| s.draw.instance_count).collect();
    assert_eq!(counts, vec![2, 2, 1]);
    assert_eq!(harness.mesh_data_count(), 5);

    // The first chunk spans both of its instances.
    assert!(submeshes[0].world_radius > 1.8);

    // Accumulation lists are emptied every frame.
    harness.frame(&world);
    assert_eq!(harness.submeshes().len(), 3);
}

#[test]
fn batch_reference_without_batch_component_draws_alone() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let mesh = spawn_mesh(&mut world, &[None]);
    let not_a_batch = world.spawn();
    for _ in 0..2 {
        let node = spawn_node(&mut world, Vec3::zeros());
        world
            .insert(node, RenderMeshComponent::new(mesh).with_batch(not_a_batch))
            .unwrap();
    }

    harness.frame(&world);
    let counts: Vec<u32> = harness
        .submeshes()
        .iter()
        .map(|s| s.draw.instance_count)
        .collect();
    assert_eq!(counts, vec![1, 1]);
}

#[test]
fn scene_sphere_covers_rendered_geometry() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let mesh = spawn_mesh(&mut world, &[None]);
    let node = spawn_node(&mut world, Vec3::new(4.0, 0.0, 0.0));
    world.insert(node, RenderMeshComponent::new(mesh)).unwrap();

    harness.frame(&world);
    let scene = harness.scene();
    assert_eq!(scene.world_scene_center, Vec3::new(4.0, 0.0, 0.0));
    assert!((scene.world_scene_bounding_sphere_radius - 3.0f32.sqrt()).abs() < 1e-5);
}

// ---------------------------------------------------------------------------
// Lights
// ---------------------------------------------------------------------------

#[test]
fn lights_reference_their_shadow_cameras() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let sun = spawn_node(&mut world, Vec3::new(0.0, 10.0, 0.0));
    world
        .insert(
            sun,
            LightComponent::directional(Vec3::new(1.0, 1.0, 1.0), 3.0).with_shadows(),
        )
        .unwrap();
    let lamp = spawn_node(&mut world, Vec3::new(2.0, 0.0, 0.0));
    world
        .insert(lamp, LightComponent::point(Vec3::new(1.0, 0.5, 0.5), 10.0, 5.0))
        .unwrap();
    let mesh = spawn_mesh(&mut world, &[None]);
    let node = spawn_node(&mut world, Vec3::zeros());
    world.insert(node, RenderMeshComponent::new(mesh)).unwrap();

    harness.frame(&world);
    let lights = harness.lights();
    assert_eq!(lights.len(), 2);
    assert_eq!(lights[0].id, sun.id());
    assert_eq!(lights[0].shadow_camera_index, Some(0));
    assert_eq!(lights[1].id, lamp.id());
    assert_eq!(lights[1].shadow_camera_index, None);
    assert_eq!(lights[1].range, 5.0);
    assert_eq!(lights[1].position.xyz(), Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn shadow_cameras_need_geometry() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let sun = spawn_node(&mut world, Vec3::new(0.0, 10.0, 0.0));
    world
        .insert(
            sun,
            LightComponent::directional(Vec3::new(1.0, 1.0, 1.0), 3.0).with_shadows(),
        )
        .unwrap();
    let lamp = spawn_node(&mut world, Vec3::zeros());
    world
        .insert(
            lamp,
            LightComponent::point(Vec3::new(1.0, 0.5, 0.5), 10.0, 5.0).with_shadows(),
        )
        .unwrap();

    harness.frame(&world);
    assert!(harness.cameras().is_empty());

    let mesh = spawn_mesh(&mut world, &[None]);
    let node = spawn_node(&mut world, Vec3::zeros());
    world.insert(node, RenderMeshComponent::new(mesh)).unwrap();
    harness.frame(&world);
    let cameras = harness.cameras();
    assert_eq!(cameras.len(), 1);
    assert!(cameras[0].is_shadow());
    assert_eq!(cameras[0].id, sun.id());
}

// ---------------------------------------------------------------------------
// Post-process
// ---------------------------------------------------------------------------

#[test]
fn post_process_entries_live_as_long_as_the_system() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let settings = world.spawn();
    world.insert(settings, PostProcessComponent::default()).unwrap();
    let main = spawn_node(&mut world, Vec3::zeros());
    world
        .insert(main, CameraComponent::main(800, 600).with_post_process(settings))
        .unwrap();

    harness.frame(&world);
    let name = format!("RenderDataStorePod.PostProcess.{}", settings.id());
    assert_eq!(harness.cameras()[0].post_process_name, name);
    let stored = harness
        .stores
        .lock()
        .pod_store(&harness.names.pod)
        .and_then(|pod| pod.get(&name).map(<[u8]>::len));
    assert!(stored.is_some_and(|len| len > 0));

    harness.frame(&world);
    let Harness {
        system,
        stores,
        names,
        ..
    } = harness;
    drop(system);
    let stores = stores.lock();
    assert!(stores.pod_store(&names.pod).unwrap().get(&name).is_none());
}

#[test]
fn cameras_without_settings_use_the_default_main_entry() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let main = spawn_node(&mut world, Vec3::zeros());
    world.insert(main, CameraComponent::main(800, 600)).unwrap();

    harness.frame(&world);
    assert_eq!(harness.cameras()[0].post_process_name, MAIN_POST_PROCESS_NAME);
    let stored = harness
        .stores
        .lock()
        .pod_store(&harness.names.pod)
        .and_then(|pod| pod.get(MAIN_POST_PROCESS_NAME).map(<[u8]>::to_vec));
    assert_eq!(
        stored.as_deref(),
        Some(bytemuck::bytes_of(&PostProcessConfiguration::default()))
    );

    harness.frame(&world);
    let Harness {
        system,
        stores,
        names,
        ..
    } = harness;
    drop(system);
    let stores = stores.lock();
    assert!(
        stores
            .pod_store(&names.pod)
            .unwrap()
            .get(MAIN_POST_PROCESS_NAME)
            .is_none()
    );
}
