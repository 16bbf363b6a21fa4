//! End-to-end frames over imported and hand-built scenes.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{Harness, scene_asset, spawn_node, world};
use lumen_core::math::{Vec3, Vec4};
use lumen_ecs::{Entity, NameComponent, NodeComponent, World, WorldMatrixComponent};
use lumen_graphics::RenderHandleType;
use lumen_graphics::dummy::DummyShaderManager;
use lumen_graphics::render_data::{MaterialTextureSlot, RenderCameraFlags};
use lumen_scene::components::{
    CameraComponent, CameraSceneFlags, LightComponent, MaterialComponent, MeshComponent,
    PlanarReflectionComponent,
};
use lumen_scene::gltf::{GltfImporter, ImportFlags, ImporterConfig, import_scene};
use lumen_scene::render_system::RenderSystemConfig;

fn node_named(world: &World, name: &str) -> Entity {
    let nodes = world.read::<NodeComponent>().unwrap();
    let names = world.read::<NameComponent>().unwrap();
    names
        .iter()
        .find(|(entity, n)| n.name == name && nodes.contains(*entity))
        .map(|(entity, _)| entity)
        .unwrap()
}

#[test]
fn imported_scene_renders_one_draw_per_submesh_material() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let data = Arc::new(scene_asset(&[0, 2, 3]));
    let mut importer = GltfImporter::new(
        harness.gpu.clone(),
        Arc::new(DummyShaderManager::new()),
        ImporterConfig::default(),
    );
    let result = importer
        .import_gltf(&mut world, Arc::clone(&data), ImportFlags::ALL)
        .clone();
    assert!(result.success, "{}", result.error);
    import_scene(&mut world, &data, &result, None).unwrap();

    let sun = node_named(&world, "sun");
    let view = node_named(&world, "view");
    world
        .write::<LightComponent>()
        .unwrap()
        .get_mut(sun)
        .unwrap()
        .shadow_enabled = true;
    {
        let mut cameras = world.write::<CameraComponent>().unwrap();
        let camera = cameras.get_mut(view).unwrap();
        camera.scene_flags = CameraSceneFlags::MAIN_CAMERA | CameraSceneFlags::ACTIVE_RENDER;
        camera.render_resolution = [800, 600];
    }
    let first_material = result.materials[0].unwrap();
    world
        .write::<MeshComponent>()
        .unwrap()
        .get_mut(result.meshes[0].unwrap())
        .unwrap()
        .submeshes[1]
        .additional_materials
        .push(first_material);

    harness.frame(&world);

    let cameras = harness.cameras();
    assert_eq!(cameras.len(), 2);
    assert_eq!(cameras.iter().filter(|c| c.is_main()).count(), 1);
    assert_eq!(cameras.iter().filter(|c| c.is_shadow()).count(), 1);

    let expected_draws: usize = {
        let meshes = world.read::<MeshComponent>().unwrap();
        meshes
            .iter()
            .flat_map(|(_, mesh)| mesh.submeshes.iter())
            .map(|submesh| 1 + submesh.additional_materials.len())
            .sum()
    };
    let submeshes = harness.submeshes();
    assert_eq!(expected_draws, 3);
    assert_eq!(submeshes.len(), expected_draws);

    let ids: HashSet<u64> = harness.material_ids().into_iter().collect();
    let imported: HashSet<u64> = result.materials.iter().flatten().map(|m| m.id()).collect();
    assert_eq!(ids, imported);

    assert_eq!(harness.graph_cameras(), vec![None, Some(view.id())]);
}

/// Main camera at `resolution` with a reflection plane parented under it.
fn reflection_scene(world: &mut World, resolution: [u32; 2]) -> (Entity, Entity) {
    let camera = spawn_node(world, Vec3::new(0.0, 2.0, 6.0));
    world
        .insert(camera, CameraComponent::main(resolution[0], resolution[1]))
        .unwrap();

    let plane = spawn_node(world, Vec3::new(0.0, -2.0, -6.0));
    world.insert(plane, NodeComponent::with_parent(camera)).unwrap();
    world
        .insert(
            plane,
            WorldMatrixComponent {
                matrix: lumen_core::math::Mat4::identity(),
            },
        )
        .unwrap();
    world.insert(plane, PlanarReflectionComponent::default()).unwrap();
    world.insert(plane, MaterialComponent::default()).unwrap();
    (camera, plane)
}

fn set_resolution(world: &World, camera: Entity, resolution: [u32; 2]) {
    world
        .write::<CameraComponent>()
        .unwrap()
        .get_mut(camera)
        .unwrap()
        .render_resolution = resolution;
}

#[test]
fn reflection_targets_follow_the_main_camera_resolution() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let (camera, plane) = reflection_scene(&mut world, [800, 600]);
    let color_name = format!("ReflectionColor_{}", plane.id());
    let depth_name = format!("ReflectionDepth_{}", plane.id());

    harness.frame(&world);
    let update = harness.system.reflection_updates()[0];
    assert!(update.recreated);
    assert_eq!(update.entity, plane);
    assert_eq!(update.resolution, [400, 300]);
    assert_eq!(harness.gpu.image_creation_count(&color_name), 1);
    assert_eq!(harness.gpu.image_creation_count(&depth_name), 1);

    let cameras = harness.cameras();
    let reflection = cameras
        .iter()
        .find(|c| c.flags.contains(RenderCameraFlags::REFLECTION))
        .unwrap();
    assert_eq!(reflection.render_resolution, [400, 300]);
    assert_eq!(reflection.main_camera_id, camera.id());
    assert_eq!(
        reflection.color_targets[0].handle_type(),
        RenderHandleType::GpuImage
    );
    assert_eq!(
        harness.graph_cameras(),
        vec![None, Some(plane.id()), Some(camera.id())]
    );

    harness.frame(&world);
    assert!(!harness.system.reflection_updates()[0].recreated);
    assert_eq!(harness.gpu.image_creation_count(&color_name), 1);

    set_resolution(&world, camera, [1600, 1200]);
    harness.frame(&world);
    let update = harness.system.reflection_updates()[0];
    assert!(update.recreated);
    assert_eq!(update.resolution, [800, 600]);
    assert_eq!(harness.gpu.image_creation_count(&color_name), 2);
    assert_eq!(harness.gpu.image_creation_count(&depth_name), 2);

    for _ in 0..3 {
        harness.frame(&world);
        assert!(!harness.system.reflection_updates()[0].recreated);
    }
    assert_eq!(harness.gpu.image_creation_count(&color_name), 2);

    let reflection = world
        .get_cloned::<PlanarReflectionComponent>(plane)
        .unwrap();
    assert_eq!(reflection.render_target_resolution, [800, 600]);
    let material = world.get_cloned::<MaterialComponent>(plane).unwrap();
    let slot = material.texture(MaterialTextureSlot::ClearcoatRoughness);
    assert_eq!(slot.image, Some(plane));
    assert_eq!(
        slot.factor,
        Vec4::new(reflection.mip_count as f32, 0.5, 800.0, 600.0)
    );
}

#[test]
fn reflection_needs_a_main_camera() {
    let mut harness = Harness::new(RenderSystemConfig::default());
    let mut world = world();
    let (camera, plane) = reflection_scene(&mut world, [800, 600]);
    world
        .write::<CameraComponent>()
        .unwrap()
        .get_mut(camera)
        .unwrap()
        .scene_flags = CameraSceneFlags::empty();

    harness.frame(&world);
    assert!(harness.system.reflection_updates().is_empty());
    assert_eq!(
        harness
            .gpu
            .image_creation_count(&format!("ReflectionColor_{}", plane.id())),
        0
    );
}
