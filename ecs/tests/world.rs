//! Integration tests for the world, queries and hierarchy helpers.

use lumen_core::math::Vec3;
use lumen_ecs::hierarchy::{is_effectively_enabled, propagate_world_matrices};
use lumen_ecs::{
    ComponentId, ComponentQuery, NameComponent, NodeComponent, TransformComponent,
    WorldMatrixComponent, World,
};
use rstest::rstest;

fn scene_world() -> World {
    let mut world = World::new();
    world.register_component::<NodeComponent>();
    world.register_component::<TransformComponent>();
    world.register_component::<WorldMatrixComponent>();
    world.register_component::<NameComponent>();
    world
}

#[test]
fn despawned_slot_is_reused_with_new_generation() {
    let mut world = scene_world();
    let first = world.spawn();
    world.insert(first, NameComponent::new("first")).unwrap();
    world.despawn(first);

    let second = world.spawn();
    assert_eq!(first.index(), second.index());
    assert_ne!(first, second);
    assert!(world.get_cloned::<NameComponent>(first).is_none());
    assert!(world.get_cloned::<NameComponent>(second).is_none());
}

#[test]
fn component_ids_shift_after_removal() {
    let mut world = scene_world();
    let entities: Vec<_> = (0..3).map(|_| world.spawn()).collect();
    for (i, &e) in entities.iter().enumerate() {
        world.insert(e, NameComponent::new(format!("n{i}"))).unwrap();
    }
    world.remove::<NameComponent>(entities[0]);

    let names = world.read::<NameComponent>().unwrap();
    assert_eq!(names.entity(ComponentId(0)), Some(entities[1]));
    assert_eq!(names.get_by_id(ComponentId(1)).map(|n| n.name.as_str()), Some("n2"));
}

#[rstest]
#[case(true, true, true)]
#[case(false, true, false)]
#[case(true, false, false)]
fn enable_state_is_inherited(
    #[case] root_enabled: bool,
    #[case] child_enabled: bool,
    #[case] expected: bool,
) {
    let mut world = scene_world();
    let root = world.spawn();
    let child = world.spawn();
    world
        .insert(
            root,
            NodeComponent {
                parent: None,
                enabled: root_enabled,
            },
        )
        .unwrap();
    world
        .insert(
            child,
            NodeComponent {
                parent: Some(root),
                enabled: child_enabled,
            },
        )
        .unwrap();

    let nodes = world.read::<NodeComponent>().unwrap();
    assert_eq!(is_effectively_enabled(&nodes, child), expected);
}

#[test]
fn query_sees_propagated_nodes() {
    let mut world = scene_world();
    let root = world.spawn();
    let child = world.spawn();
    world.insert(root, NodeComponent::default()).unwrap();
    world.insert(child, NodeComponent::with_parent(root)).unwrap();
    world
        .insert(
            child,
            TransformComponent::from_position(Vec3::new(0.0, 0.0, -3.0))
                .with_scale(Vec3::new(-1.0, 1.0, 1.0)),
        )
        .unwrap();

    let mut query = ComponentQuery::new()
        .with::<NodeComponent>()
        .with::<WorldMatrixComponent>();
    query.execute(&world);
    assert!(query.results().is_empty());

    propagate_world_matrices(&world).unwrap();
    assert!(query.execute(&world));
    assert_eq!(query.results(), &[root, child]);

    let matrix = world.get_cloned::<WorldMatrixComponent>(child).unwrap().matrix;
    assert!(matrix.determinant() < 0.0);
    assert_eq!(matrix[(2, 3)], -3.0);
}
