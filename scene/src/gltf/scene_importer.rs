//! Scene instantiation on top of imported resources.

use std::collections::{HashMap, HashSet};

use lumen_core::gltf::{
    GltfCamera, GltfData, GltfLight, GltfLightKind, GltfNodeTransform, GltfProjection,
};
use lumen_core::math::{Mat4, Vec3, quat_from_array, to_scale_rotation_translation};
use lumen_ecs::{
    Entity, NameComponent, NodeComponent, PreviousWorldMatrixComponent, TransformComponent,
    WorldMatrixComponent, World,
};

use super::result::{GltfImportResult, ImportError};
use crate::components::{
    AnimationComponent, AnimationTrackComponent, CameraComponent, CameraProjection,
    JointMatricesComponent, LightComponent, RenderMeshComponent, SkinComponent,
    register_scene_components,
};

/// Creates node entities for scene `scene` of `data` (the default scene
/// when `None`) under a new root entity and returns the root.
///
/// Nodes reference the resources in `result`; a node whose mesh or skin was
/// not imported keeps its transform but gets no render mesh or skin. Every
/// call creates new node entities. Animation tracks of the imported
/// animations are retargeted to the nodes created by the latest call.
///
/// An asset without scenes instantiates every node that is nobody's child.
pub fn import_scene(
    world: &mut World,
    data: &GltfData,
    result: &GltfImportResult,
    scene: Option<usize>,
) -> Result<Entity, ImportError> {
    lumen_core::profile_scope!("import_scene");
    register_scene_components(world);

    let (scene_name, roots) = scene_roots(data, scene)?;
    let root = world.spawn();
    insert_node(
        world,
        root,
        NodeComponent::default(),
        TransformComponent::default(),
        Mat4::identity(),
        scene_name.unwrap_or(&data.filepath),
    )?;

    let mut node_entities: HashMap<usize, Entity> = HashMap::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(usize, Entity, Mat4)> = roots
        .iter()
        .rev()
        .map(|&node| (node, root, Mat4::identity()))
        .collect();
    while let Some((index, parent, parent_matrix)) = stack.pop() {
        let Some(node) = data.nodes.get(index) else {
            log::warn!("glTF scene: node {index} does not exist");
            continue;
        };
        if !visited.insert(index) {
            log::warn!("glTF scene: node {index} is reachable twice, skipping");
            continue;
        }

        let transform = local_transform(&node.transform);
        let world_matrix = parent_matrix * transform.to_matrix();
        let entity = world.spawn();
        let name = node.name.clone().unwrap_or_else(|| format!("node {index}"));
        insert_node(
            world,
            entity,
            NodeComponent::with_parent(parent),
            transform,
            world_matrix,
            &name,
        )?;
        node_entities.insert(index, entity);

        if let Some(mesh) = node.mesh {
            match result.meshes.get(mesh).copied().flatten() {
                Some(mesh) => world.insert(entity, RenderMeshComponent::new(mesh))?,
                None => log::warn!("glTF scene: mesh {mesh} of node {index} was not imported"),
            }
        }
        if let Some(camera) = node.camera.and_then(|c| data.cameras.get(c)) {
            world.insert(entity, camera_component(camera))?;
        }
        if let Some(light) = node.light.and_then(|l| data.lights.get(l)) {
            world.insert(entity, light_component(light))?;
        }

        for &child in node.children.iter().rev() {
            stack.push((child, entity, world_matrix));
        }
    }

    bind_skins(world, data, result, &node_entities)?;
    bind_animation_targets(world, result, &node_entities)?;
    log::debug!(
        "glTF scene of {}: {} nodes",
        data.filepath,
        node_entities.len()
    );
    Ok(root)
}

fn scene_roots(
    data: &GltfData,
    scene: Option<usize>,
) -> Result<(Option<&str>, Vec<usize>), ImportError> {
    if let Some(index) = scene.or(data.default_scene) {
        let scene = data
            .scenes
            .get(index)
            .ok_or_else(|| ImportError::missing(&data.filepath, format!("scene {index}")))?;
        return Ok((scene.name.as_deref(), scene.nodes.clone()));
    }
    if let Some(scene) = data.scenes.first() {
        return Ok((scene.name.as_deref(), scene.nodes.clone()));
    }
    let children: HashSet<usize> = data
        .nodes
        .iter()
        .flat_map(|n| n.children.iter().copied())
        .collect();
    let roots = (0..data.nodes.len())
        .filter(|i| !children.contains(i))
        .collect();
    Ok((None, roots))
}

fn insert_node(
    world: &mut World,
    entity: Entity,
    node: NodeComponent,
    transform: TransformComponent,
    world_matrix: Mat4,
    name: &str,
) -> Result<(), ImportError> {
    world.insert(entity, node)?;
    world.insert(entity, transform)?;
    world.insert(
        entity,
        WorldMatrixComponent {
            matrix: world_matrix,
        },
    )?;
    world.insert(
        entity,
        PreviousWorldMatrixComponent {
            matrix: world_matrix,
        },
    )?;
    world.insert(entity, NameComponent::new(name))?;
    Ok(())
}

fn local_transform(transform: &GltfNodeTransform) -> TransformComponent {
    match *transform {
        GltfNodeTransform::Trs {
            translation,
            rotation,
            scale,
        } => TransformComponent {
            position: Vec3::from(translation),
            rotation: quat_from_array(rotation),
            scale: Vec3::from(scale),
        },
        GltfNodeTransform::Matrix(m) => {
            let matrix = Mat4::from_column_slice(&m);
            let (scale, rotation, position) = to_scale_rotation_translation(&matrix);
            TransformComponent {
                position,
                rotation,
                scale,
            }
        }
    }
}

fn camera_component(camera: &GltfCamera) -> CameraComponent {
    let defaults = CameraComponent::default();
    match camera.projection {
        GltfProjection::Perspective {
            yfov,
            aspect_ratio,
            znear,
            zfar,
        } => CameraComponent {
            z_near: znear,
            z_far: zfar.unwrap_or(defaults.z_far),
            ..defaults
        }
        .with_projection(CameraProjection::Perspective {
            y_fov: yfov,
            aspect: aspect_ratio.unwrap_or(0.0),
        }),
        GltfProjection::Orthographic {
            xmag,
            ymag,
            znear,
            zfar,
        } => CameraComponent {
            z_near: znear,
            z_far: zfar,
            ..defaults
        }
        .with_projection(CameraProjection::Orthographic {
            x_mag: xmag,
            y_mag: ymag,
        }),
    }
}

fn light_component(light: &GltfLight) -> LightComponent {
    let color = Vec3::from(light.color);
    match light.kind {
        GltfLightKind::Directional => LightComponent::directional(color, light.intensity),
        GltfLightKind::Point => {
            LightComponent::point(color, light.intensity, light.range.unwrap_or(0.0))
        }
        GltfLightKind::Spot {
            inner_cone_angle,
            outer_cone_angle,
        } => LightComponent {
            range: light.range.unwrap_or(0.0),
            ..LightComponent::spot(color, light.intensity, inner_cone_angle, outer_cone_angle)
        },
    }
}

fn bind_skins(
    world: &mut World,
    data: &GltfData,
    result: &GltfImportResult,
    nodes: &HashMap<usize, Entity>,
) -> Result<(), ImportError> {
    for (&index, &entity) in nodes {
        let Some(skin_index) = data.nodes[index].skin else {
            continue;
        };
        let (Some(source), Some(skin)) = (
            data.skins.get(skin_index),
            result.skins.get(skin_index).copied().flatten(),
        ) else {
            log::warn!("glTF scene: skin {skin_index} of node {index} was not imported");
            continue;
        };
        let joints: Vec<Entity> = source
            .joints
            .iter()
            .filter_map(|joint| nodes.get(joint).copied())
            .collect();
        if joints.len() != source.joints.len() {
            log::warn!("glTF scene: skin {skin_index} has joints outside the scene");
        }
        world.insert(
            entity,
            JointMatricesComponent {
                matrices: vec![Mat4::identity(); joints.len()],
                ..Default::default()
            },
        )?;
        world.insert(
            entity,
            SkinComponent {
                skin: Some(skin),
                skin_root: source.skeleton.and_then(|s| nodes.get(&s).copied()),
                joints,
            },
        )?;
    }
    Ok(())
}

fn bind_animation_targets(
    world: &mut World,
    result: &GltfImportResult,
    nodes: &HashMap<usize, Entity>,
) -> Result<(), ImportError> {
    let tracks: Vec<Entity> = {
        let animations = world.read::<AnimationComponent>()?;
        result
            .animations
            .iter()
            .flatten()
            .filter_map(|&animation| animations.get(animation))
            .flat_map(|animation| animation.tracks.iter().copied())
            .collect()
    };
    let mut store = world.write::<AnimationTrackComponent>()?;
    for track in tracks {
        if let Some(track) = store.get_mut(track) {
            track.target = track.target_node.and_then(|n| nodes.get(&n).copied());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lumen_core::gltf::{GltfNode, GltfScene};

    use super::*;

    fn two_level() -> GltfData {
        let mut data = GltfData::new("mem/scene.gltf");
        data.nodes.push(GltfNode {
            name: Some("parent".into()),
            children: vec![1],
            transform: GltfNodeTransform::Trs {
                translation: [1.0, 0.0, 0.0],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [1.0; 3],
            },
            ..Default::default()
        });
        data.nodes.push(GltfNode {
            transform: GltfNodeTransform::Trs {
                translation: [0.0, 2.0, 0.0],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [1.0; 3],
            },
            mesh: Some(0),
            ..Default::default()
        });
        data.scenes.push(GltfScene {
            name: Some("main".into()),
            nodes: vec![0],
        });
        data
    }

    #[test]
    fn nodes_are_parented_under_the_root() {
        let data = two_level();
        let mut world = World::new();
        let result = GltfImportResult::sized_for(&data);
        let root = import_scene(&mut world, &data, &result, None).unwrap();

        let nodes = world.read::<NodeComponent>().unwrap();
        let names = world.read::<NameComponent>().unwrap();
        let (parent, _) = names.iter().find(|(_, n)| n.name == "parent").unwrap();
        let (child, _) = names.iter().find(|(_, n)| n.name == "node 1").unwrap();
        assert_eq!(nodes.get(parent).unwrap().parent, Some(root));
        assert_eq!(nodes.get(child).unwrap().parent, Some(parent));
        assert_eq!(names.get(root).unwrap().name, "main");

        let matrices = world.read::<WorldMatrixComponent>().unwrap();
        let position = matrices.get(child).unwrap().matrix.column(3).xyz();
        assert_eq!(position, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn missing_mesh_is_skipped() {
        let data = two_level();
        let mut world = World::new();
        let result = GltfImportResult::sized_for(&data);
        import_scene(&mut world, &data, &result, Some(0)).unwrap();
        assert!(world.read::<RenderMeshComponent>().unwrap().is_empty());
    }

    #[test]
    fn unknown_scene_is_an_error() {
        let data = two_level();
        let mut world = World::new();
        let result = GltfImportResult::sized_for(&data);
        assert!(import_scene(&mut world, &data, &result, Some(4)).is_err());
    }

    #[test]
    fn sceneless_asset_uses_parentless_nodes() {
        let mut data = two_level();
        data.scenes.clear();
        let (name, roots) = scene_roots(&data, None).unwrap();
        assert_eq!(name, None);
        assert_eq!(roots, vec![0]);
    }

    #[test]
    fn matrix_transform_is_decomposed() {
        let mut m = Mat4::identity();
        m[(0, 3)] = 3.0;
        m[(1, 1)] = 2.0;
        let mut columns = [0.0f32; 16];
        columns.copy_from_slice(m.as_slice());
        let transform = local_transform(&GltfNodeTransform::Matrix(columns));
        assert_eq!(transform.position, Vec3::new(3.0, 0.0, 0.0));
        assert!((transform.scale - Vec3::new(1.0, 2.0, 1.0)).norm() < 1e-5);
    }
}
