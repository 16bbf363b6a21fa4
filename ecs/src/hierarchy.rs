//! Node parenting, enable state and world matrices.
//!
//! Parent links live on [`NodeComponent`]; there is no child list, so
//! [`children_of`] scans the node store. Local transforms are composed into
//! [`WorldMatrixComponent`] by [`propagate_world_matrices`], which also
//! rolls the previous value into [`PreviousWorldMatrixComponent`] for
//! entities that carry one.

use std::collections::HashMap;

use lumen_core::math::{Mat4, Quat, Vec3, mat4_from_scale_rotation_translation};

use crate::component_store::ComponentStore;
use crate::entity::Entity;
use crate::world::{ComponentNotRegistered, World};

/// Ancestor walks stop after this many steps, which also breaks parent cycles.
const MAX_HIERARCHY_DEPTH: usize = 1024;

/// Scene graph node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeComponent {
    /// Parent node, `None` for roots.
    pub parent: Option<Entity>,
    /// Whether the node itself is enabled. See [`is_effectively_enabled`].
    pub enabled: bool,
}

impl Default for NodeComponent {
    fn default() -> Self {
        Self {
            parent: None,
            enabled: true,
        }
    }
}

impl NodeComponent {
    /// Node parented to `parent`.
    pub fn with_parent(parent: Entity) -> Self {
        Self {
            parent: Some(parent),
            enabled: true,
        }
    }
}

/// Local position, rotation and scale relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

impl TransformComponent {
    /// Transform at `position` with identity rotation and unit scale.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Returns this transform with a different rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with a different scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local matrix (translation * rotation * scale).
    pub fn to_matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// World-space matrix of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldMatrixComponent {
    pub matrix: Mat4,
}

impl Default for WorldMatrixComponent {
    fn default() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }
}

/// World-space matrix of a node in the previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviousWorldMatrixComponent {
    pub matrix: Mat4,
}

impl Default for PreviousWorldMatrixComponent {
    fn default() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }
}

/// Human readable entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameComponent {
    pub name: String,
}

impl NameComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Returns `true` if `entity` and all of its ancestors are enabled.
///
/// Entities without a [`NodeComponent`] count as enabled.
pub fn is_effectively_enabled(nodes: &ComponentStore<NodeComponent>, entity: Entity) -> bool {
    let mut current = Some(entity);
    for _ in 0..MAX_HIERARCHY_DEPTH {
        let Some(e) = current else {
            return true;
        };
        match nodes.get(e) {
            Some(node) if !node.enabled => return false,
            Some(node) => current = node.parent,
            None => return true,
        }
    }
    log::warn!("Hierarchy of {entity:?} is deeper than {MAX_HIERARCHY_DEPTH} or cyclic");
    false
}

/// Direct children of `parent`, in node component-id order.
pub fn children_of(nodes: &ComponentStore<NodeComponent>, parent: Entity) -> Vec<Entity> {
    nodes
        .iter()
        .filter(|(_, node)| node.parent == Some(parent))
        .map(|(entity, _)| entity)
        .collect()
}

/// Recomputes the world matrix of every node.
///
/// Nodes without a [`TransformComponent`] use identity as their local matrix.
/// Every node receives a [`WorldMatrixComponent`]; nodes that already carry a
/// [`PreviousWorldMatrixComponent`] get their old world matrix copied into it
/// first.
pub fn propagate_world_matrices(world: &World) -> Result<(), ComponentNotRegistered> {
    lumen_core::profile_function!();

    let nodes = world.read::<NodeComponent>()?;
    let transforms = world.read::<TransformComponent>()?;
    let mut world_matrices = world.write::<WorldMatrixComponent>()?;

    if let Ok(mut previous) = world.write::<PreviousWorldMatrixComponent>() {
        for (entity, prev) in previous.iter_mut() {
            if let Some(current) = world_matrices.get(entity) {
                prev.matrix = current.matrix;
            }
        }
    }

    let mut resolved: HashMap<Entity, Mat4> = HashMap::with_capacity(nodes.len());
    for &entity in nodes.entities() {
        let matrix = resolve_world_matrix(&nodes, &transforms, &mut resolved, entity);
        world_matrices.set(entity, WorldMatrixComponent { matrix });
    }
    Ok(())
}

fn local_matrix(transforms: &ComponentStore<TransformComponent>, entity: Entity) -> Mat4 {
    transforms
        .get(entity)
        .map(TransformComponent::to_matrix)
        .unwrap_or_else(Mat4::identity)
}

fn resolve_world_matrix(
    nodes: &ComponentStore<NodeComponent>,
    transforms: &ComponentStore<TransformComponent>,
    resolved: &mut HashMap<Entity, Mat4>,
    entity: Entity,
) -> Mat4 {
    if let Some(matrix) = resolved.get(&entity) {
        return *matrix;
    }

    // Collect unresolved ancestors, nearest first.
    let mut chain = vec![entity];
    let mut base = Mat4::identity();
    let mut current = nodes.get(entity).and_then(|n| n.parent);
    while let Some(parent) = current {
        if let Some(matrix) = resolved.get(&parent) {
            base = *matrix;
            break;
        }
        if chain.len() >= MAX_HIERARCHY_DEPTH || !nodes.contains(parent) {
            break;
        }
        chain.push(parent);
        current = nodes.get(parent).and_then(|n| n.parent);
    }

    for &e in chain.iter().rev() {
        base *= local_matrix(transforms, e);
        resolved.insert(e, base);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut world = World::new();
        world.register_component::<NodeComponent>();
        world.register_component::<TransformComponent>();
        world.register_component::<WorldMatrixComponent>();
        world.register_component::<PreviousWorldMatrixComponent>();
        world
    }

    #[test]
    fn disabled_ancestor_disables_descendants() {
        let mut world = world();
        let root = world.spawn();
        let child = world.spawn();
        let grandchild = world.spawn();
        world.insert(root, NodeComponent::default()).unwrap();
        world.insert(child, NodeComponent::with_parent(root)).unwrap();
        world
            .insert(grandchild, NodeComponent::with_parent(child))
            .unwrap();

        assert!(is_effectively_enabled(&world.read::<NodeComponent>().unwrap(), grandchild));
        world.write::<NodeComponent>().unwrap().get_mut(root).unwrap().enabled = false;
        assert!(!is_effectively_enabled(&world.read::<NodeComponent>().unwrap(), grandchild));
    }

    #[test]
    fn cyclic_parents_terminate() {
        let mut world = world();
        let a = world.spawn();
        let b = world.spawn();
        world.insert(a, NodeComponent::with_parent(b)).unwrap();
        world.insert(b, NodeComponent::with_parent(a)).unwrap();
        assert!(!is_effectively_enabled(&world.read::<NodeComponent>().unwrap(), a));
        propagate_world_matrices(&world).unwrap();
    }

    #[test]
    fn world_matrices_compose_parent_first() {
        let mut world = world();
        let root = world.spawn();
        let child = world.spawn();
        // Child is inserted before its parent on purpose.
        world.insert(child, NodeComponent::with_parent(root)).unwrap();
        world.insert(root, NodeComponent::default()).unwrap();
        world
            .insert(root, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        world
            .insert(child, TransformComponent::from_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        world.insert(child, PreviousWorldMatrixComponent::default()).unwrap();

        propagate_world_matrices(&world).unwrap();
        let matrix = world.get_cloned::<WorldMatrixComponent>(child).unwrap().matrix;
        assert_eq!(matrix[(0, 3)], 1.0);
        assert_eq!(matrix[(1, 3)], 2.0);

        world
            .write::<TransformComponent>()
            .unwrap()
            .get_mut(root)
            .unwrap()
            .position = Vec3::new(5.0, 0.0, 0.0);
        propagate_world_matrices(&world).unwrap();

        let previous = world
            .get_cloned::<PreviousWorldMatrixComponent>(child)
            .unwrap()
            .matrix;
        assert_eq!(previous[(0, 3)], 1.0);
        let current = world.get_cloned::<WorldMatrixComponent>(child).unwrap().matrix;
        assert_eq!(current[(0, 3)], 5.0);
    }

    #[test]
    fn children_are_listed_in_order() {
        let mut world = world();
        let root = world.spawn();
        let a = world.spawn();
        let b = world.spawn();
        world.insert(root, NodeComponent::default()).unwrap();
        world.insert(b, NodeComponent::with_parent(root)).unwrap();
        world.insert(a, NodeComponent::with_parent(root)).unwrap();
        assert_eq!(children_of(&world.read::<NodeComponent>().unwrap(), root), vec![b, a]);
    }
}
