use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::component_store::ComponentStore;
use crate::entity::{Entity, EntityAllocator};

/// Marker for types that can be stored as components.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Scoped read access to one component store.
pub type ComponentRead<'a, T> = RwLockReadGuard<'a, ComponentStore<T>>;

/// Scoped write access to one component store.
pub type ComponentWrite<'a, T> = RwLockWriteGuard<'a, ComponentStore<T>>;

/// Error returned when accessing a component type that was never registered.
#[derive(Debug, Clone, Copy)]
pub struct ComponentNotRegistered {
    /// The name of the unregistered component type.
    pub type_name: &'static str,
}

impl std::fmt::Display for ComponentNotRegistered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Component type `{}` has never been registered. Call register_component() first.",
            self.type_name
        )
    }
}

impl std::error::Error for ComponentNotRegistered {}

/// Type-erased operations on a component store.
trait ErasedStorage: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_entity(&mut self, entity: Entity);
    fn contains_entity(&self, entity: Entity) -> bool;
    fn entities(&self) -> Vec<Entity>;
    fn structure_generation(&self) -> u64;
}

struct Storage<T: Component> {
    store: RwLock<ComponentStore<T>>,
}

impl<T: Component> Storage<T> {
    fn read_store(&self) -> ComponentRead<'_, T> {
        self.store.try_read().unwrap_or_else(|| {
            panic!(
                "Cannot borrow `{}` immutably: already borrowed mutably",
                std::any::type_name::<T>()
            )
        })
    }
}

impl<T: Component> ErasedStorage for Storage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) {
        self.store.get_mut().remove(entity);
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.read_store().contains(entity)
    }

    fn entities(&self) -> Vec<Entity> {
        self.read_store().entities().to_vec()
    }

    fn structure_generation(&self) -> u64 {
        self.read_store().structure_generation()
    }
}

/// Owner of all entities and component stores.
///
/// Component kinds must be registered before use. Store access goes through
/// [`read`](World::read)/[`write`](World::write), which hand out scoped
/// guards; taking a conflicting guard on the same kind panics instead of
/// deadlocking.
///
/// # Example
///
/// ```
/// use lumen_ecs::World;
///
/// #[derive(Default)]
/// struct Health(u32);
///
/// let mut world = World::new();
/// world.register_component::<Health>();
/// let e = world.spawn();
/// world.insert(e, Health(10)).unwrap();
///
/// let health = world.read::<Health>().unwrap();
/// assert_eq!(health.get(e).map(|h| h.0), Some(10));
/// ```
#[derive(Default)]
pub struct World {
    entities: EntityAllocator,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an entity without components.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawns `entity` and drops all of its components.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.free(entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    /// Returns `true` if `entity` is alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> u32 {
        self.entities.len()
    }

    /// Registers component kind `T`. Registering twice is a no-op.
    pub fn register_component<T: Component>(&mut self) {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                Box::new(Storage::<T> {
                    store: RwLock::new(ComponentStore::new()),
                })
            });
    }

    /// Returns `true` if `T` has been registered.
    pub fn is_component_registered<T: Component>(&self) -> bool {
        self.storages.contains_key(&TypeId::of::<T>())
    }

    fn storage<T: Component>(&self) -> Result<&Storage<T>, ComponentNotRegistered> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<Storage<T>>())
            .ok_or(ComponentNotRegistered {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Attaches `component` to `entity`, replacing any existing value.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), ComponentNotRegistered> {
        assert!(
            self.entities.is_alive(entity),
            "Cannot insert into dead entity {entity:?}"
        );
        let storage = self
            .storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<T>>())
            .ok_or(ComponentNotRegistered {
                type_name: std::any::type_name::<T>(),
            })?;
        storage.store.get_mut().set(entity, component);
        Ok(())
    }

    /// Detaches and returns the `T` component of `entity`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<T>>())
            .and_then(|s| s.store.get_mut().remove(entity))
    }

    /// Scoped read access to the `T` store.
    ///
    /// # Panics
    ///
    /// Panics if the store is currently borrowed for writing.
    pub fn read<T: Component>(&self) -> Result<ComponentRead<'_, T>, ComponentNotRegistered> {
        Ok(self.storage::<T>()?.read_store())
    }

    /// Scoped write access to the `T` store.
    ///
    /// # Panics
    ///
    /// Panics if the store is currently borrowed.
    pub fn write<T: Component>(&self) -> Result<ComponentWrite<'_, T>, ComponentNotRegistered> {
        let storage = self.storage::<T>()?;
        Ok(storage.store.try_write().unwrap_or_else(|| {
            panic!(
                "Cannot borrow `{}` mutably: already borrowed",
                std::any::type_name::<T>()
            )
        }))
    }

    /// Clone of the `T` component of `entity`.
    pub fn get_cloned<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.read::<T>().ok()?.get(entity).cloned()
    }

    pub(crate) fn structure_generation_of(&self, type_id: TypeId) -> Option<u64> {
        self.storages.get(&type_id).map(|s| s.structure_generation())
    }

    pub(crate) fn entities_of(&self, type_id: TypeId) -> Vec<Entity> {
        self.storages
            .get(&type_id)
            .map(|s| s.entities())
            .unwrap_or_default()
    }

    pub(crate) fn contains_of(&self, type_id: TypeId, entity: Entity) -> bool {
        self.storages
            .get(&type_id)
            .is_some_and(|s| s.contains_entity(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Position(f32);

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Velocity(f32);

    #[test]
    fn unregistered_read_is_an_error() {
        let world = World::new();
        let err = world.read::<Position>().err().unwrap();
        assert!(err.type_name.contains("Position"));
    }

    #[test]
    fn despawn_removes_components() {
        let mut world = World::new();
        world.register_component::<Position>();
        let e = world.spawn();
        world.insert(e, Position(1.0)).unwrap();
        assert!(world.despawn(e));
        assert!(world.read::<Position>().unwrap().is_empty());
        assert!(!world.is_alive(e));
    }

    #[test]
    fn read_and_write_different_kinds_together() {
        let mut world = World::new();
        world.register_component::<Position>();
        world.register_component::<Velocity>();
        let e = world.spawn();
        world.insert(e, Position(1.0)).unwrap();
        world.insert(e, Velocity(2.0)).unwrap();

        let velocities = world.read::<Velocity>().unwrap();
        let mut positions = world.write::<Position>().unwrap();
        positions.get_mut(e).unwrap().0 += velocities.get(e).unwrap().0;
        drop(positions);
        drop(velocities);

        assert_eq!(world.get_cloned::<Position>(e), Some(Position(3.0)));
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn conflicting_borrow_panics() {
        let mut world = World::new();
        world.register_component::<Position>();
        let _write = world.write::<Position>().unwrap();
        let _read = world.read::<Position>().unwrap();
    }
}
