use crate::entity::Entity;

/// Dense index of a component inside its [`ComponentStore`].
///
/// Ids follow insertion order. Removing a component shifts the ids of every
/// later component down by one, so ids are only stable while the store is
/// structurally unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// The id as a `usize` index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Component manager for one component kind.
///
/// A sparse array maps entity slots to dense positions; the dense arrays
/// hold the values and their owners in insertion order. Iteration therefore
/// visits components in component-id order, which scene systems rely on
/// for "first match wins" lookups.
///
/// Two counters support cheap change detection:
/// - [`structure_generation`](ComponentStore::structure_generation) bumps on
///   every insert or removal.
/// - [`modification_generation`](ComponentStore::modification_generation)
///   additionally bumps on every mutable access.
pub struct ComponentStore<T> {
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    entities: Vec<Entity>,
    structure_generation: u64,
    modification_generation: u64,
}

impl<T> ComponentStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
            structure_generation: 0,
            modification_generation: 0,
        }
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let dense = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[dense] == entity).then_some(dense)
    }

    /// Attaches a default-valued component to `entity`, or returns the
    /// existing one's id.
    pub fn create(&mut self, entity: Entity) -> ComponentId
    where
        T: Default,
    {
        if let Some(dense) = self.dense_index(entity) {
            return ComponentId(dense as u32);
        }
        self.set(entity, T::default())
    }

    /// Attaches `value` to `entity`, replacing any existing component.
    pub fn set(&mut self, entity: Entity, value: T) -> ComponentId {
        self.modification_generation += 1;
        if let Some(dense) = self.dense_index(entity) {
            self.dense[dense] = value;
            return ComponentId(dense as u32);
        }

        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        // A stale entity from a previous generation may still occupy the slot.
        if let Some(stale_dense) = self.sparse[slot] {
            let stale = self.entities[stale_dense as usize];
            self.remove(stale);
        }

        let dense = self.dense.len();
        self.sparse[slot] = Some(dense as u32);
        self.dense.push(value);
        self.entities.push(entity);
        self.structure_generation += 1;
        ComponentId(dense as u32)
    }

    /// Detaches the component of `entity`, preserving the order of the rest.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let dense = self.dense_index(entity)?;
        self.sparse[entity.index() as usize] = None;
        self.entities.remove(dense);
        let value = self.dense.remove(dense);
        for (offset, moved) in self.entities[dense..].iter().enumerate() {
            self.sparse[moved.index() as usize] = Some((dense + offset) as u32);
        }
        self.structure_generation += 1;
        self.modification_generation += 1;
        Some(value)
    }

    /// Read access to the component of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|dense| &self.dense[dense])
    }

    /// Write access to the component of `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let dense = self.dense_index(entity)?;
        self.modification_generation += 1;
        Some(&mut self.dense[dense])
    }

    /// Component by id.
    pub fn get_by_id(&self, id: ComponentId) -> Option<&T> {
        self.dense.get(id.index())
    }

    /// Mutable component by id.
    pub fn get_by_id_mut(&mut self, id: ComponentId) -> Option<&mut T> {
        self.modification_generation += 1;
        self.dense.get_mut(id.index())
    }

    /// Owner of component `id`.
    pub fn entity(&self, id: ComponentId) -> Option<Entity> {
        self.entities.get(id.index()).copied()
    }

    /// Id of the component attached to `entity`.
    pub fn component_id(&self, entity: Entity) -> Option<ComponentId> {
        self.dense_index(entity).map(|dense| ComponentId(dense as u32))
    }

    /// Returns `true` if `entity` has this component.
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owners in component-id order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// `(entity, component)` pairs in component-id order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Mutable `(entity, component)` pairs in component-id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.modification_generation += 1;
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Counter bumped on every insert and removal.
    pub fn structure_generation(&self) -> u64 {
        self.structure_generation
    }

    /// Counter bumped on every insert, removal and mutable access.
    pub fn modification_generation(&self) -> u64 {
        self.modification_generation
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
