use std::fmt;

/// A generational entity identifier.
///
/// Layout: `u32 index` + `u32 generation`, exposed as one 64-bit id.
/// A freed slot is reused with a bumped generation, so stale handles
/// compare unequal to the new occupant.
///
/// # Example
///
/// ```
/// use lumen_ecs::Entity;
///
/// let entity = Entity::from_id(0x0000_0002_0000_0007);
/// assert_eq!(entity.index(), 7);
/// assert_eq!(entity.generation(), 2);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation of this entity.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Opaque 64-bit identifier.
    pub fn id(&self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Rebuilds an entity from [`id`](Entity::id).
    pub fn from_id(id: u64) -> Self {
        Self {
            index: id as u32,
            generation: (id >> 32) as u32,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Allocates entity ids, reusing freed slots.
#[derive(Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    count: u32,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity.
    pub fn allocate(&mut self) -> Entity {
        self.count += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::new(index, self.generations[slot]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.alive.push(true);
        Entity::new(index, 0)
    }

    /// Frees `entity`. Returns `false` if it was not alive.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push(entity.index);
        self.count -= 1;
        true
    }

    /// Returns `true` if `entity` is currently allocated.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        slot < self.alive.len() && self.alive[slot] && self.generations[slot] == entity.generation
    }

    /// Number of live entities.
    pub fn len(&self) -> u32 {
        self.count
    }

    /// Returns `true` if no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
