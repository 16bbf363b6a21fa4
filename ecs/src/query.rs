use std::any::TypeId;

use crate::entity::Entity;
use crate::world::{Component, World};

/// Entities carrying every required component kind.
///
/// With listening enabled the result set is only rebuilt when one of the
/// required stores changed structurally since the previous
/// [`execute`](ComponentQuery::execute); value edits alone keep the cached
/// result. Results follow the component-id order of the first required kind.
///
/// # Example
///
/// ```
/// use lumen_ecs::{ComponentQuery, World};
///
/// struct A;
/// struct B;
///
/// let mut world = World::new();
/// world.register_component::<A>();
/// world.register_component::<B>();
/// let e = world.spawn();
/// world.insert(e, A).unwrap();
/// world.insert(e, B).unwrap();
///
/// let mut query = ComponentQuery::new().with::<A>().with::<B>();
/// query.execute(&world);
/// assert_eq!(query.results(), &[e]);
/// ```
#[derive(Default)]
pub struct ComponentQuery {
    required: Vec<(TypeId, &'static str)>,
    generations: Vec<Option<u64>>,
    results: Vec<Entity>,
    listening: bool,
    executed: bool,
}

impl ComponentQuery {
    /// Creates a query with no requirements. Listening starts enabled.
    pub fn new() -> Self {
        Self {
            listening: true,
            ..Default::default()
        }
    }

    /// Adds a required component kind.
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        self.required
            .push((TypeId::of::<T>(), std::any::type_name::<T>()));
        self.generations.push(None);
        self.executed = false;
        self
    }

    /// Enables or disables incremental result tracking.
    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    /// Returns `true` if incremental tracking is enabled.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Refreshes the result set. Returns `true` if it was rebuilt.
    pub fn execute(&mut self, world: &World) -> bool {
        let current: Vec<Option<u64>> = self
            .required
            .iter()
            .map(|(id, _)| world.structure_generation_of(*id))
            .collect();
        if self.listening && self.executed && current == self.generations {
            return false;
        }

        self.results.clear();
        if let Some(((first, _), rest)) = self.required.split_first() {
            let candidates = world.entities_of(*first);
            self.results.extend(
                candidates
                    .into_iter()
                    .filter(|&e| rest.iter().all(|(id, _)| world.contains_of(*id, e))),
            );
        }
        for (name, generation) in self.required.iter().map(|(_, n)| n).zip(&current) {
            if generation.is_none() {
                log::trace!("ComponentQuery: `{name}` is not registered");
            }
        }
        self.generations = current;
        self.executed = true;
        true
    }

    /// Matching entities from the last [`execute`](ComponentQuery::execute).
    pub fn results(&self) -> &[Entity] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A(u32);
    struct B;

    fn world() -> World {
        let mut world = World::new();
        world.register_component::<A>();
        world.register_component::<B>();
        world
    }

    #[test]
    fn results_follow_first_kind_order() {
        let mut world = world();
        let e0 = world.spawn();
        let e1 = world.spawn();
        let e2 = world.spawn();
        world.insert(e2, A(2)).unwrap();
        world.insert(e0, A(0)).unwrap();
        world.insert(e1, A(1)).unwrap();
        world.insert(e0, B).unwrap();
        world.insert(e2, B).unwrap();

        let mut query = ComponentQuery::new().with::<A>().with::<B>();
        assert!(query.execute(&world));
        assert_eq!(query.results(), &[e2, e0]);
    }

    #[test]
    fn listening_skips_unchanged_stores() {
        let mut world = world();
        let e = world.spawn();
        world.insert(e, A(0)).unwrap();

        let mut query = ComponentQuery::new().with::<A>();
        assert!(query.execute(&world));
        world.write::<A>().unwrap().get_mut(e).unwrap().0 = 5;
        assert!(!query.execute(&world));

        let f = world.spawn();
        world.insert(f, A(1)).unwrap();
        assert!(query.execute(&world));
        assert_eq!(query.results().len(), 2);
    }

    #[test]
    fn not_listening_always_rebuilds() {
        let mut world = world();
        let e = world.spawn();
        world.insert(e, A(0)).unwrap();

        let mut query = ComponentQuery::new().with::<A>();
        query.set_listening(false);
        assert!(query.execute(&world));
        assert!(query.execute(&world));
    }
}
