//! # Lumen ECS
//!
//! A small entity/component store:
//!
//! - [`Entity`] - generational 64-bit identifier
//! - [`ComponentStore`] - ordered component manager for one component kind
//! - [`World`] - owns entities and every registered component store
//! - [`ComponentQuery`] - entities carrying a set of component kinds, cached
//!   while the involved stores are structurally unchanged
//! - [`hierarchy`] - node parenting, enable state and world matrices

mod component_store;
mod entity;
pub mod hierarchy;
mod query;
mod world;

pub use component_store::{ComponentId, ComponentStore};
pub use entity::{Entity, EntityAllocator};
pub use hierarchy::{
    NameComponent, NodeComponent, PreviousWorldMatrixComponent, TransformComponent,
    WorldMatrixComponent,
};
pub use query::ComponentQuery;
pub use world::{Component, ComponentNotRegistered, ComponentRead, ComponentWrite, World};
