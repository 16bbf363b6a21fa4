//! # Lumen Scene
//!
//! The scene layer between an entity/component world and a GPU backend.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`components`] - scene component kinds (cameras, lights, meshes,
//!   materials, reflections, post-process settings, resources)
//! - [`render_system`] - per-frame extraction of the world into the render
//!   data stores
//! - [`gltf`] - phase-ordered, cancellable glTF resource import and the
//!   scene graph importer built on its results
//!
//! ## Example
//!
//! ```
//! use lumen_ecs::World;
//! use lumen_scene::components::{CameraComponent, register_scene_components};
//!
//! let mut world = World::new();
//! register_scene_components(&mut world);
//! let camera = world.spawn();
//! world.insert(camera, CameraComponent::main(1280, 720)).unwrap();
//! assert!(world.get_cloned::<CameraComponent>(camera).is_some());
//! ```

pub mod components;
pub mod gltf;
pub mod render_system;

/// Scene library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
