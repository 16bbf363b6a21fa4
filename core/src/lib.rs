//! # Lumen Core
//!
//! Shared building blocks for the Lumen scene layer: rendering math,
//! cooperative compute primitives, a log-once registry and the glTF
//! source data model consumed by the importer.

pub mod compute;
#[cfg(feature = "gltf")]
pub mod gltf;
pub mod log_once;
pub mod math;
pub mod profiling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
