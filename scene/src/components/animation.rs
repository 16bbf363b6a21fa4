//! Animation resources.
//!
//! Keyframe inputs and outputs are separate entities so that tracks sharing
//! a sampler accessor share one decoded copy.

use lumen_ecs::Entity;

/// Animated node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

/// Keyframe interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationInterpolation {
    Step,
    #[default]
    Linear,
    CubicSpline,
}

/// Keyframe timestamps in seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationInputComponent {
    pub timestamps: Vec<f32>,
}

/// Keyframe values, `components` floats per keyframe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationOutputComponent {
    pub components: usize,
    pub values: Vec<f32>,
}

/// One animated property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrackComponent {
    /// glTF node index of the target, resolved to an entity by the scene importer.
    pub target_node: Option<usize>,
    /// Bound scene entity.
    pub target: Option<Entity>,
    pub path: AnimationPath,
    pub interpolation: AnimationInterpolation,
    pub input: Entity,
    pub output: Entity,
}

/// Animation clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationComponent {
    pub name: String,
    pub tracks: Vec<Entity>,
    /// Largest keyframe timestamp over all tracks.
    pub duration: f32,
}
