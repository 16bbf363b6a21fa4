use lumen_core::math::{Aabb, Vec3};

use super::RenderSystem;

/// Step of the smoothed scene radius, as a fraction of the current radius.
const SCENE_BOUNDS_GRANULARITY: f32 = 0.1;

/// Sphere enclosing every rendered submesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for SceneBoundingSphere {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: 0.0,
        }
    }
}

impl SceneBoundingSphere {
    /// Sphere around the mean of the box centers, reaching both corners of
    /// the union of `bounds`. `None` when `bounds` is empty.
    pub fn from_bounds(bounds: &[Aabb]) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }
        let center = bounds
            .iter()
            .fold(Vec3::zeros(), |sum, aabb| sum + aabb.center())
            / bounds.len() as f32;
        let mut union = Aabb::empty();
        for aabb in bounds {
            union.extend(aabb);
        }
        let radius = (union.min - center)
            .norm()
            .max((union.max - center).norm());
        Some(Self { center, radius })
    }

    /// Moves `self` toward `target` in steps of `granularity * radius`.
    ///
    /// Small fluctuations are ignored so shadow maps fitted to the sphere do
    /// not shimmer. The center jumps to the target once a change is accepted;
    /// the radius grows or shrinks by whole steps.
    pub fn smoothed_toward(&self, target: &Self, granularity: f32) -> Self {
        let step = self.radius * granularity;
        if step.abs() <= f32::EPSILON {
            return *target;
        }

        let growth = target.radius - self.radius;
        let center_delta = (target.center - self.center).norm();
        if growth <= step && center_delta <= step {
            return *self;
        }

        let radius = self.radius + (growth / step).ceil() * step;
        Self {
            center: target.center,
            radius: radius.max(0.0),
        }
    }
}

impl RenderSystem {
    /// Updates the smoothed scene sphere from this frame's submesh bounds.
    /// Without geometry the previous sphere is kept.
    pub(super) fn calculate_scene_bounds(&mut self, bounds: &[Aabb]) -> SceneBoundingSphere {
        let Some(target) = SceneBoundingSphere::from_bounds(bounds) else {
            return self.scene_bounds.unwrap_or_default();
        };
        let sphere = match self.scene_bounds {
            Some(current) => current.smoothed_toward(&target, SCENE_BOUNDS_GRANULARITY),
            None => target,
        };
        self.scene_bounds = Some(sphere);
        sphere
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sphere(x: f32, radius: f32) -> SceneBoundingSphere {
        SceneBoundingSphere {
            center: Vec3::new(x, 0.0, 0.0),
            radius,
        }
    }

    #[test]
    fn sphere_reaches_box_corners() {
        let bounds = [
            Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            Aabb::new(Vec3::new(3.0, -1.0, -1.0), Vec3::new(5.0, 1.0, 1.0)),
        ];
        let s = SceneBoundingSphere::from_bounds(&bounds).unwrap();
        assert_eq!(s.center, Vec3::new(2.0, 0.0, 0.0));
        let expected = Vec3::new(3.0, 1.0, 1.0).norm();
        assert!((s.radius - expected).abs() < 1e-5);
        assert!(SceneBoundingSphere::from_bounds(&[]).is_none());
    }

    #[rstest]
    #[case::small_growth_ignored(sphere(0.0, 10.5), sphere(0.0, 10.0))]
    #[case::growth_rounds_up(sphere(0.0, 11.5), sphere(0.0, 12.0))]
    #[case::shrink_in_place_ignored(sphere(0.0, 1.0), sphere(0.0, 10.0))]
    #[case::center_jump_keeps_radius(sphere(5.0, 10.0), sphere(5.0, 10.0))]
    fn smoothing_steps(#[case] target: SceneBoundingSphere, #[case] expected: SceneBoundingSphere) {
        let current = sphere(0.0, 10.0);
        let next = current.smoothed_toward(&target, SCENE_BOUNDS_GRANULARITY);
        assert_eq!(next.center, expected.center);
        assert!((next.radius - expected.radius).abs() < 1e-4, "{next:?}");
    }

    #[test]
    fn zero_radius_takes_target() {
        let next = sphere(0.0, 0.0).smoothed_toward(&sphere(1.0, 3.0), SCENE_BOUNDS_GRANULARITY);
        assert_eq!(next, sphere(1.0, 3.0));
    }
}
