//! Math type aliases and helper functions.
//!
//! All rendering math is `f32`, column-vector convention (`clip = P * V * M * p`),
//! right-handed, with projection depth in `[0, 1]`.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
/// Use [`quat_from_array`] or `Quaternion::new(w, x, y, z)` to construct.
pub type Quat = nalgebra::Quaternion<f32>;

/// Build a 4x4 TRS matrix from scale, rotation (quaternion), and translation.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let r = nalgebra::UnitQuaternion::from_quaternion(rotation);
    let rm = r.to_rotation_matrix();
    let rm = rm.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Build a right-handed perspective projection with depth range [0, 1].
pub fn perspective_rh(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0,  0.0,              0.0,
        0.0,        f,    0.0,              0.0,
        0.0,        0.0,  zfar * nf,        znear * zfar * nf,
        0.0,        0.0,  -1.0,             0.0,
    );
    result
}

/// Build a right-handed orthographic projection with depth range [0, 1].
pub fn orthographic_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;
    #[rustfmt::skip]
    let result = Mat4::new(
        2.0 / rml, 0.0,       0.0,         -(right + left) / rml,
        0.0,       2.0 / tmb, 0.0,         -(top + bottom) / tmb,
        0.0,       0.0,       -1.0 / fmn,  -near / fmn,
        0.0,       0.0,       0.0,          1.0,
    );
    result
}

/// Flip the clip-space Y axis of a projection (Vulkan viewport convention).
pub fn flip_y(projection: &Mat4) -> Mat4 {
    let mut flipped = *projection;
    for c in 0..4 {
        flipped[(1, c)] = -flipped[(1, c)];
    }
    flipped
}

/// Create a quaternion from a `[x, y, z, w]` array.
pub fn quat_from_array(a: [f32; 4]) -> Quat {
    nalgebra::Quaternion::new(a[3], a[0], a[1], a[2])
}

/// Decompose a 4x4 matrix into (scale, rotation, translation).
///
/// A negative determinant is folded into the X scale so that the
/// rotation part stays a proper rotation.
pub fn to_scale_rotation_translation(m: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let col0 = Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]);
    let col1 = Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]);
    let col2 = Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]);
    let mut sx = col0.norm();
    let sy = col1.norm();
    let sz = col2.norm();
    if m.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
        sx = -sx;
    }
    let scale = Vec3::new(sx, sy, sz);
    if sx == 0.0 || sy == 0.0 || sz == 0.0 {
        return (scale, Quat::identity(), translation);
    }
    let rot_mat = nalgebra::Matrix3::from_columns(&[col0 / sx, col1 / sy, col2 / sz]);
    let rotation = nalgebra::UnitQuaternion::from_rotation_matrix(
        &nalgebra::Rotation3::from_matrix_unchecked(rot_mat),
    )
    .into_inner();
    (scale, rotation, translation)
}

/// Transform a point (w = 1) by a 4x4 matrix, without perspective divide.
pub fn transform_point(m: &Mat4, p: &Vec3) -> Vec3 {
    (m * Vec4::new(p.x, p.y, p.z, 1.0)).xyz()
}

/// Householder reflection across the plane `dot(n, p) + d = 0`.
///
/// `plane` holds `(n.x, n.y, n.z, d)`; `n` must be unit length.
pub fn reflection_matrix(plane: &Vec4) -> Mat4 {
    let (x, y, z, d) = (plane.x, plane.y, plane.z, plane.w);
    #[rustfmt::skip]
    let result = Mat4::new(
        1.0 - 2.0 * x * x, -2.0 * x * y,       -2.0 * x * z,       -2.0 * x * d,
        -2.0 * y * x,       1.0 - 2.0 * y * y, -2.0 * y * z,       -2.0 * y * d,
        -2.0 * z * x,       -2.0 * z * y,       1.0 - 2.0 * z * z, -2.0 * z * d,
        0.0,                0.0,                0.0,                1.0,
    );
    result
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any `extend` call replaces.
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(-f32::MAX),
        }
    }

    /// Returns `true` if the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Grow to include `point`.
    pub fn extend_point(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grow to include `other`. Invalid boxes are ignored.
    pub fn extend(&mut self, other: &Aabb) {
        if other.is_valid() {
            self.extend_point(&other.min);
            self.extend_point(&other.max);
        }
    }

    /// Box center.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Box bounding `self` after transformation by `m`.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        if !self.is_valid() {
            return *self;
        }
        let mut result = Aabb::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            result.extend_point(&transform_point(m, &corner));
        }
        result
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_trs_matrix() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn perspective_maps_near_to_zero_and_far_to_one() {
        let p = perspective_rh(FRAC_PI_2, 1.0, 0.5, 10.0);
        let near = p * Vec4::new(0.0, 0.0, -0.5, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn flip_y_negates_second_row() {
        let p = orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        let f = flip_y(&p);
        assert_eq!(f[(1, 1)], -p[(1, 1)]);
        assert_eq!(f[(0, 0)], p[(0, 0)]);
    }

    #[test]
    fn decompose_roundtrip() {
        let s = Vec3::new(2.0, 3.0, 4.0);
        let r = quat_from_array([0.0, 0.7071068, 0.0, 0.7071068]);
        let t = Vec3::new(1.0, -2.0, 5.0);
        let m = mat4_from_scale_rotation_translation(s, r, t);
        let (s2, r2, t2) = to_scale_rotation_translation(&m);
        assert!((s - s2).norm() < 1e-4);
        assert!((t - t2).norm() < 1e-6);
        assert!((r.coords - r2.coords).norm() < 1e-4 || (r.coords + r2.coords).norm() < 1e-4);
    }

    #[test]
    fn reflection_across_ground_plane() {
        let r = reflection_matrix(&Vec4::new(0.0, 1.0, 0.0, 0.0));
        let p = transform_point(&r, &Vec3::new(1.0, 2.0, 3.0));
        assert!((p - Vec3::new(1.0, -2.0, 3.0)).norm() < 1e-6);
        assert!((r.determinant() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn reflection_across_offset_plane() {
        // Plane y = 1
        let r = reflection_matrix(&Vec4::new(0.0, 1.0, 0.0, -1.0));
        let p = transform_point(&r, &Vec3::new(0.0, 3.0, 0.0));
        assert!((p - Vec3::new(0.0, -1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn aabb_transform_covers_rotated_box() {
        let b = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let m = Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)) * Mat4::new_scaling(2.0);
        let t = b.transformed(&m);
        assert!((t.min - Vec3::new(8.0, -2.0, -2.0)).norm() < 1e-6);
        assert!((t.max - Vec3::new(12.0, 2.0, 2.0)).norm() < 1e-6);
    }

    #[test]
    fn empty_aabb_is_invalid_until_extended() {
        let mut b = Aabb::empty();
        assert!(!b.is_valid());
        b.extend_point(&Vec3::new(1.0, 2.0, 3.0));
        assert!(b.is_valid());
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 3.0));
    }
}
