use lumen_core::math::{Aabb, Mat4};
use lumen_ecs::Entity;

/// Inverse bind matrices of a skin resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinIbmComponent {
    pub matrices: Vec<Mat4>,
    /// glTF node indices of the joints, in matrix order.
    pub joint_nodes: Vec<usize>,
}

/// Binds a skinned mesh instance to its joint entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinComponent {
    /// Entity carrying the [`SkinIbmComponent`].
    pub skin: Option<Entity>,
    pub skin_root: Option<Entity>,
    pub joints: Vec<Entity>,
}

/// Current joint matrices of a skinned instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointMatricesComponent {
    pub matrices: Vec<Mat4>,
    /// Bounds of the posed joints in world space.
    pub joints_aabb: Aabb,
}

/// Joint matrices of the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousJointMatricesComponent {
    pub matrices: Vec<Mat4>,
}
