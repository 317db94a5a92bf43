use glam::Mat4;
use skinview_common::POSE_FLOATS;

use crate::skeleton::{BoneId, Skeleton, SkinVariant};
use crate::solver::BoneMatrixCache;

/// A skeleton together with its pose buffer.
///
/// Mutable access to the skeleton always marks the pose buffer dirty, so the
/// buffer can never be read stale after a mutation through this type.
#[derive(Debug, Clone)]
pub struct Avatar {
    variant: SkinVariant,
    skeleton: Skeleton,
    matrices: BoneMatrixCache,
}

impl Avatar {
    pub fn new(variant: SkinVariant) -> Self {
        Self {
            variant,
            skeleton: Skeleton::new(variant),
            matrices: BoneMatrixCache::new(),
        }
    }

    /// Wrap a custom skeleton.
    pub fn with_skeleton(variant: SkinVariant, skeleton: Skeleton) -> Self {
        Self {
            variant,
            skeleton,
            matrices: BoneMatrixCache::new(),
        }
    }

    pub fn variant(&self) -> SkinVariant {
        self.variant
    }

    /// Switch variant. Only the arm dimensions change; a custom skeleton and
    /// the current pose are kept.
    pub fn set_variant(&mut self, variant: SkinVariant) {
        if variant == self.variant {
            return;
        }
        self.skeleton.swap_arm_variant(self.variant, variant);
        self.variant = variant;
        self.matrices.mark_dirty();
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Mutable skeleton access; marks the pose dirty.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        self.matrices.mark_dirty();
        &mut self.skeleton
    }

    pub fn reset_pose(&mut self) {
        self.skeleton_mut().reset_pose();
    }

    pub fn mark_dirty(&mut self) {
        self.matrices.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.matrices.is_dirty()
    }

    /// Recompute the pose buffer if dirty.
    pub fn update_matrices(&mut self) -> bool {
        self.matrices.update(&self.skeleton)
    }

    pub fn bone_matrices(&self) -> &[f32; POSE_FLOATS] {
        self.matrices.matrices()
    }

    pub fn bone_matrix(&self, id: BoneId) -> Mat4 {
        self.matrices.bone_matrix(id)
    }

    pub fn matrix_cache(&self) -> &BoneMatrixCache {
        &self.matrices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn new_avatar_needs_first_solve() {
        let mut avatar = Avatar::new(SkinVariant::Slim);
        assert!(avatar.is_dirty());
        assert!(avatar.update_matrices());
        assert!(!avatar.is_dirty());
        assert!(!avatar.update_matrices());
    }

    #[test]
    fn skeleton_mut_marks_dirty() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        avatar.update_matrices();
        avatar.skeleton_mut().bone_mut(BoneId::Head).position_offset = Vec3::Y;
        assert!(avatar.is_dirty());
        assert!(avatar.update_matrices());
        assert!((avatar.bone_matrix(BoneId::Head).w_axis.y - 25.0).abs() < 1e-5);
    }

    #[test]
    fn clones_pose_independently() {
        let mut a = Avatar::new(SkinVariant::Classic);
        let b = a.clone();
        a.skeleton_mut().bone_mut(BoneId::Body).position_offset = Vec3::X;
        assert_ne!(a.skeleton(), b.skeleton());
    }

    #[test]
    fn set_variant_swaps_arm_width() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        avatar.update_matrices();
        avatar.set_variant(SkinVariant::Slim);
        assert!(avatar.is_dirty());
        assert_eq!(avatar.skeleton().bone(BoneId::LeftArm).size.x, 3.0);
    }

    #[test]
    fn set_variant_keeps_custom_skeleton() {
        let mut bones = crate::skeleton::standard_bones(SkinVariant::Classic);
        bones[BoneId::Head.index()] = bones[BoneId::Head.index()].clone().with_size(Vec3::splat(10.0));
        bones[BoneId::RightArm.index()].rest_position.x = -7.0;
        let skeleton = Skeleton::from_bones(bones).unwrap();
        let mut avatar = Avatar::with_skeleton(SkinVariant::Classic, skeleton);
        avatar.skeleton_mut().bone_mut(BoneId::Head).position_offset = Vec3::Y;
        avatar.update_matrices();

        avatar.set_variant(SkinVariant::Slim);
        assert!(avatar.is_dirty());
        let skeleton = avatar.skeleton();
        assert_eq!(skeleton.bone(BoneId::Head).size, Vec3::splat(10.0));
        assert_eq!(skeleton.bone(BoneId::Head).position_offset, Vec3::Y);
        assert_eq!(skeleton.bone(BoneId::RightArm).rest_position.x, -6.5);
        assert_eq!(skeleton.bone(BoneId::RightArm).size.x, 3.0);
        assert_eq!(skeleton.bone(BoneId::LeftArm).rest_position.x, 5.5);
    }
}
