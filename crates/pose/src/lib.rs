//! Avatar skeleton, forward kinematics and keyframe playback.
//!
//! # Invariants
//! - Parents are solved before children; the pose buffer is never read stale
//!   after a mutation through [`Avatar`].
//! - Every bone rotation written by playback is a unit quaternion.
//! - A clip name that is not registered never changes playback or pose.

mod avatar;
pub mod builtin;
mod clip;
mod controller;
mod skeleton;
mod solver;

pub use avatar::Avatar;
pub use clip::{AnimationClip, ClipError, ClipRegistry, Keyframe, Track, slerp_shortest};
pub use controller::{AnimationController, PlayOptions, PlaybackState};
pub use skeleton::{
    Bone, BoneId, Skeleton, SkeletonError, SkinVariant, WingSide, standard_bones,
    wing_rest_rotation,
};
pub use solver::{BoneMatrixCache, compute_bone_matrices};

pub fn crate_info() -> &'static str {
    "skinview-pose v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("pose"));
    }

    #[test]
    fn builtin_walk_poses_an_avatar() {
        let registry = ClipRegistry::with_builtin_clips();
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        assert!(controller.play(&registry, builtin::WALK, PlayOptions::default(), &mut avatar));
        controller.update(0.25, &mut avatar);
        assert!(avatar.update_matrices());
        assert!(!avatar.skeleton().is_at_rest());
        for chunk in avatar.bone_matrices().chunks_exact(16) {
            assert!(chunk.iter().all(|v| v.is_finite()));
        }
    }
}
