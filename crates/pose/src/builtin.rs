//! Clips shipped with the crate.

use glam::{EulerRot, Quat, Vec3};

use crate::clip::{AnimationClip, Keyframe};
use crate::skeleton::{BoneId, WingSide, wing_rest_rotation};

pub const IDLE: &str = "idle";
pub const WALK: &str = "walk";
pub const RUN: &str = "run";
pub const WAVE: &str = "wave";
pub const FLY: &str = "fly";

pub fn builtin_clips() -> Vec<AnimationClip> {
    vec![idle(), walk(), run(), wave(), fly()]
}

fn rot_x(angle: f32) -> Quat {
    Quat::from_rotation_x(angle)
}

fn rot_z(angle: f32) -> Quat {
    Quat::from_rotation_z(angle)
}

/// Looping two-phase swing: `a` at the ends, `b` at the half-way point.
fn swing(duration: f32, a: Quat, b: Quat) -> Vec<Keyframe> {
    vec![
        Keyframe::rotation(0.0, a),
        Keyframe::rotation(duration * 0.5, b),
        Keyframe::rotation(duration, a),
    ]
}

fn idle() -> AnimationClip {
    let d = 4.0;
    AnimationClip::new(IDLE, d, true)
        .with_track(BoneId::RightArm, swing(d, rot_z(-0.02), rot_z(-0.08)))
        .with_track(BoneId::LeftArm, swing(d, rot_z(0.02), rot_z(0.08)))
        .with_track(BoneId::Cape, swing(d, rot_x(0.1), rot_x(0.16)))
}

fn walk() -> AnimationClip {
    let d = 1.0;
    let limb = 0.5;
    AnimationClip::new(WALK, d, true)
        .with_track(BoneId::RightLeg, swing(d, rot_x(limb), rot_x(-limb)))
        .with_track(BoneId::LeftLeg, swing(d, rot_x(-limb), rot_x(limb)))
        .with_track(BoneId::RightArm, swing(d, rot_x(-limb), rot_x(limb)))
        .with_track(BoneId::LeftArm, swing(d, rot_x(limb), rot_x(-limb)))
        .with_track(BoneId::Head, swing(d, rot_z(0.03), rot_z(-0.03)))
        .with_track(BoneId::Cape, swing(d, rot_x(0.2), rot_x(0.3)))
}

fn run() -> AnimationClip {
    let d = 0.6;
    let limb = 1.1;
    let bob = Vec3::new(0.0, 0.6, 0.0);
    AnimationClip::new(RUN, d, true)
        .with_track(BoneId::RightLeg, swing(d, rot_x(limb), rot_x(-limb)))
        .with_track(BoneId::LeftLeg, swing(d, rot_x(-limb), rot_x(limb)))
        .with_track(BoneId::RightArm, swing(d, rot_x(-limb), rot_x(limb)))
        .with_track(BoneId::LeftArm, swing(d, rot_x(limb), rot_x(-limb)))
        .with_track(BoneId::Cape, swing(d, rot_x(0.6), rot_x(0.8)))
        .with_track(
            BoneId::Root,
            vec![
                Keyframe::position(0.0, Vec3::ZERO),
                Keyframe::position(d * 0.25, bob),
                Keyframe::position(d * 0.5, Vec3::ZERO),
                Keyframe::position(d * 0.75, bob),
                Keyframe::position(d, Vec3::ZERO),
            ],
        )
}

fn wave() -> AnimationClip {
    AnimationClip::new(WAVE, 2.0, false).with_track(
        BoneId::RightArm,
        vec![
            Keyframe::rotation(0.0, Quat::IDENTITY),
            Keyframe::rotation(0.4, rot_z(-2.6)),
            Keyframe::rotation(0.7, rot_z(-2.2)),
            Keyframe::rotation(1.0, rot_z(-2.8)),
            Keyframe::rotation(1.3, rot_z(-2.2)),
            Keyframe::rotation(1.6, rot_z(-2.6)),
            Keyframe::rotation(2.0, Quat::IDENTITY),
        ],
    )
}

fn fly() -> AnimationClip {
    let d = 2.0;
    let spread = 70.0_f32.to_radians();
    let lift = 20.0_f32.to_radians();
    let left_open = Quat::from_euler(EulerRot::XYZ, lift, 0.0, spread);
    let right_open = Quat::from_euler(EulerRot::XYZ, lift, 0.0, -spread);
    AnimationClip::new(FLY, d, true)
        .with_track(
            BoneId::LeftWing,
            swing(d, wing_rest_rotation(WingSide::Left), left_open),
        )
        .with_track(
            BoneId::RightWing,
            swing(d, wing_rest_rotation(WingSide::Right), right_open),
        )
        .with_track(BoneId::Body, vec![Keyframe::rotation(0.0, rot_x(0.3))])
        .with_track(BoneId::Head, vec![Keyframe::rotation(0.0, rot_x(-0.3))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_clips_validate() {
        let clips = builtin_clips();
        assert_eq!(clips.len(), 5);
        for clip in &clips {
            clip.validate().unwrap();
        }
    }

    #[test]
    fn only_wave_is_one_shot() {
        for clip in builtin_clips() {
            assert_eq!(clip.looping, clip.name != WAVE, "{}", clip.name);
        }
    }

    #[test]
    fn looping_clips_end_where_they_start() {
        for clip in builtin_clips().into_iter().filter(|c| c.looping) {
            for track in &clip.tracks {
                let start = track.sample_rotation(0.0);
                let end = track.sample_rotation(clip.duration);
                match (start, end) {
                    (Some(a), Some(b)) => assert!(a.abs_diff_eq(b, 1e-5)),
                    (None, None) => {}
                    _ => panic!("channel mismatch in {}", clip.name),
                }
            }
        }
    }
}
