use glam::Vec3;
use std::sync::Arc;

use crate::avatar::Avatar;
use crate::clip::{AnimationClip, ClipRegistry, slerp_shortest};

/// Playback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Per-play settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Time multiplier.
    pub speed: f32,
    /// Blend factor between the rest pose (0.0) and the keyframe values (1.0).
    pub amplitude: f32,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            amplitude: 1.0,
        }
    }
}

/// Drives one avatar through a clip.
///
/// Looping clips wrap with `rem_euclid`, so an elapsed time landing exactly
/// on the duration reports progress 0.0. One-shot clips clamp at the
/// duration, apply their last pose and stop with [`Self::is_finished`] set.
#[derive(Debug, Clone, Default)]
pub struct AnimationController {
    state: PlaybackState,
    clip: Option<Arc<AnimationClip>>,
    elapsed: f32,
    speed: f32,
    amplitude: f32,
    finished: bool,
}

impl AnimationController {
    pub fn new() -> Self {
        Self {
            speed: 1.0,
            amplitude: 1.0,
            ..Self::default()
        }
    }

    /// Start `name` from the beginning.
    ///
    /// An unknown name logs a warning and leaves both the controller and the
    /// avatar untouched.
    pub fn play(
        &mut self,
        registry: &ClipRegistry,
        name: &str,
        options: PlayOptions,
        avatar: &mut Avatar,
    ) -> bool {
        let Some(clip) = registry.get(name) else {
            tracing::warn!(clip = name, "animation clip not found");
            return false;
        };
        avatar.reset_pose();
        tracing::debug!(
            clip = name,
            speed = options.speed,
            amplitude = options.amplitude,
            "playing clip"
        );
        self.clip = Some(clip);
        self.state = PlaybackState::Playing;
        self.elapsed = 0.0;
        self.speed = options.speed;
        self.amplitude = options.amplitude;
        self.finished = false;
        true
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop and forget the current clip. The avatar keeps its last pose.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.clip = None;
        self.elapsed = 0.0;
        self.finished = false;
    }

    /// Advance by `dt` seconds and pose the avatar. Returns whether the pose
    /// was written.
    pub fn update(&mut self, dt: f32, avatar: &mut Avatar) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(clip) = self.clip.clone() else {
            self.state = PlaybackState::Stopped;
            return false;
        };

        self.elapsed += dt * self.speed;
        if clip.looping {
            self.elapsed = self.elapsed.rem_euclid(clip.duration);
            // rem_euclid may round a tiny negative up to the divisor.
            if self.elapsed >= clip.duration {
                self.elapsed = 0.0;
            }
        } else if self.elapsed >= clip.duration {
            self.elapsed = clip.duration;
            apply_pose(&clip, self.elapsed, self.amplitude, avatar);
            self.state = PlaybackState::Stopped;
            self.finished = true;
            tracing::debug!(clip = %clip.name, "clip finished");
            return true;
        } else {
            self.elapsed = self.elapsed.max(0.0);
        }

        apply_pose(&clip, self.elapsed, self.amplitude, avatar);
        true
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// True after a one-shot clip ran to its end, until the next play/stop.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn clip_name(&self) -> Option<&str> {
        self.clip.as_deref().map(|c| c.name.as_str())
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalized position in the clip, 0.0 with no clip.
    pub fn progress(&self) -> f32 {
        match &self.clip {
            Some(clip) => (self.elapsed / clip.duration).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }
}

/// Sample every track at `time` and write the blended values into the bones.
fn apply_pose(clip: &AnimationClip, time: f32, amplitude: f32, avatar: &mut Avatar) {
    let skeleton = avatar.skeleton_mut();
    for track in &clip.tracks {
        let bone = skeleton.bone_mut(track.bone);
        if let Some(rotation) = track.sample_rotation(time) {
            bone.rotation = if amplitude == 1.0 {
                rotation
            } else {
                slerp_shortest(bone.default_rotation, rotation, amplitude)
            };
        }
        if let Some(position) = track.sample_position(time) {
            bone.position_offset = Vec3::ZERO.lerp(position, amplitude);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Keyframe;
    use crate::skeleton::{BoneId, SkinVariant};
    use glam::Quat;

    const TURN: &str = "turn";
    const HOP: &str = "hop";

    fn registry() -> ClipRegistry {
        let mut registry = ClipRegistry::new();
        registry
            .register(AnimationClip::new(TURN, 2.0, true).with_track(
                BoneId::Head,
                vec![
                    Keyframe::rotation(0.0, Quat::from_rotation_y(0.0)),
                    Keyframe::rotation(2.0, Quat::from_rotation_y(1.0)),
                ],
            ))
            .unwrap();
        registry
            .register(AnimationClip::new(HOP, 1.0, false).with_track(
                BoneId::Root,
                vec![
                    Keyframe::position(0.0, Vec3::ZERO),
                    Keyframe::position(1.0, Vec3::new(0.0, 4.0, 0.0)),
                ],
            ))
            .unwrap();
        registry
    }

    fn quat_close(a: Quat, b: Quat) -> bool {
        a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
    }

    #[test]
    fn starts_stopped() {
        let controller = AnimationController::new();
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert_eq!(controller.progress(), 0.0);
        assert_eq!(controller.clip_name(), None);
    }

    #[test]
    fn unknown_clip_leaves_everything_alone() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        avatar.skeleton_mut().bone_mut(BoneId::Head).position_offset = Vec3::X;
        let before = avatar.skeleton().clone();

        let mut controller = AnimationController::new();
        assert!(!controller.play(&registry(), "moonwalk", PlayOptions::default(), &mut avatar));
        assert!(!controller.is_playing());
        assert_eq!(avatar.skeleton(), &before);
    }

    #[test]
    fn play_resets_to_rest_and_stores_options() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        avatar.skeleton_mut().bone_mut(BoneId::Head).position_offset = Vec3::X;
        avatar.update_matrices();

        let mut controller = AnimationController::new();
        let options = PlayOptions {
            speed: 2.0,
            amplitude: 0.5,
        };
        assert!(controller.play(&registry(), TURN, options, &mut avatar));
        assert!(controller.is_playing());
        assert!(avatar.skeleton().is_at_rest());
        assert!(avatar.is_dirty());
        assert_eq!(controller.speed(), 2.0);
        assert_eq!(controller.amplitude(), 0.5);
        assert_eq!(controller.clip_name(), Some(TURN));
        assert_eq!(controller.elapsed(), 0.0);
    }

    #[test]
    fn midpoint_is_slerp_of_keys() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), TURN, PlayOptions::default(), &mut avatar);
        controller.update(1.0, &mut avatar);

        let expected = Quat::from_rotation_y(0.0).slerp(Quat::from_rotation_y(1.0), 0.5);
        assert!(quat_close(
            avatar.skeleton().bone(BoneId::Head).rotation,
            expected
        ));
        assert!((controller.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn speed_scales_time() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        let options = PlayOptions {
            speed: 0.5,
            ..PlayOptions::default()
        };
        controller.play(&registry(), TURN, options, &mut avatar);
        controller.update(1.0, &mut avatar);
        assert!((controller.elapsed() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn amplitude_blends_from_rest() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        let half = PlayOptions {
            amplitude: 0.5,
            ..PlayOptions::default()
        };
        controller.play(&registry(), HOP, half, &mut avatar);
        controller.update(0.5, &mut avatar);
        let offset = avatar.skeleton().bone(BoneId::Root).position_offset;
        assert!(offset.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));

        let zero = PlayOptions {
            amplitude: 0.0,
            ..PlayOptions::default()
        };
        controller.play(&registry(), TURN, zero, &mut avatar);
        controller.update(1.5, &mut avatar);
        assert!(quat_close(
            avatar.skeleton().bone(BoneId::Head).rotation,
            Quat::IDENTITY
        ));
    }

    #[test]
    fn amplitude_keeps_quaternions_unit() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        let options = PlayOptions {
            amplitude: 0.3,
            ..PlayOptions::default()
        };
        controller.play(&registry(), TURN, options, &mut avatar);
        controller.update(1.7, &mut avatar);
        let q = avatar.skeleton().bone(BoneId::Head).rotation;
        assert!((q.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn one_shot_holds_last_pose_and_stops() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), HOP, PlayOptions::default(), &mut avatar);
        controller.update(0.4, &mut avatar);
        assert!(controller.is_playing());

        assert!(controller.update(5.0, &mut avatar));
        assert!(!controller.is_playing());
        assert!(controller.is_finished());
        assert_eq!(controller.progress(), 1.0);
        assert_eq!(
            avatar.skeleton().bone(BoneId::Root).position_offset,
            Vec3::new(0.0, 4.0, 0.0)
        );

        // Further updates do nothing.
        assert!(!controller.update(1.0, &mut avatar));
    }

    #[test]
    fn one_shot_exactly_at_duration_finishes() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), HOP, PlayOptions::default(), &mut avatar);
        controller.update(1.0, &mut avatar);
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert!(controller.is_finished());
    }

    #[test]
    fn looping_wraps_to_zero_at_exact_duration() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), TURN, PlayOptions::default(), &mut avatar);
        controller.update(2.0, &mut avatar);
        assert!(controller.is_playing());
        assert_eq!(controller.elapsed(), 0.0);
        assert_eq!(controller.progress(), 0.0);
    }

    #[test]
    fn looping_wraps_past_duration() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), TURN, PlayOptions::default(), &mut avatar);
        controller.update(2.5, &mut avatar);
        assert!((controller.elapsed() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();

        // Pause and resume are no-ops from the wrong state.
        controller.resume();
        assert_eq!(controller.state(), PlaybackState::Stopped);
        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Stopped);

        controller.play(&registry(), TURN, PlayOptions::default(), &mut avatar);
        controller.update(0.5, &mut avatar);
        controller.pause();
        assert!(controller.is_paused());
        assert!(!controller.update(1.0, &mut avatar));
        assert!((controller.elapsed() - 0.5).abs() < 1e-6);

        controller.resume();
        assert!(controller.is_playing());
        controller.update(0.25, &mut avatar);
        assert!((controller.elapsed() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn update_marks_pose_dirty() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), TURN, PlayOptions::default(), &mut avatar);
        avatar.update_matrices();
        assert!(!avatar.is_dirty());
        controller.update(0.1, &mut avatar);
        assert!(avatar.is_dirty());
    }

    #[test]
    fn stop_clears_clip() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        controller.play(&registry(), TURN, PlayOptions::default(), &mut avatar);
        controller.update(0.5, &mut avatar);
        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert_eq!(controller.clip_name(), None);
        assert_eq!(controller.progress(), 0.0);
    }

    #[test]
    fn restart_after_finish_clears_finished() {
        let mut avatar = Avatar::new(SkinVariant::Classic);
        let mut controller = AnimationController::new();
        let registry = registry();
        controller.play(&registry, HOP, PlayOptions::default(), &mut avatar);
        controller.update(2.0, &mut avatar);
        assert!(controller.is_finished());
        controller.play(&registry, HOP, PlayOptions::default(), &mut avatar);
        assert!(!controller.is_finished());
        assert!(avatar.skeleton().is_at_rest());
    }
}
