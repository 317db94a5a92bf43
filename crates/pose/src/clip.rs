use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::skeleton::BoneId;

/// A sample point on a track. Either channel may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

impl Keyframe {
    pub fn rotation(time: f32, rotation: Quat) -> Self {
        Self {
            time,
            rotation: Some(rotation),
            position: None,
        }
    }

    pub fn position(time: f32, position: Vec3) -> Self {
        Self {
            time,
            rotation: None,
            position: Some(position),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.rotation.is_none_or(|q| q.is_finite())
            && self.position.is_none_or(|p| p.is_finite())
    }
}

/// Keyframes for a single bone, ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub bone: BoneId,
    pub keyframes: Vec<Keyframe>,
}

impl Track {
    pub fn new(bone: BoneId, keyframes: Vec<Keyframe>) -> Self {
        Self { bone, keyframes }
    }

    /// Rotation at `time`, shortest-path slerp between bracketing keys.
    pub fn sample_rotation(&self, time: f32) -> Option<Quat> {
        sample_channel(&self.keyframes, time, |k| k.rotation, slerp_shortest)
    }

    /// Position offset at `time`, linear between bracketing keys.
    pub fn sample_position(&self, time: f32) -> Option<Vec3> {
        sample_channel(&self.keyframes, time, |k| k.position, Vec3::lerp)
    }
}

/// Sample one channel over the keyframes that carry it.
///
/// Before the first key or after the last, the nearest key's value holds.
/// A channel with a single key is constant.
fn sample_channel<T: Copy>(
    keys: &[Keyframe],
    time: f32,
    get: impl Fn(&Keyframe) -> Option<T>,
    mix: impl Fn(T, T, f32) -> T,
) -> Option<T> {
    let mut prev: Option<(f32, T)> = None;
    let mut next: Option<(f32, T)> = None;
    for key in keys {
        let Some(value) = get(key) else { continue };
        if key.time <= time {
            prev = Some((key.time, value));
        } else {
            next = Some((key.time, value));
            break;
        }
    }
    match (prev, next) {
        (Some((t0, a)), Some((t1, b))) => Some(mix(a, b, (time - t0) / (t1 - t0))),
        (Some((_, a)), None) => Some(a),
        (None, Some((_, b))) => Some(b),
        (None, None) => None,
    }
}

/// Slerp along the shorter arc.
pub fn slerp_shortest(from: Quat, to: Quat, t: f32) -> Quat {
    let to = if from.dot(to) < 0.0 { -to } else { to };
    from.slerp(to, t).normalize()
}

/// Errors from clip validation and loading.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("clip {clip:?} has invalid duration {duration}")]
    InvalidDuration { clip: String, duration: f32 },
    #[error("track for {bone:?} in clip {clip:?} has no keyframes")]
    EmptyTrack { clip: String, bone: BoneId },
    #[error("keyframes for {bone:?} in clip {clip:?} are not sorted by time")]
    Unsorted { clip: String, bone: BoneId },
    #[error("keyframe at {time} for {bone:?} in clip {clip:?} lies outside 0..={duration}")]
    OutOfRange {
        clip: String,
        bone: BoneId,
        time: f32,
        duration: f32,
    },
    #[error("keyframe for {bone:?} in clip {clip:?} has non-finite values")]
    NonFinite { clip: String, bone: BoneId },
    #[error("invalid clip JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named keyframe animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds.
    pub duration: f32,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, looping: bool) -> Self {
        Self {
            name: name.into(),
            duration,
            looping,
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, bone: BoneId, keyframes: Vec<Keyframe>) -> Self {
        self.tracks.push(Track::new(bone, keyframes));
        self
    }

    pub fn validate(&self) -> Result<(), ClipError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ClipError::InvalidDuration {
                clip: self.name.clone(),
                duration: self.duration,
            });
        }
        for track in &self.tracks {
            let bone = track.bone;
            if track.keyframes.is_empty() {
                return Err(ClipError::EmptyTrack {
                    clip: self.name.clone(),
                    bone,
                });
            }
            if track.keyframes.iter().any(|k| !k.is_finite()) {
                return Err(ClipError::NonFinite {
                    clip: self.name.clone(),
                    bone,
                });
            }
            if track.keyframes.windows(2).any(|w| w[1].time < w[0].time) {
                return Err(ClipError::Unsorted {
                    clip: self.name.clone(),
                    bone,
                });
            }
            if let Some(key) = track
                .keyframes
                .iter()
                .find(|k| k.time < 0.0 || k.time > self.duration)
            {
                return Err(ClipError::OutOfRange {
                    clip: self.name.clone(),
                    bone,
                    time: key.time,
                    duration: self.duration,
                });
            }
        }
        Ok(())
    }
}

/// Name-indexed clip store. Lookup by name is the only way playback reaches
/// a clip.
#[derive(Debug, Clone, Default)]
pub struct ClipRegistry {
    clips: BTreeMap<String, Arc<AnimationClip>>,
}

impl ClipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in clips.
    pub fn with_builtin_clips() -> Self {
        let mut registry = Self::new();
        for clip in crate::builtin::builtin_clips() {
            let name = clip.name.clone();
            registry.clips.insert(name, Arc::new(clip));
        }
        registry
    }

    /// Validate and register a clip. Returns the clip it replaced, if any.
    pub fn register(
        &mut self,
        clip: AnimationClip,
    ) -> Result<Option<Arc<AnimationClip>>, ClipError> {
        clip.validate()?;
        tracing::debug!(clip = %clip.name, tracks = clip.tracks.len(), "registered clip");
        Ok(self.clips.insert(clip.name.clone(), Arc::new(clip)))
    }

    /// Register every clip in a JSON array. Returns how many were added.
    ///
    /// Nothing is registered unless every clip validates.
    pub fn load_json(&mut self, json: &str) -> Result<usize, ClipError> {
        let clips: Vec<AnimationClip> = serde_json::from_str(json)?;
        for clip in &clips {
            clip.validate()?;
        }
        let count = clips.len();
        for clip in clips {
            self.clips.insert(clip.name.clone(), Arc::new(clip));
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<Arc<AnimationClip>> {
        self.clips.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<AnimationClip>> {
        self.clips.remove(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quat_close(a: Quat, b: Quat) -> bool {
        a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
    }

    #[test]
    fn two_key_rotation_midpoint_is_slerp() {
        let r0 = Quat::from_rotation_x(0.2);
        let r1 = Quat::from_rotation_y(1.3);
        let track = Track::new(
            BoneId::Head,
            vec![Keyframe::rotation(0.0, r0), Keyframe::rotation(2.0, r1)],
        );
        let mid = track.sample_rotation(1.0).unwrap();
        assert!(quat_close(mid, r0.slerp(r1, 0.5)));
    }

    #[test]
    fn single_key_is_constant() {
        let offset = Vec3::new(0.0, 1.5, 0.0);
        let track = Track::new(BoneId::Root, vec![Keyframe::position(0.3, offset)]);
        for t in [0.0, 0.3, 5.0] {
            assert_eq!(track.sample_position(t), Some(offset));
        }
        assert_eq!(track.sample_rotation(1.0), None);
    }

    #[test]
    fn channels_sample_independently() {
        let track = Track::new(
            BoneId::Body,
            vec![
                Keyframe::position(0.0, Vec3::ZERO),
                Keyframe::rotation(0.5, Quat::from_rotation_z(0.4)),
                Keyframe::position(1.0, Vec3::new(2.0, 0.0, 0.0)),
            ],
        );
        let p = track.sample_position(0.5).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(quat_close(
            track.sample_rotation(0.9).unwrap(),
            Quat::from_rotation_z(0.4)
        ));
    }

    #[test]
    fn sampling_clamps_outside_keys() {
        let track = Track::new(
            BoneId::Head,
            vec![
                Keyframe::position(0.5, Vec3::X),
                Keyframe::position(1.0, Vec3::Y),
            ],
        );
        assert_eq!(track.sample_position(0.0), Some(Vec3::X));
        assert_eq!(track.sample_position(9.0), Some(Vec3::Y));
    }

    #[test]
    fn slerp_takes_short_path() {
        let a = Quat::from_rotation_y(0.1);
        let b = -Quat::from_rotation_y(0.3);
        let mid = slerp_shortest(a, b, 0.5);
        assert!(quat_close(mid, Quat::from_rotation_y(0.2)));
    }

    #[test]
    fn validation_rejects_bad_clips() {
        assert!(matches!(
            AnimationClip::new("zero", 0.0, true).validate(),
            Err(ClipError::InvalidDuration { .. })
        ));
        assert!(matches!(
            AnimationClip::new("empty", 1.0, true)
                .with_track(BoneId::Head, vec![])
                .validate(),
            Err(ClipError::EmptyTrack { .. })
        ));
        assert!(matches!(
            AnimationClip::new("unsorted", 1.0, true)
                .with_track(
                    BoneId::Head,
                    vec![
                        Keyframe::position(0.8, Vec3::X),
                        Keyframe::position(0.2, Vec3::Y)
                    ]
                )
                .validate(),
            Err(ClipError::Unsorted { .. })
        ));
        assert!(matches!(
            AnimationClip::new("late", 1.0, false)
                .with_track(BoneId::Head, vec![Keyframe::position(1.5, Vec3::X)])
                .validate(),
            Err(ClipError::OutOfRange { .. })
        ));
        assert!(matches!(
            AnimationClip::new("nan", 1.0, false)
                .with_track(BoneId::Head, vec![Keyframe::position(0.5, Vec3::NAN)])
                .validate(),
            Err(ClipError::NonFinite { .. })
        ));
    }

    #[test]
    fn registry_lookup_by_name() {
        let mut registry = ClipRegistry::new();
        assert!(registry.is_empty());
        let clip = AnimationClip::new("nod", 1.0, true)
            .with_track(BoneId::Head, vec![Keyframe::rotation(0.0, Quat::IDENTITY)]);
        assert!(registry.register(clip.clone()).unwrap().is_none());
        assert!(registry.register(clip).unwrap().is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("nod").unwrap().duration, 1.0);
        assert!(registry.get("shake").is_none());
    }

    #[test]
    fn registry_rejects_invalid_without_registering() {
        let mut registry = ClipRegistry::new();
        assert!(registry.register(AnimationClip::new("bad", -1.0, true)).is_err());
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn json_clips_load() {
        let json = r#"[
            {
                "name": "bob",
                "duration": 1.0,
                "loop": true,
                "tracks": [
                    { "bone": "root", "keyframes": [
                        { "time": 0.0, "position": [0.0, 0.0, 0.0] },
                        { "time": 1.0, "position": [0.0, 1.0, 0.0] }
                    ] },
                    { "bone": "head", "keyframes": [
                        { "time": 0.5, "rotation": [0.0, 0.0, 0.0, 1.0] }
                    ] }
                ]
            }
        ]"#;
        let mut registry = ClipRegistry::new();
        assert_eq!(registry.load_json(json).unwrap(), 1);
        let clip = registry.get("bob").unwrap();
        assert!(clip.looping);
        assert_eq!(clip.tracks[1].bone, BoneId::Head);
        assert_eq!(
            clip.tracks[0].sample_position(0.5),
            Some(Vec3::new(0.0, 0.5, 0.0))
        );
    }

    #[test]
    fn json_with_invalid_clip_registers_nothing() {
        let json = r#"[
            { "name": "ok", "duration": 1.0, "tracks": [] },
            { "name": "bad", "duration": 0.0, "tracks": [] }
        ]"#;
        let mut registry = ClipRegistry::new();
        assert!(registry.load_json(json).is_err());
        assert!(registry.is_empty());
    }
}
