use glam::Mat4;
use skinview_common::POSE_FLOATS;

use crate::skeleton::{BoneId, Skeleton};

/// Forward kinematics: write every bone's world matrix into `out`.
///
/// Bone `i` lands at `out[i * 16..i * 16 + 16]` in column-major order.
/// Bones are visited in the skeleton's parent-before-child order, so a
/// parent's world matrix is always read back from `out` after it was written
/// in the same pass. Nothing is allocated.
pub fn compute_bone_matrices(skeleton: &Skeleton, out: &mut [f32; POSE_FLOATS]) {
    for &id in skeleton.order() {
        let bone = skeleton.bone(id);
        let local = bone.local_matrix();
        let world = match bone.parent() {
            Some(parent) => read_matrix(out, parent) * local,
            None => local,
        };
        write_matrix(out, id, &world);
    }
}

fn read_matrix(buffer: &[f32; POSE_FLOATS], id: BoneId) -> Mat4 {
    let start = id.index() * 16;
    Mat4::from_cols_slice(&buffer[start..start + 16])
}

fn write_matrix(buffer: &mut [f32; POSE_FLOATS], id: BoneId, matrix: &Mat4) {
    let start = id.index() * 16;
    matrix.write_cols_to_slice(&mut buffer[start..start + 16]);
}

/// Pose buffer guarded by a dirty flag.
///
/// Starts dirty so the first [`BoneMatrixCache::update`] always computes.
#[derive(Debug, Clone)]
pub struct BoneMatrixCache {
    matrices: [f32; POSE_FLOATS],
    dirty: bool,
    recomputes: u64,
}

impl Default for BoneMatrixCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BoneMatrixCache {
    pub fn new() -> Self {
        let mut matrices = [0.0; POSE_FLOATS];
        for chunk in matrices.chunks_exact_mut(16) {
            Mat4::IDENTITY.write_cols_to_slice(chunk);
        }
        Self {
            matrices,
            dirty: true,
            recomputes: 0,
        }
    }

    /// Recompute if dirty. Returns whether a recompute happened.
    pub fn update(&mut self, skeleton: &Skeleton) -> bool {
        if !self.dirty {
            return false;
        }
        let _span = tracing::trace_span!("compute_bone_matrices").entered();
        compute_bone_matrices(skeleton, &mut self.matrices);
        self.dirty = false;
        self.recomputes += 1;
        true
    }

    /// Force a recompute on the next update.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The flat pose buffer, ready for upload.
    pub fn matrices(&self) -> &[f32; POSE_FLOATS] {
        &self.matrices
    }

    pub fn bone_matrix(&self, id: BoneId) -> Mat4 {
        read_matrix(&self.matrices, id)
    }

    /// Number of recomputes since construction.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}
