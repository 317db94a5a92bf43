use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Number of bones in the avatar skeleton.
pub const BONE_COUNT: usize = 12;

/// Length of the pose buffer: one 4x4 matrix per bone.
pub const POSE_FLOATS: usize = BONE_COUNT * 16;

pub const MODEL_UNIFORM: &str = "u_model";
pub const VIEW_PROJ_UNIFORM: &str = "u_viewProj";
pub const BONES_UNIFORM: &str = "u_bones";
pub const ALPHA_TEST_UNIFORM: &str = "u_alphaTest";

/// Texture slot holding the skin image.
pub const SKIN_TEXTURE: &str = "u_skin";

/// Shape of a single uniform block member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniformKind {
    Float,
    Vec4,
    Mat4,
    /// Array of `n` 4x4 matrices.
    Mat4Array(usize),
}

impl UniformKind {
    /// Size in bytes under std140 rules.
    pub const fn size(self) -> usize {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
            UniformKind::Mat4Array(n) => 64 * n,
        }
    }

    /// Base alignment in bytes under std140 rules.
    pub const fn align(self) -> usize {
        match self {
            UniformKind::Float => 4,
            _ => 16,
        }
    }

    /// Number of f32 components.
    pub const fn floats(self) -> usize {
        self.size() / 4
    }
}

/// A named member of a uniform block with its resolved byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: usize,
}

/// Ordered std140 uniform block description.
///
/// Members are laid out in insertion order. The total size is rounded up to
/// a 16-byte boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    end: usize,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// The avatar block: model, view-projection, bone palette, alpha-test threshold.
    pub fn skin() -> Self {
        Self::new()
            .with(MODEL_UNIFORM, UniformKind::Mat4)
            .with(VIEW_PROJ_UNIFORM, UniformKind::Mat4)
            .with(BONES_UNIFORM, UniformKind::Mat4Array(BONE_COUNT))
            .with(ALPHA_TEST_UNIFORM, UniformKind::Float)
    }

    pub fn with(mut self, name: &str, kind: UniformKind) -> Self {
        self.push(name, kind);
        self
    }

    /// Append a member and return its byte offset.
    pub fn push(&mut self, name: &str, kind: UniformKind) -> usize {
        let offset = align_up(self.end, kind.align());
        self.fields.push(UniformField {
            name: name.to_owned(),
            kind,
            offset,
        });
        self.end = offset + kind.size();
        offset
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Total block size in bytes, padded to 16.
    pub fn size(&self) -> usize {
        align_up(self.end, 16)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// Byte-exact mirror of [`UniformLayout::skin`].
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SkinUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub bones: [[[f32; 4]; 4]; BONE_COUNT],
    pub alpha_test: f32,
    pub _pad: [f32; 3],
}

impl SkinUniforms {
    /// Assemble a block from matrices and a pose buffer.
    ///
    /// Missing trailing bones in a short `pose` stay identity.
    pub fn new(model: Mat4, view_proj: Mat4, pose: &[f32], alpha_test: f32) -> Self {
        let mut bones = [Mat4::IDENTITY.to_cols_array_2d(); BONE_COUNT];
        for (slot, chunk) in bones.iter_mut().zip(pose.chunks_exact(16)) {
            *slot = Mat4::from_cols_slice(chunk).to_cols_array_2d();
        }
        Self {
            model: model.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            bones,
            alpha_test,
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn skin_layout_offsets() {
        let layout = UniformLayout::skin();
        assert_eq!(layout.field(MODEL_UNIFORM).unwrap().offset, 0);
        assert_eq!(layout.field(VIEW_PROJ_UNIFORM).unwrap().offset, 64);
        assert_eq!(layout.field(BONES_UNIFORM).unwrap().offset, 128);
        assert_eq!(
            layout.field(ALPHA_TEST_UNIFORM).unwrap().offset,
            128 + 64 * BONE_COUNT
        );
        assert_eq!(layout.size() % 16, 0);
    }

    #[test]
    fn skin_layout_matches_pod_struct() {
        let layout = UniformLayout::skin();
        assert_eq!(layout.size(), size_of::<SkinUniforms>());
        assert_eq!(
            layout.field(MODEL_UNIFORM).unwrap().offset,
            offset_of!(SkinUniforms, model)
        );
        assert_eq!(
            layout.field(VIEW_PROJ_UNIFORM).unwrap().offset,
            offset_of!(SkinUniforms, view_proj)
        );
        assert_eq!(
            layout.field(BONES_UNIFORM).unwrap().offset,
            offset_of!(SkinUniforms, bones)
        );
        assert_eq!(
            layout.field(ALPHA_TEST_UNIFORM).unwrap().offset,
            offset_of!(SkinUniforms, alpha_test)
        );
    }

    #[test]
    fn float_after_float_packs_tightly() {
        let layout = UniformLayout::new()
            .with("a", UniformKind::Float)
            .with("b", UniformKind::Float)
            .with("c", UniformKind::Vec4);
        assert_eq!(layout.field("b").unwrap().offset, 4);
        assert_eq!(layout.field("c").unwrap().offset, 16);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn skin_uniforms_copy_pose_blocks() {
        let mut pose = [0.0_f32; POSE_FLOATS];
        for (i, chunk) in pose.chunks_exact_mut(16).enumerate() {
            chunk.copy_from_slice(
                &Mat4::from_translation(glam::Vec3::new(i as f32, 0.0, 0.0)).to_cols_array(),
            );
        }
        let block = SkinUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, &pose, 0.5);
        assert_eq!(block.bones[3][3][0], 3.0);
        assert_eq!(block.alpha_test, 0.5);
        let bytes = bytemuck::bytes_of(&block);
        assert_eq!(bytes.len(), UniformLayout::skin().size());
    }
}
