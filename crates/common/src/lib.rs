//! Shared layout contracts: bone count, pose buffer shape, uniform block and
//! vertex layouts.
//!
//! # Invariants
//! - The pose solver writes exactly [`POSE_FLOATS`] floats, one column-major
//!   4x4 block per bone.
//! - [`SkinUniforms`] and [`UniformLayout::skin`] describe the same bytes.

mod layout;
mod vertex;

pub use layout::{
    ALPHA_TEST_UNIFORM, BONES_UNIFORM, BONE_COUNT, MODEL_UNIFORM, POSE_FLOATS, SKIN_TEXTURE,
    SkinUniforms, UniformField, UniformKind, UniformLayout, VIEW_PROJ_UNIFORM,
};
pub use vertex::{
    BONE_LOCATION, NORMAL_LOCATION, POSITION_LOCATION, SkinVertex, UV_LOCATION,
    VertexAttribute, VertexBufferLayout, VertexFormat, skin_vertex_layout,
};

pub fn crate_info() -> &'static str {
    "skinview-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
