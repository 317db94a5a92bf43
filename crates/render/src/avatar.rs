use glam::Mat4;
use skinview_common::{
    ALPHA_TEST_UNIFORM, BONES_UNIFORM, MODEL_UNIFORM, POSE_FLOATS, SKIN_TEXTURE, VIEW_PROJ_UNIFORM,
};

use crate::bind::{BindGroup, DrawOutcome, DrawParams, IndexFormat, UniformValue};
use crate::renderer::Renderer;

/// Fragments with alpha below this are discarded.
pub const DEFAULT_ALPHA_TEST: f32 = 0.1;

/// Per-draw inputs of the skinned avatar pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SkinFrame<'a> {
    pub model: Mat4,
    pub view_proj: Mat4,
    /// The solver's pose buffer, borrowed for the draw.
    pub pose: &'a [f32; POSE_FLOATS],
    pub alpha_test: f32,
}

impl<'a> SkinFrame<'a> {
    pub fn new(view_proj: Mat4, pose: &'a [f32; POSE_FLOATS]) -> Self {
        Self {
            model: Mat4::IDENTITY,
            view_proj,
            pose,
            alpha_test: DEFAULT_ALPHA_TEST,
        }
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    pub fn bind_group<T>(&self, skin: &'a T) -> BindGroup<'a, T> {
        BindGroup::new()
            .uniform(MODEL_UNIFORM, UniformValue::Mat4(self.model))
            .uniform(VIEW_PROJ_UNIFORM, UniformValue::Mat4(self.view_proj))
            .uniform(BONES_UNIFORM, UniformValue::Mat4Array(self.pose))
            .uniform(ALPHA_TEST_UNIFORM, UniformValue::Float(self.alpha_test))
            .texture(SKIN_TEXTURE, skin)
    }
}

/// Indexed avatar geometry built from [`skinview_common::SkinVertex`].
#[derive(Debug)]
pub struct AvatarMesh<'a, B> {
    pub vertices: &'a B,
    pub indices: &'a B,
    pub index_count: u32,
    pub index_format: IndexFormat,
}

/// Draw the avatar mesh with the current pose.
pub fn draw_avatar<R: Renderer>(
    renderer: &mut R,
    pipeline: &R::Pipeline,
    mesh: &AvatarMesh<'_, R::Buffer>,
    skin: &R::Texture,
    frame: &SkinFrame<'_>,
) -> DrawOutcome {
    let params = DrawParams::new(pipeline, frame.bind_group(skin))
        .with_vertex_buffer(mesh.vertices)
        .with_index(mesh.indices, mesh.index_count, mesh.index_format);
    renderer.draw(&params)
}
