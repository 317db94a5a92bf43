use std::future::Future;

use crate::bind::{DrawOutcome, DrawParams};
use crate::camera::DepthRange;
use crate::error::RenderError;
use crate::id::ResourceId;
use crate::pipeline::PipelineConfig;
use crate::resource::{BufferUsage, GpuBuffer, GpuPipeline, GpuTexture, TextureOptions};
use crate::texture::ImageSource;

/// Renderer tuning shared by both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// MSAA samples; 1 disables multisampling.
    pub sample_count: u32,
    /// Uniform slots available per frame (retained-mode backend).
    pub uniform_pool_size: usize,
    /// Bytes per uniform slot; must hold the largest pipeline uniform block.
    pub uniform_buffer_size: u64,
    /// Prefer an sRGB surface/framebuffer when one is available.
    pub prefer_srgb: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            sample_count: 4,
            uniform_pool_size: 32,
            uniform_buffer_size: 1024,
            prefer_srgb: true,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.sample_count == 0 {
            return Err(RenderError::InvalidConfig("sample_count must be at least 1".into()));
        }
        if self.uniform_pool_size == 0 {
            return Err(RenderError::InvalidConfig(
                "uniform_pool_size must be at least 1".into(),
            ));
        }
        if self.uniform_buffer_size == 0 || self.uniform_buffer_size % 16 != 0 {
            return Err(RenderError::InvalidConfig(format!(
                "uniform_buffer_size {} is not a positive multiple of 16",
                self.uniform_buffer_size
            )));
        }
        Ok(())
    }

    /// Reject a pipeline whose uniform block does not fit a pool slot.
    pub fn check_uniform_block(&self, config: &PipelineConfig) -> Result<(), RenderError> {
        let size = config.uniform_layout.size() as u64;
        if size > self.uniform_buffer_size {
            return Err(RenderError::UniformBlockTooLarge {
                size,
                capacity: self.uniform_buffer_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// A GPU backend.
///
/// Frames follow `begin_frame` → `clear`/`draw`* → `end_frame`. Draws
/// outside a frame are skipped and logged. Once disposed, every call is a
/// no-op.
pub trait Renderer {
    type Buffer: GpuBuffer;
    type Texture: GpuTexture;
    type Pipeline: GpuPipeline;

    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8])
    -> Result<Self::Buffer, RenderError>;

    /// Decode `source` and upload it as an RGBA8 texture.
    fn create_texture<S: ImageSource>(
        &mut self,
        source: S,
        options: TextureOptions,
    ) -> impl Future<Output = Result<Self::Texture, RenderError>>;

    fn create_pipeline(&mut self, config: PipelineConfig) -> Result<Self::Pipeline, RenderError>;

    /// Open a frame. False if one is already open or the target is lost.
    fn begin_frame(&mut self) -> bool;

    /// Clear color and depth of the current frame.
    fn clear(&mut self, color: ClearColor);

    fn draw(
        &mut self,
        params: &DrawParams<'_, Self::Buffer, Self::Texture, Self::Pipeline>,
    ) -> DrawOutcome;

    /// Submit and present the open frame.
    fn end_frame(&mut self);

    /// Resize the render target. Fails inside an open frame.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Forget cached bindings for a texture.
    fn invalidate_texture(&mut self, texture: ResourceId);

    fn size(&self) -> (u32, u32);

    fn depth_range(&self) -> DepthRange;

    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}
