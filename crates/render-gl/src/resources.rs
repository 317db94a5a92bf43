use std::future::Future;
use std::rc::Rc;

use glow::HasContext;
use image::RgbaImage;
use skinview_render::{
    BufferUsage, DisposeFlag, GpuBuffer, GpuPipeline, GpuResource, GpuTexture, ImageSource,
    PipelineConfig, RenderError, ResourceId, TextureOptions, UploadGeneration, UploadOutcome,
    clamp_write, run_upload,
};

use crate::location::LocationCache;

pub struct GlBuffer {
    pub(crate) id: ResourceId,
    pub(crate) gl: Rc<glow::Context>,
    pub(crate) buffer: glow::Buffer,
    /// `ARRAY_BUFFER` or `ELEMENT_ARRAY_BUFFER`; WebGL forbids rebinding to
    /// the other target.
    pub(crate) target: u32,
    pub(crate) usage: BufferUsage,
    pub(crate) size: u64,
    pub(crate) disposed: DisposeFlag,
}

impl GlBuffer {
    pub fn raw(&self) -> glow::Buffer {
        self.buffer
    }
}

impl GpuResource for GlBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn dispose(&self) {
        if self.disposed.mark_disposed() {
            tracing::debug!(id = %self.id, "buffer disposed");
            unsafe { self.gl.delete_buffer(self.buffer) };
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }
}

impl GpuBuffer for GlBuffer {
    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, data: &[u8], byte_offset: u64) {
        if self.is_disposed() {
            return;
        }
        let Some((range, len)) = clamp_write(self.size, byte_offset, data.len()) else {
            return;
        };
        unsafe {
            self.gl.bind_buffer(self.target, Some(self.buffer));
            self.gl
                .buffer_sub_data_u8_slice(self.target, range.start as i32, &data[..len]);
        }
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

pub struct GlTexture {
    pub(crate) id: ResourceId,
    pub(crate) gl: Rc<glow::Context>,
    pub(crate) texture: glow::Texture,
    pub(crate) options: TextureOptions,
    pub(crate) size: (u32, u32),
    pub(crate) generation: UploadGeneration,
}

impl GlTexture {
    pub fn raw(&self) -> glow::Texture {
        self.texture
    }
}

impl GpuResource for GlTexture {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn dispose(&self) {
        if self.generation.dispose_flag().mark_disposed() {
            tracing::debug!(id = %self.id, "texture disposed");
            unsafe { self.gl.delete_texture(self.texture) };
        }
    }

    fn is_disposed(&self) -> bool {
        self.generation.dispose_flag().is_disposed()
    }
}

impl GpuTexture for GlTexture {
    fn width(&self) -> u32 {
        self.size.0
    }

    fn height(&self) -> u32 {
        self.size.1
    }

    fn options(&self) -> TextureOptions {
        self.options
    }

    fn update<S: ImageSource>(
        &self,
        source: S,
    ) -> impl Future<Output = Result<UploadOutcome, RenderError>> {
        let ticket = self.generation.ticket();
        let gl = Rc::clone(&self.gl);
        let texture = self.texture;
        let mipmaps = self.options.generate_mipmaps;
        let size = self.size;
        async move {
            run_upload(ticket, source, size, |image| {
                write_texels(&gl, texture, image, mipmaps)
            })
            .await
        }
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Replace level 0 of an already allocated texture and rebuild its mips.
pub(crate) fn write_texels(
    gl: &glow::Context,
    texture: glow::Texture,
    image: &RgbaImage,
    mipmaps: bool,
) {
    let (width, height) = image.dimensions();
    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_sub_image_2d(
            glow::TEXTURE_2D,
            0,
            0,
            0,
            width as i32,
            height as i32,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(image.as_raw()),
        );
        if mipmaps {
            gl.generate_mipmap(glow::TEXTURE_2D);
        }
    }
}

pub struct GlPipeline {
    pub(crate) id: ResourceId,
    pub(crate) gl: Rc<glow::Context>,
    pub(crate) program: glow::Program,
    pub(crate) config: PipelineConfig,
    pub(crate) locations: LocationCache<glow::UniformLocation>,
    pub(crate) disposed: DisposeFlag,
}

impl GlPipeline {
    pub fn raw(&self) -> glow::Program {
        self.program
    }

    /// Location of a uniform, queried from the driver once per name.
    pub(crate) fn location(&self, name: &str) -> Option<glow::UniformLocation> {
        self.locations
            .get(name, |name| unsafe { self.gl.get_uniform_location(self.program, name) })
    }

    /// Driver location queries issued so far.
    pub fn location_queries(&self) -> u64 {
        self.locations.queries()
    }
}

impl GpuResource for GlPipeline {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn dispose(&self) {
        if self.disposed.mark_disposed() {
            tracing::debug!(id = %self.id, label = %self.config.label, "pipeline disposed");
            self.locations.clear();
            unsafe { self.gl.delete_program(self.program) };
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }
}

impl GpuPipeline for GlPipeline {
    fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl Drop for GlPipeline {
    fn drop(&mut self) {
        self.dispose();
    }
}
