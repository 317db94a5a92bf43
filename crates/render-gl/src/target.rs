use glow::HasContext;
use skinview_render::{RenderError, TextureOptions};

/// How color is stored and encoded on the way to the default framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorEncoding {
    /// Offscreen color renderbuffer format.
    pub color_format: u32,
    /// `FRAMEBUFFER_SRGB` is enabled while drawing into the offscreen target.
    pub framebuffer_srgb: bool,
    /// sRGB textures are stored as `SRGB8_ALPHA8` and linearized when sampled.
    pub decode_textures: bool,
}

impl ColorEncoding {
    /// Desktop GL renders into `SRGB8_ALPHA8` with `FRAMEBUFFER_SRGB` on and
    /// blits the encoded bytes. GLES and WebGL2 linearize an sRGB read buffer
    /// during a blit, so there texels stay encoded end to end in `RGBA8`.
    pub fn select(prefer_srgb: bool, embedded: bool) -> Self {
        match (prefer_srgb, embedded) {
            (true, false) => Self {
                color_format: glow::SRGB8_ALPHA8,
                framebuffer_srgb: true,
                decode_textures: true,
            },
            (true, true) => Self {
                color_format: glow::RGBA8,
                framebuffer_srgb: false,
                decode_textures: false,
            },
            (false, _) => Self {
                color_format: glow::RGBA8,
                framebuffer_srgb: false,
                decode_textures: true,
            },
        }
    }

    /// Texture options as they are allocated under this encoding.
    pub fn texture_options(&self, mut options: TextureOptions) -> TextureOptions {
        options.srgb &= self.decode_textures;
        options
    }
}

/// Color + depth renderbuffers every frame renders into, blitted to the
/// default framebuffer at the end of the frame.
pub struct Offscreen {
    pub framebuffer: glow::Framebuffer,
    color: glow::Renderbuffer,
    depth: glow::Renderbuffer,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl Offscreen {
    pub fn new(
        gl: &glow::Context,
        width: u32,
        height: u32,
        samples: u32,
        color_format: u32,
    ) -> Result<Self, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        unsafe {
            let framebuffer = gl.create_framebuffer().map_err(RenderError::TextureCreation)?;
            let color = gl.create_renderbuffer().map_err(RenderError::TextureCreation)?;
            let depth = gl.create_renderbuffer().map_err(RenderError::TextureCreation)?;

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            storage(gl, color, color_format, width, height, samples);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(color),
            );
            storage(gl, depth, glow::DEPTH_COMPONENT24, width, height, samples);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            let target = Self {
                framebuffer,
                color,
                depth,
                width,
                height,
                samples,
            };
            if status != glow::FRAMEBUFFER_COMPLETE {
                target.destroy(gl);
                return Err(RenderError::TextureCreation(format!(
                    "offscreen framebuffer incomplete (status 0x{status:x})"
                )));
            }
            tracing::debug!(width, height, samples, "offscreen framebuffer created");
            Ok(target)
        }
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
            gl.viewport(0, 0, self.width as i32, self.height as i32);
        }
    }

    /// Resolve into the default framebuffer.
    pub fn blit(&self, gl: &glow::Context) {
        let (w, h) = (self.width as i32, self.height as i32);
        unsafe {
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(self.framebuffer));
            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            gl.blit_framebuffer(0, 0, w, h, 0, 0, w, h, glow::COLOR_BUFFER_BIT, glow::NEAREST);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.framebuffer);
            gl.delete_renderbuffer(self.color);
            gl.delete_renderbuffer(self.depth);
        }
    }
}

unsafe fn storage(
    gl: &glow::Context,
    renderbuffer: glow::Renderbuffer,
    format: u32,
    width: u32,
    height: u32,
    samples: u32,
) {
    unsafe {
        gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
        if samples > 1 {
            gl.renderbuffer_storage_multisample(
                glow::RENDERBUFFER,
                samples as i32,
                format,
                width as i32,
                height as i32,
            );
        } else {
            gl.renderbuffer_storage(glow::RENDERBUFFER, format, width as i32, height as i32);
        }
    }
}
