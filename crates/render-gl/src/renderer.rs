use std::rc::Rc;

use glow::HasContext;
use skinview_render::{
    BufferUsage, ClearColor, DepthRange, DisposeFlag, DrawCall, DrawOutcome, DrawParams,
    FrameSlot, GpuResource, ImageSource, PipelineConfig, PipelineTracker, RenderError, Renderer,
    RendererConfig, ResourceId, ResourceIds, ShaderDiagnostic, ShaderStage, SkipReason,
    TextureOptions, UniformValue, UploadGeneration,
};

use crate::convert;
use crate::location::LocationCache;
use crate::resources::{GlBuffer, GlPipeline, GlTexture};
use crate::target::{ColorEncoding, Offscreen};
use crate::version::GlVersion;

/// Immediate-mode renderer on an OpenGL 3.3, GLES 3.0 or WebGL2 context.
///
/// Fixed-function state is issued only when the bound pipeline changes.
/// Uniforms are set one by one through each program's location cache.
pub struct GlRenderer {
    gl: Rc<glow::Context>,
    version: GlVersion,
    config: RendererConfig,
    ids: ResourceIds,
    vao: glow::VertexArray,
    offscreen: Offscreen,
    encoding: ColorEncoding,
    max_texture_size: u32,
    /// Bitmask of enabled attribute locations on the shared VAO.
    enabled_attributes: u32,
    tracker: PipelineTracker,
    frame: FrameSlot<()>,
    disposed: bool,
}

impl GlRenderer {
    /// Take over a current GL context drawing to a `width` x `height`
    /// default framebuffer.
    pub fn new(
        gl: glow::Context,
        width: u32,
        height: u32,
        mut config: RendererConfig,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let raw_version = unsafe { gl.get_parameter_string(glow::VERSION) };
        let version = GlVersion::parse(&raw_version).ok_or_else(|| {
            RenderError::Unsupported(format!("unrecognized GL version {raw_version:?}"))
        })?;
        version.require_supported()?;

        let max_samples = unsafe { gl.get_parameter_i32(glow::MAX_SAMPLES) }.max(1) as u32;
        if config.sample_count > max_samples {
            tracing::warn!(
                requested = config.sample_count,
                max_samples,
                "sample count unsupported, clamping"
            );
            config.sample_count = max_samples;
        }
        let max_texture_size = unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) }.max(1) as u32;

        let vao = unsafe { gl.create_vertex_array() }.map_err(RenderError::NoDevice)?;
        let encoding = ColorEncoding::select(config.prefer_srgb, version.embedded);
        let offscreen = Offscreen::new(
            &gl,
            width,
            height,
            config.sample_count,
            encoding.color_format,
        )?;
        unsafe {
            gl.bind_vertex_array(Some(vao));
            gl.enable(glow::DEPTH_TEST);
        }

        tracing::info!(
            %version,
            width,
            height,
            samples = config.sample_count,
            srgb_target = encoding.framebuffer_srgb,
            "gl renderer ready"
        );
        Ok(Self {
            gl: Rc::new(gl),
            version,
            config,
            ids: ResourceIds::new(),
            vao,
            offscreen,
            encoding,
            max_texture_size,
            enabled_attributes: 0,
            tracker: PipelineTracker::new(),
            frame: FrameSlot::new(),
            disposed: false,
        })
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn version(&self) -> GlVersion {
        self.version
    }

    pub fn color_encoding(&self) -> ColorEncoding {
        self.encoding
    }

    /// The effective config, after sample count clamping.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn compile(
        &self,
        label: &str,
        stage: ShaderStage,
        body: &str,
    ) -> Result<glow::Shader, RenderError> {
        let source = format!("{}{}", self.version.shader_header(), body);
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(|message| RenderError::PipelineCreation {
                    label: label.to_string(),
                    message,
                })?;
            self.gl.shader_source(shader, &source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                return Ok(shader);
            }
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            Err(RenderError::ShaderCompile {
                label: label.to_string(),
                diagnostic: ShaderDiagnostic::new(stage, &source, &log),
            })
        }
    }

    /// Push cull, blend and depth state for `config`.
    fn apply_state(&self, config: &PipelineConfig) {
        let gl = &self.gl;
        unsafe {
            match convert::cull_face(config.cull_mode) {
                Some(face) => {
                    gl.enable(glow::CULL_FACE);
                    gl.cull_face(face);
                }
                None => gl.disable(glow::CULL_FACE),
            }
            if config.blend_mode.is_enabled() {
                let (src, dst) = config.blend_mode.factors();
                gl.enable(glow::BLEND);
                gl.blend_func(convert::blend_factor(src), convert::blend_factor(dst));
            } else {
                gl.disable(glow::BLEND);
            }
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(convert::compare(config.depth_compare));
            gl.depth_mask(config.depth_write);
        }
    }

    fn set_uniform(&self, pipeline: &GlPipeline, name: &str, value: &UniformValue<'_>) {
        let field = pipeline.config.uniform_layout.field(name);
        if let Some(field) = field {
            if !value.fits(field.kind) {
                tracing::warn!(uniform = name, expected = ?field.kind, "uniform shape mismatch, skipped");
                return;
            }
        }
        let Some(location) = pipeline.location(name) else {
            return;
        };
        let gl = &self.gl;
        unsafe {
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(Some(&location), *v),
                UniformValue::Vec4(v) => gl.uniform_4_f32(Some(&location), v.x, v.y, v.z, v.w),
                UniformValue::Mat4(m) => {
                    gl.uniform_matrix_4_f32_slice(Some(&location), false, &m.to_cols_array())
                }
                UniformValue::Mat4Array(values) => {
                    let mut floats = values.len() / 16 * 16;
                    if let Some(field) = field {
                        floats = floats.min(field.kind.floats());
                    }
                    if floats > 0 {
                        gl.uniform_matrix_4_f32_slice(Some(&location), false, &values[..floats]);
                    }
                }
            }
        }
    }

    /// Point the shared VAO at `buffers`, one per pipeline vertex layout.
    fn bind_vertex_buffers(&mut self, config: &PipelineConfig, buffers: &[&GlBuffer]) {
        let gl = &self.gl;
        let mut enabled = 0u32;
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            for (layout, buffer) in config.vertex_layouts.iter().zip(buffers) {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer.buffer));
                for attribute in &layout.attributes {
                    let Some(bit) = 1u32.checked_shl(attribute.location) else {
                        continue;
                    };
                    gl.enable_vertex_attrib_array(attribute.location);
                    gl.vertex_attrib_pointer_f32(
                        attribute.location,
                        convert::components(attribute.format),
                        glow::FLOAT,
                        false,
                        layout.stride as i32,
                        attribute.offset as i32,
                    );
                    enabled |= bit;
                }
            }
            let stale = self.enabled_attributes & !enabled;
            for location in 0..32 {
                if stale & (1 << location) != 0 {
                    gl.disable_vertex_attrib_array(location);
                }
            }
        }
        self.enabled_attributes = enabled;
    }
}

impl Renderer for GlRenderer {
    type Buffer = GlBuffer;
    type Texture = GlTexture;
    type Pipeline = GlPipeline;

    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<GlBuffer, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        if data.is_empty() {
            return Err(RenderError::BufferAllocation {
                size: 0,
                reason: "empty buffer".into(),
            });
        }
        let target = if usage.contains(BufferUsage::INDEX) {
            glow::ELEMENT_ARRAY_BUFFER
        } else if usage.contains(BufferUsage::UNIFORM) && !usage.contains(BufferUsage::VERTEX) {
            glow::UNIFORM_BUFFER
        } else {
            glow::ARRAY_BUFFER
        };
        let gl = &self.gl;
        let buffer = unsafe {
            let buffer = gl
                .create_buffer()
                .map_err(|reason| RenderError::BufferAllocation {
                    size: data.len() as u64,
                    reason,
                })?;
            gl.bind_buffer(target, Some(buffer));
            gl.buffer_data_u8_slice(target, data, glow::DYNAMIC_DRAW);
            if gl.get_error() == glow::OUT_OF_MEMORY {
                gl.delete_buffer(buffer);
                return Err(RenderError::BufferAllocation {
                    size: data.len() as u64,
                    reason: "GL_OUT_OF_MEMORY".into(),
                });
            }
            buffer
        };

        let id = self.ids.next_buffer();
        tracing::debug!(%id, ?usage, size = data.len(), "buffer created");
        Ok(GlBuffer {
            id,
            gl: Rc::clone(&self.gl),
            buffer,
            target,
            usage,
            size: data.len() as u64,
            disposed: DisposeFlag::new(),
        })
    }

    async fn create_texture<S: ImageSource>(
        &mut self,
        source: S,
        options: TextureOptions,
    ) -> Result<GlTexture, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let options = self.encoding.texture_options(options);
        let image = source.decode().await?;
        let (width, height) = image.dimensions();
        let max = self.max_texture_size;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::TextureCreation(format!(
                "{width}x{height} outside 1..={max}"
            )));
        }

        let gl = &self.gl;
        let texture = unsafe {
            let texture = gl.create_texture().map_err(RenderError::TextureCreation)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                convert::internal_format(&options),
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(image.as_raw()),
            );
            let min = convert::min_filter(options.min_filter, options.generate_mipmaps);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min);
            let mag = convert::mag_filter(options.mag_filter);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, mag);
            let wrap_s = convert::wrap(options.wrap_u);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap_s);
            let wrap_t = convert::wrap(options.wrap_v);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap_t);
            if options.generate_mipmaps {
                gl.generate_mipmap(glow::TEXTURE_2D);
            }
            texture
        };

        let id = self.ids.next_texture();
        tracing::debug!(%id, width, height, mipmaps = options.generate_mipmaps, "texture created");
        Ok(GlTexture {
            id,
            gl: Rc::clone(&self.gl),
            texture,
            options,
            size: (width, height),
            generation: UploadGeneration::new(),
        })
    }

    fn create_pipeline(&mut self, config: PipelineConfig) -> Result<GlPipeline, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        config
            .validate()
            .map_err(|message| RenderError::PipelineCreation {
                label: config.label.clone(),
                message,
            })?;
        let _span = tracing::info_span!("create_pipeline", label = %config.label).entered();

        let vertex = self.compile(&config.label, ShaderStage::Vertex, &config.vertex_shader)?;
        let fragment = match self.compile(&config.label, ShaderStage::Fragment, &config.fragment_shader) {
            Ok(fragment) => fragment,
            Err(err) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(err);
            }
        };

        let gl = &self.gl;
        let program = unsafe {
            let program = gl
                .create_program()
                .map_err(|message| RenderError::PipelineCreation {
                    label: config.label.clone(),
                    message,
                })?;
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(RenderError::ProgramLink {
                    label: config.label.clone(),
                    log: log.trim().to_string(),
                });
            }
            program
        };

        let id = self.ids.next_pipeline();
        tracing::debug!(%id, label = %config.label, "pipeline created");
        Ok(GlPipeline {
            id,
            gl: Rc::clone(&self.gl),
            program,
            config,
            locations: LocationCache::new(),
            disposed: DisposeFlag::new(),
        })
    }

    fn begin_frame(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        if self.frame.open(()).is_err() {
            return false;
        }
        self.tracker.reset();
        self.offscreen.bind(&self.gl);
        if self.encoding.framebuffer_srgb {
            unsafe { self.gl.enable(glow::FRAMEBUFFER_SRGB) };
        }
        true
    }

    fn clear(&mut self, color: ClearColor) {
        if self.disposed {
            return;
        }
        if !self.frame.is_open() {
            tracing::warn!("clear called outside a frame");
            return;
        }
        unsafe {
            self.gl.clear_color(color.r, color.g, color.b, color.a);
            self.gl.clear_depth_f32(1.0);
            // Depth writes must be on for the depth clear to land.
            self.gl.depth_mask(true);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        self.tracker.reset();
    }

    fn draw(&mut self, params: &DrawParams<'_, GlBuffer, GlTexture, GlPipeline>) -> DrawOutcome {
        if self.disposed {
            return DrawOutcome::Skipped(SkipReason::Disposed);
        }
        if !self.frame.is_open() {
            tracing::warn!("draw called outside a frame");
            return DrawOutcome::Skipped(SkipReason::NoFrame);
        }
        let call = match params.resolve() {
            Ok(call) => call,
            Err(reason) => {
                tracing::debug!(?reason, "draw skipped");
                return DrawOutcome::Skipped(reason);
            }
        };

        let pipeline = params.pipeline;
        if self.tracker.should_bind(pipeline.id) {
            unsafe { self.gl.use_program(Some(pipeline.program)) };
            self.apply_state(&pipeline.config);
        }
        for (name, value) in &params.bind_group.uniforms {
            self.set_uniform(pipeline, name, value);
        }
        for (slot, texture) in params.ordered_textures() {
            let name = &pipeline.config.textures[slot];
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + slot as u32);
                self.gl.bind_texture(glow::TEXTURE_2D, Some(texture.texture));
                if let Some(location) = pipeline.location(name) {
                    self.gl.uniform_1_i32(Some(&location), slot as i32);
                }
            }
        }
        self.bind_vertex_buffers(&pipeline.config, &params.vertex_buffers);

        let mode = convert::topology(pipeline.config.topology);
        unsafe {
            match (call, &params.index) {
                (DrawCall::Indexed { count, format }, Some(index)) => {
                    self.gl
                        .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index.buffer.buffer));
                    self.gl
                        .draw_elements(mode, count as i32, convert::index_type(format), 0);
                }
                (DrawCall::Vertices { count }, _) => self.gl.draw_arrays(mode, 0, count as i32),
                (DrawCall::Indexed { .. }, None) => {
                    return DrawOutcome::Skipped(SkipReason::MissingCount);
                }
            }
        }
        DrawOutcome::Drawn
    }

    fn end_frame(&mut self) {
        if self.frame.close().is_none() {
            tracing::warn!("end_frame called without an open frame");
            return;
        }
        let _span = tracing::trace_span!("present_frame", frame = self.frame.completed()).entered();
        if self.encoding.framebuffer_srgb {
            unsafe { self.gl.disable(glow::FRAMEBUFFER_SRGB) };
        }
        self.offscreen.blit(&self.gl);
        unsafe { self.gl.flush() };
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        if self.frame.is_open() {
            return Err(RenderError::ResizeDuringFrame);
        }
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.offscreen.width, self.offscreen.height) {
            return Ok(());
        }
        let next = Offscreen::new(
            &self.gl,
            width,
            height,
            self.config.sample_count,
            self.encoding.color_format,
        )?;
        self.offscreen.destroy(&self.gl);
        self.offscreen = next;
        Ok(())
    }

    fn invalidate_texture(&mut self, texture: ResourceId) {
        // Textures are bound per draw; nothing is cached per texture.
        tracing::trace!(%texture, "texture invalidated");
    }

    fn size(&self) -> (u32, u32) {
        (self.offscreen.width, self.offscreen.height)
    }

    fn depth_range(&self) -> DepthRange {
        DepthRange::NegativeOneToOne
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if self.frame.abandon().is_some() && self.encoding.framebuffer_srgb {
            unsafe { self.gl.disable(glow::FRAMEBUFFER_SRGB) };
        }
        self.tracker.reset();
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.delete_vertex_array(self.vao);
            self.gl.use_program(None);
        }
        self.offscreen.destroy(&self.gl);
        tracing::debug!("gl renderer disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for GlRenderer {
    fn drop(&mut self) {
        self.dispose();
    }
}
