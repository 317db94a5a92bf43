use std::sync::Arc;

use skinview_render::{
    BindGroupCache, BufferUsage, ClearColor, DepthRange, DisposeFlag, DrawCall, DrawOutcome,
    DrawParams, FrameSlot, GpuResource, ImageSource, PipelineConfig, PipelineTracker,
    PreparedDraw, RenderError, Renderer, RendererConfig, ResourceId, ResourceIds, SkipReason,
    TextureOptions, UniformPool, UploadGeneration, mip_level_count, prepare_draw,
};
use wgpu::util::DeviceExt;

use crate::context::{Acquired, Target, WgpuInit, create_instance, request_device};
use crate::convert;
use crate::resources::{WgpuBuffer, WgpuPipeline, WgpuTexture, write_texels};
use crate::targets::{Attachments, DEPTH_FORMAT};

/// Vertex entry point every pipeline's shader must define.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point every pipeline's shader must define.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Error scopes are awaited on native targets only. On wasm, failures go to
/// the device's uncaptured error handler.
#[cfg(not(target_arch = "wasm32"))]
fn push_scope(device: &wgpu::Device, filter: wgpu::ErrorFilter) {
    device.push_error_scope(filter);
}

#[cfg(target_arch = "wasm32")]
fn push_scope(_device: &wgpu::Device, _filter: wgpu::ErrorFilter) {}

#[cfg(not(target_arch = "wasm32"))]
fn pop_scope(device: &wgpu::Device) -> Option<wgpu::Error> {
    pollster::block_on(device.pop_error_scope())
}

#[cfg(target_arch = "wasm32")]
fn pop_scope(_device: &wgpu::Device) -> Option<wgpu::Error> {
    None
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct WgpuFrame {
    output: Acquired,
    encoder: wgpu::CommandEncoder,
    pass: Option<wgpu::RenderPass<'static>>,
    depth_cleared: bool,
}

/// Retained-mode renderer on wgpu.
///
/// Uniforms go through a fixed pool of per-draw buffers (bind group 0);
/// every pipeline texture gets its own bind group at index `1 + slot`.
pub struct WgpuRenderer {
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    target: Target,
    attachments: Attachments,
    config: RendererConfig,
    ids: ResourceIds,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pool: UniformPool<UniformSlot>,
    bind_groups: BindGroupCache<wgpu::BindGroup>,
    staging: Vec<u8>,
    tracker: PipelineTracker,
    frame: FrameSlot<WgpuFrame>,
    size: (u32, u32),
    disposed: bool,
}

impl WgpuRenderer {
    /// Render into a window surface created from `instance`.
    pub async fn new(
        instance: wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        init: WgpuInit,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface), &init).await?;
        let target = Target::surface(
            surface,
            &adapter,
            &device,
            &init,
            config.prefer_srgb,
            width,
            height,
        )?;
        Ok(Self::assemble(instance, adapter, device, queue, target, config, width, height))
    }

    /// Render into an offscreen texture.
    pub async fn headless(
        width: u32,
        height: u32,
        init: WgpuInit,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let instance = create_instance(&init);
        let (adapter, device, queue) = request_device(&instance, None, &init).await?;
        let target = Target::offscreen(&device, config.prefer_srgb, width, height);
        Ok(Self::assemble(instance, adapter, device, queue, target, config, width, height))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        target: Target,
        mut config: RendererConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let format = target.format();
        let supported = adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(config.sample_count);
        if !supported {
            tracing::warn!(
                requested = config.sample_count,
                ?format,
                "sample count unsupported, falling back to 1"
            );
            config.sample_count = 1;
        }

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let slots = (0..config.uniform_pool_size)
            .map(|_| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("uniform_pool_buffer"),
                    size: config.uniform_buffer_size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("uniform_pool_bind_group"),
                    layout: &uniform_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                UniformSlot { buffer, bind_group }
            })
            .collect();

        let attachments = Attachments::new(&device, format, width, height, config.sample_count);
        tracing::info!(
            ?format,
            width,
            height,
            samples = config.sample_count,
            pool = config.uniform_pool_size,
            "wgpu renderer ready"
        );

        Self {
            _instance: instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            target,
            attachments,
            config,
            ids: ResourceIds::new(),
            uniform_layout,
            texture_layout,
            pool: UniformPool::new(slots),
            bind_groups: BindGroupCache::new(),
            staging: Vec::new(),
            tracker: PipelineTracker::new(),
            frame: FrameSlot::new(),
            size: (width.max(1), height.max(1)),
            disposed: false,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.target.format()
    }

    /// The effective config, after sample count fallback.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The render target of a headless renderer.
    pub fn offscreen_texture(&self) -> Option<&wgpu::Texture> {
        match &self.target {
            Target::Offscreen { texture, .. } => Some(texture),
            Target::Surface { .. } => None,
        }
    }

    /// Pool exhaustion count, for frame-loop diagnostics.
    pub fn pool_exhaustions(&self) -> u64 {
        self.pool.exhaustion_warnings()
    }

    fn open_pass(
        frame: &mut WgpuFrame,
        attachments: &Attachments,
        tracker: &mut PipelineTracker,
        clear: Option<ClearColor>,
    ) {
        frame.pass = None;
        let color_load = match clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.r),
                g: f64::from(c.g),
                b: f64::from(c.b),
                a: f64::from(c.a),
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = if clear.is_some() || !frame.depth_cleared {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        frame.depth_cleared = true;

        let (view, resolve_target) = attachments.color(&frame.output.view);
        let pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("skinview_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &attachments.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();
        frame.pass = Some(pass);
        tracker.reset();
    }
}

impl Renderer for WgpuRenderer {
    type Buffer = WgpuBuffer;
    type Texture = WgpuTexture;
    type Pipeline = WgpuPipeline;

    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<WgpuBuffer, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        if data.is_empty() {
            return Err(RenderError::BufferAllocation {
                size: 0,
                reason: "empty buffer".into(),
            });
        }
        let mut usages = wgpu::BufferUsages::COPY_DST;
        if usage.contains(BufferUsage::VERTEX) {
            usages |= wgpu::BufferUsages::VERTEX;
        }
        if usage.contains(BufferUsage::INDEX) {
            usages |= wgpu::BufferUsages::INDEX;
        }
        if usage.contains(BufferUsage::UNIFORM) {
            usages |= wgpu::BufferUsages::UNIFORM;
        }

        push_scope(&self.device, wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skinview_buffer"),
            contents: data,
            usage: usages,
        });
        if let Some(err) = pop_scope(&self.device) {
            return Err(RenderError::BufferAllocation {
                size: data.len() as u64,
                reason: err.to_string(),
            });
        }

        let id = self.ids.next_buffer();
        tracing::debug!(%id, ?usage, size = data.len(), "buffer created");
        Ok(WgpuBuffer {
            id,
            buffer,
            queue: Arc::clone(&self.queue),
            usage,
            disposed: DisposeFlag::new(),
        })
    }

    async fn create_texture<S: ImageSource>(
        &mut self,
        source: S,
        options: TextureOptions,
    ) -> Result<WgpuTexture, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let image = source.decode().await?;
        let (width, height) = image.dimensions();
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::TextureCreation(format!(
                "{width}x{height} outside 1..={max}"
            )));
        }
        let mip_level_count = if options.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skin_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::texture_format(&options),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_texels(&self.queue, &texture, &image, options.generate_mipmaps);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&convert::sampler_descriptor(&options));

        let id = self.ids.next_texture();
        tracing::debug!(%id, width, height, mip_level_count, "texture created");
        Ok(WgpuTexture {
            id,
            texture: Arc::new(texture),
            view,
            sampler,
            queue: Arc::clone(&self.queue),
            options,
            size: (width, height),
            generation: UploadGeneration::new(),
        })
    }

    fn create_pipeline(&mut self, config: PipelineConfig) -> Result<WgpuPipeline, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        config
            .validate()
            .map_err(|message| RenderError::PipelineCreation {
                label: config.label.clone(),
                message,
            })?;
        self.config.check_uniform_block(&config)?;

        let _span = tracing::info_span!("create_pipeline", label = %config.label).entered();
        push_scope(&self.device, wgpu::ErrorFilter::Validation);

        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(config.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(config.vertex_shader.as_str().into()),
        });
        let separate_fragment;
        let fragment_module = if config.fragment_shader == config.vertex_shader {
            &vertex_module
        } else {
            separate_fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(config.label.as_str()),
                source: wgpu::ShaderSource::Wgsl(config.fragment_shader.as_str().into()),
            });
            &separate_fragment
        };

        let mut layouts = vec![&self.uniform_layout];
        layouts.extend(std::iter::repeat_n(&self.texture_layout, config.textures.len()));
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(config.label.as_str()),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = config
            .vertex_layouts
            .iter()
            .map(convert::vertex_attributes)
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = config
            .vertex_layouts
            .iter()
            .zip(&attributes)
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(config.label.as_str()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment_module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target.format(),
                        blend: convert::blend_state(config.blend_mode),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: convert::topology(config.topology),
                    cull_mode: convert::cull_mode(config.cull_mode),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: config.depth_write,
                    depth_compare: convert::compare(config.depth_compare),
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: self.config.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            });

        if let Some(err) = pop_scope(&self.device) {
            return Err(RenderError::PipelineCreation {
                label: config.label.clone(),
                message: err.to_string(),
            });
        }

        let id = self.ids.next_pipeline();
        tracing::debug!(%id, label = %config.label, "pipeline created");
        Ok(WgpuPipeline {
            id,
            pipeline,
            config,
            disposed: DisposeFlag::new(),
        })
    }

    fn begin_frame(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        if self.frame.is_open() {
            tracing::warn!("begin_frame called inside an open frame");
            return false;
        }
        let Some(output) = self.target.acquire(&self.device) else {
            return false;
        };
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("skinview_frame"),
            });
        self.pool.begin_frame();
        self.tracker.reset();
        self.frame
            .open(WgpuFrame {
                output,
                encoder,
                pass: None,
                depth_cleared: false,
            })
            .is_ok()
    }

    fn clear(&mut self, color: ClearColor) {
        if self.disposed {
            return;
        }
        let Some(frame) = self.frame.current_mut() else {
            tracing::warn!("clear called outside a frame");
            return;
        };
        Self::open_pass(frame, &self.attachments, &mut self.tracker, Some(color));
    }

    fn draw(&mut self, params: &DrawParams<'_, WgpuBuffer, WgpuTexture, WgpuPipeline>) -> DrawOutcome {
        if self.disposed {
            return DrawOutcome::Skipped(SkipReason::Disposed);
        }
        let Some(frame) = self.frame.current_mut() else {
            tracing::warn!("draw called outside a frame");
            return DrawOutcome::Skipped(SkipReason::NoFrame);
        };
        let PreparedDraw { call, slot, .. } =
            match prepare_draw(params, &mut self.pool, &mut self.staging) {
                Ok(prepared) => prepared,
                Err(reason) => {
                    tracing::debug!(?reason, "draw skipped");
                    return DrawOutcome::Skipped(reason);
                }
            };

        let pipeline = params.pipeline;
        if !self.staging.is_empty() {
            self.queue.write_buffer(&slot.buffer, 0, &self.staging);
        }

        if frame.pass.is_none() {
            Self::open_pass(frame, &self.attachments, &mut self.tracker, None);
        }
        let Some(pass) = frame.pass.as_mut() else {
            return DrawOutcome::Skipped(SkipReason::NoFrame);
        };

        if self.tracker.should_bind(pipeline.id()) {
            pass.set_pipeline(&pipeline.pipeline);
        }
        pass.set_bind_group(0, &slot.bind_group, &[]);
        for (index, texture) in params.ordered_textures() {
            let device = &self.device;
            let layout = &self.texture_layout;
            let group = self.bind_groups.get_or_build(texture.id(), pipeline.id(), || {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("texture_bind_group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                })
            });
            pass.set_bind_group(1 + index as u32, group, &[]);
        }
        for (index, buffer) in params.vertex_buffers.iter().enumerate() {
            pass.set_vertex_buffer(index as u32, buffer.buffer.slice(..));
        }

        match (call, &params.index) {
            (DrawCall::Indexed { count, format }, Some(index)) => {
                pass.set_index_buffer(index.buffer.buffer.slice(..), convert::index_format(format));
                pass.draw_indexed(0..count, 0, 0..1);
            }
            (DrawCall::Vertices { count }, _) => pass.draw(0..count, 0..1),
            (DrawCall::Indexed { .. }, None) => {
                return DrawOutcome::Skipped(SkipReason::MissingCount);
            }
        }
        DrawOutcome::Drawn
    }

    fn end_frame(&mut self) {
        let Some(mut frame) = self.frame.close() else {
            tracing::warn!("end_frame called without an open frame");
            return;
        };
        let _span = tracing::info_span!("submit_frame", frame = self.frame.completed()).entered();
        frame.pass = None;
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        if let Some(surface_texture) = frame.output.surface_texture {
            surface_texture.present();
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        if self.frame.is_open() {
            return Err(RenderError::ResizeDuringFrame);
        }
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.size {
            return Ok(());
        }
        self.target.resize(&self.device, width, height);
        self.attachments = Attachments::new(
            &self.device,
            self.target.format(),
            width,
            height,
            self.config.sample_count,
        );
        self.size = (width, height);
        Ok(())
    }

    fn invalidate_texture(&mut self, texture: ResourceId) {
        if self.bind_groups.invalidate(texture) {
            tracing::debug!(%texture, "texture bind group invalidated");
        }
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn depth_range(&self) -> DepthRange {
        DepthRange::ZeroToOne
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(mut frame) = self.frame.abandon() {
            frame.pass = None;
        }
        self.bind_groups.clear();
        self.tracker.reset();
        tracing::debug!("wgpu renderer disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::SKIN_SHADER;
    use skinview_common::{SKIN_TEXTURE, SkinVertex};
    use skinview_render::{BindGroup, GpuTexture};

    fn headless(pool: usize) -> Option<WgpuRenderer> {
        let config = RendererConfig {
            uniform_pool_size: pool,
            ..Default::default()
        };
        match pollster::block_on(WgpuRenderer::headless(64, 64, WgpuInit::default(), config)) {
            Ok(renderer) => Some(renderer),
            Err(err) => {
                eprintln!("no adapter: {err}");
                None
            }
        }
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn headless_frame_overflows_pool_and_survives_dispose() {
        let Some(mut renderer) = headless(3) else {
            return;
        };
        let pipeline = renderer
            .create_pipeline(PipelineConfig::skin("skin", SKIN_SHADER, SKIN_SHADER))
            .unwrap();
        let vertices = renderer
            .create_buffer(BufferUsage::VERTEX, &[0; size_of::<SkinVertex>() * 3])
            .unwrap();
        let skin = pollster::block_on(
            renderer.create_texture(image::RgbaImage::new(64, 64), TextureOptions::default()),
        )
        .unwrap();
        assert_eq!(skin.width(), 64);

        assert!(renderer.begin_frame());
        renderer.clear(ClearColor::TRANSPARENT);
        let untextured: DrawParams<'_, WgpuBuffer, WgpuTexture, WgpuPipeline> =
            DrawParams::new(&pipeline, BindGroup::new())
                .with_vertex_buffer(&vertices)
                .with_vertex_count(3);
        assert_eq!(
            renderer.draw(&untextured),
            DrawOutcome::Skipped(SkipReason::MissingTexture)
        );
        let params = DrawParams::new(&pipeline, BindGroup::new().texture(SKIN_TEXTURE, &skin))
            .with_vertex_buffer(&vertices)
            .with_vertex_count(3);
        let outcomes: Vec<_> = (0..5).map(|_| renderer.draw(&params)).collect();
        renderer.end_frame();
        assert_eq!(outcomes.iter().filter(|o| o.is_drawn()).count(), 3);
        assert_eq!(outcomes[3], DrawOutcome::Skipped(SkipReason::PoolExhausted));
        assert_eq!(renderer.pool_exhaustions(), 1);

        skin.dispose();
        skin.dispose();
        vertices.dispose();
        vertices.dispose();
        pipeline.dispose();
        pipeline.dispose();
        assert!(skin.is_disposed() && vertices.is_disposed() && pipeline.is_disposed());

        renderer.dispose();
        renderer.dispose();
        assert!(renderer.is_disposed());
        assert!(!renderer.begin_frame());
        assert_eq!(renderer.draw(&params), DrawOutcome::Skipped(SkipReason::Disposed));
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn invalid_wgsl_is_caught_by_error_scope() {
        let Some(mut renderer) = headless(1) else {
            return;
        };
        let err = renderer
            .create_pipeline(PipelineConfig::skin("broken", "fn vs_main(", "fn vs_main("))
            .err();
        assert!(matches!(err, Some(RenderError::PipelineCreation { .. })));
    }
}
