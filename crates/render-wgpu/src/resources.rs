use std::future::Future;
use std::sync::Arc;

use image::RgbaImage;
use skinview_render::{
    BufferUsage, DisposeFlag, GpuBuffer, GpuPipeline, GpuResource, GpuTexture, ImageSource,
    PipelineConfig, RenderError, ResourceId, TextureOptions, UploadGeneration, UploadOutcome,
    clamp_write, mip_chain, run_upload,
};

pub struct WgpuBuffer {
    pub(crate) id: ResourceId,
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) queue: Arc<wgpu::Queue>,
    pub(crate) usage: BufferUsage,
    pub(crate) disposed: DisposeFlag,
}

impl WgpuBuffer {
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl GpuResource for WgpuBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn dispose(&self) {
        if self.disposed.mark_disposed() {
            tracing::debug!(id = %self.id, "buffer disposed");
            self.buffer.destroy();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }
}

impl GpuBuffer for WgpuBuffer {
    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn size(&self) -> u64 {
        self.buffer.size()
    }

    fn update(&self, data: &[u8], byte_offset: u64) {
        if self.is_disposed() {
            return;
        }
        let Some((range, len)) = clamp_write(self.buffer.size(), byte_offset, data.len()) else {
            return;
        };
        if range.start % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            tracing::warn!(id = %self.id, offset = range.start, "unaligned buffer write dropped");
            return;
        }
        let padded = (len as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        if padded == len as u64 {
            self.queue.write_buffer(&self.buffer, range.start, &data[..len]);
        } else if range.start + padded <= self.buffer.size() {
            let mut bytes = data[..len].to_vec();
            bytes.resize(padded as usize, 0);
            self.queue.write_buffer(&self.buffer, range.start, &bytes);
        } else {
            let whole = len as u64 / wgpu::COPY_BUFFER_ALIGNMENT * wgpu::COPY_BUFFER_ALIGNMENT;
            tracing::warn!(id = %self.id, len, "buffer write tail does not fill a word, truncated");
            if whole > 0 {
                self.queue
                    .write_buffer(&self.buffer, range.start, &data[..whole as usize]);
            }
        }
    }
}

pub struct WgpuTexture {
    pub(crate) id: ResourceId,
    pub(crate) texture: Arc<wgpu::Texture>,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) queue: Arc<wgpu::Queue>,
    pub(crate) options: TextureOptions,
    pub(crate) size: (u32, u32),
    pub(crate) generation: UploadGeneration,
}

impl WgpuTexture {
    pub fn raw(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl GpuResource for WgpuTexture {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn dispose(&self) {
        if self.generation.dispose_flag().mark_disposed() {
            tracing::debug!(id = %self.id, "texture disposed");
            self.texture.destroy();
        }
    }

    fn is_disposed(&self) -> bool {
        self.generation.dispose_flag().is_disposed()
    }
}

impl GpuTexture for WgpuTexture {
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
        let queue = Arc::clone(&self.queue);
        let texture = Arc::clone(&self.texture);
        let mipmaps = self.options.generate_mipmaps;
        let size = self.size;
        async move {
            run_upload(ticket, source, size, |image| {
                write_texels(&queue, &texture, image, mipmaps)
            })
            .await
        }
    }
}

/// Upload `image` into mip 0, then the CPU-built chain when mipmapped.
pub(crate) fn write_texels(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    image: &RgbaImage,
    mipmaps: bool,
) {
    write_level(queue, texture, 0, image);
    if mipmaps {
        for (level, mip) in mip_chain(image).iter().enumerate() {
            write_level(queue, texture, level as u32 + 1, mip);
        }
    }
}

fn write_level(queue: &wgpu::Queue, texture: &wgpu::Texture, level: u32, image: &RgbaImage) {
    let (width, height) = image.dimensions();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

pub struct WgpuPipeline {
    pub(crate) id: ResourceId,
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) config: PipelineConfig,
    pub(crate) disposed: DisposeFlag,
}

impl WgpuPipeline {
    pub fn raw(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}

impl GpuResource for WgpuPipeline {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn dispose(&self) {
        if self.disposed.mark_disposed() {
            tracing::debug!(id = %self.id, label = %self.config.label, "pipeline disposed");
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }
}

impl GpuPipeline for WgpuPipeline {
    fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
