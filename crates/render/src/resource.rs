use std::future::Future;
use std::ops::Range;

use crate::error::RenderError;
use crate::id::ResourceId;
use crate::pipeline::PipelineConfig;
use crate::texture::{ImageSource, UploadOutcome};

bitflags::bitflags! {
    /// What a buffer may be bound as.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 0x1;
        const INDEX = 0x2;
        const UNIFORM = 0x4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    Repeat,
    #[default]
    Clamp,
    Mirror,
}

/// Sampling and storage options for an RGBA8 texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureOptions {
    pub srgb: bool,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub generate_mipmaps: bool,
}

impl Default for TextureOptions {
    /// Pixel-art skins: nearest filtering, clamped, no mips.
    fn default() -> Self {
        Self {
            srgb: true,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
            generate_mipmaps: false,
        }
    }
}

/// Common surface of every GPU handle.
///
/// `dispose` is idempotent and every operation on a disposed handle is a
/// no-op.
pub trait GpuResource {
    fn id(&self) -> ResourceId;
    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

pub trait GpuBuffer: GpuResource {
    fn usage(&self) -> BufferUsage;
    /// Allocated size in bytes.
    fn size(&self) -> u64;
    /// Overwrite bytes starting at `byte_offset`. Writes past the end are
    /// clamped to the allocation.
    fn update(&self, data: &[u8], byte_offset: u64);
}

pub trait GpuTexture: GpuResource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn options(&self) -> TextureOptions;
    /// Replace the texel data. The upload version is taken when this is
    /// called, so a later call supersedes this one even if this future is
    /// still decoding.
    fn update<S: ImageSource>(
        &self,
        source: S,
    ) -> impl Future<Output = Result<UploadOutcome, RenderError>>;
}

pub trait GpuPipeline: GpuResource {
    fn config(&self) -> &PipelineConfig;
}

/// Clamp a sub-range write to a buffer of `capacity` bytes.
///
/// Returns the byte range inside the buffer and how many source bytes fit,
/// or `None` when nothing fits.
pub fn clamp_write(capacity: u64, byte_offset: u64, len: usize) -> Option<(Range<u64>, usize)> {
    if byte_offset >= capacity || len == 0 {
        if len > 0 {
            tracing::warn!(capacity, byte_offset, len, "buffer write starts past the end, dropped");
        }
        return None;
    }
    let end = byte_offset.saturating_add(len as u64);
    if end > capacity {
        tracing::warn!(capacity, byte_offset, len, "buffer write clamped to allocation");
    }
    let end = end.min(capacity);
    Some((byte_offset..end, (end - byte_offset) as usize))
}
