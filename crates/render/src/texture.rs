use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::dispose::DisposeFlag;
use crate::error::RenderError;

/// Anything that can produce RGBA8 texels, possibly after a decode step.
pub trait ImageSource {
    fn decode(self) -> impl Future<Output = Result<RgbaImage, RenderError>>;
}

impl ImageSource for RgbaImage {
    async fn decode(self) -> Result<RgbaImage, RenderError> {
        Ok(self)
    }
}

/// Encoded image bytes (PNG).
#[derive(Debug, Clone)]
pub struct EncodedImage(pub Vec<u8>);

impl ImageSource for EncodedImage {
    async fn decode(self) -> Result<RgbaImage, RenderError> {
        let image = image::load_from_memory(&self.0)?;
        Ok(image.to_rgba8())
    }
}

/// What happened to a texture update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Applied,
    /// A newer update was requested before this one reached the GPU.
    Superseded,
    /// The texture was disposed while this update was in flight.
    Disposed,
}

/// Upload version counter shared by a texture and its in-flight updates.
#[derive(Debug, Clone, Default)]
pub struct UploadGeneration {
    latest: Arc<AtomicU64>,
    disposed: DisposeFlag,
}

impl UploadGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the version and return the ticket for the new upload.
    pub fn ticket(&self) -> UploadTicket {
        let version = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        UploadTicket {
            version,
            latest: Arc::clone(&self.latest),
            disposed: self.disposed.clone(),
        }
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    pub fn dispose_flag(&self) -> &DisposeFlag {
        &self.disposed
    }
}

/// Right to write one upload, valid while no newer ticket exists.
#[derive(Debug)]
pub struct UploadTicket {
    version: u64,
    latest: Arc<AtomicU64>,
    disposed: DisposeFlag,
}

impl UploadTicket {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn check(&self) -> Option<UploadOutcome> {
        if self.disposed.is_disposed() {
            Some(UploadOutcome::Disposed)
        } else if self.latest.load(Ordering::Acquire) != self.version {
            Some(UploadOutcome::Superseded)
        } else {
            None
        }
    }

    /// Run `write` only if this ticket is still the latest.
    pub fn apply(self, write: impl FnOnce()) -> UploadOutcome {
        match self.check() {
            Some(outcome) => outcome,
            None => {
                write();
                UploadOutcome::Applied
            }
        }
    }
}

/// Decode `source`, then hand the texels to `write` if `ticket` is still
/// current and the size matches `expected`.
pub async fn run_upload<S: ImageSource>(
    ticket: UploadTicket,
    source: S,
    expected: (u32, u32),
    write: impl FnOnce(&RgbaImage),
) -> Result<UploadOutcome, RenderError> {
    if let Some(outcome) = ticket.check() {
        return Ok(outcome);
    }
    let image = source.decode().await?;
    if let Some(outcome) = ticket.check() {
        tracing::debug!(version = ticket.version(), ?outcome, "texture upload dropped");
        return Ok(outcome);
    }
    let actual = image.dimensions();
    if actual != expected {
        return Err(RenderError::SizeMismatch { expected, actual });
    }
    Ok(ticket.apply(|| write(&image)))
}

/// Mip levels for a `width` x `height` base image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Downsampled copies of `base`, level 1 onward, ending at 1x1.
pub fn mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let (mut width, mut height) = base.dimensions();
    let mut levels: Vec<RgbaImage> = Vec::new();
    while width > 1 || height > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        let previous = levels.last().unwrap_or(base);
        let next = imageops::resize(previous, width, height, FilterType::Triangle);
        levels.push(next);
    }
    levels
}
