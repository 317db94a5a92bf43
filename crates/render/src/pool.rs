use crate::bind::{DrawCall, DrawParams, SkipReason, pack_uniforms};
use crate::resource::{GpuBuffer, GpuPipeline, GpuTexture};

/// Fixed set of per-draw uniform slots, reused every frame.
///
/// Draw `n` of a frame gets slot `n`. Once every slot is taken further
/// claims fail until the next [`UniformPool::begin_frame`]; the first
/// failure of a frame is logged.
#[derive(Debug)]
pub struct UniformPool<S> {
    slots: Vec<S>,
    next: usize,
    warned: bool,
    warnings: u64,
}

impl<S> UniformPool<S> {
    pub fn new(slots: Vec<S>) -> Self {
        Self {
            slots,
            next: 0,
            warned: false,
            warnings: 0,
        }
    }

    pub fn begin_frame(&mut self) {
        self.next = 0;
        self.warned = false;
    }

    /// Take the next free slot.
    pub fn claim(&mut self) -> Option<(usize, &S)> {
        let Some(slot) = self.slots.get(self.next) else {
            if !self.warned {
                self.warned = true;
                self.warnings += 1;
                tracing::warn!(
                    capacity = self.slots.len(),
                    "uniform pool exhausted, skipping remaining draws this frame"
                );
            }
            return None;
        };
        let index = self.next;
        self.next += 1;
        Some((index, slot))
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots claimed in the current frame.
    pub fn claimed(&self) -> usize {
        self.next
    }

    /// Frames in which the pool ran out.
    pub fn exhaustion_warnings(&self) -> u64 {
        self.warnings
    }

    pub fn slots(&self) -> &[S] {
        &self.slots
    }
}

/// A draw that resolved and holds this frame's uniform slot `index`.
#[derive(Debug)]
pub struct PreparedDraw<'p, S> {
    pub call: DrawCall,
    pub index: usize,
    pub slot: &'p S,
}

/// Resolve `params`, claim a uniform slot and pack the uniform block into
/// `staging`.
///
/// A draw that fails to resolve never takes a slot.
pub fn prepare_draw<'p, B, T, P, S>(
    params: &DrawParams<'_, B, T, P>,
    pool: &'p mut UniformPool<S>,
    staging: &mut Vec<u8>,
) -> Result<PreparedDraw<'p, S>, SkipReason>
where
    B: GpuBuffer,
    T: GpuTexture,
    P: GpuPipeline,
{
    let call = params.resolve()?;
    let (index, slot) = pool.claim().ok_or(SkipReason::PoolExhausted)?;
    pack_uniforms(
        &params.pipeline.config().uniform_layout,
        &params.bind_group.uniforms,
        staging,
    );
    Ok(PreparedDraw { call, index, slot })
}
