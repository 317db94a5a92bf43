use glam::{Mat4, Vec4};
use skinview_common::{UniformKind, UniformLayout};

use crate::resource::{GpuBuffer, GpuPipeline, GpuTexture};

/// A uniform value by name. Matrix arrays borrow the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Float(f32),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Consecutive column-major 4x4 matrices.
    Mat4Array(&'a [f32]),
}

impl UniformValue<'_> {
    /// Whether this value can be written into a member of `kind`.
    pub fn fits(&self, kind: UniformKind) -> bool {
        matches!(
            (self, kind),
            (UniformValue::Float(_), UniformKind::Float)
                | (UniformValue::Vec4(_), UniformKind::Vec4)
                | (UniformValue::Mat4(_), UniformKind::Mat4)
                | (UniformValue::Mat4Array(_), UniformKind::Mat4Array(_))
        )
    }
}

/// Named uniforms and textures for a single draw.
#[derive(Debug)]
pub struct BindGroup<'a, T> {
    pub uniforms: Vec<(&'a str, UniformValue<'a>)>,
    pub textures: Vec<(&'a str, &'a T)>,
}

impl<T> Default for BindGroup<'_, T> {
    fn default() -> Self {
        Self {
            uniforms: Vec::new(),
            textures: Vec::new(),
        }
    }
}

impl<'a, T> BindGroup<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform(mut self, name: &'a str, value: UniformValue<'a>) -> Self {
        self.uniforms.push((name, value));
        self
    }

    pub fn texture(mut self, name: &'a str, texture: &'a T) -> Self {
        self.textures.push((name, texture));
        self
    }

    pub fn uniform_value(&self, name: &str) -> Option<&UniformValue<'a>> {
        self.uniforms.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn texture_for(&self, name: &str) -> Option<&'a T> {
        self.textures.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    #[default]
    Uint16,
    Uint32,
}

impl IndexFormat {
    pub const fn size(self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

#[derive(Debug)]
pub struct IndexBinding<'a, B> {
    pub buffer: &'a B,
    pub count: u32,
    pub format: IndexFormat,
}

/// One draw call: pipeline, vertex streams, optional index stream and
/// resource bindings.
#[derive(Debug)]
pub struct DrawParams<'a, B, T, P> {
    pub pipeline: &'a P,
    pub vertex_buffers: Vec<&'a B>,
    pub index: Option<IndexBinding<'a, B>>,
    pub vertex_count: Option<u32>,
    pub bind_group: BindGroup<'a, T>,
}

/// Why a draw did not reach the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `draw` outside `begin_frame`/`end_frame`.
    NoFrame,
    /// Neither an index binding nor a vertex count.
    MissingCount,
    /// Every uniform slot of this frame is in use.
    PoolExhausted,
    /// The renderer or one of the bound resources was disposed.
    Disposed,
    /// A texture the pipeline samples is not in the bind group.
    MissingTexture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    Skipped(SkipReason),
}

impl DrawOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, DrawOutcome::Drawn)
    }
}

/// The concrete GPU call a [`DrawParams`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Indexed { count: u32, format: IndexFormat },
    Vertices { count: u32 },
}

impl<'a, B, T, P> DrawParams<'a, B, T, P>
where
    B: GpuBuffer,
    T: GpuTexture,
    P: GpuPipeline,
{
    pub fn new(pipeline: &'a P, bind_group: BindGroup<'a, T>) -> Self {
        Self {
            pipeline,
            vertex_buffers: Vec::new(),
            index: None,
            vertex_count: None,
            bind_group,
        }
    }

    pub fn with_vertex_buffer(mut self, buffer: &'a B) -> Self {
        self.vertex_buffers.push(buffer);
        self
    }

    pub fn with_index(mut self, buffer: &'a B, count: u32, format: IndexFormat) -> Self {
        self.index = Some(IndexBinding {
            buffer,
            count,
            format,
        });
        self
    }

    pub fn with_vertex_count(mut self, count: u32) -> Self {
        self.vertex_count = Some(count);
        self
    }

    /// Check every bound resource and pick the draw call. Indexed wins when
    /// an index binding is present.
    pub fn resolve(&self) -> Result<DrawCall, SkipReason> {
        if self.pipeline.is_disposed()
            || self.vertex_buffers.iter().any(|b| b.is_disposed())
            || self.index.as_ref().is_some_and(|i| i.buffer.is_disposed())
        {
            return Err(SkipReason::Disposed);
        }
        for name in &self.pipeline.config().textures {
            match self.bind_group.texture_for(name) {
                None => return Err(SkipReason::MissingTexture),
                Some(texture) if texture.is_disposed() => return Err(SkipReason::Disposed),
                Some(_) => {}
            }
        }
        match (&self.index, self.vertex_count) {
            (Some(index), _) => Ok(DrawCall::Indexed {
                count: index.count,
                format: index.format,
            }),
            (None, Some(count)) => Ok(DrawCall::Vertices { count }),
            (None, None) => Err(SkipReason::MissingCount),
        }
    }

    /// Textures in the pipeline's binding order. Only meaningful after
    /// [`Self::resolve`] succeeded.
    pub fn ordered_textures(&self) -> impl Iterator<Item = (usize, &'a T)> + '_ {
        self.pipeline
            .config()
            .textures
            .iter()
            .enumerate()
            .filter_map(|(slot, name)| self.bind_group.texture_for(name).map(|t| (slot, t)))
    }
}

/// Pack named uniforms into `out` following `layout`.
///
/// `out` is resized to the block size and zeroed first. Names the layout
/// does not know are ignored; a value of the wrong shape is skipped with a
/// warning. Matrix arrays are truncated to the declared length. Returns the
/// number of members written.
pub fn pack_uniforms(
    layout: &UniformLayout,
    uniforms: &[(&str, UniformValue<'_>)],
    out: &mut Vec<u8>,
) -> usize {
    out.clear();
    out.resize(layout.size(), 0);
    let mut written = 0;
    for (name, value) in uniforms {
        let Some(field) = layout.field(name) else {
            tracing::trace!(uniform = name, "uniform not in block");
            continue;
        };
        if !value.fits(field.kind) {
            tracing::warn!(uniform = name, expected = ?field.kind, "uniform shape mismatch, skipped");
            continue;
        }
        let dst = &mut out[field.offset..field.offset + field.kind.size()];
        match value {
            UniformValue::Float(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec4(v) => dst.copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            UniformValue::Mat4(m) => dst.copy_from_slice(bytemuck::bytes_of(&m.to_cols_array())),
            UniformValue::Mat4Array(values) => {
                let floats = values.len().min(field.kind.floats());
                let bytes: &[u8] = bytemuck::cast_slice(&values[..floats]);
                dst[..bytes.len()].copy_from_slice(bytes);
            }
        }
        written += 1;
    }
    written
}
