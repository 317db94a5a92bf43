//! Rendering contract shared by the GL and wgpu backends.
//!
//! # Invariants
//! - Shared code never branches on the backend; everything goes through
//!   [`Renderer`] and the resource traits.
//! - Operations on a disposed handle or renderer are no-ops.
//! - A draw outside an open frame never reaches the GPU.
//! - A texture update only writes if no newer update was requested after it.

mod avatar;
mod bind;
mod cache;
mod camera;
mod diagnostics;
mod dispose;
mod error;
mod frame;
mod id;
mod pipeline;
mod pool;
mod renderer;
mod resource;
mod texture;

pub use avatar::{AvatarMesh, DEFAULT_ALPHA_TEST, SkinFrame, draw_avatar};
pub use bind::{
    BindGroup, DrawCall, DrawOutcome, DrawParams, IndexBinding, IndexFormat, SkipReason,
    UniformValue, pack_uniforms,
};
pub use cache::BindGroupCache;
pub use camera::{DepthRange, OrbitCamera};
pub use diagnostics::{ShaderDiagnostic, ShaderStage, error_line};
pub use dispose::DisposeFlag;
pub use error::RenderError;
pub use frame::{FrameSlot, PipelineTracker};
pub use id::{ResourceId, ResourceIds};
pub use pipeline::{
    BlendFactor, BlendMode, CompareFunction, CullMode, MAX_VERTEX_ATTRIBUTES, PipelineConfig,
    Topology,
};
pub use pool::{PreparedDraw, UniformPool, prepare_draw};
pub use renderer::{ClearColor, Renderer, RendererConfig};
pub use resource::{
    BufferUsage, FilterMode, GpuBuffer, GpuPipeline, GpuResource, GpuTexture, TextureOptions,
    WrapMode, clamp_write,
};
pub use texture::{
    EncodedImage, ImageSource, UploadGeneration, UploadOutcome, UploadTicket, mip_chain,
    mip_level_count, run_upload,
};

pub fn crate_info() -> &'static str {
    "skinview-render v0.1.0"
}
