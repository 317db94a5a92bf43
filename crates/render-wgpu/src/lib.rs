//! Retained-mode wgpu backend for the skin renderer.
//!
//! Pipelines carry all fixed-function state; per-draw uniforms come from a
//! fixed pool of small uniform buffers and textures are bound through cached
//! bind groups.
//!
//! # Invariants
//! - A frame is one command encoder; nothing is submitted until `end_frame`.
//! - The first render pass of a frame clears depth to 1.0.
//! - A texture's bind group is rebuilt only when its pipeline changes or it is
//!   invalidated.
//! - Pool slots are never reused within a frame.
//! - Buffer and pipeline creation errors are returned as `RenderError` on
//!   native targets. On wasm they reach the device's uncaptured error handler.

mod context;
mod convert;
mod renderer;
mod resources;
mod shaders;
mod targets;

pub use context::{Target, WgpuInit, choose_surface_format, create_instance, request_device};
pub use renderer::{FRAGMENT_ENTRY, VERTEX_ENTRY, WgpuRenderer};
pub use resources::{WgpuBuffer, WgpuPipeline, WgpuTexture};
pub use shaders::SKIN_SHADER;
pub use targets::DEPTH_FORMAT;

pub fn crate_info() -> &'static str {
    "skinview-render-wgpu v0.1.0"
}
