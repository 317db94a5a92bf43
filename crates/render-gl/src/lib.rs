//! Immediate-mode OpenGL backend for the skin renderer, on `glow`.
//!
//! Targets OpenGL 3.3 core, OpenGL ES 3.0 and WebGL2. The caller owns
//! context creation (window, canvas or headless) and hands the renderer a
//! current `glow::Context`.
//!
//! # Invariants
//! - Cull, blend and depth state is only issued when the bound pipeline
//!   changes within a frame.
//! - Uniform locations are queried once per program and name, misses
//!   included.
//! - Every frame renders into the offscreen framebuffer and is blitted to the
//!   default framebuffer at `end_frame`.
//! - GL handles are released on `dispose` or on drop, whichever comes first.
//! - With `prefer_srgb` the blitted image is sRGB-encoded on desktop GL, GLES
//!   and WebGL2 alike.

mod convert;
mod location;
mod renderer;
mod resources;
mod shaders;
mod target;
mod version;

pub use location::LocationCache;
pub use renderer::GlRenderer;
pub use resources::{GlBuffer, GlPipeline, GlTexture};
pub use shaders::{SKIN_FRAGMENT_SHADER, SKIN_VERTEX_SHADER};
pub use target::ColorEncoding;
pub use version::GlVersion;

pub fn crate_info() -> &'static str {
    "skinview-render-gl v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("gl"));
    }
}
