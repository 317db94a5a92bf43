//! Mapping from the backend-agnostic descriptors to GL enums.

use skinview_common::VertexFormat;
use skinview_render::{
    BlendFactor, CompareFunction, CullMode, FilterMode, IndexFormat, TextureOptions, Topology,
    WrapMode,
};

pub fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
    }
}

/// Face to cull, `None` to disable culling.
pub fn cull_face(mode: CullMode) -> Option<u32> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(glow::FRONT),
        CullMode::Back => Some(glow::BACK),
    }
}

pub fn compare(function: CompareFunction) -> u32 {
    match function {
        CompareFunction::Never => glow::NEVER,
        CompareFunction::Less => glow::LESS,
        CompareFunction::LessEqual => glow::LEQUAL,
        CompareFunction::Equal => glow::EQUAL,
        CompareFunction::Greater => glow::GREATER,
        CompareFunction::GreaterEqual => glow::GEQUAL,
        CompareFunction::NotEqual => glow::NOTEQUAL,
        CompareFunction::Always => glow::ALWAYS,
    }
}

pub fn topology(topology: Topology) -> u32 {
    match topology {
        Topology::TriangleList => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::LineList => glow::LINES,
    }
}

/// Component count for `glVertexAttribPointer`.
pub fn components(format: VertexFormat) -> i32 {
    format.components() as i32
}

pub fn index_type(format: IndexFormat) -> u32 {
    match format {
        IndexFormat::Uint16 => glow::UNSIGNED_SHORT,
        IndexFormat::Uint32 => glow::UNSIGNED_INT,
    }
}

pub fn mag_filter(mode: FilterMode) -> i32 {
    match mode {
        FilterMode::Nearest => glow::NEAREST as i32,
        FilterMode::Linear => glow::LINEAR as i32,
    }
}

/// Minification filter; mipmapped textures sample between levels.
pub fn min_filter(mode: FilterMode, mipmaps: bool) -> i32 {
    let filter = match (mode, mipmaps) {
        (FilterMode::Nearest, false) => glow::NEAREST,
        (FilterMode::Linear, false) => glow::LINEAR,
        (FilterMode::Nearest, true) => glow::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Linear, true) => glow::LINEAR_MIPMAP_LINEAR,
    };
    filter as i32
}

pub fn wrap(mode: WrapMode) -> i32 {
    let wrap = match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::Clamp => glow::CLAMP_TO_EDGE,
        WrapMode::Mirror => glow::MIRRORED_REPEAT,
    };
    wrap as i32
}

pub fn internal_format(options: &TextureOptions) -> i32 {
    let format = if options.srgb {
        glow::SRGB8_ALPHA8
    } else {
        glow::RGBA8
    };
    format as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinview_render::BlendMode;

    #[test]
    fn blend_modes_map_to_gl_factors() {
        let (src, dst) = BlendMode::Alpha.factors();
        assert_eq!(
            (blend_factor(src), blend_factor(dst)),
            (glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA)
        );
        let (src, dst) = BlendMode::Multiply.factors();
        assert_eq!((blend_factor(src), blend_factor(dst)), (glow::DST_COLOR, glow::ZERO));
    }

    #[test]
    fn cull_none_disables() {
        assert_eq!(cull_face(CullMode::None), None);
        assert_eq!(cull_face(CullMode::Back), Some(glow::BACK));
    }

    #[test]
    fn depth_compare_maps() {
        assert_eq!(compare(CompareFunction::LessEqual), glow::LEQUAL);
        assert_eq!(compare(CompareFunction::GreaterEqual), glow::GEQUAL);
    }

    #[test]
    fn mipmapped_min_filter() {
        assert_eq!(min_filter(FilterMode::Nearest, false), glow::NEAREST as i32);
        assert_eq!(
            min_filter(FilterMode::Linear, true),
            glow::LINEAR_MIPMAP_LINEAR as i32
        );
    }

    #[test]
    fn texture_defaults() {
        let options = TextureOptions::default();
        assert_eq!(internal_format(&options), glow::SRGB8_ALPHA8 as i32);
        assert_eq!(wrap(options.wrap_u), glow::CLAMP_TO_EDGE as i32);
        assert_eq!(mag_filter(options.mag_filter), glow::NEAREST as i32);
    }

    #[test]
    fn index_and_topology() {
        assert_eq!(index_type(IndexFormat::Uint32), glow::UNSIGNED_INT);
        assert_eq!(topology(Topology::LineList), glow::LINES);
        assert_eq!(components(VertexFormat::Float32x3), 3);
    }
}
