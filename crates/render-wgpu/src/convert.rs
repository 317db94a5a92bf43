//! Mapping from the backend-agnostic descriptors to wgpu types.

use skinview_common::{VertexBufferLayout, VertexFormat};
use skinview_render::{
    BlendFactor, BlendMode, CompareFunction, CullMode, FilterMode, IndexFormat, TextureOptions,
    Topology, WrapMode,
};

pub fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
    }
}

pub fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    if !mode.is_enabled() {
        return None;
    }
    let (src, dst) = mode.factors();
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(src),
        dst_factor: blend_factor(dst),
        operation: wgpu::BlendOperation::Add,
    };
    Some(wgpu::BlendState {
        color: component,
        alpha: component,
    })
}

pub fn cull_mode(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

pub fn compare(function: CompareFunction) -> wgpu::CompareFunction {
    match function {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub fn topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Topology::LineList => wgpu::PrimitiveTopology::LineList,
    }
}

pub fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

pub fn vertex_attributes(layout: &VertexBufferLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .attributes
        .iter()
        .map(|a| wgpu::VertexAttribute {
            format: vertex_format(a.format),
            offset: a.offset,
            shader_location: a.location,
        })
        .collect()
}

pub fn index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

pub fn filter(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub fn address(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        WrapMode::Mirror => wgpu::AddressMode::MirrorRepeat,
    }
}

pub fn texture_format(options: &TextureOptions) -> wgpu::TextureFormat {
    if options.srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

pub fn sampler_descriptor(options: &TextureOptions) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("skinview_sampler"),
        address_mode_u: address(options.wrap_u),
        address_mode_v: address(options.wrap_v),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter(options.mag_filter),
        min_filter: filter(options.min_filter),
        mipmap_filter: if options.generate_mipmaps {
            filter(options.min_filter)
        } else {
            wgpu::FilterMode::Nearest
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinview_common::skin_vertex_layout;

    #[test]
    fn opaque_mode_disables_blending() {
        assert!(blend_state(BlendMode::None).is_none());
        let alpha = blend_state(BlendMode::Alpha).unwrap();
        assert_eq!(alpha.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(alpha.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        let multiply = blend_state(BlendMode::Multiply).unwrap();
        assert_eq!(multiply.color.src_factor, wgpu::BlendFactor::Dst);
        assert_eq!(multiply.alpha.dst_factor, wgpu::BlendFactor::Zero);
    }

    #[test]
    fn skin_layout_attributes() {
        let attributes = vertex_attributes(&skin_vertex_layout());
        let summary: Vec<_> = attributes
            .iter()
            .map(|a| (a.shader_location, a.offset, a.format))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, 0, wgpu::VertexFormat::Float32x3),
                (1, 12, wgpu::VertexFormat::Float32x2),
                (2, 20, wgpu::VertexFormat::Float32x3),
                (3, 32, wgpu::VertexFormat::Float32),
            ]
        );
    }

    #[test]
    fn sampler_follows_options() {
        let options = TextureOptions {
            wrap_u: WrapMode::Mirror,
            mag_filter: FilterMode::Linear,
            ..TextureOptions::default()
        };
        let desc = sampler_descriptor(&options);
        assert_eq!(desc.address_mode_u, wgpu::AddressMode::MirrorRepeat);
        assert_eq!(desc.address_mode_v, wgpu::AddressMode::ClampToEdge);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(texture_format(&options), wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn culling_and_depth() {
        assert_eq!(cull_mode(CullMode::None), None);
        assert_eq!(cull_mode(CullMode::Back), Some(wgpu::Face::Back));
        assert_eq!(compare(CompareFunction::LessEqual), wgpu::CompareFunction::LessEqual);
        assert_eq!(index_format(IndexFormat::Uint32), wgpu::IndexFormat::Uint32);
    }
}
