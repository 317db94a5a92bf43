use skinview_common::{SKIN_TEXTURE, UniformLayout, VertexBufferLayout, skin_vertex_layout};

/// Vertex attribute locations every GL 3.3, GLES 3.0 and WebGPU device
/// provides.
pub const MAX_VERTEX_ATTRIBUTES: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    Never,
    #[default]
    Less,
    LessEqual,
    Equal,
    Greater,
    GreaterEqual,
    NotEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    None,
    #[default]
    Alpha,
    Additive,
    Multiply,
}

impl BlendMode {
    /// `(src, dst)` factors applied to both color and alpha.
    pub const fn factors(self) -> (BlendFactor, BlendFactor) {
        match self {
            BlendMode::None => (BlendFactor::One, BlendFactor::Zero),
            BlendMode::Alpha => (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            BlendMode::Additive => (BlendFactor::SrcAlpha, BlendFactor::One),
            BlendMode::Multiply => (BlendFactor::DstColor, BlendFactor::Zero),
        }
    }

    /// Whether the blend unit needs to be on at all.
    pub const fn is_enabled(self) -> bool {
        !matches!(self, BlendMode::None)
    }
}

/// Everything needed to build a pipeline on either backend.
///
/// Shader sources are in the backend's language (WGSL for wgpu, GLSL ES 3.0
/// for GL). `textures` lists sampler names in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub label: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub vertex_layouts: Vec<VertexBufferLayout>,
    pub topology: Topology,
    pub cull_mode: CullMode,
    pub blend_mode: BlendMode,
    pub depth_write: bool,
    pub depth_compare: CompareFunction,
    pub uniform_layout: UniformLayout,
    pub textures: Vec<String>,
}

impl PipelineConfig {
    pub fn new(
        label: impl Into<String>,
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            vertex_layouts: Vec::new(),
            topology: Topology::default(),
            cull_mode: CullMode::default(),
            blend_mode: BlendMode::default(),
            depth_write: true,
            depth_compare: CompareFunction::default(),
            uniform_layout: UniformLayout::new(),
            textures: Vec::new(),
        }
    }

    /// The skinned avatar pipeline: skin vertex layout, skin uniform block,
    /// one `u_skin` texture.
    pub fn skin(
        label: impl Into<String>,
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
    ) -> Self {
        Self::new(label, vertex_shader, fragment_shader)
            .with_vertex_layout(skin_vertex_layout())
            .with_uniform_layout(UniformLayout::skin())
            .with_texture(SKIN_TEXTURE)
    }

    pub fn with_vertex_layout(mut self, layout: VertexBufferLayout) -> Self {
        self.vertex_layouts.push(layout);
        self
    }

    pub fn with_uniform_layout(mut self, layout: UniformLayout) -> Self {
        self.uniform_layout = layout;
        self
    }

    pub fn with_texture(mut self, name: impl Into<String>) -> Self {
        self.textures.push(name.into());
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_depth(mut self, write: bool, compare: CompareFunction) -> Self {
        self.depth_write = write;
        self.depth_compare = compare;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Slot of a named texture, in binding order.
    pub fn texture_slot(&self, name: &str) -> Option<usize> {
        self.textures.iter().position(|t| t == name)
    }

    /// Check the layouts for problems a backend would only report as an
    /// opaque error.
    pub fn validate(&self) -> Result<(), String> {
        for (index, layout) in self.vertex_layouts.iter().enumerate() {
            if !layout.is_consistent() {
                return Err(format!(
                    "vertex layout {index} has attributes outside its {} byte stride",
                    layout.stride
                ));
            }
        }
        let mut locations: Vec<u32> = self
            .vertex_layouts
            .iter()
            .flat_map(|l| l.attributes.iter().map(|a| a.location))
            .collect();
        if let Some(location) = locations.iter().find(|l| **l >= MAX_VERTEX_ATTRIBUTES) {
            return Err(format!(
                "vertex attribute location {location} exceeds the limit of {MAX_VERTEX_ATTRIBUTES}"
            ));
        }
        locations.sort_unstable();
        if locations.windows(2).any(|w| w[0] == w[1]) {
            return Err("duplicate vertex attribute location".into());
        }
        for (i, name) in self.textures.iter().enumerate() {
            if self.textures[..i].contains(name) {
                return Err(format!("texture `{name}` bound twice"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinview_common::{VertexAttribute, VertexFormat};

    #[test]
    fn blend_factor_table() {
        use BlendFactor::*;
        assert_eq!(BlendMode::None.factors(), (One, Zero));
        assert_eq!(BlendMode::Alpha.factors(), (SrcAlpha, OneMinusSrcAlpha));
        assert_eq!(BlendMode::Additive.factors(), (SrcAlpha, One));
        assert_eq!(BlendMode::Multiply.factors(), (DstColor, Zero));
        assert!(!BlendMode::None.is_enabled());
        assert!(BlendMode::Multiply.is_enabled());
    }

    #[test]
    fn skin_config_is_complete() {
        let config = PipelineConfig::skin("skin", "vs", "fs");
        assert_eq!(config.vertex_layouts.len(), 1);
        assert_eq!(config.vertex_layouts[0].stride, 36);
        assert_eq!(config.texture_slot(SKIN_TEXTURE), Some(0));
        assert_eq!(config.uniform_layout, UniformLayout::skin());
        assert!(config.depth_write);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_layouts() {
        let overflowing = PipelineConfig::new("bad", "", "").with_vertex_layout(VertexBufferLayout {
            stride: 8,
            attributes: vec![VertexAttribute {
                location: 0,
                format: VertexFormat::Float32x3,
                offset: 0,
            }],
        });
        assert!(overflowing.validate().is_err());

        let duplicate = PipelineConfig::skin("dup", "", "").with_vertex_layout(VertexBufferLayout {
            stride: 4,
            attributes: vec![VertexAttribute {
                location: 0,
                format: VertexFormat::Float32,
                offset: 0,
            }],
        });
        assert!(duplicate.validate().is_err());

        let twice = PipelineConfig::skin("twice", "", "").with_texture(SKIN_TEXTURE);
        assert!(twice.validate().is_err());
    }

    #[test]
    fn validate_bounds_attribute_locations() {
        let at = |location| {
            PipelineConfig::new("loc", "", "").with_vertex_layout(VertexBufferLayout {
                stride: 4,
                attributes: vec![VertexAttribute {
                    location,
                    format: VertexFormat::Float32,
                    offset: 0,
                }],
            })
        };
        assert!(at(MAX_VERTEX_ATTRIBUTES - 1).validate().is_ok());
        let err = at(MAX_VERTEX_ATTRIBUTES).validate().unwrap_err();
        assert!(err.contains("location 16"));
        assert!(at(40).validate().is_err());
    }
}
