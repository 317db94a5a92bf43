use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

pub const POSITION_LOCATION: u32 = 0;
pub const UV_LOCATION: u32 = 1;
pub const NORMAL_LOCATION: u32 = 2;
pub const BONE_LOCATION: u32 = 3;

/// Interleaved avatar vertex. The bone index is stored as a float so it can
/// travel through the same attribute path as the other components.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SkinVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub bone: f32,
}

/// Float attribute formats supported by both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub const fn components(self) -> u32 {
        match self {
            VertexFormat::Float32 => 1,
            VertexFormat::Float32x2 => 2,
            VertexFormat::Float32x3 => 3,
            VertexFormat::Float32x4 => 4,
        }
    }

    pub const fn size(self) -> u64 {
        self.components() as u64 * 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// Layout of one vertex buffer slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexBufferLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBufferLayout {
    /// True when every attribute fits inside the stride.
    pub fn is_consistent(&self) -> bool {
        self.attributes
            .iter()
            .all(|a| a.offset + a.format.size() <= self.stride)
    }
}

/// Layout matching [`SkinVertex`].
pub fn skin_vertex_layout() -> VertexBufferLayout {
    VertexBufferLayout {
        stride: std::mem::size_of::<SkinVertex>() as u64,
        attributes: vec![
            VertexAttribute {
                location: POSITION_LOCATION,
                format: VertexFormat::Float32x3,
                offset: 0,
            },
            VertexAttribute {
                location: UV_LOCATION,
                format: VertexFormat::Float32x2,
                offset: 12,
            },
            VertexAttribute {
                location: NORMAL_LOCATION,
                format: VertexFormat::Float32x3,
                offset: 20,
            },
            VertexAttribute {
                location: BONE_LOCATION,
                format: VertexFormat::Float32,
                offset: 32,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn skin_layout_matches_struct() {
        let layout = skin_vertex_layout();
        assert_eq!(layout.stride, 36);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(
            offsets,
            vec![
                offset_of!(SkinVertex, position) as u64,
                offset_of!(SkinVertex, uv) as u64,
                offset_of!(SkinVertex, normal) as u64,
                offset_of!(SkinVertex, bone) as u64,
            ]
        );
        assert!(layout.is_consistent());
    }

    #[test]
    fn attribute_past_stride_is_inconsistent() {
        let layout = VertexBufferLayout {
            stride: 12,
            attributes: vec![VertexAttribute {
                location: 0,
                format: VertexFormat::Float32x4,
                offset: 0,
            }],
        };
        assert!(!layout.is_consistent());
    }
}
