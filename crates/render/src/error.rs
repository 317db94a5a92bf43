use crate::diagnostics::ShaderDiagnostic;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no graphics device available: {0}")]
    NoDevice(String),
    #[error("unsupported graphics context: {0}")]
    Unsupported(String),
    #[error("invalid renderer config: {0}")]
    InvalidConfig(String),
    #[error("failed to allocate {size} byte buffer: {reason}")]
    BufferAllocation { size: u64, reason: String },
    #[error("failed to create texture: {0}")]
    TextureCreation(String),
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("texture update is {actual:?}, texture is {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("pipeline `{label}`: {diagnostic}")]
    ShaderCompile {
        label: String,
        diagnostic: ShaderDiagnostic,
    },
    #[error("pipeline `{label}` failed to link: {log}")]
    ProgramLink { label: String, log: String },
    #[error("pipeline `{label}` rejected: {message}")]
    PipelineCreation { label: String, message: String },
    #[error("uniform block of {size} bytes exceeds the {capacity} byte uniform buffer")]
    UniformBlockTooLarge { size: u64, capacity: u64 },
    #[error("surface error: {0}")]
    Surface(String),
    #[error("cannot resize while a frame is open")]
    ResizeDuringFrame,
    #[error("renderer has been disposed")]
    Disposed,
}
