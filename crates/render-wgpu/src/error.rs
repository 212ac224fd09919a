use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A shader module or pipeline failed validation at construction.
    #[error("shader validation failed: {0}")]
    Shader(String),
    #[error("pick readback failed: {0}")]
    Readback(String),
    #[error("pick pixel ({x}, {y}) outside {width}x{height} target")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}
