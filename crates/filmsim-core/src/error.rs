//! Error types for FilmSim.

use thiserror::Error;

/// Main error type for FilmSim operations.
#[derive(Error, Debug)]
pub enum FilmSimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LUT error: {0}")]
    Lut(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Shader compilation error: {0}")]
    Shader(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render thread error: {0}")]
    RenderThread(String),
}

/// Result type alias for FilmSim operations.
pub type Result<T> = std::result::Result<T, FilmSimError>;
