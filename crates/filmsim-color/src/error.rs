//! Color subsystem errors.

use filmsim_core::FilmSimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LutError {
    #[error("invalid LUT format: {0}")]
    InvalidLut(String),
    #[error("unsupported LUT size {0} (must be between 2 and 256)")]
    UnsupportedSize(usize),
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("truncated LUT data: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("image decode error: {0}")]
    Image(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LutError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for LutError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

impl From<LutError> for FilmSimError {
    fn from(e: LutError) -> Self {
        match e {
            LutError::Io(io) => FilmSimError::Io(io),
            other => FilmSimError::Lut(other.to_string()),
        }
    }
}
