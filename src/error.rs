// src/error.rs
//
// Crate-wide error type. Plotting helpers keep returning boxed errors (the
// plotters error types are generic over the backend); the pipeline folds
// those into `MagnetSimError::Plot`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MagnetSimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plotting failed: {0}")]
    Plot(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("sample count mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),
}

impl MagnetSimError {
    pub fn plot(e: impl std::fmt::Display) -> Self {
        Self::Plot(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MagnetSimError>;
