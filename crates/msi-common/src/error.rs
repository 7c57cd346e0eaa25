//! Error types shared by the common crate.

use thiserror::Error;

/// Errors raised by the shared types.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Malformed or degenerate (zero-area) bounding region.
    /// Raised before any network call is attempted.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Failed to read or parse a point-surface file.
    #[error("failed to parse surface file: {0}")]
    SurfaceParse(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommonError {
    /// Create an InvalidRegion error.
    pub fn invalid_region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    /// Create a SurfaceParse error.
    pub fn surface_parse(msg: impl Into<String>) -> Self {
        Self::SurfaceParse(msg.into())
    }
}

/// Result type for common operations.
pub type CommonResult<T> = std::result::Result<T, CommonError>;
