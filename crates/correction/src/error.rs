//! Error types for the correction adapter.

use thiserror::Error;

/// Errors raised while invoking the correction tool or reading its output.
#[derive(Error, Debug)]
pub enum CorrectionError {
    /// The external tool reported failure or produced no usable output.
    /// Fatal to the current run, never retried.
    #[error("correction failed: {0}")]
    Failed(String),

    /// The L2W result grid could not be read.
    #[error("failed to read correction output: {0}")]
    OutputRead(String),

    /// Underlying I/O failure (settings file, output scan).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raster model rejected the loaded grid.
    #[error("raster error: {0}")]
    Raster(#[from] raster_grid::RasterError),
}

impl CorrectionError {
    /// Create a Failed error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create an OutputRead error.
    pub fn output_read(msg: impl Into<String>) -> Self {
        Self::OutputRead(msg.into())
    }
}

/// Result type for correction operations.
pub type CorrectionResult<T> = std::result::Result<T, CorrectionError>;
