//! Error types for raster processing.

use thiserror::Error;

/// Errors that can occur during rasterization, fusion or index computation.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Too few or degenerate (collinear) points for surface interpolation.
    #[error("insufficient surface data: {0}")]
    InsufficientData(String),

    /// Grids being fused disagree on resolution or CRS.
    #[error("grid mismatch: {0}")]
    GridMismatch(String),

    /// A named band does not exist in the grid.
    #[error("band not found: {0}")]
    BandNotFound(String),

    /// Band data length does not match the grid dimensions.
    #[error("band size mismatch: {0}")]
    BandSizeMismatch(String),

    /// Failed to write a table.
    #[error("table write error: {0}")]
    TableWrite(String),
}

impl RasterError {
    /// Create an InsufficientData error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    /// Create a GridMismatch error.
    pub fn grid_mismatch(msg: impl Into<String>) -> Self {
        Self::GridMismatch(msg.into())
    }
}

impl From<csv::Error> for RasterError {
    fn from(err: csv::Error) -> Self {
        Self::TableWrite(err.to_string())
    }
}

/// Result type for raster operations.
pub type RasterResult<T> = std::result::Result<T, RasterError>;
