//! Error types for catalog search and retrieval.

use thiserror::Error;

/// Errors that can occur while querying or downloading from the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The query matched zero products. Fatal, never retried.
    #[error("no product found for {0}")]
    NoProductFound(String),

    /// Retrieval kept failing after the internal retry budget. Fatal.
    #[error("download failed after {attempts} attempts: {reason}")]
    DownloadFailed { attempts: u32, reason: String },

    /// Token request was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Catalog response could not be interpreted.
    #[error("unexpected catalog response: {0}")]
    BadResponse(String),

    /// Failed to unpack the downloaded archive.
    #[error("failed to unpack product archive: {0}")]
    Unpack(String),

    /// Malformed credentials file.
    #[error("invalid credentials file: {0}")]
    Credentials(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
