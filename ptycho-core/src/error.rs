//! Error types for ptycho-core.

use thiserror::Error;

/// Result type alias for ptycho-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Frame or scan geometry that cannot describe a dataset.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
