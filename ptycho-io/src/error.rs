//! I/O error types.

use ptycho_core::ElementType;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Input directory does not exist.
    #[error("input directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No frame files with the requested extension.
    #[error("no '{extension}' files found in {}", .directory.display())]
    EmptyInput {
        directory: PathBuf,
        extension: String,
    },

    /// Unreadable, corrupt or non-grayscale image.
    #[error("cannot decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// Frame pixel count differs from the geometry of the first frame.
    #[error(
        "frame {index} ({}) has {actual} pixels, expected {expected}",
        .path.display()
    )]
    ShapeMismatch {
        index: usize,
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// Frame element type differs from the type of the first frame.
    #[error(
        "frame {index} ({}) stores {actual} pixels, expected {expected}",
        .path.display()
    )]
    ElementTypeMismatch {
        index: usize,
        path: PathBuf,
        expected: ElementType,
        actual: ElementType,
    },

    /// HDF5 container failure (clear, commit, write or flush).
    #[error("container error: {0}")]
    Container(#[from] hdf5::Error),

    /// Attribute value HDF5 cannot store.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// A dataset the pipeline needs was not committed.
    #[error("dataset {0} missing from container")]
    MissingDataset(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] ptycho_core::Error),
}

impl Error {
    /// True for a missing input directory or an input without frames.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::EmptyInput { .. })
    }
}
