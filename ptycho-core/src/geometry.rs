//! Per-frame pixel geometry and the square scan grid.

use crate::{ElementType, Error, Result};

/// Pixel geometry shared by every frame of a run, fixed by the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Image width in pixels (columns, fastest-varying in the flattened row).
    pub width: usize,
    /// Image height in pixels (rows).
    pub height: usize,
    /// Pixel storage type.
    pub element_type: ElementType,
}

impl FrameGeometry {
    /// Creates a geometry, rejecting zero-sized images.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] if either dimension is zero or the
    /// pixel count overflows `usize`.
    pub fn new(width: usize, height: usize, element_type: ElementType) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry(format!(
                "image must be non-empty, got {width}x{height}"
            )));
        }
        width.checked_mul(height).ok_or_else(|| {
            Error::InvalidGeometry(format!("pixel count of {width}x{height} overflows"))
        })?;
        Ok(Self {
            width,
            height,
            element_type,
        })
    }

    /// Number of pixels in one flattened frame.
    #[must_use]
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }
}

/// Square scan grid inferred from the number of frames found.
///
/// The side is `floor(sqrt(files_found))`; any files past `side²` do not
/// fit the grid and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanGrid {
    side: usize,
    files_found: usize,
}

impl ScanGrid {
    /// Infers the largest square grid that fits `files_found` frames.
    #[must_use]
    pub fn from_file_count(files_found: usize) -> Self {
        Self {
            side: files_found.isqrt(),
            files_found,
        }
    }

    /// Side length of the grid (`scan_size`).
    #[must_use]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of frames found before truncation.
    #[must_use]
    pub fn files_found(&self) -> usize {
        self.files_found
    }

    /// Number of frames placed on the grid, `side²`.
    #[must_use]
    pub fn frames_used(&self) -> usize {
        self.side * self.side
    }

    /// Number of trailing frames dropped by truncation.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.files_found - self.frames_used()
    }
}
