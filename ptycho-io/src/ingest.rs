//! Streaming ingest of frames into a committed container.
//!
//! Frames are decoded and written strictly one at a time, in the order
//! given. Only the current frame and the pixel-wise accumulator are held in
//! memory; the main dataset is never read back.

use crate::container::{DatasetHandle, Hdf5Container};
use crate::image::read_frame;
use crate::{Error, Result};
use ptycho_core::FrameGeometry;
use std::path::PathBuf;

/// Datasets an ingest run writes to.
#[derive(Clone, Copy)]
pub struct IngestTargets<'a> {
    /// `[frames, pixels]` main dataset, one row per frame.
    pub main: &'a DatasetHandle,
    /// Per-frame mean, one element per frame.
    pub frame_mean: &'a DatasetHandle,
    /// Pixel-wise mean over all frames, written once at the end.
    pub ronchigram: &'a DatasetHandle,
}

/// Outcome of a completed ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Number of frames written.
    pub frames: usize,
    /// Pixels per frame.
    pub num_pixels: usize,
}

/// Streams `files` into `targets`, frame `i` into row `i`.
///
/// Each frame must match `geometry` in pixel count and element type. The
/// container is flushed after every frame and once more after the
/// pixel-wise mean is written. Progress is logged roughly
/// `progress_divisions` times over the run.
///
/// # Errors
/// Stops at the first frame that fails to decode
/// ([`Error::Decode`]), has the wrong pixel count ([`Error::ShapeMismatch`])
/// or element type ([`Error::ElementTypeMismatch`]), or on any container
/// failure. Rows written before the failure stay in the container.
pub fn ingest(
    container: &Hdf5Container,
    files: &[PathBuf],
    targets: IngestTargets<'_>,
    geometry: &FrameGeometry,
    progress_divisions: usize,
) -> Result<IngestStats> {
    let num_frames = files.len();
    let num_pixels = geometry.num_pixels();
    let interval = progress_interval(num_frames, progress_divisions);
    let mut pixel_sum = vec![0.0f64; num_pixels];

    for (index, path) in files.iter().enumerate() {
        if (index + 1) % interval == 0 {
            log::info!(
                "Processing file...{}% - reading: {}",
                percent(index, num_frames),
                path.display()
            );
        }

        let frame = read_frame(path)?;
        if frame.len() != num_pixels {
            return Err(Error::ShapeMismatch {
                index,
                path: path.clone(),
                expected: num_pixels,
                actual: frame.len(),
            });
        }
        if frame.element_type() != geometry.element_type {
            return Err(Error::ElementTypeMismatch {
                index,
                path: path.clone(),
                expected: geometry.element_type,
                actual: frame.element_type(),
            });
        }

        targets.main.write_row(index, &frame)?;
        #[allow(clippy::cast_possible_truncation)]
        let frame_mean = frame.mean() as f32;
        targets.frame_mean.write_element(index, frame_mean)?;
        frame.accumulate_into(&mut pixel_sum);

        container.flush()?;
    }

    if num_frames > 0 {
        #[allow(clippy::cast_precision_loss)]
        let n = num_frames as f64;
        #[allow(clippy::cast_possible_truncation)]
        let mean: Vec<f32> = pixel_sum.iter().map(|&s| (s / n) as f32).collect();
        targets.ronchigram.write_all(&mean)?;
    }
    container.flush()?;

    Ok(IngestStats {
        frames: num_frames,
        num_pixels,
    })
}

/// Frames between progress reports: `num_frames / divisions` rounded to the
/// nearest integer, at least 1.
fn progress_interval(num_frames: usize, divisions: usize) -> usize {
    let divisions = divisions.max(1);
    ((num_frames + divisions / 2) / divisions).max(1)
}

fn percent(index: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    (100 * index + total / 2) / total
}
