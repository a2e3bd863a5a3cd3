//! Raster-order coordinate matrices for position and spectroscopic axes.
//!
//! A [`PositionMatrix`] enumerates every point of an N-dimensional grid in
//! raster order, the first axis varying fastest. It is stored as an
//! `[n_axes, n_points]` matrix: row `k` holds the coordinate of axis `k` for
//! every point. Each axis also exposes the region it occupies in that
//! layout, which is what downstream readers use to slice out one axis.

use crate::{Error, Result};
use ndarray::Array2;
use std::ops::Range;

/// Region of the `[n_axes, n_points]` layout occupied by one labelled axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSlice {
    /// Axis label, e.g. `"X"` or `"U"`.
    pub label: String,
    /// Physical unit of the axis.
    pub unit: String,
    /// Row range (always one row).
    pub rows: Range<usize>,
    /// Column range (every point).
    pub cols: Range<usize>,
}

impl AxisSlice {
    /// Slice bounds as `[row_start, row_end, col_start, col_end]`.
    #[must_use]
    pub fn bounds(&self) -> [u64; 4] {
        [
            self.rows.start as u64,
            self.rows.end as u64,
            self.cols.start as u64,
            self.cols.end as u64,
        ]
    }
}

/// Raster-order grid coordinates with per-axis labels and units.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMatrix {
    indices: Array2<u32>,
    axes: Vec<AxisSlice>,
}

impl PositionMatrix {
    /// Enumerates the grid with the given axis sizes.
    ///
    /// `dims[0]` varies fastest. `labels` and `units` name each axis and must
    /// have the same length as `dims`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] if the label/unit counts disagree
    /// with `dims`, if the grid is empty, or if a coordinate does not fit in
    /// `u32`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn raster(dims: &[usize], labels: &[&str], units: &[&str]) -> Result<Self> {
        if dims.is_empty() || labels.len() != dims.len() || units.len() != dims.len() {
            return Err(Error::InvalidGeometry(format!(
                "{} dims need as many labels and units, got {} and {}",
                dims.len(),
                labels.len(),
                units.len()
            )));
        }
        if dims.iter().any(|&d| d == 0) {
            return Err(Error::InvalidGeometry(format!(
                "grid dimensions must be non-zero: {dims:?}"
            )));
        }
        if dims.iter().any(|&d| u32::try_from(d).is_err()) {
            return Err(Error::InvalidGeometry(format!(
                "grid dimensions exceed u32 range: {dims:?}"
            )));
        }

        let n_points = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| Error::InvalidGeometry(format!("grid {dims:?} is too large")))?;

        let mut indices = Array2::<u32>::zeros((dims.len(), n_points));
        // Stride of axis k is the product of all faster axes.
        let mut stride = 1usize;
        for (axis, &dim) in dims.iter().enumerate() {
            for (point, value) in indices.row_mut(axis).iter_mut().enumerate() {
                *value = ((point / stride) % dim) as u32;
            }
            stride *= dim;
        }

        let axes = labels
            .iter()
            .zip(units)
            .enumerate()
            .map(|(axis, (label, unit))| AxisSlice {
                label: (*label).to_string(),
                unit: (*unit).to_string(),
                rows: axis..axis + 1,
                cols: 0..n_points,
            })
            .collect();

        Ok(Self { indices, axes })
    }

    /// Integer coordinates, shape `[n_axes, n_points]`.
    #[must_use]
    pub fn indices(&self) -> &Array2<u32> {
        &self.indices
    }

    /// Physical coordinates, shape `[n_axes, n_points]`.
    ///
    /// Coordinates are in units of one grid step, so values equal indices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn values(&self) -> Array2<f32> {
        self.indices.mapv(|v| v as f32)
    }

    /// Labelled axis regions, in axis order.
    #[must_use]
    pub fn axes(&self) -> &[AxisSlice] {
        &self.axes
    }

    /// Number of grid points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.indices.ncols()
    }

    /// Axis labels, in axis order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.label.clone()).collect()
    }

    /// Axis units, in axis order.
    #[must_use]
    pub fn units(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.unit.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_raster_first_axis_fastest() {
        let mat = PositionMatrix::raster(&[3, 2], &["X", "Y"], &["pixel", "pixel"]).unwrap();
        assert_eq!(mat.indices().shape(), &[2, 6]);
        assert_eq!(mat.indices().row(0).to_vec(), vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(mat.indices().row(1).to_vec(), vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_raster_visits_every_point_once() {
        let mat = PositionMatrix::raster(&[4, 5], &["U", "V"], &["", ""]).unwrap();
        let points: HashSet<(u32, u32)> = (0..mat.num_points())
            .map(|i| (mat.indices()[[0, i]], mat.indices()[[1, i]]))
            .collect();
        assert_eq!(points.len(), 20);
        assert!(points.contains(&(3, 4)));
    }

    #[test]
    fn test_axis_slices_cover_layout() {
        let mat = PositionMatrix::raster(&[2, 2], &["X", "Y"], &["pixel", "pixel"]).unwrap();
        let axes = mat.axes();
        assert_eq!(axes[0].label, "X");
        assert_eq!(axes[0].bounds(), [0, 1, 0, 4]);
        assert_eq!(axes[1].bounds(), [1, 2, 0, 4]);
        assert_eq!(mat.units(), vec!["pixel".to_string(), "pixel".to_string()]);
    }

    #[test]
    fn test_values_mirror_indices() {
        let mat = PositionMatrix::raster(&[2, 3], &["U", "V"], &["", ""]).unwrap();
        let values = mat.values();
        assert_eq!(values[[0, 5]], 1.0);
        assert_eq!(values[[1, 5]], 2.0);
    }

    #[test]
    fn test_raster_rejects_bad_input() {
        assert!(PositionMatrix::raster(&[2, 2], &["X"], &["", ""]).is_err());
        assert!(PositionMatrix::raster(&[0, 2], &["X", "Y"], &["", ""]).is_err());
        assert!(PositionMatrix::raster(&[], &[], &[]).is_err());
    }
}
