//! The remote temporal-segmentation contract.
//!
//! [`LandTrendrParams`] is the fixed record of scalar knobs attached to every
//! segmentation request. [`SegmentationResult`] is the opaque per-pixel array
//! the service returns; local code only reads and reshapes it.

use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Run parameters
// ---------------------------------------------------------------------------

/// The eight scalar knobs of a segmentation run. Serializes with the field
/// names the remote service expects. Immutable once assembled; passed by
/// value with the attached time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandTrendrParams {
    /// Maximum number of segments in the fitted trajectory.
    pub max_segments: u32,
    /// Threshold for dampening single-observation spikes.
    pub spike_threshold: f64,
    /// How many extra vertices beyond `max_segments + 1` the initial model
    /// may identify.
    pub vertex_count_overshoot: u32,
    /// Disallow segments that represent a one-year recovery.
    pub prevent_one_year_recovery: bool,
    /// Recoveries faster than 1/threshold years are disallowed.
    pub recovery_threshold: f64,
    /// P-value threshold for accepting a fitted model.
    pub pval_threshold: f64,
    /// Take the model with most vertices whose p-value is within this
    /// proportion of the best score.
    pub best_model_proportion: f64,
    /// Minimum observations required to attempt fitting.
    pub min_observations_needed: u32,
}

impl Default for LandTrendrParams {
    fn default() -> Self {
        Self {
            max_segments: 6,
            spike_threshold: 0.9,
            vertex_count_overshoot: 3,
            prevent_one_year_recovery: true,
            recovery_threshold: 0.25,
            pval_threshold: 0.05,
            best_model_proportion: 0.75,
            min_observations_needed: 6,
        }
    }
}

impl LandTrendrParams {
    /// Number of vertex slots the dense output stack carries.
    pub fn vertex_slots(&self) -> usize {
        self.max_segments as usize + 1
    }
}

// ---------------------------------------------------------------------------
// Result array
// ---------------------------------------------------------------------------

/// Row index of the vertex year in the result array.
pub const ROW_YEAR: usize = 0;
/// Row index of the source (observed) value.
pub const ROW_SOURCE: usize = 1;
/// Row index of the fitted value.
pub const ROW_FITTED: usize = 2;
/// Row index of the is-vertex flag (non-zero marks a vertex year).
pub const ROW_IS_VERTEX: usize = 3;

/// Number of rows in the per-pixel result array.
pub const RESULT_ROWS: usize = 4;

/// The segmentation service's output: one `4 x nSteps` array per pixel
/// (rows: year, source value, fitted value, is-vertex flag).
///
/// Not owned or mutated locally beyond reshaping.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationResult {
    rows: usize,
    cols: usize,
    steps: usize,
    pixels: Vec<Array2<f64>>,
}

impl SegmentationResult {
    /// Build a result from per-pixel arrays in row-major pixel order. Every
    /// array must be `4 x steps`.
    pub fn new(rows: usize, cols: usize, steps: usize, pixels: Vec<Array2<f64>>) -> Result<Self> {
        if pixels.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        for p in &pixels {
            if p.dim() != (RESULT_ROWS, steps) {
                return Err(Error::SizeMismatch {
                    er: RESULT_ROWS,
                    ec: steps,
                    ar: p.nrows(),
                    ac: p.ncols(),
                });
            }
        }
        Ok(Self {
            rows,
            cols,
            steps,
            pixels,
        })
    }

    /// Build a result from a flat value buffer: pixel-major, each pixel
    /// holding `4 * steps` values in row-major order.
    pub fn from_flat(rows: usize, cols: usize, steps: usize, values: Vec<f64>) -> Result<Self> {
        let per_pixel = RESULT_ROWS * steps;
        if values.len() != rows * cols * per_pixel {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let pixels = values
            .chunks_exact(per_pixel)
            .map(|chunk| {
                Array2::from_shape_vec((RESULT_ROWS, steps), chunk.to_vec())
                    .map_err(|e| Error::Other(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(rows, cols, steps, pixels)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of time steps (columns) in each per-pixel array.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The `4 x steps` array for one pixel.
    pub fn pixel(&self, row: usize, col: usize) -> Result<&Array2<f64>> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(&self.pixels[row * self.cols + col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn params_default_matches_published_run() {
        let p = LandTrendrParams::default();
        assert_eq!(p.max_segments, 6);
        assert!((p.spike_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(p.vertex_count_overshoot, 3);
        assert!(p.prevent_one_year_recovery);
        assert!((p.recovery_threshold - 0.25).abs() < f64::EPSILON);
        assert!((p.pval_threshold - 0.05).abs() < f64::EPSILON);
        assert!((p.best_model_proportion - 0.75).abs() < f64::EPSILON);
        assert_eq!(p.min_observations_needed, 6);
        assert_eq!(p.vertex_slots(), 7);
    }

    #[test]
    fn result_shape_validation() {
        let good = array![[1985.0, 1986.0], [10.0, 20.0], [11.0, 19.0], [1.0, 1.0]];
        assert!(SegmentationResult::new(1, 1, 2, vec![good.clone()]).is_ok());

        // Wrong pixel count
        assert!(SegmentationResult::new(1, 2, 2, vec![good.clone()]).is_err());

        // Wrong per-pixel shape
        let bad = array![[1985.0, 1986.0], [10.0, 20.0]];
        assert!(SegmentationResult::new(1, 1, 2, vec![bad]).is_err());
    }

    #[test]
    fn from_flat_round_trip() {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        let result = SegmentationResult::from_flat(1, 2, 2, values).unwrap();
        let p0 = result.pixel(0, 0).unwrap();
        assert_eq!(p0[[0, 0]], 0.0);
        assert_eq!(p0[[3, 1]], 7.0);
        let p1 = result.pixel(0, 1).unwrap();
        assert_eq!(p1[[0, 0]], 8.0);
        assert!(result.pixel(1, 0).is_err());
    }
}
