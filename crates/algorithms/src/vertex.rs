//! Dense vertex-stack extraction.
//!
//! The segmentation service returns one `4 x nSteps` array per pixel; only
//! the columns flagged as vertices matter downstream. This module gathers
//! those columns into a fixed-width, zero-padded band stack so every pixel
//! carries the same band layout regardless of how many vertices it fitted.

use ndarray::Array2;
use trendr_core::raster::Raster;
use trendr_core::segmentation::{SegmentationResult, ROW_FITTED, ROW_IS_VERTEX, ROW_SOURCE, ROW_YEAR};
use trendr_core::Result;

use trendr_core::image::Image;

/// Gather the vertex columns of every pixel into a dense band stack.
///
/// Produces `3 * (max_segments + 1)` bands: all `yrs_vert_N`, then all
/// `src_vert_N`, then all `fit_vert_N`, with `N` counting from 1. Pixels with
/// fewer vertices than slots are zero-padded on the right; pixels with more
/// (vertex-count overshoot) are truncated.
pub fn vertex_stack(result: &SegmentationResult, max_segments: u32) -> Result<Image> {
    let slots = max_segments as usize + 1;
    let (rows, cols) = (result.rows(), result.cols());

    // One matrix per result row, slots wide
    let mut years = vec![Array2::<f64>::zeros((rows, cols)); slots];
    let mut sources = vec![Array2::<f64>::zeros((rows, cols)); slots];
    let mut fitted = vec![Array2::<f64>::zeros((rows, cols)); slots];

    for row in 0..rows {
        for col in 0..cols {
            let pixel = result.pixel(row, col)?;
            let mut slot = 0;
            for step in 0..result.steps() {
                if slot == slots {
                    break;
                }
                if pixel[[ROW_IS_VERTEX, step]] != 0.0 {
                    years[slot][[row, col]] = pixel[[ROW_YEAR, step]];
                    sources[slot][[row, col]] = pixel[[ROW_SOURCE, step]];
                    fitted[slot][[row, col]] = pixel[[ROW_FITTED, step]];
                    slot += 1;
                }
            }
        }
    }

    let mut bands = Vec::with_capacity(3 * slots);
    for (prefix, stack) in [("yrs", years), ("src", sources), ("fit", fitted)] {
        for (i, data) in stack.into_iter().enumerate() {
            bands.push((format!("{}_vert_{}", prefix, i + 1), Raster::from_array(data)));
        }
    }
    Image::new(bands, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendr_core::segmentation::RESULT_ROWS;

    /// A 1x1 result whose single pixel has the given vertex flags.
    fn one_pixel(years: &[f64], flags: &[f64]) -> SegmentationResult {
        let steps = years.len();
        let mut values = Vec::with_capacity(RESULT_ROWS * steps);
        values.extend_from_slice(years); // year row
        values.extend(years.iter().map(|y| y + 0.5)); // source row
        values.extend(years.iter().map(|y| y + 0.25)); // fitted row
        values.extend_from_slice(flags); // is-vertex row
        SegmentationResult::from_flat(1, 1, steps, values).unwrap()
    }

    #[test]
    fn band_count_and_order_for_six_segments() {
        let result = one_pixel(&[1985.0, 1986.0, 1987.0], &[1.0, 0.0, 1.0]);
        let stack = vertex_stack(&result, 6).unwrap();

        assert_eq!(stack.n_bands(), 21);
        let names = stack.band_names();
        assert_eq!(names[0], "yrs_vert_1");
        assert_eq!(names[6], "yrs_vert_7");
        assert_eq!(names[7], "src_vert_1");
        assert_eq!(names[14], "fit_vert_1");
        assert_eq!(names[20], "fit_vert_7");
    }

    #[test]
    fn non_vertex_steps_are_skipped_and_tail_zero_padded() {
        let result = one_pixel(&[1985.0, 1986.0, 1987.0], &[1.0, 0.0, 1.0]);
        let stack = vertex_stack(&result, 6).unwrap();

        assert_eq!(stack.band("yrs_vert_1").unwrap().get(0, 0).unwrap(), 1985.0);
        assert_eq!(stack.band("yrs_vert_2").unwrap().get(0, 0).unwrap(), 1987.0);
        assert_eq!(stack.band("yrs_vert_3").unwrap().get(0, 0).unwrap(), 0.0);
        assert_eq!(stack.band("src_vert_2").unwrap().get(0, 0).unwrap(), 1987.5);
        assert_eq!(stack.band("fit_vert_2").unwrap().get(0, 0).unwrap(), 1987.25);
        assert_eq!(stack.band("fit_vert_7").unwrap().get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn overshoot_vertices_are_truncated() {
        // Four vertices but only three slots for max_segments = 2
        let result = one_pixel(
            &[1985.0, 1986.0, 1987.0, 1988.0],
            &[1.0, 1.0, 1.0, 1.0],
        );
        let stack = vertex_stack(&result, 2).unwrap();

        assert_eq!(stack.n_bands(), 9);
        assert_eq!(stack.band("yrs_vert_3").unwrap().get(0, 0).unwrap(), 1987.0);
        assert!(stack.band("yrs_vert_4").is_err());
    }

    #[test]
    fn no_vertices_yields_all_zero_bands() {
        let result = one_pixel(&[1985.0, 1986.0], &[0.0, 0.0]);
        let stack = vertex_stack(&result, 6).unwrap();
        for (_, band) in stack.iter_bands() {
            assert_eq!(band.get(0, 0).unwrap(), 0.0);
        }
    }
}
