//! Grid resampling.
//!
//! Reflectance bands are resampled bicubically (Catmull-Rom) before any
//! radiometric transform; QA bitmasks use nearest-neighbour so bit values are
//! never blended.

use trendr_core::raster::{Raster, RasterElement};

/// Bicubic (Catmull-Rom) resampling of a float raster to a new shape.
///
/// Any NaN among a target pixel's 4x4 support window makes the output pixel
/// NaN. A same-shape call returns the input unchanged.
pub fn resample_bicubic(raster: &Raster<f64>, rows: usize, cols: usize) -> Raster<f64> {
    if raster.shape() == (rows, cols) {
        return raster.clone();
    }

    let (src_rows, src_cols) = raster.shape();
    let row_scale = src_rows as f64 / rows as f64;
    let col_scale = src_cols as f64 / cols as f64;

    let mut out = Raster::filled(rows, cols, f64::NAN);
    out.set_nodata(Some(f64::NAN));

    for row in 0..rows {
        // Continuous source coordinate of the target pixel centre
        let sy = (row as f64 + 0.5) * row_scale - 0.5;
        let y0 = sy.floor();
        let fy = sy - y0;

        for col in 0..cols {
            let sx = (col as f64 + 0.5) * col_scale - 0.5;
            let x0 = sx.floor();
            let fx = sx - x0;

            let mut col_values = [0.0f64; 4];
            let mut valid = true;

            'window: for (j, cv) in col_values.iter_mut().enumerate() {
                let ry = clamp_index(y0 as i64 + j as i64 - 1, src_rows);
                let mut row_values = [0.0f64; 4];
                for (i, rv) in row_values.iter_mut().enumerate() {
                    let rx = clamp_index(x0 as i64 + i as i64 - 1, src_cols);
                    let v = unsafe { raster.get_unchecked(ry, rx) };
                    if v.is_nan() {
                        valid = false;
                        break 'window;
                    }
                    *rv = v;
                }
                *cv = catmull_rom(&row_values, fx);
            }

            if valid {
                let v = catmull_rom(&col_values, fy);
                unsafe {
                    *out.data_mut().uget_mut((row, col)) = v;
                }
            }
        }
    }

    out
}

/// Nearest-neighbour resampling, for categorical/bitmask grids.
pub fn resample_nearest<T: RasterElement>(raster: &Raster<T>, rows: usize, cols: usize) -> Raster<T> {
    if raster.shape() == (rows, cols) {
        return raster.clone();
    }

    let (src_rows, src_cols) = raster.shape();
    let row_scale = src_rows as f64 / rows as f64;
    let col_scale = src_cols as f64 / cols as f64;

    let mut out = Raster::new(rows, cols);
    out.set_nodata(raster.nodata());

    for row in 0..rows {
        let ry = clamp_index(((row as f64 + 0.5) * row_scale) as i64, src_rows);
        for col in 0..cols {
            let rx = clamp_index(((col as f64 + 0.5) * col_scale) as i64, src_cols);
            let v = unsafe { raster.get_unchecked(ry, rx) };
            unsafe {
                *out.data_mut().uget_mut((row, col)) = v;
            }
        }
    }

    out
}

/// Catmull-Rom interpolation of four samples at parameter `t` in [0, 1].
fn catmull_rom(p: &[f64; 4], t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p[1])
        + (-p[0] + p[2]) * t
        + (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]) * t2
        + (-p[0] + 3.0 * p[1] - 3.0 * p[2] + p[3]) * t3)
}

fn clamp_index(i: i64, len: usize) -> usize {
    i.clamp(0, len as i64 - 1) as usize
}
