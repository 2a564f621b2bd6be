//! Medoid compositing.
//!
//! LandTrendr expects a single image per year. The medoid — the observation
//! with least total squared difference from the per-band median — is a robust
//! composite that is always a real acquisition, so the reflectance
//! trajectories handed to segmentation correspond to actual sensor
//! measurements rather than averaged, physically inconsistent values.

use ndarray::Array2;
use rayon::prelude::*;
use trendr_core::image::Image;
use trendr_core::raster::Raster;
use trendr_core::{Error, Result};

/// Validate that every image shares the first image's band layout and grid.
fn check_collection(collection: &[Image]) -> Result<(Vec<String>, (usize, usize))> {
    let first = &collection[0];
    let names: Vec<String> = first.band_names().iter().map(|s| s.to_string()).collect();
    let shape = first.shape();
    for img in collection {
        if img.shape() != shape {
            return Err(Error::SizeMismatch {
                er: shape.0,
                ec: shape.1,
                ar: img.shape().0,
                ac: img.shape().1,
            });
        }
        for name in &names {
            img.band(name)?;
        }
    }
    Ok((names, shape))
}

/// Per-band, per-pixel median across a non-empty collection.
///
/// Masked candidate values are skipped; a pixel with no valid candidate in a
/// band stays masked. Even-sized sets take the mean of the two middle values.
pub fn median_composite(collection: &[Image]) -> Result<Image> {
    if collection.is_empty() {
        return Err(Error::Other("median of an empty collection".into()));
    }
    let (names, (rows, cols)) = check_collection(collection)?;

    let mut bands = Vec::with_capacity(names.len());
    for name in &names {
        let sources: Vec<&Raster<f64>> = collection
            .iter()
            .map(|img| img.band(name))
            .collect::<Result<_>>()?;

        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                let mut values = Vec::with_capacity(sources.len());
                for (col, slot) in row_data.iter_mut().enumerate() {
                    values.clear();
                    for src in &sources {
                        let v = unsafe { src.get_unchecked(row, col) };
                        if !v.is_nan() {
                            values.push(v);
                        }
                    }
                    if values.is_empty() {
                        continue;
                    }
                    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
                    let mid = values.len() / 2;
                    *slot = if values.len() % 2 == 1 {
                        values[mid]
                    } else {
                        (values[mid - 1] + values[mid]) / 2.0
                    };
                }
                row_data
            })
            .collect();

        let mut raster = Raster::from_vec(data, rows, cols)?;
        raster.set_nodata(Some(f64::NAN));
        bands.push((name.clone(), raster));
    }

    Image::new(bands, collection[0].time_start())
}

/// Reduce a candidate collection to one composite by per-pixel medoid
/// selection.
///
/// An empty collection yields a clone of `fallback` (expected to be fully
/// masked) so that gap years produce a masked composite instead of an error.
/// For each pixel the candidate minimising the summed squared per-band
/// difference from the median is selected and its band values emitted;
/// pixels with no valid candidate stay masked. Pure function of its inputs:
/// repeated runs are bit-identical.
pub fn medoid_composite(collection: &[Image], fallback: &Image) -> Result<Image> {
    if collection.is_empty() {
        return Ok(fallback.clone());
    }

    let (names, (rows, cols)) = check_collection(collection)?;
    let median = median_composite(collection)?;

    let median_bands: Vec<&Raster<f64>> = names
        .iter()
        .map(|n| median.band(n))
        .collect::<Result<_>>()?;
    let candidate_bands: Vec<Vec<&Raster<f64>>> = collection
        .iter()
        .map(|img| names.iter().map(|n| img.band(n)).collect::<Result<_>>())
        .collect::<Result<_>>()?;

    // Per-pixel index of the selected candidate, -1 where none is valid.
    let selection: Vec<i64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_sel = vec![-1i64; cols];
            for (col, slot) in row_sel.iter_mut().enumerate() {
                let mut best = -1i64;
                let mut best_dist = f64::INFINITY;

                'candidates: for (k, bands) in candidate_bands.iter().enumerate() {
                    let mut dist = 0.0;
                    for (band, med) in bands.iter().zip(&median_bands) {
                        let v = unsafe { band.get_unchecked(row, col) };
                        let m = unsafe { med.get_unchecked(row, col) };
                        if v.is_nan() || m.is_nan() {
                            continue 'candidates;
                        }
                        let d = v - m;
                        dist += d * d;
                    }
                    if dist < best_dist {
                        best_dist = dist;
                        best = k as i64;
                    }
                }
                *slot = best;
            }
            row_sel
        })
        .collect();

    let mut bands = Vec::with_capacity(names.len());
    for (b, name) in names.iter().enumerate() {
        let data: Vec<f64> = selection
            .par_iter()
            .enumerate()
            .map(|(idx, &sel)| {
                if sel < 0 {
                    f64::NAN
                } else {
                    let (row, col) = (idx / cols, idx % cols);
                    unsafe { candidate_bands[sel as usize][b].get_unchecked(row, col) }
                }
            })
            .collect();
        let mut raster = Raster::from_vec(data, rows, cols)?;
        raster.set_nodata(Some(f64::NAN));
        bands.push((name.clone(), raster));
    }

    Image::new(bands, collection[0].time_start())
}

/// Per-pixel count of unmasked observations in a candidate collection,
/// judged on each image's first band.
pub fn count_clear_pixels(collection: &[Image]) -> Result<Raster<f64>> {
    if collection.is_empty() {
        return Err(Error::Other("clear-pixel count of an empty collection".into()));
    }
    let (_, (rows, cols)) = check_collection(collection)?;

    let mut counts = Array2::<f64>::zeros((rows, cols));
    for img in collection {
        let band = img.band_at(0)?;
        ndarray::Zip::from(&mut counts).and(band.data()).for_each(|c, &v| {
            if !v.is_nan() {
                *c += 1.0;
            }
        });
    }

    Ok(Raster::from_array(counts))
}
