//! Annual series flattening.
//!
//! Turns a list of per-year single-band images into one multiband image with
//! year-named bands, the shape exports and fit-to-value products use.

use trendr_core::image::Image;
use trendr_core::{Error, Result};

/// Flatten an annual series into one image with `yr_<year>` bands.
///
/// Takes band `band` from each image, names it after the matching year, and
/// replaces masked cells with `fill`. The series and year list must be the
/// same length and aligned.
pub fn series_to_band_stack(
    series: &[Image],
    band: &str,
    years: &[i32],
    fill: f64,
) -> Result<Image> {
    if series.len() != years.len() {
        return Err(Error::Other(format!(
            "series of {} images but {} years",
            series.len(),
            years.len()
        )));
    }
    if series.is_empty() {
        return Err(Error::Other("cannot stack an empty series".into()));
    }

    let mut bands = Vec::with_capacity(series.len());
    for (img, year) in series.iter().zip(years) {
        let raster = img.band(band)?.unmask(fill);
        bands.push((format!("yr_{year}"), raster));
    }
    Image::new(bands, series[0].time_start())
}
