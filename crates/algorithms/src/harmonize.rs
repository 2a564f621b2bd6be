//! OLI → ETM+ reflectance harmonization.
//!
//! Landsat 8 OLI surface reflectance sits on a slightly different radiometric
//! scale than TM/ETM+. Before compositing, OLI scenes are renamed onto the
//! reference band layout, resampled bicubically, and pushed through the
//! band-wise reduced-major-axis regression of Roy et al. 2016 (Remote Sensing
//! of Environment 185, Table 2).

use trendr_core::image::Image;
use trendr_core::sensor::{OLI_BANDS, SR_BANDS};
use trendr_core::Result;

use crate::resample::resample_bicubic;

/// RMA regression slopes, one per reference band (B1 B2 B3 B4 B5 B7).
pub const ROY_SLOPES: [f64; 6] = [0.9785, 0.9542, 0.9825, 1.0073, 1.0171, 0.9949];

/// RMA regression intercepts on the 0-1 reflectance scale; multiplied by
/// 10000 to match the scaled integer products.
pub const ROY_INTERCEPTS: [f64; 6] = [-0.0095, -0.0016, -0.0022, -0.0021, -0.0030, 0.0029];

/// Harmonize one OLI scene onto the ETM+ reflectance scale.
///
/// Renames the six OLI bands (B2..B7) to the reference layout (B1..B5, B7),
/// resamples each band bicubically onto `target` and applies
/// `(v - intercept * 10000) / slope` band-wise, truncating to the 16-bit
/// band depth. The temporal tag is preserved.
///
/// The six OLI bands are assumed present; a missing band surfaces as
/// [`trendr_core::Error::MissingBand`].
pub fn harmonize_oli(image: &Image, target: (usize, usize)) -> Result<Image> {
    let renamed = image.select(&OLI_BANDS, &SR_BANDS)?;

    let mut bands = Vec::with_capacity(SR_BANDS.len());
    for (i, name) in SR_BANDS.iter().enumerate() {
        let slope = ROY_SLOPES[i];
        let intercept = ROY_INTERCEPTS[i] * 10_000.0;
        let resampled = resample_bicubic(renamed.band(name)?, target.0, target.1);
        bands.push((name.to_string(), resampled.map(|v| (v - intercept) / slope)));
    }

    Ok(Image::new(bands, image.time_start())?.to_short())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendr_core::raster::Raster;

    fn oli_scene(value: f64) -> Image {
        let bands = OLI_BANDS
            .iter()
            .map(|n| (n.to_string(), Raster::filled(3, 3, value)))
            .collect();
        Image::new(bands, 555).unwrap()
    }

    #[test]
    fn renames_onto_reference_layout() {
        let out = harmonize_oli(&oli_scene(5000.0), (3, 3)).unwrap();
        assert_eq!(out.band_names(), SR_BANDS.to_vec());
        assert_eq!(out.time_start(), 555);
    }

    #[test]
    fn applies_roy_coefficients() {
        let out = harmonize_oli(&oli_scene(5000.0), (3, 3)).unwrap();
        for (i, name) in SR_BANDS.iter().enumerate() {
            let expected = ((5000.0 - ROY_INTERCEPTS[i] * 10_000.0) / ROY_SLOPES[i]).trunc();
            let got = out.band(name).unwrap().get(1, 1).unwrap();
            assert!(
                (got - expected).abs() < f64::EPSILON,
                "band {name}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn output_is_short_truncated() {
        // A value pushed past the i16 maximum clamps
        let out = harmonize_oli(&oli_scene(33_000.0), (3, 3)).unwrap();
        let v = out.band("B1").unwrap().get(0, 0).unwrap();
        assert_eq!(v, i16::MAX as f64);
    }

    #[test]
    fn missing_band_is_an_error() {
        let bands = vec![("B2".to_string(), Raster::filled(2, 2, 1.0))];
        let img = Image::new(bands, 0).unwrap();
        assert!(harmonize_oli(&img, (2, 2)).is_err());
    }

    #[test]
    fn resamples_to_target_grid() {
        let out = harmonize_oli(&oli_scene(5000.0), (6, 6)).unwrap();
        assert_eq!(out.shape(), (6, 6));
    }
}
