//! Spectral index transforms.
//!
//! Derives the single-band time series handed to segmentation. Normalized
//! differences are scaled by 1000 and truncated to the 16-bit band depth.
//! The segmentation convention wants disturbance to move values upward, so
//! each index carries a polarity sign ([`SpectralIndex::flip`]); the sign is
//! always passed explicitly rather than read from process-wide state.

use rayon::prelude::*;
use trendr_core::image::Image;
use trendr_core::raster::Raster;
use trendr_core::{Error, Result};

/// Tasseled Cap coefficients (brightness, greenness, wetness) for the six
/// reference bands.
const TC_BRIGHTNESS: [f64; 6] = [0.2043, 0.4158, 0.5524, 0.5741, 0.3124, 0.2303];
const TC_GREENNESS: [f64; 6] = [-0.1603, -0.2819, -0.4934, 0.7940, -0.0002, -0.1446];
const TC_WETNESS: [f64; 6] = [0.0315, 0.2021, 0.3102, 0.1594, -0.6806, -0.6109];

/// Enumeration of supported segmentation indices: spectral derivations plus
/// the six raw reference bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralIndex {
    /// Normalized Burn Ratio, (B4 - B7) / (B4 + B7)
    Nbr,
    /// Normalized Difference Vegetation Index, (B4 - B3) / (B4 + B3)
    Ndvi,
    /// Normalized Difference Snow Index, (B2 - B5) / (B2 + B5)
    Ndsi,
    /// Normalized Difference Moisture Index, (B4 - B5) / (B4 + B5)
    Ndmi,
    /// Enhanced Vegetation Index
    Evi,
    /// Tasseled Cap brightness
    Tcb,
    /// Tasseled Cap greenness
    Tcg,
    /// Tasseled Cap wetness
    Tcw,
    /// Tasseled Cap angle
    Tca,
    B1,
    B2,
    B3,
    B4,
    B5,
    B7,
}

impl SpectralIndex {
    /// Output band name.
    pub fn band_name(&self) -> &'static str {
        match self {
            SpectralIndex::Nbr => "NBR",
            SpectralIndex::Ndvi => "NDVI",
            SpectralIndex::Ndsi => "NDSI",
            SpectralIndex::Ndmi => "NDMI",
            SpectralIndex::Evi => "EVI",
            SpectralIndex::Tcb => "TCB",
            SpectralIndex::Tcg => "TCG",
            SpectralIndex::Tcw => "TCW",
            SpectralIndex::Tca => "TCA",
            SpectralIndex::B1 => "B1",
            SpectralIndex::B2 => "B2",
            SpectralIndex::B3 => "B3",
            SpectralIndex::B4 => "B4",
            SpectralIndex::B5 => "B5",
            SpectralIndex::B7 => "B7",
        }
    }

    /// Polarity sign matching the segmentation disturbance convention: -1
    /// for indices that decrease under disturbance, +1 otherwise.
    pub fn flip(&self) -> i32 {
        match self {
            SpectralIndex::Nbr
            | SpectralIndex::Ndvi
            | SpectralIndex::Ndsi
            | SpectralIndex::Ndmi
            | SpectralIndex::Evi
            | SpectralIndex::Tcg
            | SpectralIndex::Tcw
            | SpectralIndex::Tca
            | SpectralIndex::B4 => -1,
            _ => 1,
        }
    }
}

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Pixels where either band is masked, or where the sum is zero, are NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    if band_a.shape() != band_b.shape() {
        return Err(Error::SizeMismatch {
            er: band_a.rows(),
            ec: band_a.cols(),
            ar: band_b.rows(),
            ac: band_b.cols(),
        });
    }

    let (rows, cols) = band_a.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if a.is_nan() || b.is_nan() {
                    continue;
                }
                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue; // Avoid division by zero
                }
                *slot = (a - b) / sum;
            }
            row_data
        })
        .collect();

    let mut out = Raster::from_vec(data, rows, cols)?;
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

/// Tasseled Cap transform: brightness, greenness, wetness and angle bands.
pub fn tasseled_cap(img: &Image) -> Result<Image> {
    let (rows, cols) = img.shape();
    let bands: Vec<&Raster<f64>> = trendr_core::SR_BANDS
        .iter()
        .map(|n| img.band(n))
        .collect::<Result<_>>()?;

    let mut brt = Raster::masked(rows, cols);
    let mut grn = Raster::masked(rows, cols);
    let mut wet = Raster::masked(rows, cols);
    let mut ang = Raster::masked(rows, cols);

    for row in 0..rows {
        for col in 0..cols {
            let mut b = 0.0;
            let mut g = 0.0;
            let mut w = 0.0;
            let mut valid = true;
            for (i, band) in bands.iter().enumerate() {
                let v = unsafe { band.get_unchecked(row, col) };
                if v.is_nan() {
                    valid = false;
                    break;
                }
                b += v * TC_BRIGHTNESS[i];
                g += v * TC_GREENNESS[i];
                w += v * TC_WETNESS[i];
            }
            if valid {
                brt.set(row, col, b)?;
                grn.set(row, col, g)?;
                wet.set(row, col, w)?;
                ang.set(row, col, (g / b).atan().to_degrees() * 100.0)?;
            }
        }
    }

    Image::new(
        vec![
            ("TCB".into(), brt),
            ("TCG".into(), grn),
            ("TCW".into(), wet),
            ("TCA".into(), ang),
        ],
        img.time_start(),
    )
}

/// Derive a single-band index image from an annual composite.
///
/// Normalized differences and EVI are scaled by 1000 and truncated to
/// shorts; raw bands and Tasseled Cap components pass through unscaled. With
/// `flip` set the result is multiplied by the index's polarity sign so that
/// disturbance moves values upward, as the segmentation service expects.
/// The composite's temporal tag is preserved.
pub fn calc_index(img: &Image, index: SpectralIndex, flip: bool) -> Result<Image> {
    let name = index.band_name();
    let sign = if flip { index.flip() as f64 } else { 1.0 };

    let raster = match index {
        SpectralIndex::Nbr => scaled_nd(img, "B4", "B7", sign)?,
        SpectralIndex::Ndvi => scaled_nd(img, "B4", "B3", sign)?,
        SpectralIndex::Ndsi => scaled_nd(img, "B2", "B5", sign)?,
        SpectralIndex::Ndmi => scaled_nd(img, "B4", "B5", sign)?,
        SpectralIndex::Evi => evi(img)?.map(|v| to_short(v * 1000.0 * sign)),
        SpectralIndex::Tcb | SpectralIndex::Tcg | SpectralIndex::Tcw | SpectralIndex::Tca => {
            tasseled_cap(img)?.band(name)?.map(|v| v * sign)
        }
        SpectralIndex::B1
        | SpectralIndex::B2
        | SpectralIndex::B3
        | SpectralIndex::B4
        | SpectralIndex::B5
        | SpectralIndex::B7 => img.band(name)?.map(|v| v * sign),
    };

    Image::new(vec![(name.to_string(), raster)], img.time_start())
}

fn scaled_nd(img: &Image, a: &str, b: &str, sign: f64) -> Result<Raster<f64>> {
    let nd = normalized_difference(img.band(a)?, img.band(b)?)?;
    Ok(nd.map(|v| to_short(v * 1000.0 * sign)))
}

fn evi(img: &Image) -> Result<Raster<f64>> {
    let nir = img.band("B4")?;
    let red = img.band("B3")?;
    let blue = img.band("B1")?;

    let (rows, cols) = img.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };
                let b = unsafe { blue.get_unchecked(row, col) };
                if n.is_nan() || r.is_nan() || b.is_nan() {
                    continue;
                }
                let denom = n + 6.0 * r - 7.5 * b + 1.0;
                if denom.abs() < 1e-10 {
                    continue;
                }
                *slot = 2.5 * (n - r) / denom;
            }
            row_data
        })
        .collect();

    let mut out = Raster::from_vec(data, rows, cols)?;
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

fn to_short(v: f64) -> f64 {
    trendr_core::image::to_short_value(v)
}

/// Multiply every band by an explicit ±1 sign and re-truncate to shorts,
/// preserving the temporal tag.
pub fn invert_index(img: &Image, sign: i32) -> Result<Image> {
    if sign != 1 && sign != -1 {
        return Err(Error::InvalidParameter {
            name: "sign",
            value: sign.to_string(),
            reason: "polarity sign must be 1 or -1".into(),
        });
    }
    Ok(img.map_bands(|v| v * sign as f64).to_short())
}

/// Append the sign-corrected fit-to-value companion band, named after the
/// first band with an `_FTV` suffix.
pub fn append_ftv(img: &Image, sign: i32) -> Result<Image> {
    if sign != 1 && sign != -1 {
        return Err(Error::InvalidParameter {
            name: "sign",
            value: sign.to_string(),
            reason: "polarity sign must be 1 or -1".into(),
        });
    }
    let first = img.band_names()[0].to_string();
    let ftv = img.band(&first)?.map(|v| v * sign as f64);
    Ok(img.add_band(&format!("{first}_FTV"), ftv)?.to_short())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendr_core::sensor::SR_BANDS;

    fn composite(values: [f64; 6]) -> Image {
        let bands = SR_BANDS
            .iter()
            .zip(values)
            .map(|(n, v)| {
                let mut r = Raster::filled(2, 2, v);
                r.set_nodata(Some(f64::NAN));
                (n.to_string(), r)
            })
            .collect();
        Image::new(bands, 777).unwrap()
    }

    #[test]
    fn nbr_is_scaled_and_short() {
        // (4000 - 2000) / (4000 + 2000) = 0.3333.. -> 333 after x1000 trunc
        let img = composite([500.0, 800.0, 900.0, 4000.0, 3000.0, 2000.0]);
        let nbr = calc_index(&img, SpectralIndex::Nbr, false).unwrap();
        assert_eq!(nbr.band_names(), vec!["NBR"]);
        assert_eq!(nbr.band("NBR").unwrap().get(0, 0).unwrap(), 333.0);
        assert_eq!(nbr.time_start(), 777);
    }

    #[test]
    fn nbr_flip_negates() {
        let img = composite([500.0, 800.0, 900.0, 4000.0, 3000.0, 2000.0]);
        let nbr = calc_index(&img, SpectralIndex::Nbr, true).unwrap();
        assert_eq!(nbr.band("NBR").unwrap().get(0, 0).unwrap(), -333.0);
    }

    #[test]
    fn zero_sum_is_masked() {
        let img = composite([500.0, 800.0, 900.0, 2000.0, 3000.0, -2000.0]);
        let nbr = calc_index(&img, SpectralIndex::Nbr, false).unwrap();
        assert!(nbr.band("NBR").unwrap().get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn raw_band_index_passes_through() {
        let img = composite([500.0, 800.0, 900.0, 4000.0, 3000.0, 2000.0]);
        let b5 = calc_index(&img, SpectralIndex::B5, false).unwrap();
        assert_eq!(b5.band_names(), vec!["B5"]);
        assert_eq!(b5.band("B5").unwrap().get(0, 0).unwrap(), 3000.0);
    }

    #[test]
    fn flip_table_matches_convention() {
        assert_eq!(SpectralIndex::Nbr.flip(), -1);
        assert_eq!(SpectralIndex::Tcb.flip(), 1);
        assert_eq!(SpectralIndex::B4.flip(), -1);
        assert_eq!(SpectralIndex::B5.flip(), 1);
    }

    #[test]
    fn invert_round_trips_under_double_negation() {
        let img = composite([500.0, 800.0, 900.0, 4000.0, 3000.0, 2000.0]).to_short();
        let twice = invert_index(&invert_index(&img, -1).unwrap(), -1).unwrap();
        assert_eq!(twice, img);

        let twice = invert_index(&invert_index(&img, 1).unwrap(), 1).unwrap();
        assert_eq!(twice, img);
    }

    #[test]
    fn invert_rejects_bad_sign() {
        let img = composite([1.0; 6]);
        assert!(invert_index(&img, 0).is_err());
        assert!(invert_index(&img, 2).is_err());
    }

    #[test]
    fn ftv_band_is_appended() {
        let img = composite([500.0, 800.0, 900.0, 4000.0, 3000.0, 2000.0]);
        let nbr = calc_index(&img, SpectralIndex::Nbr, true).unwrap();
        let with_ftv = append_ftv(&nbr, -1).unwrap();
        assert_eq!(with_ftv.band_names(), vec!["NBR", "NBR_FTV"]);
        // Segmentation band stays flipped; FTV band is flipped back
        assert_eq!(with_ftv.band("NBR").unwrap().get(0, 0).unwrap(), -333.0);
        assert_eq!(with_ftv.band("NBR_FTV").unwrap().get(0, 0).unwrap(), 333.0);
    }

    #[test]
    fn tasseled_cap_components() {
        let img = composite([1000.0, 1000.0, 1000.0, 1000.0, 1000.0, 1000.0]);
        let tc = tasseled_cap(&img).unwrap();
        let brt: f64 = TC_BRIGHTNESS.iter().sum::<f64>() * 1000.0;
        let grn: f64 = TC_GREENNESS.iter().sum::<f64>() * 1000.0;
        assert!((tc.band("TCB").unwrap().get(0, 0).unwrap() - brt).abs() < 1e-9);
        assert!((tc.band("TCG").unwrap().get(0, 0).unwrap() - grn).abs() < 1e-9);
        let expected_angle = (grn / brt).atan().to_degrees() * 100.0;
        assert!((tc.band("TCA").unwrap().get(0, 0).unwrap() - expected_angle).abs() < 1e-9);
    }
}
