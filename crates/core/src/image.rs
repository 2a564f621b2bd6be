//! Multiband images and acquisition scenes.
//!
//! An [`Image`] is an ordered list of named single-band rasters sharing one
//! grid, plus an epoch-milliseconds temporal tag. Band values are stored as
//! `f64` with NaN marking masked pixels; [`Image::to_short`] truncates values
//! into the signed 16-bit range the reflectance products use.

use crate::error::{Error, Result};
use crate::raster::Raster;

/// Truncate a value into the signed 16-bit range, preserving NaN.
pub fn to_short_value(v: f64) -> f64 {
    if v.is_nan() {
        v
    } else {
        v.trunc().clamp(i16::MIN as f64, i16::MAX as f64)
    }
}

/// An ordered named-band image with a temporal tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    bands: Vec<(String, Raster<f64>)>,
    time_start: i64,
}

impl Image {
    /// Create an image from named bands. All bands must share one grid shape
    /// and names must be unique.
    pub fn new(bands: Vec<(String, Raster<f64>)>, time_start: i64) -> Result<Self> {
        if bands.is_empty() {
            return Err(Error::Other("image must have at least one band".into()));
        }
        let shape = bands[0].1.shape();
        for (name, raster) in &bands {
            if raster.shape() != shape {
                return Err(Error::SizeMismatch {
                    er: shape.0,
                    ec: shape.1,
                    ar: raster.rows(),
                    ac: raster.cols(),
                });
            }
            if bands.iter().filter(|(n, _)| n == name).count() > 1 {
                return Err(Error::DuplicateBand(name.clone()));
            }
        }
        Ok(Self { bands, time_start })
    }

    /// A fully-masked image with the given band names and shape. This is the
    /// compositor fallback for years with no candidate imagery.
    pub fn fully_masked<S: AsRef<str>>(
        names: &[S],
        rows: usize,
        cols: usize,
        time_start: i64,
    ) -> Self {
        let bands = names
            .iter()
            .map(|n| (n.as_ref().to_string(), Raster::masked(rows, cols)))
            .collect();
        Self { bands, time_start }
    }

    /// A constant-valued image.
    pub fn constant<S: AsRef<str>>(
        names: &[S],
        value: f64,
        rows: usize,
        cols: usize,
        time_start: i64,
    ) -> Self {
        let bands = names
            .iter()
            .map(|n| {
                let mut r = Raster::filled(rows, cols, value);
                r.set_nodata(Some(f64::NAN));
                (n.as_ref().to_string(), r)
            })
            .collect();
        Self { bands, time_start }
    }

    // Accessors

    /// Temporal tag (epoch milliseconds).
    pub fn time_start(&self) -> i64 {
        self.time_start
    }

    /// Return a copy carrying a different temporal tag.
    pub fn with_time_start(mut self, time_start: i64) -> Self {
        self.time_start = time_start;
        self
    }

    /// Band names in stack order.
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of bands.
    pub fn n_bands(&self) -> usize {
        self.bands.len()
    }

    /// Grid shape (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.bands[0].1.shape()
    }

    /// Look up a band by name.
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
            .ok_or_else(|| Error::MissingBand(name.to_string()))
    }

    /// Band by stack position.
    pub fn band_at(&self, idx: usize) -> Result<&Raster<f64>> {
        self.bands
            .get(idx)
            .map(|(_, r)| r)
            .ok_or_else(|| Error::MissingBand(format!("#{idx}")))
    }

    /// Iterate `(name, raster)` pairs in stack order.
    pub fn iter_bands(&self) -> impl Iterator<Item = (&str, &Raster<f64>)> {
        self.bands.iter().map(|(n, r)| (n.as_str(), r))
    }

    // Transformations

    /// Select bands by name, renaming them in order. The temporal tag is
    /// preserved.
    pub fn select<S: AsRef<str>, D: AsRef<str>>(&self, from: &[S], to: &[D]) -> Result<Image> {
        if from.len() != to.len() {
            return Err(Error::Other(format!(
                "select: {} source bands but {} destination names",
                from.len(),
                to.len()
            )));
        }
        let mut bands = Vec::with_capacity(from.len());
        for (src, dst) in from.iter().zip(to) {
            let raster = self.band(src.as_ref())?.clone();
            bands.push((dst.as_ref().to_string(), raster));
        }
        Image::new(bands, self.time_start)
    }

    /// Append a band. The raster must match the image grid.
    pub fn add_band(&self, name: &str, raster: Raster<f64>) -> Result<Image> {
        if raster.shape() != self.shape() {
            return Err(Error::SizeMismatch {
                er: self.shape().0,
                ec: self.shape().1,
                ar: raster.rows(),
                ac: raster.cols(),
            });
        }
        let mut bands = self.bands.clone();
        bands.push((name.to_string(), raster));
        Image::new(bands, self.time_start)
    }

    /// Apply a function to every valid cell of every band.
    pub fn map_bands<F: Fn(f64) -> f64 + Copy>(&self, f: F) -> Image {
        let bands = self
            .bands
            .iter()
            .map(|(n, r)| (n.clone(), r.map(f)))
            .collect();
        Image {
            bands,
            time_start: self.time_start,
        }
    }

    /// Truncate every band into the signed 16-bit integer range.
    pub fn to_short(&self) -> Image {
        self.map_bands(to_short_value)
    }

    /// Mask every band: cells where `mask` is zero (or masked itself) become
    /// NaN.
    pub fn mask(&self, mask: &Raster<f64>) -> Result<Image> {
        if mask.shape() != self.shape() {
            return Err(Error::SizeMismatch {
                er: self.shape().0,
                ec: self.shape().1,
                ar: mask.rows(),
                ac: mask.cols(),
            });
        }
        let bands = self
            .bands
            .iter()
            .map(|(n, r)| {
                let mut out = r.clone();
                out.set_nodata(Some(f64::NAN));
                ndarray::Zip::from(out.data_mut())
                    .and(mask.data())
                    .for_each(|v, &m| {
                        if m.is_nan() || m == 0.0 {
                            *v = f64::NAN;
                        }
                    });
                (n.clone(), out)
            })
            .collect();
        Ok(Image {
            bands,
            time_start: self.time_start,
        })
    }

    /// Whether every cell of every band is masked.
    pub fn is_fully_masked(&self) -> bool {
        self.bands.iter().all(|(_, r)| r.is_fully_masked())
    }
}

/// One acquisition from a sensor collection: native spectral bands plus the
/// per-pixel quality bitmask.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Remote acquisition id, e.g. `LT05_046028_19870725`.
    pub id: String,
    /// Native spectral bands.
    pub image: Image,
    /// Quality bitmask band.
    pub qa: Raster<u16>,
}
