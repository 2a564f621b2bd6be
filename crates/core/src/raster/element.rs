//! Raster element trait for generic cell values

use num_traits::Zero;
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell. The pipeline carries
/// two grid types: `f64` reflectance/index bands (NaN-masked) and `u16` QA
/// bitmask words.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + Zero + Send + Sync + 'static
{
    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;
}

impl RasterElement for u16 {
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        match nodata {
            Some(nd) => *self == nd,
            None => false,
        }
    }
}

impl RasterElement for f64 {
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        if self.is_nan() {
            return true;
        }
        match nodata {
            Some(nd) => (self - nd).abs() < f64::EPSILON * 100.0,
            None => false,
        }
    }
}
