//! Quality-bitmask masking.
//!
//! Landsat C01 surface reflectance carries a `pixel_qa` band; a pixel is
//! retained only when every selected feature bit is unset.

use trendr_core::raster::Raster;

/// A maskable feature and its `pixel_qa` bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskFeature {
    /// Bit 2
    Water,
    /// Cloud shadow, bit 3
    Shadow,
    /// Bit 4
    Snow,
    /// Bit 5
    Cloud,
}

impl MaskFeature {
    /// The default mask set: cloud, cloud shadow and snow.
    pub const DEFAULT: [MaskFeature; 3] = [MaskFeature::Cloud, MaskFeature::Shadow, MaskFeature::Snow];

    /// The QA word with only this feature's bit set.
    pub fn bit(&self) -> u16 {
        match self {
            MaskFeature::Water => 1 << 2,
            MaskFeature::Shadow => 1 << 3,
            MaskFeature::Snow => 1 << 4,
            MaskFeature::Cloud => 1 << 5,
        }
    }
}

/// Build a 0/1 mask from a QA band: 1 where every selected feature bit is
/// unset, 0 otherwise. An empty feature list retains everything.
pub fn qa_mask(qa: &Raster<u16>, features: &[MaskFeature]) -> Raster<f64> {
    let (rows, cols) = qa.shape();
    let mut out = Raster::filled(rows, cols, 1.0);
    out.set_nodata(Some(f64::NAN));

    if features.is_empty() {
        return out;
    }

    let bits: u16 = features.iter().map(|f| f.bit()).fold(0, |acc, b| acc | b);
    ndarray::Zip::from(out.data_mut())
        .and(qa.data())
        .for_each(|m, &q| {
            if q & bits != 0 {
                *m = 0.0;
            }
        });

    out
}
