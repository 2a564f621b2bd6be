//! # Trendr Core
//!
//! Core types for the trendr LandTrendr pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: Generic nodata-aware raster grid
//! - `Image`: Ordered named-band image with a temporal tag
//! - `RegionOfInterest`, `YearRange`, `DayWindow`: query geometry
//! - `Sensor`: the closed set of Landsat surface-reflectance sources
//! - `SegmentationResult`, `LandTrendrParams`: the remote segmentation contract
//! - `SceneSource`: the seam between the local pipeline and the remote engine

pub mod error;
pub mod geo;
pub mod image;
pub mod raster;
pub mod segmentation;
pub mod sensor;
pub mod source;

pub use error::{Error, Result};
pub use geo::{august_first_ms, DayWindow, RegionOfInterest, YearRange};
pub use image::{Image, Scene};
pub use raster::{Raster, RasterElement};
pub use segmentation::{LandTrendrParams, SegmentationResult};
pub use sensor::{Sensor, SR_BANDS};
pub use source::SceneSource;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geo::{DayWindow, RegionOfInterest, YearRange};
    pub use crate::image::{Image, Scene};
    pub use crate::raster::{Raster, RasterElement};
    pub use crate::segmentation::{LandTrendrParams, SegmentationResult};
    pub use crate::sensor::{Sensor, SR_BANDS};
    pub use crate::source::SceneSource;
}
