//! # Trendr Algorithms
//!
//! The locally-meaningful half of the LandTrendr pipeline: everything between
//! fetching raw acquisitions and handing a prepared time series to the remote
//! segmentation service, plus the reshaping of its output.
//!
//! ## Modules
//!
//! - **harmonize**: OLI → ETM+ reflectance alignment (Roy et al. 2016)
//! - **mask**: cloud/shadow/snow/water masking from the QA bitmask
//! - **resample**: bicubic and nearest-neighbour grid resampling
//! - **medoid**: per-pixel medoid compositing with empty-year fallback
//! - **series**: per-sensor loading, merging and annual series building
//! - **index**: spectral index transforms with explicit sign convention
//! - **vertex**: dense vertex-stack extraction from segmentation output
//! - **stack**: annual series flattening to year-named bands

pub mod harmonize;
pub mod index;
pub mod mask;
pub mod medoid;
pub mod resample;
pub mod series;
pub mod stack;
pub mod vertex;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::harmonize::harmonize_oli;
    pub use crate::index::{append_ftv, calc_index, invert_index, SpectralIndex};
    pub use crate::mask::{qa_mask, MaskFeature};
    pub use crate::medoid::{count_clear_pixels, medoid_composite, median_composite};
    pub use crate::resample::{resample_bicubic, resample_nearest};
    pub use crate::series::{
        build_annual_series, build_composite, build_index_series, clear_pixel_count_series,
        merged_collection, prepare_scene, Compositor, PipelineConfig,
    };
    pub use crate::stack::series_to_band_stack;
    pub use crate::vertex::vertex_stack;
    pub use trendr_core::prelude::*;
}
