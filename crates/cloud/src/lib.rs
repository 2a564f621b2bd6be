//! # Trendr Cloud
//!
//! Client for the remote engine behind the trendr pipeline. The engine owns
//! the expensive computations: materializing filtered Landsat collections,
//! running temporal segmentation over uploaded series, and exporting images
//! to remote storage. This crate is plumbing only; all pixel math lives in
//! `trendr-algorithms`.

pub mod engine;
pub mod error;
pub mod models;
pub mod sync_api;

pub use engine::{EngineClient, EngineClientOptions};
pub use error::{CloudError, Result};
pub use models::{
    BandDto, CollectionQuery, CollectionResponse, ExportJob, ExportRequest, ExportState,
    SceneDto, SegmentationRequest, SegmentationResponse, SeriesStepDto,
};
pub use sync_api::EngineClientBlocking;
