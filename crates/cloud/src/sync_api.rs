//! Blocking (synchronous) API.
//!
//! Wraps the async [`EngineClient`] with a Tokio runtime so the pipeline and
//! CLI don't need to manage their own async runtime. The blocking client is
//! also the production [`SceneSource`] implementation.

use trendr_core::geo::{DayWindow, RegionOfInterest};
use trendr_core::image::{Image, Scene};
use trendr_core::segmentation::{LandTrendrParams, SegmentationResult};
use trendr_core::sensor::{Sensor, QA_BAND};
use trendr_core::source::SceneSource;

use crate::engine::{EngineClient, EngineClientOptions};
use crate::error::{CloudError, Result};
use crate::models::{
    CollectionQuery, ExportJob, ExportRequest, SceneDto, SegmentationRequest,
    SegmentationResponse,
};

/// Blocking wrapper around [`EngineClient`].
///
/// Uses an internal single-threaded Tokio runtime.
pub struct EngineClientBlocking {
    rt: tokio::runtime::Runtime,
    inner: EngineClient,
}

impl EngineClientBlocking {
    /// Create a new blocking engine client.
    pub fn new(base_url: &str, options: EngineClientOptions) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;
        let inner = EngineClient::new(base_url, options)?;
        Ok(Self { rt, inner })
    }

    /// Fetch the acquisitions matching a collection query (blocking).
    pub fn query_collection(&self, query: &CollectionQuery) -> Result<Vec<SceneDto>> {
        self.rt.block_on(self.inner.query_collection(query))
    }

    /// Run temporal segmentation over a prepared request (blocking).
    pub fn segment(&self, request: &SegmentationRequest) -> Result<SegmentationResponse> {
        self.rt.block_on(self.inner.segment(request))
    }

    /// One-shot segmentation: assemble the request from an annual index
    /// series, upload it, and reshape the response. Failures surface as
    /// `Remote { stage: "segmentation" }`.
    pub fn segment_series(
        &self,
        series: &[Image],
        band: &str,
        params: LandTrendrParams,
    ) -> trendr_core::Result<SegmentationResult> {
        let run = || -> Result<SegmentationResult> {
            let request = SegmentationRequest::from_series(series, band, params)?;
            self.segment(&request)?.into_result()
        };
        run().map_err(|e| e.into_stage("segmentation"))
    }

    /// Submit an export (blocking, fire-and-forget). Failures surface as
    /// `Remote { stage: "export" }`.
    pub fn start_export(&self, request: &ExportRequest) -> trendr_core::Result<ExportJob> {
        self.rt
            .block_on(self.inner.start_export(request))
            .map_err(|e| e.into_stage("export"))
    }

    /// Poll the state of a submitted export (blocking).
    pub fn export_state(&self, job_id: &str) -> Result<ExportJob> {
        self.rt.block_on(self.inner.export_state(job_id))
    }
}

impl SceneSource for EngineClientBlocking {
    fn scenes(
        &self,
        sensor: Sensor,
        year: i32,
        window: &DayWindow,
        region: &RegionOfInterest,
    ) -> trendr_core::Result<Vec<Scene>> {
        let mut query = CollectionQuery::new(sensor.collection_id()).region(region);
        for range in window.datetime_ranges(year) {
            query = query.datetime(&range);
        }
        let mut bands: Vec<&str> = sensor.native_bands().to_vec();
        bands.push(QA_BAND);
        query = query.bands(&bands);

        let dtos = self
            .query_collection(&query)
            .map_err(|e| e.into_stage("collection"))?;
        dtos.into_iter()
            .map(|dto| dto.into_scene().map_err(|e| e.into_stage("collection")))
            .collect()
    }
}
