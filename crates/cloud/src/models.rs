//! Wire types for the remote engine.
//!
//! Lightweight serde models for the three engine endpoints: collection
//! queries (`POST /collection`), temporal segmentation (`POST /segmentation`)
//! and asset export (`POST /export`). Band values travel as `Option<f64>`
//! with `null` marking masked pixels.

use serde::{Deserialize, Serialize};
use trendr_core::geo::RegionOfInterest;
use trendr_core::image::{Image, Scene};
use trendr_core::raster::Raster;
use trendr_core::segmentation::{LandTrendrParams, SegmentationResult};

use crate::error::{CloudError, Result};

// ---------------------------------------------------------------------------
// Collection query
// ---------------------------------------------------------------------------

/// Body for `POST /collection`: one sensor collection, filtered spatially
/// and temporally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionQuery {
    /// Remote collection identifier, e.g. `LANDSAT/LT05/C01/T1_SR`.
    pub collection: String,

    /// Bounding box `[west, south, east, north]`.
    pub bbox: Vec<f64>,

    /// Datetime ranges (`"YYYY-MM-DD/YYYY-MM-DD"`); a cross-year seasonal
    /// window contributes two.
    pub datetime: Vec<String>,

    /// Bands to materialize, in stack order.
    pub bands: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CollectionQuery {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            bbox: Vec::new(),
            datetime: Vec::new(),
            bands: Vec::new(),
            limit: None,
        }
    }

    /// Set the bounding box from a region polygon.
    pub fn region(mut self, region: &RegionOfInterest) -> Self {
        self.bbox = region.bbox().to_vec();
        self
    }

    /// Add a datetime range (`"YYYY-MM-DD/YYYY-MM-DD"`).
    pub fn datetime(mut self, range: &str) -> Self {
        self.datetime.push(range.to_string());
        self
    }

    /// Set the band list.
    pub fn bands(mut self, bands: &[&str]) -> Self {
        self.bands = bands.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Cap the number of returned scenes.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// One band of a returned scene; `null` values are masked pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandDto {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// One acquisition as returned by `POST /collection`, pixels in row-major
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDto {
    pub id: String,
    pub time_start: i64,
    pub rows: usize,
    pub cols: usize,
    pub bands: Vec<BandDto>,
    /// Quality bitmask words, row-major.
    pub qa: Vec<u16>,
}

impl SceneDto {
    /// Materialize into a pipeline scene. `null` band values become NaN.
    pub fn into_scene(self) -> Result<Scene> {
        let (rows, cols) = (self.rows, self.cols);
        let mut bands = Vec::with_capacity(self.bands.len());
        for band in self.bands {
            let values: Vec<f64> = band
                .values
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            let mut raster = Raster::from_vec(values, rows, cols).map_err(CloudError::Core)?;
            raster.set_nodata(Some(f64::NAN));
            bands.push((band.name, raster));
        }
        let image = Image::new(bands, self.time_start).map_err(CloudError::Core)?;
        let qa = Raster::from_vec(self.qa, rows, cols).map_err(CloudError::Core)?;
        Ok(Scene {
            id: self.id,
            image,
            qa,
        })
    }
}

/// Response of `POST /collection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResponse {
    pub scenes: Vec<SceneDto>,
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// One time step of the series attached to a segmentation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStepDto {
    /// Synthetic composite timestamp (epoch milliseconds); the service
    /// orders steps by this value.
    pub time_start: i64,
    /// Index values, row-major, `null` where masked.
    pub values: Vec<Option<f64>>,
}

/// Body for `POST /segmentation`: the scalar knobs plus the full per-pixel
/// time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationRequest {
    #[serde(flatten)]
    pub params: LandTrendrParams,
    pub rows: usize,
    pub cols: usize,
    pub series: Vec<SeriesStepDto>,
}

impl SegmentationRequest {
    /// Assemble a request from an annual single-band index series.
    ///
    /// Every image must carry exactly the named band on one common grid;
    /// masked cells travel as `null`.
    pub fn from_series(series: &[Image], band: &str, params: LandTrendrParams) -> Result<Self> {
        let first = series
            .first()
            .ok_or_else(|| CloudError::Decode("empty index series".into()))?;
        let (rows, cols) = first.shape();

        let mut steps = Vec::with_capacity(series.len());
        for img in series {
            if img.shape() != (rows, cols) {
                return Err(CloudError::Core(trendr_core::Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: img.shape().0,
                    ac: img.shape().1,
                }));
            }
            let raster = img.band(band).map_err(CloudError::Core)?;
            let values = raster
                .data()
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect();
            steps.push(SeriesStepDto {
                time_start: img.time_start(),
                values,
            });
        }

        Ok(Self {
            params,
            rows,
            cols,
            series: steps,
        })
    }
}

/// Response of `POST /segmentation`: a flat pixel-major value buffer, each
/// pixel holding a `4 x steps` array in row-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationResponse {
    pub rows: usize,
    pub cols: usize,
    pub steps: usize,
    pub values: Vec<f64>,
}

impl SegmentationResponse {
    /// Reshape into the per-pixel result arrays.
    pub fn into_result(self) -> Result<SegmentationResult> {
        SegmentationResult::from_flat(self.rows, self.cols, self.steps, self.values)
            .map_err(CloudError::Core)
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Body for `POST /export`: fire-and-forget materialization of an image to
/// remote storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    pub file_name_prefix: String,

    /// Region polygon ring as `[lon, lat]` pairs.
    pub region: Vec<[f64; 2]>,

    /// Output pixel scale in meters.
    pub scale: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl ExportRequest {
    pub fn new(description: &str, prefix: &str, region: &RegionOfInterest, scale: f64) -> Self {
        Self {
            description: description.to_string(),
            folder: None,
            file_name_prefix: prefix.to_string(),
            region: region.ring().iter().map(|&(lon, lat)| [lon, lat]).collect(),
            scale,
            crs: None,
        }
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    pub fn crs(mut self, crs: &str) -> Self {
        self.crs = Some(crs.to_string());
        self
    }
}

/// Lifecycle of a submitted export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportState {
    Submitted,
    Running,
    Completed,
    Failed,
}

/// Handle of a submitted export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: String,
    pub state: ExportState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_query_serializes_expected_fields() {
        let region = RegionOfInterest::new(vec![(-124.0, 47.4), (-123.9, 47.4), (-123.9, 47.6)])
            .unwrap();
        let query = CollectionQuery::new("LANDSAT/LT05/C01/T1_SR")
            .region(&region)
            .datetime("1987-06-01/1987-09-30")
            .bands(&["B1", "B2", "pixel_qa"]);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["collection"], "LANDSAT/LT05/C01/T1_SR");
        assert_eq!(json["bbox"][0], -124.0);
        assert_eq!(json["datetime"][0], "1987-06-01/1987-09-30");
        assert_eq!(json["bands"][2], "pixel_qa");
        // Unset limit is omitted entirely
        assert!(json.get("limit").is_none());
    }

    #[test]
    fn scene_dto_nulls_become_nan() {
        let dto = SceneDto {
            id: "LT05_046028_19870725".into(),
            time_start: 554_000_000_000,
            rows: 1,
            cols: 2,
            bands: vec![BandDto {
                name: "B1".into(),
                values: vec![Some(1000.0), None],
            }],
            qa: vec![0, 32],
        };

        let scene = dto.into_scene().unwrap();
        assert_eq!(scene.id, "LT05_046028_19870725");
        assert_eq!(scene.image.band("B1").unwrap().get(0, 0).unwrap(), 1000.0);
        assert!(scene.image.band("B1").unwrap().get(0, 1).unwrap().is_nan());
        assert_eq!(scene.qa.get(0, 1).unwrap(), 32);
    }

    #[test]
    fn segmentation_request_flattens_params_camel_case() {
        let img = Image::constant(&["NBR"], -600.0, 1, 1, 42);
        let req =
            SegmentationRequest::from_series(&[img], "NBR", LandTrendrParams::default()).unwrap();

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["maxSegments"], 6);
        assert_eq!(json["preventOneYearRecovery"], true);
        assert_eq!(json["bestModelProportion"], 0.75);
        assert_eq!(json["rows"], 1);
        assert_eq!(json["series"][0]["timeStart"], 42);
        assert_eq!(json["series"][0]["values"][0], -600.0);
    }

    #[test]
    fn segmentation_request_masks_travel_as_null() {
        let img = Image::fully_masked(&["NBR"], 1, 1, 0);
        let req =
            SegmentationRequest::from_series(&[img], "NBR", LandTrendrParams::default()).unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert!(json["series"][0]["values"][0].is_null());
    }

    #[test]
    fn segmentation_response_reshapes() {
        let resp = SegmentationResponse {
            rows: 1,
            cols: 1,
            steps: 2,
            values: vec![1985.0, 1986.0, 10.0, 20.0, 11.0, 19.0, 1.0, 1.0],
        };
        let result = resp.into_result().unwrap();
        assert_eq!(result.steps(), 2);
        assert_eq!(result.pixel(0, 0).unwrap()[[0, 1]], 1986.0);
    }

    #[test]
    fn export_state_parses_screaming_case() {
        let job: ExportJob =
            serde_json::from_str(r#"{"id":"job-7","state":"RUNNING"}"#).unwrap();
        assert_eq!(job.state, ExportState::Running);
    }
}
