//! Async client for the remote engine.
//!
//! The engine does the heavy lifting the pipeline cannot do locally: it
//! materializes filtered sensor collections, runs temporal segmentation over
//! an uploaded series, and exports images to remote storage. Each call is one
//! POST/GET; transient failures are retried with exponential backoff, client
//! errors are not.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CloudError, Result};
use crate::models::{
    CollectionQuery, CollectionResponse, ExportJob, ExportRequest, SceneDto, SegmentationRequest,
    SegmentationResponse,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`EngineClient`].
pub struct EngineClientOptions {
    /// Per-request timeout (default 30 s). Segmentation calls move whole
    /// series and can run long.
    pub request_timeout: Duration,
    /// Maximum retries on transient failures (default 3).
    pub max_retries: u32,
    /// Bearer token attached to every request, if set.
    pub auth_token: Option<String>,
}

impl Default for EngineClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client for the engine's collection, segmentation and export
/// endpoints.
pub struct EngineClient {
    base_url: String,
    client: reqwest::Client,
    options: EngineClientOptions,
}

impl EngineClient {
    /// Create a new client for the given engine root URL.
    pub fn new(base_url: &str, options: EngineClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            options,
        })
    }

    /// The engine root URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Collection ──────────────────────────────────────────────────

    /// Fetch the acquisitions matching a collection query.
    pub async fn query_collection(&self, query: &CollectionQuery) -> Result<Vec<SceneDto>> {
        log::debug!(
            "collection query: {} bbox={:?} datetime={:?}",
            query.collection,
            query.bbox,
            query.datetime
        );
        let resp: CollectionResponse = self.post_json("collection", query).await?;
        log::debug!("collection query returned {} scenes", resp.scenes.len());
        Ok(resp.scenes)
    }

    // ── Segmentation ────────────────────────────────────────────────

    /// Run temporal segmentation over an uploaded index series.
    pub async fn segment(&self, request: &SegmentationRequest) -> Result<SegmentationResponse> {
        log::info!(
            "segmentation: {}x{} pixels, {} steps, maxSegments={}",
            request.rows,
            request.cols,
            request.series.len(),
            request.params.max_segments
        );
        self.post_json("segmentation", request).await
    }

    // ── Export ──────────────────────────────────────────────────────

    /// Submit an export. Fire-and-forget: the returned job handle can be
    /// polled with [`EngineClient::export_state`] but nothing waits on it.
    pub async fn start_export(&self, request: &ExportRequest) -> Result<ExportJob> {
        log::info!("export: {} (prefix {})", request.description, request.file_name_prefix);
        self.post_json("export", request).await
    }

    /// Poll the state of a submitted export.
    pub async fn export_state(&self, job_id: &str) -> Result<ExportJob> {
        self.get_json(&format!("export/{job_id}")).await
    }

    // ── Private helpers ─────────────────────────────────────────────

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut last_err = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1s, 2s, ...
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                tokio::time::sleep(delay).await;
                log::debug!("retrying {endpoint} (attempt {attempt})");
            }

            let mut req = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(body);
            if let Some(token) = &self.options.auth_token {
                req = req.bearer_auth(token);
            }

            match req.send().await {
                Ok(r) if r.status().is_success() => {
                    let text = r
                        .text()
                        .await
                        .map_err(|e| CloudError::Network(format!("reading response body: {e}")))?;
                    return serde_json::from_str(&text)
                        .map_err(|e| CloudError::Decode(format!("{endpoint}: {e}")));
                }
                Ok(r) => {
                    let status = r.status();
                    let message = r
                        .text()
                        .await
                        .unwrap_or_default()
                        .chars()
                        .take(500)
                        .collect::<String>();
                    last_err = Some(CloudError::Api {
                        endpoint: endpoint.to_string(),
                        status: status.as_u16(),
                        message,
                    });
                    // Don't retry client errors (4xx)
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => {
                    last_err = Some(CloudError::Network(format!("{endpoint} request failed: {e}")));
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| CloudError::Network(format!("{endpoint} request failed"))))
    }

    async fn get_json<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut req = self.client.get(&url);
        if let Some(token) = &self.options.auth_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().await.unwrap_or_default();
            return Err(CloudError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        let text = resp
            .text()
            .await
            .map_err(|e| CloudError::Network(format!("reading response body: {e}")))?;
        serde_json::from_str(&text).map_err(|e| CloudError::Decode(format!("{endpoint}: {e}")))
    }
}
