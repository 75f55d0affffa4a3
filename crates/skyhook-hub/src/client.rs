//! HTTP implementation of the control API.
//!
//! Three endpoints, all token-authenticated with `Authorization: Token <t>`:
//! upload-slot handshake, metrics submission, manifest submission. Wire
//! quirks (denial markers, status codes) are mapped to typed outcomes here
//! and nowhere else.

use crate::api::{ControlApi, Manifest, SlotOutcome, UploadSlot};
use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use skyhook_metrics::MetricsDocument;
use tracing::{debug, warn};

const REQUEST_UPLOAD_PATH: &str = "api/artifacts/request-upload";
const SUBMIT_METRICS_PATH: &str = "api/metrics/submit";
const SUBMIT_MANIFEST_PATH: &str = "api/artifacts/manifest";

/// Marker some hub deployments embed in an otherwise-200 response body.
const PERMISSION_DENIED_MARKER: &str = "permission denied";

/// Client for the hub control API.
#[derive(Debug, Clone)]
pub struct HubClient {
    config: HubConfig,
    http_client: Client,
}

#[derive(Debug, Serialize)]
struct SlotRequest<'a> {
    file_name: &'a str,
    experiment_name: &'a str,
    model_name: &'a str,
    pipeline_tag: &'a str,
}

#[derive(Debug, Deserialize)]
struct SlotResponse {
    status: String,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct MetricsSubmission<'a> {
    experiment_name: &'a str,
    model_name: &'a str,
    pipeline_tag: &'a str,
    metrics: &'a MetricsDocument,
}

#[derive(Debug, Serialize)]
struct ManifestSubmission<'a> {
    experiment_name: &'a str,
    model_name: &'a str,
    pipeline_tag: &'a str,
    files: &'a Manifest,
}

#[derive(Debug, Deserialize)]
struct SubmissionAck {
    #[serde(default)]
    detail: Option<String>,
}

impl HubClient {
    /// Creates a client for the given hub configuration.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self { config, http_client: Client::new() }
    }

    /// Creates a client reusing an existing HTTP client.
    #[must_use]
    pub fn with_http_client(config: HubConfig, http_client: Client) -> Self {
        Self { config, http_client }
    }

    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.config.token)
    }

    /// Reads a response body, mapping non-success statuses to typed errors.
    async fn read_body(response: Response, operation: &str) -> HubResult<String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| String::new());
        if status.is_success() {
            return Ok(body);
        }
        warn!(%status, operation, "hub request failed");
        Err(error_for_status(status, body))
    }
}

#[async_trait]
impl ControlApi for HubClient {
    async fn request_upload_slot(&self, file_name: &str) -> HubResult<SlotOutcome> {
        debug!(file_name, "requesting upload slot");

        let response = self
            .http_client
            .post(self.config.endpoint(REQUEST_UPLOAD_PATH))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&SlotRequest {
                file_name,
                experiment_name: &self.config.experiment_name,
                model_name: &self.config.model_name,
                pipeline_tag: &self.config.pipeline_tag,
            })
            .send()
            .await?;

        // Authorization failures on the handshake are a modeled outcome, not
        // an error: the orchestrator ends the walk and still submits the
        // partial manifest.
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let reason = response.text().await.unwrap_or_default();
            let reason =
                if reason.trim().is_empty() { format!("hub returned {status}") } else { reason };
            return Ok(SlotOutcome::Denied { reason });
        }

        let body = Self::read_body(response, "request upload slot").await?;
        let slot: SlotResponse = serde_json::from_str(&body)
            .map_err(|e| HubError::InvalidResponse(format!("slot response: {e}")))?;

        match slot.status.as_str() {
            "granted" => match (slot.upload_url, slot.file_id) {
                (Some(upload_url), Some(file_id)) => Ok(SlotOutcome::Granted(UploadSlot {
                    file_name: file_name.to_string(),
                    upload_url,
                    file_id,
                })),
                _ => Err(HubError::InvalidResponse(
                    "granted slot missing upload_url or file_id".to_string(),
                )),
            },
            "denied" => Ok(SlotOutcome::Denied {
                reason: slot.reason.unwrap_or_else(|| "no reason given".to_string()),
            }),
            other => Err(HubError::InvalidResponse(format!("unknown slot status `{other}`"))),
        }
    }

    async fn submit_metrics(&self, document: &MetricsDocument) -> HubResult<()> {
        debug!(
            labels = document.label.len(),
            series = document.dataset.len(),
            "submitting metrics document"
        );

        let response = self
            .http_client
            .post(self.config.endpoint(SUBMIT_METRICS_PATH))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&MetricsSubmission {
                experiment_name: &self.config.experiment_name,
                model_name: &self.config.model_name,
                pipeline_tag: &self.config.pipeline_tag,
                metrics: document,
            })
            .send()
            .await?;

        let body = Self::read_body(response, "submit metrics").await?;
        ensure_not_denied(&body)
    }

    async fn submit_manifest(&self, manifest: &Manifest) -> HubResult<()> {
        debug!(files = manifest.len(), "submitting manifest");

        let response = self
            .http_client
            .post(self.config.endpoint(SUBMIT_MANIFEST_PATH))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&ManifestSubmission {
                experiment_name: &self.config.experiment_name,
                model_name: &self.config.model_name,
                pipeline_tag: &self.config.pipeline_tag,
                files: manifest,
            })
            .send()
            .await?;

        let body = Self::read_body(response, "submit manifest").await?;
        ensure_not_denied(&body)
    }
}

/// Maps a non-success status to the error taxonomy.
fn error_for_status(status: StatusCode, body: String) -> HubError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HubError::PermissionDenied,
        _ => HubError::UnexpectedStatus { status: status.as_u16(), body },
    }
}

/// Some deployments answer 200 but embed a denial in the ack body. Translate
/// that wire quirk into the typed error so callers never string-match.
fn ensure_not_denied(body: &str) -> HubResult<()> {
    if let Ok(ack) = serde_json::from_str::<SubmissionAck>(body) {
        if let Some(detail) = ack.detail {
            if detail.to_lowercase().contains(PERMISSION_DENIED_MARKER) {
                return Err(HubError::PermissionDenied);
            }
        }
    }
    Ok(())
}
