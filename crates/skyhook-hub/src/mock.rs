//! In-memory hub and blob store for tests and offline development.
//!
//! `MockHub` grants every slot by default; individual files can be scripted
//! to be denied or to fail at the transport level. Every call is recorded so
//! sequencing tests can assert on exactly what the orchestrator did.

use crate::api::{ControlApi, FileDigest, Manifest, SlotOutcome, UploadSlot};
use crate::error::{HubError, HubResult};
use crate::transfer::BlobStore;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use skyhook_metrics::MetricsDocument;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

/// Scripted control API.
#[derive(Debug, Default)]
pub struct MockHub {
    denied: HashMap<String, String>,
    transport_failures: HashSet<String>,
    fail_metrics: bool,
    fail_manifest: bool,
    slot_requests: Mutex<Vec<String>>,
    metrics_submissions: Mutex<Vec<MetricsDocument>>,
    manifest_submissions: Mutex<Vec<Manifest>>,
}

impl MockHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a denial for one file name.
    #[must_use]
    pub fn deny(mut self, file_name: &str, reason: &str) -> Self {
        self.denied.insert(file_name.to_string(), reason.to_string());
        self
    }

    /// Scripts a transport failure for one file's handshake.
    #[must_use]
    pub fn fail_handshake_transport(mut self, file_name: &str) -> Self {
        self.transport_failures.insert(file_name.to_string());
        self
    }

    /// Scripts a transport failure for the metrics submission.
    #[must_use]
    pub fn fail_metrics(mut self) -> Self {
        self.fail_metrics = true;
        self
    }

    /// Scripts a transport failure for the manifest submission.
    #[must_use]
    pub fn fail_manifest(mut self) -> Self {
        self.fail_manifest = true;
        self
    }

    /// File names handshakes were requested for, in order.
    #[must_use]
    pub fn slot_requests(&self) -> Vec<String> {
        self.slot_requests.lock().unwrap().clone()
    }

    #[must_use]
    pub fn submitted_metrics(&self) -> Vec<MetricsDocument> {
        self.metrics_submissions.lock().unwrap().clone()
    }

    #[must_use]
    pub fn submitted_manifests(&self) -> Vec<Manifest> {
        self.manifest_submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlApi for MockHub {
    async fn request_upload_slot(&self, file_name: &str) -> HubResult<SlotOutcome> {
        self.slot_requests.lock().unwrap().push(file_name.to_string());

        if self.transport_failures.contains(file_name) {
            return Err(HubError::Transport(format!("simulated outage for {file_name}")));
        }
        if let Some(reason) = self.denied.get(file_name) {
            return Ok(SlotOutcome::Denied { reason: reason.clone() });
        }
        Ok(SlotOutcome::Granted(UploadSlot {
            file_name: file_name.to_string(),
            upload_url: format!("mock://blobs/{file_name}"),
            file_id: format!("mock-{file_name}"),
        }))
    }

    async fn submit_metrics(&self, document: &MetricsDocument) -> HubResult<()> {
        if self.fail_metrics {
            return Err(HubError::Transport("simulated metrics outage".to_string()));
        }
        self.metrics_submissions.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn submit_manifest(&self, manifest: &Manifest) -> HubResult<()> {
        if self.fail_manifest {
            return Err(HubError::Transport("simulated manifest outage".to_string()));
        }
        self.manifest_submissions.lock().unwrap().push(manifest.clone());
        Ok(())
    }
}

/// Blob store that "transfers" by reading the file locally, producing the
/// same digest the real transfer would.
#[derive(Debug, Default)]
pub struct MockBlobStore {
    failures: HashSet<String>,
}

impl MockBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a transfer failure for one file name.
    #[must_use]
    pub fn fail(mut self, file_name: &str) -> Self {
        self.failures.insert(file_name.to_string());
        self
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn transfer(&self, slot: &UploadSlot, path: &Path) -> HubResult<FileDigest> {
        if self.failures.contains(&slot.file_name) {
            return Err(HubError::Transport(format!(
                "simulated transfer failure for {}",
                slot.file_name
            )));
        }
        let bytes = tokio::fs::read(path).await.map_err(|e| HubError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(FileDigest {
            file_name: slot.file_name.clone(),
            md5_base64: STANDARD.encode(md5::compute(&bytes).0),
        })
    }
}
