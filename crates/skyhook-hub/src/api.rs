//! Control-API seam.
//!
//! The orchestrator drives a `ControlApi` implementation and never sees HTTP
//! details; `HubClient` is the production implementation, `MockHub` the test
//! one.

use crate::error::HubResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skyhook_metrics::MetricsDocument;
use std::collections::BTreeMap;

/// Authorization for exactly one file upload, as granted by the hub.
///
/// Short-lived: consumed by the blob transfer immediately after the
/// handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    /// The file name the slot was granted for.
    pub file_name: String,
    /// Pre-authorized blob destination. Opaque; accepts raw bytes with no
    /// further authentication.
    pub upload_url: String,
    /// Hub-side identifier for the file.
    pub file_id: String,
}

/// Outcome of an upload handshake.
///
/// Denial is an application-level decision by the hub and is deliberately a
/// value, not an error: transport failures are the error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Granted(UploadSlot),
    Denied { reason: String },
}

/// Content digest of one transferred file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub file_name: String,
    /// MD5 of the transferred bytes, standard base64.
    pub md5_base64: String,
}

/// The final file-name -> content-digest mapping, submitted once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the digest of a successfully transferred file.
    pub fn record(&mut self, digest: FileDigest) {
        self.0.insert(digest.file_name, digest.md5_base64);
    }

    #[must_use]
    pub fn digest_for(&self, file_name: &str) -> Option<&str> {
        self.0.get(file_name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The token-authenticated control API, reduced to the three calls a publish
/// run makes.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Asks the hub to authorize an upload for one file name.
    async fn request_upload_slot(&self, file_name: &str) -> HubResult<SlotOutcome>;

    /// Submits the aggregated metrics document.
    async fn submit_metrics(&self, document: &MetricsDocument) -> HubResult<()>;

    /// Submits the final manifest. Fire-and-forget on the hub side.
    async fn submit_manifest(&self, manifest: &Manifest) -> HubResult<()>;
}
