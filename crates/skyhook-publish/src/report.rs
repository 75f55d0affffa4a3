use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyhook_hub::FileDigest;
use uuid::Uuid;

/// Identifier for one publish run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublishRunId(pub String);

impl PublishRunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for PublishRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PublishRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How the metrics phase ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsOutcome {
    /// No metrics directory was configured for the run.
    Skipped,
    /// The configured metrics directory does not exist; artifacts proceed.
    SkippedMissingDir,
    Submitted { labels: usize, series: usize },
    Failed { reason: String },
}

/// How the terminal manifest submission ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ManifestOutcome {
    Submitted { files: usize },
    Failed { reason: String },
}

/// One contained per-file failure (handshake transport or transfer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file_name: String,
    pub reason: String,
}

/// Overall outcome of a publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Partial,
    Failed,
}

/// Complete record of one publish run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReport {
    pub run_id: PublishRunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub metrics: MetricsOutcome,
    /// Digests of every successfully transferred file, in walk order.
    pub uploaded: Vec<FileDigest>,
    /// Contained per-file failures, in walk order.
    pub failures: Vec<FileFailure>,
    /// Denial reason when the hub ended the artifact walk early.
    pub denied: Option<String>,
    /// True when cancellation ended the walk early.
    pub cancelled: bool,
    pub manifest: ManifestOutcome,
}

impl PublishReport {
    /// Collapses the run into a single outcome.
    ///
    /// A failed manifest submission fails the run: without it the hub cannot
    /// verify anything that was uploaded. Contained degradations (file
    /// failures, denial, cancellation, a failed or missing metrics phase)
    /// make the run partial.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        if matches!(self.manifest, ManifestOutcome::Failed { .. }) {
            return RunOutcome::Failed;
        }
        let degraded = !self.failures.is_empty()
            || self.denied.is_some()
            || self.cancelled
            || matches!(self.metrics, MetricsOutcome::Failed { .. });
        if degraded { RunOutcome::Partial } else { RunOutcome::Success }
    }
}
