//! Publish run orchestration.
//!
//! One run moves through fixed phases:
//! metrics -> per-file (handshake -> transfer -> record) -> manifest.
//! A denied handshake ends the artifact walk; a failed transfer or a failed
//! handshake excludes that file only. The manifest submission is terminal
//! and happens exactly once, whatever the walk did.

use crate::cancel::CancelToken;
use crate::report::{
    FileFailure, ManifestOutcome, MetricsOutcome, PublishReport, PublishRunId,
};
use chrono::Utc;
use skyhook_hub::{BlobStore, ControlApi, Manifest, SlotOutcome};
use skyhook_metrics::{aggregate_metrics_dir, MetricsError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One artifact file discovered under the artifact root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    /// Walk-root-relative name with `/` separators; the manifest key.
    pub file_name: String,
    pub size_bytes: u64,
}

/// Inputs for one publish run.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Directory of artifact files, walked recursively.
    pub artifact_dir: PathBuf,
    /// Directory of metric logs; `None` skips the metrics phase entirely.
    pub metrics_dir: Option<PathBuf>,
}

/// Drives a complete publish run against a control API and a blob store.
#[derive(Debug)]
pub struct Publisher<C, B> {
    hub: C,
    blobs: B,
    cancel: CancelToken,
}

impl<C: ControlApi, B: BlobStore> Publisher<C, B> {
    pub fn new(hub: C, blobs: B) -> Self {
        Self { hub, blobs, cancel: CancelToken::never() }
    }

    /// Attaches a cancellation token checked between files and raced against
    /// the in-flight transfer.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The control API driving this publisher.
    pub fn hub(&self) -> &C {
        &self.hub
    }

    /// Runs the full pipeline and reports how it went.
    ///
    /// Never panics and never aborts early on contained failures: the report
    /// carries every outcome, and `PublishReport::outcome()` collapses it
    /// for callers that only need success/partial/failure.
    pub async fn publish(&self, options: &PublishOptions) -> PublishReport {
        let run_id = PublishRunId::new();
        let started_at = Utc::now();
        info!(run = %run_id, artifact_dir = %options.artifact_dir.display(), "starting publish run");

        let metrics = self.run_metrics_phase(options.metrics_dir.as_deref()).await;

        let mut manifest = Manifest::new();
        let mut uploaded = Vec::new();
        let mut failures = Vec::new();
        let mut denied = None;
        let mut cancelled = false;

        for artifact in enumerate_artifacts(&options.artifact_dir) {
            if self.cancel.is_cancelled() {
                warn!(run = %run_id, "publish cancelled; skipping remaining artifacts");
                cancelled = true;
                break;
            }

            debug!(file = %artifact.file_name, size = artifact.size_bytes, "negotiating upload");
            let slot = match self.hub.request_upload_slot(&artifact.file_name).await {
                Ok(SlotOutcome::Granted(slot)) => slot,
                Ok(SlotOutcome::Denied { reason }) => {
                    warn!(file = %artifact.file_name, %reason, "upload denied; ending artifact walk");
                    denied = Some(reason);
                    break;
                }
                Err(err) => {
                    warn!(file = %artifact.file_name, error = %err, "handshake failed; continuing");
                    failures.push(FileFailure {
                        file_name: artifact.file_name,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let mut cancel = self.cancel.clone();
            let transferred = tokio::select! {
                result = self.blobs.transfer(&slot, &artifact.path) => result,
                () = cancel.cancelled() => {
                    warn!(file = %artifact.file_name, "transfer aborted by cancellation");
                    cancelled = true;
                    break;
                }
            };

            match transferred {
                Ok(digest) => {
                    debug!(file = %digest.file_name, md5 = %digest.md5_base64, "transfer complete");
                    manifest.record(digest.clone());
                    uploaded.push(digest);
                }
                Err(err) => {
                    warn!(file = %artifact.file_name, error = %err, "transfer failed; file excluded from manifest");
                    failures.push(FileFailure {
                        file_name: artifact.file_name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        // Terminal step: the partial manifest goes out even after a denial
        // or cancellation, so the hub can verify what did land.
        let manifest_outcome = match self.hub.submit_manifest(&manifest).await {
            Ok(()) => ManifestOutcome::Submitted { files: manifest.len() },
            Err(err) => {
                warn!(error = %err, "manifest submission failed");
                ManifestOutcome::Failed { reason: err.to_string() }
            }
        };

        let report = PublishReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            metrics,
            uploaded,
            failures,
            denied,
            cancelled,
            manifest: manifest_outcome,
        };
        info!(run = %report.run_id, outcome = ?report.outcome(), "publish run finished");
        report
    }

    /// Metrics are optional for a run: a missing directory or a submission
    /// failure degrades the report but never blocks the artifact phase.
    async fn run_metrics_phase(&self, metrics_dir: Option<&Path>) -> MetricsOutcome {
        let Some(dir) = metrics_dir else {
            return MetricsOutcome::Skipped;
        };

        let document = match aggregate_metrics_dir(dir) {
            Ok(document) => document,
            Err(MetricsError::NotFound(path)) => {
                warn!(path = %path.display(), "metrics directory missing; proceeding without metrics");
                return MetricsOutcome::SkippedMissingDir;
            }
            Err(err) => {
                warn!(error = %err, "metrics aggregation failed; proceeding without metrics");
                return MetricsOutcome::Failed { reason: err.to_string() };
            }
        };

        match self.hub.submit_metrics(&document).await {
            Ok(()) => MetricsOutcome::Submitted {
                labels: document.label.len(),
                series: document.dataset.len(),
            },
            Err(err) => {
                warn!(error = %err, "metrics submission failed; proceeding with artifacts");
                MetricsOutcome::Failed { reason: err.to_string() }
            }
        }
    }
}

/// Enumerates regular files under the artifact root, sorted for a stable
/// walk order. A missing root means there is nothing to upload - the run
/// still submits its (empty) manifest.
fn enumerate_artifacts(root: &Path) -> Vec<ArtifactFile> {
    if !root.is_dir() {
        warn!(path = %root.display(), "artifact directory missing; nothing to upload");
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "skipping unreadable artifact entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or_else(|_| entry.path());
        let file_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        files.push(ArtifactFile { path: entry.path().to_path_buf(), file_name, size_bytes });
    }
    files
}
