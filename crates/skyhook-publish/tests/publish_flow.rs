//! End-to-end sequencing tests for the publish orchestrator, driven through
//! the in-memory hub and blob store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use skyhook_publish::{cancel_pair, ManifestOutcome, MetricsOutcome, PublishOptions, Publisher, RunOutcome};
use skyhook_hub::{MockBlobStore, MockHub};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

fn options(artifacts: &TempDir, metrics: Option<&TempDir>) -> PublishOptions {
    PublishOptions {
        artifact_dir: artifacts.path().to_path_buf(),
        metrics_dir: metrics.map(|m| m.path().to_path_buf()),
    }
}

#[tokio::test]
async fn test_full_run_uploads_everything_and_submits_one_manifest() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "weights.bin", &vec![42u8; 64 * 1024]);
    write_file(&artifacts, "config.json", b"{\"layers\": 12}");

    let metrics = TempDir::new().unwrap();
    write_file(&metrics, "epoch", b"0 0 0\n0 0 1\n0 0 0\n");
    write_file(&metrics, "loss", b"0 1.5 0\n0 1.2 1\n0 0.9 0\n");

    let publisher = Publisher::new(MockHub::new(), MockBlobStore::new());
    let report = publisher.publish(&options(&artifacts, Some(&metrics))).await;

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(report.metrics, MetricsOutcome::Submitted { labels: 2, series: 1 });
    assert_eq!(report.uploaded.len(), 2);
    assert!(report.failures.is_empty());

    let manifests = publisher.hub().submitted_manifests();
    assert_eq!(manifests.len(), 1, "manifest must be submitted exactly once");
    assert_eq!(manifests[0].len(), 2);
    assert_eq!(
        manifests[0].digest_for("weights.bin"),
        Some(STANDARD.encode(md5::compute(vec![42u8; 64 * 1024]).0).as_str())
    );
    assert_eq!(
        manifests[0].digest_for("config.json"),
        Some(STANDARD.encode(md5::compute(b"{\"layers\": 12}").0).as_str())
    );
}

#[tokio::test]
async fn test_denied_handshake_stops_the_walk_and_submits_partial_manifest() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "a.bin", b"aaa");
    write_file(&artifacts, "b.bin", b"bbb");
    write_file(&artifacts, "c.bin", b"ccc");

    let hub = MockHub::new().deny("b.bin", "quota exhausted");
    let publisher = Publisher::new(hub, MockBlobStore::new());
    let report = publisher.publish(&options(&artifacts, None)).await;

    assert_eq!(report.outcome(), RunOutcome::Partial);
    assert_eq!(report.denied.as_deref(), Some("quota exhausted"));
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.uploaded[0].file_name, "a.bin");

    let hub = publisher.hub();
    // No handshake for c.bin after the denial.
    assert_eq!(hub.slot_requests(), vec!["a.bin".to_string(), "b.bin".to_string()]);

    let manifests = hub.submitted_manifests();
    assert_eq!(manifests.len(), 1);
    assert!(manifests[0].digest_for("a.bin").is_some());
    assert!(manifests[0].digest_for("b.bin").is_none());
    assert!(manifests[0].digest_for("c.bin").is_none());
}

#[tokio::test]
async fn test_failed_transfer_excludes_only_that_file() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "a.bin", b"aaa");
    write_file(&artifacts, "b.bin", b"bbb");
    write_file(&artifacts, "c.bin", b"ccc");

    let blobs = MockBlobStore::new().fail("a.bin");
    let publisher = Publisher::new(MockHub::new(), blobs);
    let report = publisher.publish(&options(&artifacts, None)).await;

    assert_eq!(report.outcome(), RunOutcome::Partial);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "a.bin");

    let manifests = publisher.hub().submitted_manifests();
    assert!(manifests[0].digest_for("a.bin").is_none());
    assert!(manifests[0].digest_for("b.bin").is_some());
    assert!(manifests[0].digest_for("c.bin").is_some());
}

#[tokio::test]
async fn test_handshake_transport_failure_is_contained_per_file() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "a.bin", b"aaa");
    write_file(&artifacts, "b.bin", b"bbb");

    let hub = MockHub::new().fail_handshake_transport("a.bin");
    let publisher = Publisher::new(hub, MockBlobStore::new());
    let report = publisher.publish(&options(&artifacts, None)).await;

    assert_eq!(report.outcome(), RunOutcome::Partial);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "a.bin");
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.uploaded[0].file_name, "b.bin");
    assert!(report.denied.is_none(), "transport failure is not a denial");
}

#[tokio::test]
async fn test_missing_artifact_dir_submits_empty_manifest() {
    let artifacts = TempDir::new().unwrap();
    let missing = PublishOptions {
        artifact_dir: artifacts.path().join("absent"),
        metrics_dir: None,
    };

    let publisher = Publisher::new(MockHub::new(), MockBlobStore::new());
    let report = publisher.publish(&missing).await;

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(report.manifest, ManifestOutcome::Submitted { files: 0 });
    let manifests = publisher.hub().submitted_manifests();
    assert_eq!(manifests.len(), 1);
    assert!(manifests[0].is_empty());
}

#[tokio::test]
async fn test_missing_metrics_dir_does_not_block_artifacts() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "weights.bin", b"w");

    let metrics_parent = TempDir::new().unwrap();
    let opts = PublishOptions {
        artifact_dir: artifacts.path().to_path_buf(),
        metrics_dir: Some(metrics_parent.path().join("absent")),
    };

    let publisher = Publisher::new(MockHub::new(), MockBlobStore::new());
    let report = publisher.publish(&opts).await;

    assert_eq!(report.metrics, MetricsOutcome::SkippedMissingDir);
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.outcome(), RunOutcome::Success);
    assert!(publisher.hub().submitted_metrics().is_empty());
}

#[tokio::test]
async fn test_metrics_submission_failure_degrades_but_artifacts_proceed() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "weights.bin", b"w");
    let metrics = TempDir::new().unwrap();
    write_file(&metrics, "loss", b"0 1.0 0\n");

    let hub = MockHub::new().fail_metrics();
    let publisher = Publisher::new(hub, MockBlobStore::new());
    let report = publisher.publish(&options(&artifacts, Some(&metrics))).await;

    assert!(matches!(report.metrics, MetricsOutcome::Failed { .. }));
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.outcome(), RunOutcome::Partial);
}

#[tokio::test]
async fn test_manifest_failure_fails_the_run() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "weights.bin", b"w");

    let hub = MockHub::new().fail_manifest();
    let publisher = Publisher::new(hub, MockBlobStore::new());
    let report = publisher.publish(&options(&artifacts, None)).await;

    assert!(matches!(report.manifest, ManifestOutcome::Failed { .. }));
    assert_eq!(report.outcome(), RunOutcome::Failed);
    // The upload itself still happened and is reported.
    assert_eq!(report.uploaded.len(), 1);
}

#[tokio::test]
async fn test_pre_cancelled_run_skips_uploads_but_still_submits_manifest() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "weights.bin", b"w");

    let (canceller, token) = cancel_pair();
    canceller.cancel();

    let publisher =
        Publisher::new(MockHub::new(), MockBlobStore::new()).with_cancel_token(token);
    let report = publisher.publish(&options(&artifacts, None)).await;

    assert!(report.cancelled);
    assert!(report.uploaded.is_empty());
    assert_eq!(report.outcome(), RunOutcome::Partial);
    let hub = publisher.hub();
    assert!(hub.slot_requests().is_empty());
    assert_eq!(hub.submitted_manifests().len(), 1);
}

#[tokio::test]
async fn test_nested_artifacts_are_keyed_by_relative_path() {
    let artifacts = TempDir::new().unwrap();
    write_file(&artifacts, "checkpoints/step-100/weights.bin", b"deep");

    let publisher = Publisher::new(MockHub::new(), MockBlobStore::new());
    let report = publisher.publish(&options(&artifacts, None)).await;

    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.uploaded[0].file_name, "checkpoints/step-100/weights.bin");
}
