//! Skyhook Publish
//!
//! Top-level sequencing for a publish run:
//! - Aggregate and submit the metrics document (optional phase)
//! - Walk the artifact directory: handshake, transfer, record the digest
//! - Submit the content-hash manifest exactly once at the end
//!
//! File-level failures are contained in the run report; only an
//! application-level denial (or cancellation) ends the artifact walk early,
//! and even then the partial manifest still goes out.

pub mod cancel;
pub mod orchestrator;
pub mod report;

pub use cancel::{cancel_pair, CancelToken, Canceller};
pub use orchestrator::{ArtifactFile, PublishOptions, Publisher};
pub use report::{
    FileFailure, ManifestOutcome, MetricsOutcome, PublishReport, PublishRunId, RunOutcome,
};
