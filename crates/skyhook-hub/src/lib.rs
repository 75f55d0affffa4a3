//! Skyhook Hub
//!
//! Wire layer for the publishing pipeline:
//! - The `ControlApi` seam and the token-authenticated `HubClient`
//! - The `BlobStore` seam and the streaming `BlobTransfer`
//! - Upload progress reporting
//!
//! Business logic never inspects response bodies: denial, transport failure,
//! and protocol surprises all surface as typed outcomes from this crate.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod progress;
pub mod transfer;

pub use api::{ControlApi, FileDigest, Manifest, SlotOutcome, UploadSlot};
pub use client::HubClient;
pub use config::{ConfigError, HubConfig};
pub use error::{HubError, HubResult};
pub use mock::{MockBlobStore, MockHub};
pub use progress::{NullProgressSink, ProgressEvent, ProgressSink, StderrProgressSink};
pub use transfer::{BlobStore, BlobTransfer, DEFAULT_CHUNK_SIZE};
