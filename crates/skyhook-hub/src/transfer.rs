//! Streaming blob transfer.
//!
//! Artifacts are model checkpoints that can run to gigabytes, so a transfer
//! never holds a whole file: one scoped handle is read in bounded chunks,
//! and that single pass feeds both the request body and the MD5 digest. The
//! digest recorded in the manifest is therefore the digest of exactly the
//! bytes sent, not of a re-read file.

use crate::api::{FileDigest, UploadSlot};
use crate::error::{HubError, HubResult};
use crate::progress::{NullProgressSink, ProgressEvent, ProgressSink};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use futures::Stream;
use reqwest::{Body, Client};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// 512 KiB read chunks: bounded memory even for multi-gigabyte checkpoints.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Destination-agnostic artifact byte sink.
///
/// `BlobTransfer` is the HTTP implementation; tests drive the orchestrator
/// with `MockBlobStore` instead.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Streams the file at `path` to the slot's destination and returns the
    /// digest of exactly the bytes sent.
    async fn transfer(&self, slot: &UploadSlot, path: &Path) -> HubResult<FileDigest>;
}

/// Streams artifact bytes to a pre-authorized blob destination.
pub struct BlobTransfer {
    http_client: Client,
    chunk_size: usize,
    progress: Arc<dyn ProgressSink>,
}

impl std::fmt::Debug for BlobTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobTransfer").field("chunk_size", &self.chunk_size).finish_non_exhaustive()
    }
}

impl BlobTransfer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: Arc::new(NullProgressSink),
        }
    }

    /// Attaches a progress sink receiving per-chunk events.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Overrides the read chunk size. Values below 4 KiB are clamped up.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(4 * 1024);
        self
    }
}

impl Default for BlobTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for BlobTransfer {
    async fn transfer(&self, slot: &UploadSlot, path: &Path) -> HubResult<FileDigest> {
        let total_bytes =
            tokio::fs::metadata(path).await.map_err(|e| file_read_error(path, &e))?.len();
        let file = tokio::fs::File::open(path).await.map_err(|e| file_read_error(path, &e))?;

        debug!(file_name = %slot.file_name, total_bytes, "starting blob transfer");
        self.progress.on_event(ProgressEvent::Started {
            file_name: slot.file_name.clone(),
            total_bytes,
        });

        let digest = Arc::new(Mutex::new(md5::Context::new()));
        let stream = digest_stream(
            file,
            self.chunk_size,
            Arc::clone(&digest),
            Arc::clone(&self.progress),
            slot.file_name.clone(),
            total_bytes,
        );

        let send = async {
            let response =
                self.http_client.put(&slot.upload_url).body(Body::wrap_stream(stream)).send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(HubError::UnexpectedStatus { status: status.as_u16(), body })
            }
        };

        if let Err(err) = send.await {
            self.progress.on_event(ProgressEvent::Failed {
                file_name: slot.file_name.clone(),
                reason: err.to_string(),
            });
            return Err(err);
        }

        self.progress.on_event(ProgressEvent::Finished { file_name: slot.file_name.clone() });
        let context = digest.lock().unwrap().clone();
        Ok(FileDigest {
            file_name: slot.file_name.clone(),
            md5_base64: STANDARD.encode(context.compute().0),
        })
    }
}

fn file_read_error(path: &Path, err: &std::io::Error) -> HubError {
    HubError::FileRead { path: path.display().to_string(), reason: err.to_string() }
}

/// Turns a file handle into a chunk stream that updates the digest and the
/// progress sink as each chunk is handed to the HTTP body.
fn digest_stream(
    file: tokio::fs::File,
    chunk_size: usize,
    digest: Arc<Mutex<md5::Context>>,
    progress: Arc<dyn ProgressSink>,
    file_name: String,
    total_bytes: u64,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    futures::stream::try_unfold((file, 0u64), move |(mut file, sent_bytes)| {
        let digest = Arc::clone(&digest);
        let progress = Arc::clone(&progress);
        let file_name = file_name.clone();
        async move {
            let mut buf = vec![0u8; chunk_size];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok(None);
            }
            buf.truncate(read);
            digest.lock().unwrap().consume(&buf);

            let sent_bytes = sent_bytes + read as u64;
            progress.on_event(ProgressEvent::Advanced {
                file_name,
                sent_bytes,
                total_bytes,
            });
            Ok(Some((Bytes::from(buf), (file, sent_bytes))))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink(StdMutex<Vec<ProgressEvent>>);

    impl ProgressSink for RecordingSink {
        fn on_event(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    async fn collect_digest(contents: &[u8], chunk_size: usize) -> (String, Vec<ProgressEvent>) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob");
        std::fs::write(&path, contents).unwrap();

        let digest = Arc::new(Mutex::new(md5::Context::new()));
        let sink = Arc::new(RecordingSink::default());
        let file = tokio::fs::File::open(&path).await.unwrap();
        let stream = digest_stream(
            file,
            chunk_size,
            Arc::clone(&digest),
            sink.clone() as Arc<dyn ProgressSink>,
            "blob".to_string(),
            contents.len() as u64,
        );

        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        let streamed: Vec<u8> = chunks.concat();
        assert_eq!(streamed, contents);

        let context = digest.lock().unwrap().clone();
        let encoded = STANDARD.encode(context.compute().0);
        let events = sink.0.lock().unwrap().clone();
        (encoded, events)
    }

    #[tokio::test]
    async fn test_digest_matches_streamed_bytes() {
        let contents: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (encoded, _) = collect_digest(&contents, 8 * 1024).await;
        assert_eq!(encoded, STANDARD.encode(md5::compute(&contents).0));
    }

    #[tokio::test]
    async fn test_chunking_does_not_change_the_digest() {
        let contents = b"the exact bytes presented to the transfer".repeat(1000);
        let (small, _) = collect_digest(&contents, 4 * 1024).await;
        let (large, _) = collect_digest(&contents, 1024 * 1024).await;
        assert_eq!(small, large);
    }

    #[tokio::test]
    async fn test_progress_reaches_the_full_byte_count() {
        let contents = vec![7u8; 10_000];
        let (_, events) = collect_digest(&contents, 4 * 1024).await;
        let last_sent = events
            .iter()
            .rev()
            .find_map(|e| match e {
                ProgressEvent::Advanced { sent_bytes, .. } => Some(*sent_bytes),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_sent, contents.len() as u64);
    }

    #[tokio::test]
    async fn test_empty_file_digest_is_md5_of_nothing() {
        let (encoded, events) = collect_digest(&[], 4 * 1024).await;
        assert_eq!(encoded, STANDARD.encode(md5::compute(b"").0));
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let slot = UploadSlot {
            file_name: "gone.bin".to_string(),
            upload_url: "https://blobs.example.com/gone".to_string(),
            file_id: "f-1".to_string(),
        };
        let err = BlobTransfer::new().transfer(&slot, &temp.path().join("gone.bin")).await;
        assert!(matches!(err, Err(HubError::FileRead { .. })));
    }
}
