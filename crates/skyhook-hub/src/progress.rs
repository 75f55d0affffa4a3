use serde::{Deserialize, Serialize};

/// Upload progress notifications, one stream per transferred file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { file_name: String, total_bytes: u64 },
    Advanced { file_name: String, sent_bytes: u64, total_bytes: u64 },
    Finished { file_name: String },
    Failed { file_name: String, reason: String },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Discards all events.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Prints one line per event to stderr, keeping stdout clean for reports.
#[derive(Debug, Default)]
pub struct StderrProgressSink;

impl ProgressSink for StderrProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { file_name, total_bytes } => {
                eprintln!("[upload:{file_name}] started ({total_bytes} bytes)");
            }
            ProgressEvent::Advanced { file_name, sent_bytes, total_bytes } => {
                eprintln!("[upload:{file_name}] {sent_bytes}/{total_bytes} bytes");
            }
            ProgressEvent::Finished { file_name } => eprintln!("[upload:{file_name}] finished"),
            ProgressEvent::Failed { file_name, reason } => {
                eprintln!("[upload:{file_name}] failed: {reason}");
            }
        }
    }
}
