//! Terminal progress bars for artifact uploads.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use skyhook_hub::{ProgressEvent, ProgressSink};
use std::collections::HashMap;
use std::sync::Mutex;

/// `ProgressSink` backed by indicatif byte bars, one bar per in-flight file.
pub struct BarProgressSink {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl BarProgressSink {
    pub fn new() -> Self {
        Self { multi: MultiProgress::new(), bars: Mutex::new(HashMap::new()) }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:30!} {bar:32} {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for BarProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        let mut bars = self.bars.lock().unwrap();
        match event {
            ProgressEvent::Started { file_name, total_bytes } => {
                let bar = self.multi.add(ProgressBar::new(total_bytes));
                bar.set_style(Self::style());
                bar.set_message(file_name.clone());
                bars.insert(file_name, bar);
            }
            ProgressEvent::Advanced { file_name, sent_bytes, .. } => {
                if let Some(bar) = bars.get(&file_name) {
                    bar.set_position(sent_bytes);
                }
            }
            ProgressEvent::Finished { file_name } => {
                if let Some(bar) = bars.remove(&file_name) {
                    bar.finish_and_clear();
                }
            }
            ProgressEvent::Failed { file_name, .. } => {
                if let Some(bar) = bars.remove(&file_name) {
                    bar.abandon();
                }
            }
        }
    }
}
