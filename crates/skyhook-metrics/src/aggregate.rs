//! Metrics directory aggregation.
//!
//! A metrics directory is flat: one log file per metric, plus the reserved
//! `epoch` file whose records mark training steps, plus a handful of
//! single-line scalar summaries that are not time series and are excluded.

use crate::document::{MetricSeries, MetricsDocument};
use crate::error::{MetricsError, MetricsResult};
use crate::parser::read_points;
use crate::value::MetricValue;
use std::path::Path;
use tracing::debug;

/// Reserved file whose records feed the shared epoch-label sequence.
pub const EPOCH_FILE: &str = "epoch";

/// Single-line scalar summaries written next to the time-series logs.
/// They carry run metadata, not series, and never enter the document.
pub const SINGLE_LINE_FILES: &[&str] = &[
    "train_runtime",
    "train_samples_per_second",
    "train_steps_per_second",
    "total_flos",
];

/// Accumulates series one at a time and is finalized exactly once.
#[derive(Debug, Default)]
pub struct MetricsDocumentBuilder {
    labels: Vec<MetricValue>,
    dataset: Vec<MetricSeries>,
}

impl MetricsDocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an epoch label unless it was already seen (numeric equality,
    /// first-seen order preserved).
    pub fn push_epoch_label(&mut self, label: MetricValue) {
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    /// Appends one complete metric series.
    pub fn push_series(&mut self, series: MetricSeries) {
        self.dataset.push(series);
    }

    /// Finalizes the document.
    #[must_use]
    pub fn finish(self) -> MetricsDocument {
        MetricsDocument { label: self.labels, dataset: self.dataset }
    }
}

/// Aggregates a metrics directory into one document.
///
/// Regular files are visited in sorted name order so the document is stable
/// across platforms. The reserved `epoch` file contributes its step markers
/// to the shared label sequence; every other non-excluded file becomes one
/// series named after the file.
///
/// # Errors
/// Returns `MetricsError::NotFound` if the directory does not exist. The
/// caller treats this as recoverable - metrics are optional for a publish
/// run.
pub fn aggregate_metrics_dir(dir: &Path) -> MetricsResult<MetricsDocument> {
    if !dir.is_dir() {
        return Err(MetricsError::NotFound(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut builder = MetricsDocumentBuilder::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if SINGLE_LINE_FILES.contains(&name.as_str()) {
            debug!(file = %name, "excluding single-line summary from aggregation");
            continue;
        }

        let points = read_points(&path)?;
        if name == EPOCH_FILE {
            for point in points {
                if let Some(epoch) = point.epoch {
                    builder.push_epoch_label(epoch);
                }
            }
        } else {
            let data = points.into_iter().map(|p| p.value).collect();
            builder.push_series(MetricSeries { label: name, data });
        }
    }

    Ok(builder.finish())
}
