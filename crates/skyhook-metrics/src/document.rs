use crate::value::MetricValue;
use serde::{Deserialize, Serialize};

/// One named time series: a metric log file's values in line order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    /// Metric name - the log file name.
    pub label: String,
    /// Observed values, in line order.
    pub data: Vec<MetricValue>,
}

/// The unified time-series document submitted to the hub.
///
/// Wire shape, reproduced exactly for platform compatibility:
/// `{"label": [...], "dataset": [{"label": <name>, "data": [...]}, ...]}`
///
/// `label` holds the deduplicated epoch markers in first-seen order. Series
/// lengths are NOT guaranteed to equal the label count: a metric file keeps
/// every record even when the shared epoch repeats, and the aggregator
/// performs no truncation or padding. Consumers must treat the alignment as
/// positional and best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub label: Vec<MetricValue>,
    pub dataset: Vec<MetricSeries>,
}

impl MetricsDocument {
    /// True when the run produced neither epoch labels nor series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.dataset.is_empty()
    }

    /// Serializes the document to its wire JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
