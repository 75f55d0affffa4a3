//! Skyhook Metrics
//!
//! Metric-log aggregation for the publishing pipeline:
//! - Parsing per-metric log files (`<timestamp> <value> <epoch>` records)
//! - Building the unified time-series document submitted to the hub

pub mod aggregate;
pub mod document;
pub mod error;
pub mod parser;
pub mod value;

pub use aggregate::{aggregate_metrics_dir, MetricsDocumentBuilder, EPOCH_FILE, SINGLE_LINE_FILES};
pub use document::{MetricSeries, MetricsDocument};
pub use error::{MetricsError, MetricsResult};
pub use parser::{read_points, MetricPoint};
pub use value::MetricValue;
