//! Metric log file parsing.
//!
//! Training backends append one whitespace-delimited record per observation:
//! `<timestamp> <value> <epoch>`. Files can grow to millions of lines, so
//! reads are buffered line by line rather than slurping the file.

use crate::error::{MetricsError, MetricsResult};
use crate::value::MetricValue;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// One accepted log record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    /// The observed metric value (second field).
    pub value: MetricValue,
    /// The training-step marker (third field), when it parsed as a number.
    pub epoch: Option<MetricValue>,
}

/// Reads every well-formed record from a metric log file, in line order.
///
/// Lines with fewer than three fields are skipped, as are lines whose value
/// field is not numeric. Parsing is idempotent: two reads of the same file
/// yield identical points.
///
/// # Errors
/// Returns `MetricsError::NotFound` if the path does not exist.
pub fn read_points(path: &Path) -> MetricsResult<Vec<MetricPoint>> {
    if !path.exists() {
        return Err(MetricsError::NotFound(path.to_path_buf()));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut points = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(point) = parse_line(&line) {
            points.push(point);
        } else if !line.trim().is_empty() {
            debug!(path = %path.display(), line = idx + 1, "skipping malformed metric record");
        }
    }
    Ok(points)
}

/// Parses a single record.
///
/// Value and epoch parse as integers first; if either fails, both reparse as
/// floats, so a record like `0 1.5 2` yields a float value AND a float epoch.
/// A non-numeric epoch alone does not drop the record - the value still
/// counts toward its series.
fn parse_line(line: &str) -> Option<MetricPoint> {
    let mut fields = line.split_whitespace();
    let _timestamp = fields.next()?;
    let value = fields.next()?;
    let epoch = fields.next()?;

    match (value.parse::<i64>(), epoch.parse::<i64>()) {
        (Ok(v), Ok(e)) => Some(MetricPoint {
            value: MetricValue::Int(v),
            epoch: Some(MetricValue::Int(e)),
        }),
        _ => {
            let value = value.parse::<f64>().ok()?;
            let epoch = epoch.parse::<f64>().ok().map(MetricValue::Float);
            Some(MetricPoint { value: MetricValue::Float(value), epoch })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_records_in_line_order() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "loss", "0 1.5 0\n0 1.2 1\n0 0.9 0\n");

        let points = read_points(&path).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].value, MetricValue::Float(1.5));
        assert_eq!(points[1].value, MetricValue::Float(1.2));
        assert_eq!(points[2].value, MetricValue::Float(0.9));
        assert_eq!(points[0].epoch, Some(MetricValue::Float(0.0)));
    }

    #[test]
    fn test_integer_records_stay_integers() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "steps", "1700000000 10 0\n1700000001 20 1\n");

        let points = read_points(&path).unwrap();
        assert_eq!(points[0].value, MetricValue::Int(10));
        assert_eq!(points[0].epoch, Some(MetricValue::Int(0)));
    }

    #[test]
    fn test_float_value_forces_float_epoch() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "loss", "0 0.5 2\n");

        let points = read_points(&path).unwrap();
        assert_eq!(points[0].value, MetricValue::Float(0.5));
        // Epoch reparsed as float alongside the value.
        assert!(matches!(points[0].epoch, Some(MetricValue::Float(e)) if e == 2.0));
    }

    #[test]
    fn test_short_and_malformed_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let path = write_log(
            &temp,
            "loss",
            "0 1.0\nnot a metric line at all\n0 2.0 0\n\n0 nan-ish x\n",
        );

        let points = read_points(&path).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, MetricValue::Float(2.0));
    }

    #[test]
    fn test_unparseable_epoch_keeps_the_value() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "loss", "0 3.5 start\n");

        let points = read_points(&path).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, MetricValue::Float(3.5));
        assert_eq!(points[0].epoch, None);
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "loss", "0 1.5 0 trailing junk\n");

        let points = read_points(&path).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = write_log(&temp, "loss", "0 1.5 0\n0 1.2 1\nbad\n0 0.9 2\n");

        let first = read_points(&path).unwrap();
        let second = read_points(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = read_points(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, MetricsError::NotFound(_)));
    }
}
