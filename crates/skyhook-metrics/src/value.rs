use serde::{Deserialize, Serialize};

/// A scalar read from a metric log.
///
/// Log fields parse integer-first with a float fallback, and the distinction
/// survives into the serialized document: an epoch logged as `1` serializes
/// as `1`, never `1.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    /// Parses a single log field, integer-first.
    ///
    /// Returns `None` if the field is numeric in neither representation.
    #[must_use]
    pub fn parse(field: &str) -> Option<Self> {
        if let Ok(i) = field.parse::<i64>() {
            return Some(Self::Int(i));
        }
        field.parse::<f64>().ok().map(Self::Float)
    }

    /// Numeric view of the value, used for label comparison.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

/// Equality is numeric: `Int(0)` and `Float(0.0)` are the same epoch label.
impl PartialEq for MetricValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}
