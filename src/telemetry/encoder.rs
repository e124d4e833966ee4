//! OTLP/JSON payload encoding.
//!
//! Each emission becomes one self-contained `resourceMetrics` document
//! carrying a single cumulative, monotonic sum with one data point.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNIT: &str = "1";
pub const AGGREGATION_TEMPORALITY_CUMULATIVE: &str = "AGGREGATION_TEMPORALITY_CUMULATIVE";
pub const SOURCE_KEY: &str = "source";

/// Data point value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Double(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeMetrics {
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub unit: &'static str,
    pub sum: Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sum {
    pub data_points: Vec<DataPoint>,
    pub aggregation_temporality: &'static str,
    pub is_monotonic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_double: Option<f64>,
    pub time_unix_nano: u64,
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue {
                string_value: value.into(),
            },
        }
    }
}

/// Encode one metric.
///
/// Attributes are `labels` in order followed by `source`. A label already
/// keyed `source` is dropped so the configured value is the only one sent.
///
/// Every sum is declared monotonic, including the `users` gauge which can
/// decrease. Downstream dashboards depend on this shape.
pub fn encode(
    name: &str,
    value: MetricValue,
    labels: &[(&str, &str)],
    source: &str,
    time_unix_nano: u64,
) -> ExportPayload {
    let mut attributes: Vec<KeyValue> = labels
        .iter()
        .filter(|(key, _)| *key != SOURCE_KEY)
        .map(|(key, value)| KeyValue::new(*key, *value))
        .collect();
    attributes.push(KeyValue::new(SOURCE_KEY, source));

    let (as_int, as_double) = match value {
        MetricValue::Int(v) => (Some(v), None),
        MetricValue::Double(v) => (None, Some(v)),
    };

    ExportPayload {
        resource_metrics: vec![ResourceMetrics {
            scope_metrics: vec![ScopeMetrics {
                metrics: vec![Metric {
                    name: name.to_string(),
                    unit: UNIT,
                    sum: Sum {
                        data_points: vec![DataPoint {
                            as_int,
                            as_double,
                            time_unix_nano,
                            attributes,
                        }],
                        aggregation_temporality: AGGREGATION_TEMPORALITY_CUMULATIVE,
                        is_monotonic: true,
                    },
                }],
            }],
        }],
    }
}

/// Wall-clock milliseconds scaled to nanoseconds.
pub fn now_unix_nano() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    millis.saturating_mul(1_000_000)
}
