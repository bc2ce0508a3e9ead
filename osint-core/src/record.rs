//! Raw vendor payloads and their normalized, flattened form

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::{QueryType, VendorId};

/// Longest array of scalars kept inline (joined) before it is summarized
pub const MAX_INLINE_ARRAY: usize = 25;

/// Exactly what a vendor returned, before adaptation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResponse {
    /// Parsed JSON (object, array or scalar)
    Json(Value),
    /// Unparsed body text, e.g. a Server-Sent-Events stream
    Text(String),
}

impl RawResponse {
    /// Build from a response body, keeping non-JSON text as-is
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => RawResponse::Json(value),
            Err(_) => RawResponse::Text(body.to_string()),
        }
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        RawResponse::Json(value)
    }
}

/// One flat row of vendor output
///
/// Values are always scalars (string, number, boolean, null). Nested
/// structures are collapsed on insert: short scalar arrays are joined,
/// anything deeper becomes a summary such as `[Array(3)]` or
/// `[Complex Object]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedRecord(IndexMap<String, Value>);

impl NormalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, collapsing nested data into a scalar.
    ///
    /// An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), summarize(value));
    }

    /// Insert only when the key is not already present
    pub fn insert_missing(&mut self, key: impl Into<String>, value: Value) {
        self.0.entry(key.into()).or_insert_with(|| summarize(value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for NormalizedRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = NormalizedRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Collapse a JSON value into something a flat record may hold
pub fn summarize(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let all_scalar = items
                .iter()
                .all(|v| !matches!(v, Value::Array(_) | Value::Object(_)));
            if items.is_empty() {
                Value::String(String::new())
            } else if all_scalar && items.len() <= MAX_INLINE_ARRAY {
                let joined = items
                    .iter()
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(", ");
                Value::String(joined)
            } else {
                Value::String(format!("[Array({})]", items.len()))
            }
        }
        Value::Object(map) if map.is_empty() => Value::String(String::new()),
        Value::Object(_) => Value::String("[Complex Object]".to_string()),
        scalar => scalar,
    }
}

/// Text form of a scalar (strings unquoted)
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Kinds of per-vendor failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterErrorKind {
    /// Vendor does not support the query type (a skip, not a failure)
    UnsupportedQueryType,
    /// Network failure or non-2xx response
    Http,
    /// No response within the per-vendor window
    Timeout,
    /// Payload matched no known shape
    MalformedResponse,
    /// Part of an export could not be serialized and was replaced
    ExportSerialization,
    /// Vendor is not usable with the current configuration (missing key)
    Configuration,
    /// The search was cancelled before the vendor answered
    Cancelled,
}

impl fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterErrorKind::UnsupportedQueryType => "unsupported query type",
            AdapterErrorKind::Http => "http",
            AdapterErrorKind::Timeout => "timeout",
            AdapterErrorKind::MalformedResponse => "malformed response",
            AdapterErrorKind::ExportSerialization => "export serialization",
            AdapterErrorKind::Configuration => "configuration",
            AdapterErrorKind::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// A failure local to one vendor within a search
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    /// HTTP status, when the vendor answered at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind: AdapterErrorKind::Http,
            status,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::MalformedResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Configuration, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Cancelled, message)
    }
}

/// Normalized output of one vendor for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub vendor: VendorId,
    pub query_type: QueryType,
    pub records: Vec<NormalizedRecord>,
    /// Wall time spent on the request, filled in by the caller
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Total the vendor claims to hold, which may exceed `records.len()`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AdapterError>,
}

impl ResultSet {
    pub fn new(vendor: VendorId, query_type: QueryType, records: Vec<NormalizedRecord>) -> Self {
        Self {
            vendor,
            query_type,
            records,
            elapsed_ms: 0,
            reported_total: None,
            error: None,
        }
    }

    /// An empty result set carrying a malformed-response note
    pub fn malformed(vendor: VendorId, query_type: QueryType, message: impl Into<String>) -> Self {
        Self {
            error: Some(AdapterError::malformed(message)),
            ..Self::new(vendor, query_type, Vec::new())
        }
    }

    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Number of hits, preferring the vendor's own total
    pub fn count(&self) -> u64 {
        self.reported_total
            .unwrap_or(self.records.len() as u64)
            .max(self.records.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_nested_values() {
        assert_eq!(summarize(json!(["a", "b"])), json!("a, b"));
        assert_eq!(summarize(json!([{"x": 1}, {"x": 2}])), json!("[Array(2)]"));
        assert_eq!(summarize(json!({"x": 1})), json!("[Complex Object]"));
        assert_eq!(summarize(json!(true)), json!(true));
        assert_eq!(summarize(json!([])), json!(""));
    }

    #[test]
    fn test_record_never_holds_nested_values() {
        let record: NormalizedRecord = vec![
            ("a", json!({"deep": {"deeper": 1}})),
            ("b", json!([[1, 2], [3]])),
            ("c", json!(5)),
        ]
        .into_iter()
        .collect();

        for (_, value) in record.iter() {
            assert!(!value.is_array() && !value.is_object());
        }
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_raw_response_from_body() {
        assert_eq!(
            RawResponse::from_body(r#"{"a":1}"#),
            RawResponse::Json(json!({"a": 1}))
        );
        assert!(matches!(
            RawResponse::from_body("data: {}\n\n"),
            RawResponse::Text(_)
        ));
    }

    #[test]
    fn test_count_prefers_reported_total() {
        let mut set = ResultSet::new(
            VendorId::Snusbase,
            QueryType::Email,
            vec![NormalizedRecord::new()],
        );
        assert_eq!(set.count(), 1);
        set.reported_total = Some(40);
        assert_eq!(set.count(), 40);
    }
}
