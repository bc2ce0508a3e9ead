//! JSON export of search results
//!
//! Exports always carry the full [`ResultSet`] or [`AggregateSearch`], never
//! the paginated table. Serialization cannot fail from the caller's point
//! of view: anything that cannot be represented is replaced with a
//! sentinel and reported alongside the document.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use osint_core::{AdapterError, AdapterErrorKind, AggregateSearch, QueryType, ResultSet};

/// Marker written where a value could not be serialized
pub const CIRCULAR_SENTINEL: &str = "[Circular]";

/// Nesting depth past which values are replaced with the sentinel.
/// Self-referencing data unrolls into unbounded depth, and serde_json
/// refuses to read documents nested deeper than 128 levels.
pub const MAX_EXPORT_DEPTH: usize = 64;

/// Longest query value kept in a filename
const MAX_FILENAME_VALUE_CHARS: usize = 64;

/// Result of [`safe_serialize`]
#[derive(Debug, Clone, PartialEq)]
pub struct SafeValue {
    pub value: Value,
    /// Set when part of the input was replaced with the sentinel
    pub error: Option<AdapterError>,
}

/// Serialize `value`, substituting `sentinel` for anything that fails to
/// serialize or nests deeper than [`MAX_EXPORT_DEPTH`]
pub fn safe_serialize<T: Serialize + ?Sized>(value: &T, sentinel: &str) -> SafeValue {
    let value = match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => {
            warn!("Export serialization failed: {}", e);
            return SafeValue {
                value: Value::String(sentinel.to_string()),
                error: Some(AdapterError::new(
                    AdapterErrorKind::ExportSerialization,
                    e.to_string(),
                )),
            };
        }
    };

    let mut truncated = 0usize;
    let value = limit_depth(value, 0, sentinel, &mut truncated);
    let error = (truncated > 0).then(|| {
        warn!("Export replaced {} over-nested values", truncated);
        AdapterError::new(
            AdapterErrorKind::ExportSerialization,
            format!(
                "{} values nested deeper than {} levels were replaced with {}",
                truncated, MAX_EXPORT_DEPTH, sentinel
            ),
        )
    });

    SafeValue { value, error }
}

fn limit_depth(value: Value, depth: usize, sentinel: &str, truncated: &mut usize) -> Value {
    let nested = matches!(value, Value::Array(_) | Value::Object(_));
    if nested && depth >= MAX_EXPORT_DEPTH {
        *truncated += 1;
        return Value::String(sentinel.to_string());
    }

    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| limit_depth(v, depth + 1, sentinel, truncated))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, limit_depth(v, depth + 1, sentinel, truncated)))
                .collect::<Map<_, _>>(),
        ),
        other => other,
    }
}

/// A downloadable export
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub filename: String,
    pub document: Value,
    /// Parts of the document that had to be replaced
    pub errors: Vec<AdapterError>,
}

impl Export {
    /// Pretty-printed JSON body
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.document)
            .unwrap_or_else(|_| format!("\"{}\"", CIRCULAR_SENTINEL))
    }
}

/// Export one vendor's result set
pub fn export_result_set(set: &ResultSet, query_value: &str, at: DateTime<Utc>) -> Export {
    let safe = safe_serialize(set, CIRCULAR_SENTINEL);
    Export {
        filename: export_filename(set.vendor.as_str(), set.query_type, query_value, at),
        document: safe.value,
        errors: safe.error.into_iter().collect(),
    }
}

/// Export a whole search. The document is the search itself; only when that
/// fails is each outcome serialized on its own, so one bad vendor payload
/// cannot take the others down with it.
pub fn export_search(search: &AggregateSearch, at: DateTime<Utc>) -> Export {
    let filename = export_filename("all", search.query.query_type, &search.query.value, at);

    let whole = safe_serialize(search, CIRCULAR_SENTINEL);
    if whole.error.is_none() {
        return Export {
            filename,
            document: whole.value,
            errors: Vec::new(),
        };
    }

    let mut errors = Vec::new();
    let outcomes: Vec<Value> = search
        .outcomes
        .iter()
        .map(|outcome| {
            let safe = safe_serialize(outcome, CIRCULAR_SENTINEL);
            errors.extend(safe.error);
            safe.value
        })
        .collect();

    let mut document = Map::new();
    document.insert("search_id".to_string(), Value::from(search.search_id));
    document.insert(
        "query".to_string(),
        safe_serialize(&search.query, CIRCULAR_SENTINEL).value,
    );
    document.insert(
        "vendors".to_string(),
        safe_serialize(&search.vendors, CIRCULAR_SENTINEL).value,
    );
    document.insert("outcomes".to_string(), Value::Array(outcomes));
    document.insert(
        "started_at".to_string(),
        Value::String(search.started_at.to_rfc3339()),
    );
    if let Some(finished) = search.finished_at {
        document.insert(
            "finished_at".to_string(),
            Value::String(finished.to_rfc3339()),
        );
    }

    Export {
        filename,
        document: Value::Object(document),
        errors,
    }
}

/// `<prefix>_<querytype>_<value>_<timestamp>.json` with the value reduced to
/// filename-safe characters
pub fn export_filename(
    prefix: &str,
    query_type: QueryType,
    value: &str,
    at: DateTime<Utc>,
) -> String {
    let value: String = value
        .chars()
        .take(MAX_FILENAME_VALUE_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "{}_{}_{}_{}.json",
        prefix,
        query_type.as_str(),
        value,
        at.format("%Y%m%dT%H%M%SZ")
    )
}
