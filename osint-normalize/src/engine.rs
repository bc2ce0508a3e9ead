//! Generic normalization engine
//!
//! Interprets an [`AdapterSpec`] against a raw vendor payload. The engine
//! never panics on unexpected input: anything it cannot place becomes a
//! [`NormalizeError`] that callers turn into an empty, annotated result set.

use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use osint_core::record::scalar_text;
use osint_core::{NormalizedRecord, RawResponse};

use crate::flatten::{build_record, is_table, lookup_path, pivot_table, tag_record};
use crate::spec::{AdapterSpec, Shape};
use crate::sse::{looks_like_sse, parse_events};

/// Tag column used when a plain results object turns out to be grouped
const FALLBACK_GROUP_TAG: &str = "source";

/// Why a payload could not be normalized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The payload matched none of the shapes its adapter spec allows
    #[error("Unrecognized response shape: {0}")]
    UnrecognizedShape(String),

    /// The vendor answered 2xx but reported a failure in the body
    #[error("Vendor reported an error: {0}")]
    VendorError(String),
}

/// Records extracted from one payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    pub reported_total: Option<u64>,
}

/// Decoded body: one JSON document, or the JSON payloads of an SSE stream
enum Payload<'a> {
    Json(Cow<'a, Value>),
    Events(Vec<Value>),
}

/// Normalize a raw vendor response according to `spec`
pub fn normalize(spec: &AdapterSpec, raw: &RawResponse) -> Result<Normalized, NormalizeError> {
    let payload = decode(raw)?;

    match (spec.shape, payload) {
        (
            Shape::SseBatch {
                batch_status,
                items_field,
            },
            Payload::Events(events),
        ) => normalize_batches(spec, &events, batch_status, items_field),
        (
            Shape::SseBatch {
                batch_status,
                items_field,
            },
            Payload::Json(value),
        ) => {
            // A batch vendor that answered with one plain JSON document
            let events = match value.into_owned() {
                Value::Array(items) => items,
                other => vec![other],
            };
            normalize_batches(spec, &events, batch_status, items_field)
        }
        (_, Payload::Events(mut events)) => {
            let value = if events.len() == 1 {
                events.remove(0)
            } else {
                Value::Array(events)
            };
            normalize_value(spec, &value)
        }
        (_, Payload::Json(value)) => normalize_value(spec, &value),
    }
}

fn decode(raw: &RawResponse) -> Result<Payload<'_>, NormalizeError> {
    match raw {
        RawResponse::Json(Value::String(text)) | RawResponse::Text(text) => decode_text(text),
        RawResponse::Json(value) => Ok(Payload::Json(Cow::Borrowed(value))),
    }
}

fn decode_text(text: &str) -> Result<Payload<'static>, NormalizeError> {
    if text.trim().is_empty() {
        return Err(NormalizeError::UnrecognizedShape(
            "empty response body".to_string(),
        ));
    }

    if looks_like_sse(text) {
        let events = sse_payloads(text);
        if events.is_empty() {
            return Err(NormalizeError::UnrecognizedShape(
                "SSE stream contained no parsable events".to_string(),
            ));
        }
        return Ok(Payload::Events(events));
    }

    serde_json::from_str::<Value>(text)
        .map(|value| Payload::Json(Cow::Owned(value)))
        .map_err(|_| {
            NormalizeError::UnrecognizedShape(
                "response is neither JSON nor an SSE stream".to_string(),
            )
        })
}

/// JSON payloads of every well-formed event; malformed events are skipped
fn sse_payloads(text: &str) -> Vec<Value> {
    let mut payloads = Vec::new();

    for event in parse_events(text) {
        let data = event.data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(value) => payloads.push(value),
            Err(e) => {
                // Some vendors put several JSON lines in one event
                let lines: Vec<Value> = data
                    .lines()
                    .filter_map(|line| serde_json::from_str(line.trim()).ok())
                    .collect();
                if lines.is_empty() {
                    warn!(
                        "Skipping malformed SSE event ({}): {}",
                        e,
                        data.chars().take(80).collect::<String>()
                    );
                }
                payloads.extend(lines);
            }
        }
    }

    payloads
}

fn normalize_batches(
    spec: &AdapterSpec,
    events: &[Value],
    batch_status: &str,
    items_field: &str,
) -> Result<Normalized, NormalizeError> {
    let mut records = Vec::new();
    let mut reported_total = None;
    let mut saw_batch = false;

    for event in events {
        if let Some(total) = spec.total_path.and_then(|p| lookup_path(event, p)) {
            reported_total = as_count(total).or(reported_total);
        }

        if event.get("status").and_then(Value::as_str) != Some(batch_status) {
            debug!(
                "Ignoring SSE event with status {:?}",
                event.get("status").map(scalar_text)
            );
            continue;
        }

        saw_batch = true;
        match lookup_path(event, items_field) {
            Some(items) => collect_records(items, spec, None, &mut records),
            None => debug!("Batch event without '{}' field", items_field),
        }
    }

    if !saw_batch {
        if let Some(message) = events.iter().find_map(vendor_error) {
            return Err(NormalizeError::VendorError(message));
        }
        // A stream of only status events (`completed`, ...) is a real empty
        // result; anything without a status is not a batch stream at all
        if !events.iter().any(|e| e.get("status").is_some()) {
            return Err(NormalizeError::UnrecognizedShape(
                "no batch status events in response".to_string(),
            ));
        }
    }

    Ok(Normalized {
        records,
        reported_total,
    })
}

fn normalize_value(spec: &AdapterSpec, root: &Value) -> Result<Normalized, NormalizeError> {
    let reported_total = spec
        .total_path
        .and_then(|p| lookup_path(root, p))
        .and_then(as_count);

    let fields = spec.result_fields();
    let mut records = Vec::new();

    if let Shape::Single = spec.shape {
        if let Some(message) = vendor_error(root) {
            return Err(NormalizeError::VendorError(message));
        }

        let payload = if fields.is_empty() {
            Some(root)
        } else {
            locate(root, fields)
        };
        let Some(payload) = payload else {
            return Err(missing_results(fields));
        };
        if !payload.is_object() && !payload.is_array() {
            return Err(scalar_results(payload));
        }
        collect_records(payload, spec, None, &mut records);

        return Ok(Normalized {
            records,
            reported_total,
        });
    }

    let payload = if root.is_array() {
        Some(root)
    } else {
        locate(root, fields)
    };

    let payload = match payload {
        Some(payload) => payload,
        None if is_table(root) => root,
        None => {
            return Err(match vendor_error(root) {
                Some(message) => NormalizeError::VendorError(message),
                None => missing_results(fields),
            });
        }
    };

    match spec.shape {
        Shape::Grouped { tag, inner } => expand_grouped(payload, spec, tag, inner, &mut records)?,
        _ => expand_records(payload, spec, &mut records)?,
    }

    Ok(Normalized {
        records,
        reported_total,
    })
}

/// First present field in precedence order
fn locate<'a>(root: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields.iter().find_map(|field| lookup_path(root, field))
}

fn expand_records(
    payload: &Value,
    spec: &AdapterSpec,
    out: &mut Vec<NormalizedRecord>,
) -> Result<(), NormalizeError> {
    match payload {
        Value::Object(map)
            if !is_table(payload) && !map.is_empty() && map.values().all(Value::is_array) =>
        {
            expand_grouped(payload, spec, FALLBACK_GROUP_TAG, None, out)
        }
        Value::Object(_) | Value::Array(_) => {
            collect_records(payload, spec, None, out);
            Ok(())
        }
        scalar => Err(scalar_results(scalar)),
    }
}

fn expand_grouped(
    payload: &Value,
    spec: &AdapterSpec,
    tag: &str,
    inner: Option<&str>,
    out: &mut Vec<NormalizedRecord>,
) -> Result<(), NormalizeError> {
    let groups = match payload {
        Value::Object(_) if is_table(payload) => {
            collect_records(payload, spec, None, out);
            return Ok(());
        }
        Value::Object(groups) => groups,
        Value::Array(_) => {
            collect_records(payload, spec, None, out);
            return Ok(());
        }
        scalar => return Err(scalar_results(scalar)),
    };

    let mut recognized = groups.is_empty();
    for (name, group) in groups {
        if !group.is_array() && !group.is_object() {
            debug!("Group '{}' holds a scalar, skipping", name);
            continue;
        }
        recognized = true;

        let records = match (inner, group) {
            (Some(field), Value::Object(_)) => match lookup_path(group, field) {
                Some(records) => records,
                None => {
                    debug!("Group '{}' has no '{}' field, skipping", name, field);
                    continue;
                }
            },
            (_, group) => group,
        };

        if records.is_array() || records.is_object() {
            collect_records(records, spec, Some((tag, name.as_str())), out);
        }
    }

    if !recognized {
        return Err(NormalizeError::UnrecognizedShape(
            "grouped results hold no record collections".to_string(),
        ));
    }
    Ok(())
}

/// Turn an array, table or single object into records
fn collect_records(
    value: &Value,
    spec: &AdapterSpec,
    tag: Option<(&str, &str)>,
    out: &mut Vec<NormalizedRecord>,
) {
    let mut push = |item: &Value| {
        let record = build_record(item, spec);
        if record.is_empty() {
            return;
        }
        out.push(match tag {
            Some((column, name)) => tag_record(record, column, name),
            None => record,
        });
    };

    match value {
        Value::Array(items) => {
            for item in items {
                match pivot_table(item) {
                    Some(rows) => rows.iter().for_each(&mut push),
                    None => push(item),
                }
            }
        }
        Value::Object(_) => match pivot_table(value) {
            Some(rows) => rows.iter().for_each(&mut push),
            None => push(value),
        },
        scalar => push(scalar),
    }
}

/// Failure message from a 2xx body such as `{"success": false, "message": ..}`
fn vendor_error(root: &Value) -> Option<String> {
    let obj = root.as_object()?;

    let failed = obj.get("success") == Some(&Value::Bool(false))
        || match obj.get("error") {
            Some(Value::String(s)) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Object(_)) => true,
            _ => false,
        };
    if !failed {
        return None;
    }

    let message = ["error", "message", "detail", "msg"]
        .iter()
        .find_map(|key| match obj.get(*key)? {
            Value::String(s) if !s.is_empty() && !s.eq_ignore_ascii_case("true") => {
                Some(s.clone())
            }
            nested @ Value::Object(_) => lookup_path(nested, "message").map(scalar_text),
            _ => None,
        })
        .unwrap_or_else(|| "request was not successful".to_string());

    Some(message)
}

/// Parse a vendor-reported hit count
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn missing_results(fields: &[&str]) -> NormalizeError {
    NormalizeError::UnrecognizedShape(format!(
        "no results field found (tried {})",
        fields.join(", ")
    ))
}

fn scalar_results(value: &Value) -> NormalizeError {
    NormalizeError::UnrecognizedShape(format!(
        "results hold a scalar instead of records: {}",
        scalar_text(value).chars().take(120).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Merge;
    use serde_json::json;

    const GROUPED: AdapterSpec = AdapterSpec {
        shape: Shape::Grouped {
            tag: "database",
            inner: None,
        },
        result_fields: &["results"],
        total_path: Some("size"),
        ..AdapterSpec::DEFAULT
    };

    const SSE: AdapterSpec = AdapterSpec {
        shape: Shape::SseBatch {
            batch_status: "batch_results",
            items_field: "results",
        },
        columns: &[
            ("plugin", "plugin_name"),
            ("service", "data.meta.name"),
            ("badges", "data.badges"),
        ],
        merges: &[Merge::new("data.recovery", "recovery_")],
        ..AdapterSpec::DEFAULT
    };

    fn rows(normalized: &Normalized) -> Vec<Value> {
        normalized
            .records
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect()
    }

    #[test]
    fn test_result_field_precedence() {
        let raw = RawResponse::Json(json!({
            "data": [{"from": "data"}],
            "result": [{"from": "result"}]
        }));
        let normalized = normalize(&AdapterSpec::DEFAULT, &raw).unwrap();
        assert_eq!(rows(&normalized), vec![json!({"from": "result"})]);
    }

    #[test]
    fn test_grouped_tags_each_record() {
        let raw = RawResponse::Json(json!({
            "size": 2,
            "results": {
                "db1": [{"email": "a@x.com"}],
                "db2": [{"email": "b@x.com", "database": "ignored"}]
            }
        }));
        let normalized = normalize(&GROUPED, &raw).unwrap();
        assert_eq!(
            rows(&normalized),
            vec![
                json!({"database": "db1", "email": "a@x.com"}),
                json!({"database": "db2", "email": "b@x.com"}),
            ]
        );
        assert_eq!(normalized.reported_total, Some(2));
    }

    #[test]
    fn test_grouped_inner_field() {
        let spec = AdapterSpec {
            shape: Shape::Grouped {
                tag: "database",
                inner: Some("Data"),
            },
            result_fields: &["List"],
            ..AdapterSpec::DEFAULT
        };
        let raw = RawResponse::Json(json!({
            "List": {
                "Collection": {"InfoLeak": "desc", "Data": [{"Email": "a@x.com"}]},
                "No results found": {"InfoLeak": "nothing"}
            }
        }));
        let normalized = normalize(&spec, &raw).unwrap();
        assert_eq!(
            rows(&normalized),
            vec![json!({"database": "Collection", "Email": "a@x.com"})]
        );
    }

    #[test]
    fn test_plain_results_object_of_arrays_is_grouped() {
        let raw = RawResponse::Json(json!({"results": {"site": [{"user": "bob"}]}}));
        let normalized = normalize(&AdapterSpec::DEFAULT, &raw).unwrap();
        assert_eq!(rows(&normalized), vec![json!({"source": "site", "user": "bob"})]);
    }

    #[test]
    fn test_tables_are_pivoted() {
        let raw = RawResponse::Json(json!({
            "results": {"headers": ["email", "password"], "values": [["a@x.com", "p1"]]}
        }));
        let normalized = normalize(&AdapterSpec::DEFAULT, &raw).unwrap();
        assert_eq!(rows(&normalized), vec![json!({"email": "a@x.com", "password": "p1"})]);
    }

    #[test]
    fn test_sse_batches_accumulate_and_skip_garbage() {
        let body = concat!(
            "data: {\"status\":\"batch_results\",\"results\":[{\"plugin_name\":\"X\",\"data\":{\"badges\":[\"A\"],\"meta\":{\"name\":\"Svc\"}}}]}\n\n",
            "data: {not json\n\n",
            "data: {\"status\":\"batch_results\",\"results\":[{\"plugin_name\":\"Y\",\"data\":{\"recovery\":{\"phone\":\"+1***\"}}}]}\n\n",
            "data: {\"status\":\"completed\",\"creditsLeft\":5}\n\n"
        );
        let normalized = normalize(&SSE, &RawResponse::Text(body.to_string())).unwrap();
        assert_eq!(
            rows(&normalized),
            vec![
                json!({"plugin": "X", "service": "Svc", "badges": "A"}),
                json!({"plugin": "Y", "recovery_phone": "+1***"}),
            ]
        );
    }

    #[test]
    fn test_sse_text_inside_json_string() {
        let body = "data: {\"status\":\"batch_results\",\"results\":[{\"plugin_name\":\"X\"}]}\n\n";
        let raw = RawResponse::Json(Value::String(body.to_string()));
        let normalized = normalize(&SSE, &raw).unwrap();
        assert_eq!(rows(&normalized), vec![json!({"plugin": "X"})]);
    }

    #[test]
    fn test_sse_error_event() {
        let body = "data: {\"status\":\"error\",\"error\":\"Insufficient credits\"}\n\n";
        let err = normalize(&SSE, &RawResponse::Text(body.to_string())).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::VendorError("Insufficient credits".to_string())
        );
    }

    #[test]
    fn test_sse_without_batch_status_is_unrecognized() {
        for raw in [
            RawResponse::Json(json!(42)),
            RawResponse::Json(json!(null)),
            RawResponse::Json(json!({"unexpected": 1})),
            RawResponse::Text("data: {\"foo\":1}\n\n".to_string()),
        ] {
            assert!(
                matches!(normalize(&SSE, &raw), Err(NormalizeError::UnrecognizedShape(_))),
                "{:?} accepted",
                raw
            );
        }
    }

    #[test]
    fn test_sse_completed_only_is_empty_result() {
        let body = "data: {\"status\":\"completed\",\"creditsLeft\":5}\n\n";
        let normalized = normalize(&SSE, &RawResponse::Text(body.to_string())).unwrap();
        assert!(normalized.records.is_empty());
    }

    #[test]
    fn test_grouped_scalars_are_unrecognized() {
        let raw = RawResponse::Json(json!({"results": {"db1": "x", "db2": 3}}));
        assert!(matches!(
            normalize(&GROUPED, &raw),
            Err(NormalizeError::UnrecognizedShape(_))
        ));

        let raw = RawResponse::Json(json!({"results": {}}));
        assert!(normalize(&GROUPED, &raw).unwrap().records.is_empty());
    }

    #[test]
    fn test_vendor_error_body() {
        let raw = RawResponse::Json(json!({"success": false, "message": "Invalid API key"}));
        let err = normalize(&AdapterSpec::DEFAULT, &raw).unwrap_err();
        assert_eq!(err, NormalizeError::VendorError("Invalid API key".to_string()));
    }

    #[test]
    fn test_unrecognized_shapes() {
        for raw in [
            RawResponse::Json(json!({"unexpected": 1})),
            RawResponse::Json(json!({"results": "No results"})),
            RawResponse::Text("<html>502 Bad Gateway</html>".to_string()),
            RawResponse::Text("   ".to_string()),
            RawResponse::Json(json!(42)),
        ] {
            assert!(matches!(
                normalize(&AdapterSpec::DEFAULT, &raw),
                Err(NormalizeError::UnrecognizedShape(_))
            ));
        }
    }

    #[test]
    fn test_empty_results_are_not_errors() {
        let raw = RawResponse::Json(json!({"results": []}));
        assert!(normalize(&AdapterSpec::DEFAULT, &raw).unwrap().records.is_empty());
    }

    #[test]
    fn test_count_parsing() {
        assert_eq!(as_count(&json!(12)), Some(12));
        assert_eq!(as_count(&json!("7")), Some(7));
        assert_eq!(as_count(&json!(-1)), None);
        assert_eq!(as_count(&json!(null)), None);
    }
}
