//! Flattening helpers shared by every adapter

use serde_json::{Map, Value};

use osint_core::record::scalar_text;
use osint_core::NormalizedRecord;

use crate::spec::AdapterSpec;

/// Resolve a dotted path (`data.meta.name`) inside a JSON value.
///
/// Array segments may be numeric indices. Null leaves count as absent.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    (!current.is_null()).then_some(current)
}

/// Whether an object is a `{headers: [..], values: [[..], ..]}` table
pub fn is_table(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    matches!(
        (map.get("headers"), map.get("values")),
        (Some(Value::Array(headers)), Some(Value::Array(rows)))
            if headers.iter().all(Value::is_string) && rows.iter().all(Value::is_array)
    )
}

/// Pivot a table into one object per row keyed by header.
///
/// Cells beyond the header count are named `column_<n>`; short rows leave
/// the missing headers out.
pub fn pivot_table(value: &Value) -> Option<Vec<Value>> {
    if !is_table(value) {
        return None;
    }

    let headers: Vec<String> = value["headers"]
        .as_array()?
        .iter()
        .map(scalar_text)
        .collect();

    let rows = value["values"]
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .map(|cells| {
            let mut row = Map::new();
            for (i, cell) in cells.iter().enumerate() {
                let column = headers
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{}", i + 1));
                row.insert(column, cell.clone());
            }
            Value::Object(row)
        })
        .collect();

    Some(rows)
}

/// Build one flat record from a vendor item according to `spec`
pub fn build_record(item: &Value, spec: &AdapterSpec) -> NormalizedRecord {
    let mut record = NormalizedRecord::new();

    let Value::Object(fields) = item else {
        if !item.is_null() {
            record.insert("value", item.clone());
        }
        return record;
    };

    if spec.columns.is_empty() {
        for (key, value) in fields {
            if spec.drop.contains(&key.as_str()) || merged_in_place(spec, key, value) {
                continue;
            }
            record.insert(spec.rename(key), value.clone());
        }
    } else {
        for (column, path) in spec.columns {
            if let Some(value) = lookup_path(item, path) {
                record.insert(*column, value.clone());
            }
        }
    }

    for merge in spec.merges {
        match lookup_path(item, merge.path) {
            Some(Value::Object(nested)) => {
                for (key, value) in nested {
                    if spec.drop.contains(&key.as_str()) {
                        continue;
                    }
                    record.insert_missing(format!("{}{}", merge.prefix, key), value.clone());
                }
            }
            Some(value @ Value::Array(_)) => {
                record.insert_missing(merge.array_column(), value.clone());
            }
            _ => {}
        }
    }

    record
}

/// A top-level key handled by a merge rule rather than copied directly
fn merged_in_place(spec: &AdapterSpec, key: &str, value: &Value) -> bool {
    value.is_object() && spec.merges.iter().any(|m| m.path == key)
}

/// Put `column = tag` first, ahead of the record's own fields
pub fn tag_record(record: NormalizedRecord, column: &str, tag: &str) -> NormalizedRecord {
    let mut tagged = NormalizedRecord::new();
    tagged.insert(column, Value::String(tag.to_string()));
    for (key, value) in record.iter() {
        if key != column {
            tagged.insert(key, value.clone());
        }
    }
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Merge;
    use serde_json::json;

    #[test]
    fn test_lookup_path() {
        let value = json!({"data": {"meta": {"name": "Svc"}, "list": [1, 2], "gone": null}});
        assert_eq!(lookup_path(&value, "data.meta.name"), Some(&json!("Svc")));
        assert_eq!(lookup_path(&value, "data.list.1"), Some(&json!(2)));
        assert_eq!(lookup_path(&value, "data.gone"), None);
        assert_eq!(lookup_path(&value, "data.missing.deeper"), None);
    }

    #[test]
    fn test_pivot_table() {
        let table = json!({
            "headers": ["email", "password"],
            "values": [["a@x.com", "p1"], ["b@x.com", "p2", "extra"]]
        });
        let rows = pivot_table(&table).unwrap();
        assert_eq!(rows[0], json!({"email": "a@x.com", "password": "p1"}));
        assert_eq!(
            rows[1],
            json!({"email": "b@x.com", "password": "p2", "column_3": "extra"})
        );
        assert!(pivot_table(&json!({"headers": "nope", "values": []})).is_none());
    }

    #[test]
    fn test_build_record_merges_with_prefix() {
        const SPEC: AdapterSpec = AdapterSpec {
            merges: &[
                Merge::new("recovery", "recovery_"),
                Merge::new("display", ""),
            ],
            drop: &["internal"],
            ..AdapterSpec::DEFAULT
        };

        let item = json!({
            "email": "a@x.com",
            "recovery": {"phone": "+1***"},
            "display": {"name": "Alice", "email": "shadowed"},
            "internal": 1
        });
        let record = build_record(&item, &SPEC);

        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["email", "recovery_phone", "name"]
        );
        assert_eq!(record.get("email"), Some(&json!("a@x.com")));
    }

    #[test]
    fn test_tag_record_goes_first() {
        let record: NormalizedRecord = vec![("email", json!("a@x.com"))].into_iter().collect();
        let tagged = tag_record(record, "database", "db1");
        assert_eq!(tagged.keys().collect::<Vec<_>>(), vec!["database", "email"]);
    }
}
