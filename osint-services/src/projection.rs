//! Table projection of a result set
//!
//! Turns a [`ResultSet`] into ordered columns and display cells for the
//! results table. The raw value stays next to the display text, so
//! nothing here affects what gets exported.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use osint_core::record::scalar_text;
use osint_core::{ResultSet, VendorId};

/// Rows per page in the results table
pub const PAGE_SIZE: usize = 10;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid date pattern")
});

/// Rendering hint for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    Empty,
    Boolean,
    Number,
    Date,
    Url,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub raw: Value,
    pub display: String,
    pub format: CellFormat,
}

impl Cell {
    pub fn new(raw: Value) -> Self {
        let (format, display) = match &raw {
            Value::Null => (CellFormat::Empty, String::new()),
            Value::Bool(b) => (CellFormat::Boolean, if *b { "Yes" } else { "No" }.to_string()),
            Value::Number(n) => (CellFormat::Number, n.to_string()),
            Value::String(s) if s.trim().is_empty() => (CellFormat::Empty, String::new()),
            Value::String(s) if is_url(s) => (CellFormat::Url, s.clone()),
            Value::String(s) if DATE_RE.is_match(s) => (CellFormat::Date, format_date(s)),
            Value::String(s) => (CellFormat::Text, s.clone()),
            other => (CellFormat::Text, scalar_text(other)),
        };
        Self {
            raw,
            display,
            format,
        }
    }

    fn empty() -> Self {
        Self::new(Value::Null)
    }
}

fn is_url(s: &str) -> bool {
    (s.starts_with("http://") || s.starts_with("https://")) && url::Url::parse(s).is_ok()
}

/// Render timestamps in UTC; plain dates and unparsable values are kept
fn format_date(s: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return ts.to_utc().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    s.to_string()
}

/// A result set laid out as a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub vendor: VendorId,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Projection {
    /// Project `set`, putting `preferred` columns first when present
    pub fn new(set: &ResultSet, preferred: &[&str]) -> Self {
        let mut seen: IndexSet<&str> = IndexSet::new();
        for record in &set.records {
            seen.extend(record.keys());
        }

        let mut columns: Vec<String> = preferred
            .iter()
            .filter(|c| seen.contains(**c))
            .map(|c| c.to_string())
            .collect();
        for key in seen {
            if !preferred.contains(&key) {
                columns.push(key.to_string());
            }
        }

        let rows = set
            .records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().map(Cell::new).unwrap_or_else(Cell::empty))
                    .collect()
            })
            .collect();

        Self {
            vendor: set.vendor,
            columns,
            rows,
        }
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(PAGE_SIZE)
    }

    /// Rows of a zero-based page; empty past the last page
    pub fn page(&self, index: usize) -> &[Vec<Cell>] {
        let start = index.saturating_mul(PAGE_SIZE).min(self.rows.len());
        let end = (start + PAGE_SIZE).min(self.rows.len());
        &self.rows[start..end]
    }

    /// Tab-separated copy of the whole table, header row first
    pub fn to_tsv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(
            self.columns
                .iter()
                .map(|c| tsv_field(c))
                .collect::<Vec<_>>()
                .join("\t"),
        );
        for row in &self.rows {
            lines.push(
                row.iter()
                    .map(|cell| tsv_field(&cell.display))
                    .collect::<Vec<_>>()
                    .join("\t"),
            );
        }
        lines.join("\n")
    }
}

fn tsv_field(s: &str) -> String {
    s.replace(['\t', '\r', '\n'], " ")
}
