//! Declarative description of a vendor's response shape
//!
//! Every vendor is described by an [`AdapterSpec`] value and interpreted by
//! the single engine in [`crate::engine`]. Adding a vendor means writing a
//! new spec, never new parsing code.

/// Result-field precedence used when a spec does not name its own
pub const DEFAULT_RESULT_FIELDS: &[&str] = &["results", "result", "data", "records"];

/// How records are laid out once the results field is located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An array of records (or one object / table standing for them)
    Records,
    /// An object keyed by sub-database name whose values hold the records.
    /// Each record is tagged with `tag = <key>`; when `inner` is set the
    /// records sit under that field of each group object.
    Grouped {
        tag: &'static str,
        inner: Option<&'static str>,
    },
    /// The located object is exactly one record
    Single,
    /// SSE-framed text; items of every event whose `status` equals
    /// `batch_status` are accumulated from `items_field`
    SseBatch {
        batch_status: &'static str,
        items_field: &'static str,
    },
}

/// Merge a nested object into its parent record under a key prefix.
///
/// When the path points at an array instead, the array is kept as one
/// joined column named after the last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub path: &'static str,
    pub prefix: &'static str,
}

impl Merge {
    pub const fn new(path: &'static str, prefix: &'static str) -> Self {
        Self { path, prefix }
    }

    pub fn array_column(&self) -> &'static str {
        self.path.rsplit('.').next().unwrap_or(self.path)
    }
}

/// Normalization rules for one vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSpec {
    pub shape: Shape,
    /// Dotted paths tried in order; the first present one wins.
    /// Empty means [`DEFAULT_RESULT_FIELDS`] (or the root for `Single`).
    pub result_fields: &'static [&'static str],
    /// Explicit `(column, path)` projection. When set, only these columns
    /// (plus merges) make it into the record.
    pub columns: &'static [(&'static str, &'static str)],
    pub merges: &'static [Merge],
    /// `(vendor key, column)` renames for top-level keys
    pub renames: &'static [(&'static str, &'static str)],
    /// Keys never copied into records
    pub drop: &'static [&'static str],
    /// Columns shown first in the table, when present
    pub preferred_columns: &'static [&'static str],
    /// Path of the vendor's own hit count
    pub total_path: Option<&'static str>,
}

impl AdapterSpec {
    pub const DEFAULT: AdapterSpec = AdapterSpec {
        shape: Shape::Records,
        result_fields: &[],
        columns: &[],
        merges: &[],
        renames: &[],
        drop: &[],
        preferred_columns: &[],
        total_path: None,
    };

    /// Result fields to try, in precedence order
    pub fn result_fields(&self) -> &'static [&'static str] {
        match (self.result_fields.is_empty(), self.shape) {
            (false, _) => self.result_fields,
            (true, Shape::Single) => &[],
            (true, _) => DEFAULT_RESULT_FIELDS,
        }
    }

    /// Column name for a top-level vendor key
    pub fn rename<'a>(&self, key: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|(from, _)| *from == key)
            .map(|(_, to)| *to)
            .unwrap_or(key)
    }
}

impl Default for AdapterSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}
