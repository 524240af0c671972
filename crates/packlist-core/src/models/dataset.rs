//! Extraction output models: tables, field records and datasets.

use serde::{Deserialize, Serialize};

/// A grid cell. `None` means no token landed in that intersection.
pub type Cell = Option<String>;

/// One table row in reading order.
pub type Row = Vec<Cell>;

/// An ordered sequence of rows.
///
/// A table assembled from one page has uniform width. Tables merged across
/// pages may be ragged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the first row (0 for an empty table).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Widest row.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if rows differ in width.
    pub fn is_ragged(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().any(|row| row.len() != width)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Append a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Append all rows of another table.
    pub fn extend(&mut self, other: Table) {
        self.rows.extend(other.rows);
    }

    /// Rows as plain strings, with empty cells rendered as "".
    pub fn to_strings(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.clone().unwrap_or_default()).collect())
            .collect()
    }
}

/// Named field values extracted from one page, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Source page number (1-indexed).
    pub page: u32,
    fields: Vec<(String, String)>,
}

impl FieldRecord {
    /// Create an empty record for a page.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            fields: Vec::new(),
        }
    }

    /// Append a field. Names are expected to be unique within a record.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Look up a value by field name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Field values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.fields
    }
}

/// Ordered extraction output of one conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dataset {
    /// Clustered table rows, all pages merged.
    Rows { table: Table },
    /// One field record per page that had text.
    Records {
        columns: Vec<String>,
        records: Vec<FieldRecord>,
    },
}

impl Dataset {
    /// Number of rows or records.
    pub fn len(&self) -> usize {
        match self {
            Dataset::Rows { table } => table.len(),
            Dataset::Records { records, .. } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Header row for spreadsheet output.
    ///
    /// Field records always carry their field names. Table rows have no
    /// header unless `table_header` is set, in which case generic
    /// `col_N` names cover the widest row.
    pub fn header(&self, table_header: bool) -> Option<Vec<String>> {
        match self {
            Dataset::Records { columns, .. } => Some(columns.clone()),
            Dataset::Rows { table } if table_header => {
                Some((1..=table.max_width()).map(|i| format!("col_{i}")).collect())
            }
            Dataset::Rows { .. } => None,
        }
    }

    /// Body rows as strings.
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        match self {
            Dataset::Rows { table } => table.to_strings(),
            Dataset::Records { records, .. } => records
                .iter()
                .map(|r| r.values().map(str::to_string).collect())
                .collect(),
        }
    }
}

/// Terminal result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// At least one row or record was produced.
    Extracted(Dataset),
    /// The document was readable but nothing was recognized.
    NothingExtracted,
}

impl Outcome {
    /// Wrap a dataset, mapping an empty one to [`Outcome::NothingExtracted`].
    pub fn from_dataset(dataset: Dataset) -> Self {
        if dataset.is_empty() {
            Outcome::NothingExtracted
        } else {
            Outcome::Extracted(dataset)
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Outcome::Extracted(dataset) => Some(dataset),
            Outcome::NothingExtracted => None,
        }
    }

    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            Outcome::Extracted(dataset) => Some(dataset),
            Outcome::NothingExtracted => None,
        }
    }
}
