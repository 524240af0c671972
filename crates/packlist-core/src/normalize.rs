//! Whitespace canonicalization, column ordering and dataset assembly.

use tracing::debug;

use crate::layout::merge_tables;
use crate::models::{Cell, Dataset, FieldRecord, Row, Table};

/// Collapse every whitespace run (newlines, tabs, NBSP included) to one
/// ASCII space and trim both ends.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Normalize a cell, keeping empty cells as `None`.
pub fn normalize_cell(cell: Cell) -> Cell {
    cell.map(|text| normalize_text(&text))
}

/// Normalize every cell in a row.
pub fn normalize_row(row: Row) -> Row {
    row.into_iter().map(normalize_cell).collect()
}

/// Normalize every value in a record.
pub fn normalize_record(mut record: FieldRecord) -> FieldRecord {
    for (_, value) in record.fields_mut().iter_mut() {
        *value = normalize_text(value);
    }
    record
}

/// Resolve the exported column order for field records.
///
/// Names listed in `order` come first, in that order; remaining schema names
/// follow in schema order. Names in `order` that the schema lacks are ignored.
pub fn canonical_columns(schema: &[String], order: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(schema.len());
    for name in order {
        if schema.contains(name) && !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    for name in schema {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    columns
}

/// Rearrange a record's fields to match `columns`.
pub fn reorder_record(mut record: FieldRecord, columns: &[String]) -> FieldRecord {
    let fields = record.fields_mut();
    let mut ordered = Vec::with_capacity(fields.len());
    for name in columns {
        if let Some(pos) = fields.iter().position(|(n, _)| n == name) {
            ordered.push(fields.remove(pos));
        }
    }
    ordered.append(fields);
    *fields = ordered;
    record
}

/// Rearrange a row's cells by column index.
///
/// Listed indices come first; an index past the row's width yields an empty
/// cell. Unlisted columns follow in their original order.
pub fn reorder_row(row: Row, column_order: &[usize]) -> Row {
    if column_order.is_empty() {
        return row;
    }
    let mut slots: Vec<Option<Cell>> = row.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len().max(column_order.len()));
    for &index in column_order {
        match slots.get_mut(index) {
            Some(slot) => out.push(slot.take().flatten()),
            None => out.push(None),
        }
    }
    out.extend(slots.into_iter().flatten());
    out
}

/// Accumulates per-page outputs into one dataset, in page order.
#[derive(Debug)]
pub enum DatasetBuilder {
    /// Table mode: page tables merged on finish.
    Rows {
        pages: Vec<(u32, Table)>,
        column_order: Vec<usize>,
    },
    /// Field mode: one record per page.
    Records {
        columns: Vec<String>,
        records: Vec<FieldRecord>,
    },
}

impl DatasetBuilder {
    /// Builder for clustered-table output.
    pub fn rows(column_order: Vec<usize>) -> Self {
        DatasetBuilder::Rows {
            pages: Vec::new(),
            column_order,
        }
    }

    /// Builder for field records with the given column schema.
    pub fn records(columns: Vec<String>) -> Self {
        DatasetBuilder::Records {
            columns,
            records: Vec::new(),
        }
    }

    /// Add one page's table. Cells are normalized on the way in.
    pub fn push_table(&mut self, page: u32, table: Table) {
        if let DatasetBuilder::Rows {
            pages,
            column_order,
        } = self
        {
            let rows = table
                .into_rows()
                .into_iter()
                .map(|row| reorder_row(normalize_row(row), column_order))
                .collect();
            pages.push((page, Table::from_rows(rows)));
        } else {
            debug!("Ignoring table for page {} in record mode", page);
        }
    }

    /// Add one page's record. Values are normalized and reordered.
    pub fn push_record(&mut self, record: FieldRecord) {
        if let DatasetBuilder::Records { columns, records } = self {
            records.push(reorder_record(normalize_record(record), columns));
        } else {
            debug!("Ignoring record for page {} in table mode", record.page);
        }
    }

    /// Finish into a dataset ordered by page number.
    pub fn finish(self) -> Dataset {
        match self {
            DatasetBuilder::Rows { mut pages, .. } => {
                pages.sort_by_key(|(page, _)| *page);
                Dataset::Rows {
                    table: merge_tables(pages),
                }
            }
            DatasetBuilder::Records {
                columns,
                mut records,
            } => {
                records.sort_by_key(|r| r.page);
                Dataset::Records { columns, records }
            }
        }
    }
}
