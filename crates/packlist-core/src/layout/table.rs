//! Table assembly from clustered tokens, and merging across pages.

use tracing::{debug, instrument};

use super::cluster::{chain_clusters, ClusterResult, TokenClusterer};
use crate::models::{Cell, Edge, PositionedToken, Row, Table, TableSettings};

/// Builds a [`Table`] from a clustering result.
#[derive(Debug, Clone, Default)]
pub struct TableAssembler {
    settings: TableSettings,
}

impl TableAssembler {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    /// Cluster and assemble a page's tokens in one step.
    #[instrument(skip_all, fields(tokens = tokens.len(), edges = edges.len()))]
    pub fn extract(&self, tokens: &[PositionedToken], edges: &[Edge]) -> Table {
        let clusters = TokenClusterer::new(self.settings.clone()).cluster(tokens, edges);
        self.assemble(tokens, &clusters)
    }

    /// Turn band assignments into rows of cells.
    ///
    /// Tokens sharing a cell are joined with single spaces, line by line, left
    /// to right. Rows where every cell is empty are dropped, so a table built
    /// here never contains a blank row.
    pub fn assemble(&self, tokens: &[PositionedToken], clusters: &ClusterResult) -> Table {
        let width = clusters.columns.len();
        let mut grid: Vec<Vec<Vec<usize>>> = vec![vec![Vec::new(); width]; clusters.rows.len()];
        for a in &clusters.assignments {
            if let Some(cell) = grid.get_mut(a.row).and_then(|row| row.get_mut(a.column)) {
                cell.push(a.token);
            }
        }

        let mut table = Table::new();
        let mut dropped = 0;
        for cells in grid {
            let row: Row = cells
                .into_iter()
                .map(|members| self.cell_text(tokens, members))
                .collect();
            if row.iter().all(Option::is_none) {
                dropped += 1;
                continue;
            }
            table.push(row);
        }

        if dropped > 0 {
            debug!("Dropped {} empty rows", dropped);
        }
        table
    }

    fn cell_text(&self, tokens: &[PositionedToken], mut members: Vec<usize>) -> Cell {
        members.retain(|&i| !tokens[i].text.trim().is_empty());
        if members.is_empty() {
            return None;
        }

        members.sort_by(|&a, &b| {
            tokens[a]
                .center_y()
                .total_cmp(&tokens[b].center_y())
                .then(a.cmp(&b))
        });
        let centers: Vec<f64> = members.iter().map(|&i| tokens[i].center_y()).collect();

        let mut parts: Vec<&str> = Vec::with_capacity(members.len());
        for range in chain_clusters(&centers, self.settings.snap_tolerance) {
            let mut line = members[range].to_vec();
            line.sort_by(|&a, &b| tokens[a].x0.total_cmp(&tokens[b].x0).then(a.cmp(&b)));
            parts.extend(line.into_iter().map(|i| tokens[i].text.trim()));
        }
        Some(parts.join(" "))
    }
}

/// Concatenate per-page tables in the given order.
///
/// The first non-empty page sets the reference width. Pages that differ are
/// kept as they are, so the merged table may be ragged.
pub fn merge_tables(pages: Vec<(u32, Table)>) -> Table {
    let mut merged = Table::new();
    let mut reference: Option<(u32, usize)> = None;

    for (page, table) in pages {
        if table.is_empty() {
            continue;
        }
        let width = table.column_count();
        match reference {
            None => reference = Some((page, width)),
            Some((first, expected)) if expected != width => {
                debug!(
                    "Page {} has {} columns, page {} had {}; keeping rows as-is",
                    page, width, first, expected
                );
            }
            Some(_) => {}
        }
        merged.extend(table);
    }
    merged
}
