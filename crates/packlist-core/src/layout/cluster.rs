//! Token clustering into row and column bands.
//!
//! Rows and columns are found independently per axis, either by clustering
//! token positions or by reading ruling lines. Every token that lands in both
//! a row band and a column band gets an assignment; the rest are dropped.

use std::cmp::Ordering;
use std::ops::Range;

use tracing::{debug, trace};

use crate::models::{Edge, PositionedToken, Strategy, TableSettings};

/// A row or column band: the extent covered along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub start: f64,
    pub end: f64,
}

impl Band {
    fn contains(&self, start: f64, end: f64, tolerance: f64) -> bool {
        start >= self.start - tolerance && end <= self.end + tolerance
    }
}

/// Grid position of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAssignment {
    /// Index into the clustered token slice.
    pub token: usize,
    pub row: usize,
    pub column: usize,
}

/// Output of the clusterer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterResult {
    /// Row bands, top to bottom.
    pub rows: Vec<Band>,
    /// Column bands, left to right.
    pub columns: Vec<Band>,
    /// Assignments ordered by row, then column, then reading order.
    pub assignments: Vec<TokenAssignment>,
}

impl ClusterResult {
    /// Check if no token was placed.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Groups sorted values into runs whose consecutive gaps are at most
/// `tolerance`. Returns index ranges into `sorted`.
pub(crate) fn chain_clusters(sorted: &[f64], tolerance: f64) -> Vec<Range<usize>> {
    let mut clusters = Vec::new();
    let mut start = 0;
    for i in 1..sorted.len() {
        if sorted[i] - sorted[i - 1] > tolerance {
            clusters.push(start..i);
            start = i;
        }
    }
    if !sorted.is_empty() {
        clusters.push(start..sorted.len());
    }
    clusters
}

/// Total order on tokens by position, then text.
pub(crate) fn reading_order(a: &PositionedToken, b: &PositionedToken) -> Ordering {
    a.center_y()
        .total_cmp(&b.center_y())
        .then_with(|| a.x0.total_cmp(&b.x0))
        .then_with(|| a.x1.total_cmp(&b.x1))
        .then_with(|| a.text.cmp(&b.text))
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    /// Column boundaries along x, from vertical rulings.
    X,
    /// Row boundaries along y, from horizontal rulings.
    Y,
}

/// Token clusterer driven by [`TableSettings`].
#[derive(Debug, Clone, Default)]
pub struct TokenClusterer {
    settings: TableSettings,
}

impl TokenClusterer {
    /// Create a clusterer with the given settings.
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    /// Partition tokens into row and column bands.
    ///
    /// Never fails: missing structure yields an empty result.
    pub fn cluster(&self, tokens: &[PositionedToken], edges: &[Edge]) -> ClusterResult {
        let mut order: Vec<usize> = (0..tokens.len())
            .filter(|&i| !tokens[i].text.trim().is_empty())
            .collect();
        if order.is_empty() {
            return ClusterResult::default();
        }
        order.sort_by(|&a, &b| reading_order(&tokens[a], &tokens[b]).then(a.cmp(&b)));

        let (rows, row_members) = match self.settings.horizontal_mode {
            Strategy::ByTextPosition => self.rows_by_text(tokens, &order),
            Strategy::ByRulingLines => {
                let bands = self.ruled_bands(edges, Axis::Y);
                let members = self.place(&bands, &order, |t| (t.top, t.bottom), tokens);
                (bands, members)
            }
        };
        if rows.is_empty() {
            debug!("No row bands found among {} tokens", order.len());
            return ClusterResult::default();
        }

        let (columns, column_of) = match self.settings.vertical_mode {
            Strategy::ByTextPosition => self.columns_by_text(tokens, &row_members),
            Strategy::ByRulingLines => {
                let bands = self.ruled_bands(edges, Axis::X);
                let mut column_of = vec![None; tokens.len()];
                for (column, members) in self
                    .place(&bands, &order, |t| (t.x0, t.x1), tokens)
                    .into_iter()
                    .enumerate()
                {
                    for token in members {
                        column_of[token] = Some(column);
                    }
                }
                (bands, column_of)
            }
        };
        if columns.is_empty() {
            debug!("No column bands found among {} tokens", order.len());
            return ClusterResult::default();
        }

        let mut assignments = Vec::new();
        for (row, members) in row_members.iter().enumerate() {
            for &token in members {
                if let Some(column) = column_of[token] {
                    assignments.push(TokenAssignment { token, row, column });
                } else {
                    trace!("Dropping token {:?} outside every column", tokens[token].text);
                }
            }
        }
        assignments.sort_by(|a, b| {
            a.row
                .cmp(&b.row)
                .then(a.column.cmp(&b.column))
                .then_with(|| reading_order(&tokens[a.token], &tokens[b.token]))
                .then(a.token.cmp(&b.token))
        });

        debug!(
            "Clustered {} tokens into {} rows x {} columns ({} placed)",
            order.len(),
            rows.len(),
            columns.len(),
            assignments.len()
        );

        ClusterResult {
            rows,
            columns,
            assignments,
        }
    }

    /// Row bands from chained vertical centers.
    fn rows_by_text(
        &self,
        tokens: &[PositionedToken],
        order: &[usize],
    ) -> (Vec<Band>, Vec<Vec<usize>>) {
        let centers: Vec<f64> = order.iter().map(|&i| tokens[i].center_y()).collect();
        let mut bands = Vec::new();
        let mut members = Vec::new();
        for range in chain_clusters(&centers, self.settings.snap_tolerance) {
            let group: Vec<usize> = order[range].to_vec();
            let start = group.iter().map(|&i| tokens[i].top).fold(f64::INFINITY, f64::min);
            let end = group
                .iter()
                .map(|&i| tokens[i].bottom)
                .fold(f64::NEG_INFINITY, f64::max);
            bands.push(Band { start, end });
            members.push(group);
        }
        (bands, members)
    }

    /// Column bands from fragment start positions.
    ///
    /// Within each row, tokens separated by at most `join_tolerance` form one
    /// fragment. Fragment starts across the page are then chained with
    /// `snap_tolerance`.
    fn columns_by_text(
        &self,
        tokens: &[PositionedToken],
        row_members: &[Vec<usize>],
    ) -> (Vec<Band>, Vec<Option<usize>>) {
        struct Fragment {
            x0: f64,
            x1: f64,
            members: Vec<usize>,
        }

        let mut fragments: Vec<Fragment> = Vec::new();
        for members in row_members {
            let mut line = members.clone();
            line.sort_by(|&a, &b| {
                tokens[a]
                    .x0
                    .total_cmp(&tokens[b].x0)
                    .then_with(|| reading_order(&tokens[a], &tokens[b]))
                    .then(a.cmp(&b))
            });

            let mut current: Option<Fragment> = None;
            for token in line {
                let t = &tokens[token];
                match current.as_mut() {
                    Some(f) if t.x0 - f.x1 <= self.settings.join_tolerance => {
                        f.x1 = f.x1.max(t.x1);
                        f.members.push(token);
                    }
                    _ => {
                        if let Some(done) = current.take() {
                            fragments.push(done);
                        }
                        current = Some(Fragment {
                            x0: t.x0,
                            x1: t.x1,
                            members: vec![token],
                        });
                    }
                }
            }
            fragments.extend(current);
        }

        fragments.sort_by(|a, b| a.x0.total_cmp(&b.x0).then(a.x1.total_cmp(&b.x1)));
        let starts: Vec<f64> = fragments.iter().map(|f| f.x0).collect();

        let mut bands = Vec::new();
        let mut column_of = vec![None; tokens.len()];
        for (column, range) in chain_clusters(&starts, self.settings.snap_tolerance)
            .into_iter()
            .enumerate()
        {
            let group = &fragments[range];
            let start = group.iter().map(|f| f.x0).fold(f64::INFINITY, f64::min);
            let end = group.iter().map(|f| f.x1).fold(f64::NEG_INFINITY, f64::max);
            bands.push(Band { start, end });
            for fragment in group {
                for &token in &fragment.members {
                    column_of[token] = Some(column);
                }
            }
        }
        (bands, column_of)
    }

    /// Bands bounded by ruling lines along one axis.
    fn ruled_bands(&self, edges: &[Edge], axis: Axis) -> Vec<Band> {
        let boundaries = self.ruling_positions(edges, axis);
        if boundaries.len() < 2 {
            debug!(
                "Only {} {:?} rulings qualify, no ruled bands",
                boundaries.len(),
                axis
            );
            return Vec::new();
        }
        boundaries
            .windows(2)
            .map(|w| Band {
                start: w[0],
                end: w[1],
            })
            .collect()
    }

    /// Snap, join and length-filter rulings; return surviving positions.
    fn ruling_positions(&self, edges: &[Edge], axis: Axis) -> Vec<f64> {
        // (position across the axis, span start, span end)
        let mut segments: Vec<(f64, f64, f64)> = edges
            .iter()
            .filter_map(|e| match axis {
                Axis::X if e.is_vertical() => Some(((e.x0 + e.x1) / 2.0, e.top, e.bottom)),
                Axis::Y if e.is_horizontal() => Some(((e.top + e.bottom) / 2.0, e.x0, e.x1)),
                _ => None,
            })
            .collect();
        segments.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.total_cmp(&b.2))
        });

        let positions: Vec<f64> = segments.iter().map(|s| s.0).collect();
        let mut boundaries = Vec::new();
        for range in chain_clusters(&positions, self.settings.snap_tolerance) {
            let snapped = positions[range.clone()].iter().sum::<f64>() / range.len() as f64;

            let mut spans: Vec<(f64, f64)> = segments[range].iter().map(|s| (s.1, s.2)).collect();
            spans.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

            let mut joined: Vec<(f64, f64)> = Vec::new();
            for (start, end) in spans {
                match joined.last_mut() {
                    Some(last) if start - last.1 <= self.settings.join_tolerance => {
                        last.1 = last.1.max(end);
                    }
                    _ => joined.push((start, end)),
                }
            }

            if joined
                .iter()
                .any(|(start, end)| end - start >= self.settings.edge_min_length)
            {
                boundaries.push(snapped);
            }
        }
        boundaries
    }

    /// Place tokens into ruled bands; a token goes to the first band that
    /// holds its extent.
    fn place<F>(
        &self,
        bands: &[Band],
        order: &[usize],
        extent: F,
        tokens: &[PositionedToken],
    ) -> Vec<Vec<usize>>
    where
        F: Fn(&PositionedToken) -> (f64, f64),
    {
        let mut members = vec![Vec::new(); bands.len()];
        let tolerance = self.settings.intersection_tolerance;
        for &token in order {
            let (start, end) = extent(&tokens[token]);
            if let Some(index) = bands.iter().position(|b| b.contains(start, end, tolerance)) {
                members[index].push(token);
            } else {
                trace!("Token {:?} lies outside every ruled band", tokens[token].text);
            }
        }
        members
    }
}
