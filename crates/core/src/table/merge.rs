//! Merged-cell detection.
//!
//! Two sources of evidence are used. Cell geometry, when present, is exact:
//! a cell covering several grid positions is a merge. A bare text matrix
//! only offers repeated values, so runs of identical strings are taken as
//! merges. The latter also flags genuinely repeated values (a column of the
//! same category label, a row of identical totals) as merged.

use super::grid::place_cells;
use super::settings::BoundaryMatch;
use super::types::{MergeSpan, TableRegion, normalize_cells};

/// Merge spans of a region: from its cells first, from its matrix when the
/// cells yield none.
pub fn detect_merges(region: &TableRegion, matching: BoundaryMatch) -> Vec<MergeSpan> {
    let spans = merges_from_cells(region, matching);
    if !spans.is_empty() {
        return spans;
    }
    region
        .matrix
        .as_deref()
        .map(merges_from_matrix)
        .unwrap_or_default()
}

/// Spans of cells covering more than one position of the boundary grid.
pub fn merges_from_cells(region: &TableRegion, matching: BoundaryMatch) -> Vec<MergeSpan> {
    let cells = normalize_cells(&region.cells);
    if cells.is_empty() {
        return Vec::new();
    }
    place_cells(&cells, matching).map(|p| p.spans()).unwrap_or_default()
}

/// Spans of identical adjacent values in a text matrix.
///
/// From each unvisited position the span first grows right over equal
/// unvisited values, then down while the whole span-width row below is equal
/// and unvisited. The column count is taken from the first row; positions
/// missing from shorter rows never match.
pub fn merges_from_matrix<T: PartialEq>(matrix: &[Vec<T>]) -> Vec<MergeSpan> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Vec::new();
    }
    let at = |r: usize, c: usize| matrix.get(r).and_then(|row| row.get(c));
    let mut visited = vec![vec![false; cols]; rows];
    let mut spans = Vec::new();

    for i in 0..rows {
        for j in 0..cols {
            if visited[i][j] {
                continue;
            }
            visited[i][j] = true;
            let Some(value) = at(i, j) else {
                continue;
            };

            let mut col_span = 1;
            while j + col_span < cols
                && !visited[i][j + col_span]
                && at(i, j + col_span) == Some(value)
            {
                visited[i][j + col_span] = true;
                col_span += 1;
            }

            let mut row_span = 1;
            while i + row_span < rows {
                let r = i + row_span;
                let matches =
                    (j..j + col_span).all(|c| !visited[r][c] && at(r, c) == Some(value));
                if !matches {
                    break;
                }
                visited[r][j..j + col_span].fill(true);
                row_span += 1;
            }

            if row_span > 1 || col_span > 1 {
                spans.push(MergeSpan::new(i, j, i + row_span - 1, j + col_span - 1));
            }
        }
    }
    spans
}
