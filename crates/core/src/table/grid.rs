//! Mapping cells onto a logical row/column grid.

use tracing::debug;

use crate::page::TextLine;

use super::clustering::{cluster, distinct_sorted};
use super::settings::BoundaryMatch;
use super::structure::Structure;
use super::types::{Cell, Grid, MergeSpan, RawCell, normalize_cells};

/// A cell resolved to boundary indices. `row_end`/`col_end` are exclusive
/// boundary indices, not inclusive grid positions.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Placed {
    pub row_start: usize,
    pub col_start: usize,
    pub row_end: usize,
    pub col_end: usize,
    pub text: String,
}

impl Placed {
    fn is_span(&self) -> bool {
        self.row_end > self.row_start + 1 || self.col_end > self.col_start + 1
    }

    fn span(&self) -> MergeSpan {
        MergeSpan::new(self.row_start, self.col_start, self.row_end - 1, self.col_end - 1)
    }
}

/// Cells located on the boundary lists derived from their own edges.
#[derive(Debug, Default)]
pub(crate) struct Placement {
    pub row_count: usize,
    pub col_count: usize,
    pub cells: Vec<Placed>,
}

impl Placement {
    /// Every cell covering more than one grid position, as a merge span.
    pub fn spans(&self) -> Vec<MergeSpan> {
        self.cells.iter().filter(|c| c.is_span()).map(Placed::span).collect()
    }
}

/// Boundary list plus the lookup policy used to locate an edge on it.
struct Axis {
    bounds: Vec<f64>,
    matching: BoundaryMatch,
}

impl Axis {
    fn new(values: Vec<f64>, matching: BoundaryMatch) -> Self {
        let bounds = match matching {
            BoundaryMatch::Exact => distinct_sorted(values),
            BoundaryMatch::Nearest { tolerance } => cluster(&values, tolerance),
        };
        Self { bounds, matching }
    }

    fn intervals(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }

    fn locate(&self, v: f64) -> Option<usize> {
        match self.matching {
            BoundaryMatch::Exact => {
                let i = self.bounds.partition_point(|b| *b < v);
                (self.bounds.get(i) == Some(&v)).then_some(i)
            }
            BoundaryMatch::Nearest { tolerance } => {
                let i = self.bounds.partition_point(|b| *b < v);
                let below = i.checked_sub(1).map(|j| (j, v - self.bounds[j]));
                let above = self.bounds.get(i).map(|b| (i, b - v));
                let (idx, dist) = match (below, above) {
                    (Some(b), Some(a)) => {
                        if a.1 < b.1 {
                            a
                        } else {
                            b
                        }
                    }
                    (Some(b), None) => b,
                    (None, Some(a)) => a,
                    (None, None) => return None,
                };
                (dist <= tolerance).then_some(idx)
            }
        }
    }
}

/// Locate every cell on the boundaries derived from all cell edges.
///
/// Cells whose edges cannot be located, or that collapse to no interval,
/// are skipped. Returns `None` when the boundaries leave no rows or columns.
pub(crate) fn place_cells(cells: &[Cell], matching: BoundaryMatch) -> Option<Placement> {
    let rows = Axis::new(
        cells.iter().flat_map(|c| [c.bbox.top, c.bbox.bottom]).collect(),
        matching,
    );
    let cols = Axis::new(
        cells.iter().flat_map(|c| [c.bbox.x0, c.bbox.x1]).collect(),
        matching,
    );
    if rows.intervals() == 0 || cols.intervals() == 0 {
        return None;
    }

    let mut placed = Vec::with_capacity(cells.len());
    for cell in cells {
        let located = (
            rows.locate(cell.bbox.top),
            rows.locate(cell.bbox.bottom),
            cols.locate(cell.bbox.x0),
            cols.locate(cell.bbox.x1),
        );
        match located {
            (Some(rs), Some(re), Some(cs), Some(ce)) if re > rs && ce > cs => placed.push(Placed {
                row_start: rs,
                col_start: cs,
                row_end: re,
                col_end: ce,
                text: cell.text.clone(),
            }),
            _ => debug!(bbox = ?cell.bbox, "cell does not sit on the grid, skipped"),
        }
    }
    Some(Placement {
        row_count: rows.intervals(),
        col_count: cols.intervals(),
        cells: placed,
    })
}

/// Build a grid and its merge spans from a cell list.
///
/// A cell covering several positions records a span, claims all of them and
/// writes its text at the top-left one. A single-position cell writes only if
/// its position is still free. Returns empty vectors when no grid can be
/// built.
pub fn build_grid(cells: &[RawCell], matching: BoundaryMatch) -> (Grid, Vec<MergeSpan>) {
    let cells = normalize_cells(cells);
    if cells.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let Some(placement) = place_cells(&cells, matching) else {
        return (Vec::new(), Vec::new());
    };

    let (rows, cols) = (placement.row_count, placement.col_count);
    let mut grid = vec![vec![String::new(); cols]; rows];
    let mut occupied = vec![vec![false; cols]; rows];
    let mut merges = Vec::new();
    for cell in &placement.cells {
        if cell.is_span() {
            merges.push(cell.span());
            for row in &mut occupied[cell.row_start..cell.row_end] {
                row[cell.col_start..cell.col_end].fill(true);
            }
            grid[cell.row_start][cell.col_start] = cell.text.clone();
        } else if !occupied[cell.row_start][cell.col_start] {
            grid[cell.row_start][cell.col_start] = cell.text.clone();
            occupied[cell.row_start][cell.col_start] = true;
        }
    }
    (grid, merges)
}

/// Fill the cells of `structure` with the text of `lines`.
///
/// Each span goes to the cell containing its center. Within a cell, spans
/// of one line are joined with a space and lines with a newline.
pub fn fill_from_structure(structure: &Structure, lines: &[TextLine]) -> Grid {
    let (rows, cols) = (structure.row_count(), structure.col_count());
    let mut parts: Vec<Vec<Vec<String>>> = vec![vec![Vec::new(); cols]; rows];
    for line in lines {
        let mut current: Vec<((usize, usize), Vec<&str>)> = Vec::new();
        for span in &line.spans {
            let text = span.text.trim();
            if text.is_empty() {
                continue;
            }
            let Some(pos) = structure.locate(span.bbox.h_center(), span.bbox.v_center()) else {
                continue;
            };
            match current.iter_mut().find(|(p, _)| *p == pos) {
                Some((_, words)) => words.push(text),
                None => current.push((pos, vec![text])),
            }
        }
        for ((r, c), words) in current {
            parts[r][c].push(words.join(" "));
        }
    }
    parts
        .into_iter()
        .map(|row| row.into_iter().map(|cell| cell.join("\n")).collect())
        .collect()
}

/// Drop leading and trailing rows and columns that are entirely empty,
/// keeping at least one cell.
pub fn trim_empty_margins(grid: Grid) -> Grid {
    let blank = |s: &String| s.trim().is_empty();
    let Some(first_row) = grid.iter().position(|r| !r.iter().all(blank)) else {
        return grid.into_iter().take(1).map(|r| r.into_iter().take(1).collect()).collect();
    };
    let last_row = grid.iter().rposition(|r| !r.iter().all(blank)).unwrap_or(first_row);
    let cols = grid.first().map_or(0, Vec::len);
    let used = |c: usize| grid.iter().any(|r| r.get(c).is_some_and(|s| !blank(s)));
    let first_col = (0..cols).find(|&c| used(c)).unwrap_or(0);
    let last_col = (0..cols).rev().find(|&c| used(c)).unwrap_or(first_col);

    grid.into_iter()
        .skip(first_row)
        .take(last_row - first_row + 1)
        .map(|row| row.into_iter().skip(first_col).take(last_col - first_col + 1).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::TextSpan;
    use crate::table::types::BBox;

    fn cells(list: &[(f64, f64, f64, f64, &str)]) -> Vec<RawCell> {
        list.iter().map(|&c| RawCell::from(c)).collect()
    }

    #[test]
    fn simple_two_by_two() {
        let input = cells(&[
            (0.0, 0.0, 50.0, 50.0, "A1"),
            (50.0, 0.0, 100.0, 50.0, "B1"),
            (0.0, 50.0, 50.0, 100.0, "A2"),
            (50.0, 50.0, 100.0, 100.0, "B2"),
        ]);
        let (grid, merges) = build_grid(&input, BoundaryMatch::Exact);
        assert_eq!(grid, vec![vec!["A1", "B1"], vec!["A2", "B2"]]);
        assert!(merges.is_empty());
    }

    #[test]
    fn spanning_cell_claims_its_positions() {
        let input = cells(&[
            (0.0, 0.0, 100.0, 20.0, "Header"),
            (0.0, 0.0, 50.0, 20.0, "hidden"),
            (0.0, 20.0, 50.0, 40.0, "a"),
            (50.0, 20.0, 100.0, 40.0, "b"),
        ]);
        let (grid, merges) = build_grid(&input, BoundaryMatch::Exact);
        assert_eq!(grid, vec![vec!["Header", ""], vec!["a", "b"]]);
        assert_eq!(merges, vec![MergeSpan::new(0, 0, 0, 1)]);
    }

    #[test]
    fn first_writer_wins() {
        let input = cells(&[
            (0.0, 0.0, 10.0, 10.0, "first"),
            (0.0, 0.0, 10.0, 10.0, "second"),
        ]);
        let (grid, _) = build_grid(&input, BoundaryMatch::Exact);
        assert_eq!(grid, vec![vec!["first"]]);
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert_eq!(build_grid(&[], BoundaryMatch::Exact), (Vec::new(), Vec::new()));
        let flat = cells(&[(0.0, 5.0, 10.0, 5.0, "line")]);
        assert_eq!(build_grid(&flat, BoundaryMatch::Exact), (Vec::new(), Vec::new()));
    }

    #[test]
    fn jittered_edges_need_nearest_matching() {
        let input = cells(&[
            (0.0, 0.0, 50.0, 50.0, "A1"),
            (50.4, 0.2, 100.0, 50.0, "B1"),
            (0.0, 50.3, 50.0, 100.0, "A2"),
            (50.0, 50.0, 100.0, 99.8, "B2"),
        ]);
        let (exact, _) = build_grid(&input, BoundaryMatch::Exact);
        assert_ne!(exact.len(), 2);
        let (near, merges) = build_grid(&input, BoundaryMatch::Nearest { tolerance: 1.0 });
        assert_eq!(near, vec![vec!["A1", "B1"], vec!["A2", "B2"]]);
        assert!(merges.is_empty());
    }

    #[test]
    fn structure_fill_joins_spans_and_lines() {
        let structure = Structure {
            rows: vec![0.0, 20.0, 40.0],
            cols: vec![0.0, 50.0, 100.0],
        };
        let span = |x0: f64, top: f64, text: &str| TextSpan {
            bbox: BBox::new(x0, top, x0 + 10.0, top + 5.0),
            text: text.into(),
            font: String::new(),
            size: 5.0,
        };
        let lines = vec![
            TextLine {
                bbox: BBox::new(0.0, 2.0, 100.0, 7.0),
                spans: vec![span(2.0, 2.0, "New"), span(14.0, 2.0, "York"), span(60.0, 2.0, "8.3")],
            },
            TextLine {
                bbox: BBox::new(0.0, 9.0, 50.0, 14.0),
                spans: vec![span(2.0, 9.0, "City")],
            },
            TextLine {
                bbox: BBox::new(0.0, 25.0, 100.0, 30.0),
                spans: vec![span(60.0, 25.0, "x"), span(200.0, 25.0, "outside")],
            },
        ];
        let grid = fill_from_structure(&structure, &lines);
        assert_eq!(grid, vec![vec!["New York\nCity", "8.3"], vec!["", "x"]]);
    }

    #[test]
    fn margins_are_trimmed() {
        let grid: Grid = vec![
            vec!["".into(), "".into(), "".into()],
            vec!["".into(), "a".into(), "b".into()],
            vec!["".into(), "".into(), "c".into()],
        ];
        assert_eq!(trim_empty_margins(grid), vec![vec!["a", "b"], vec!["", "c"]]);
        let blank: Grid = vec![vec!["".into(), " ".into()], vec!["".into(), "".into()]];
        assert_eq!(trim_empty_margins(blank), vec![vec![""]]);
    }
}
