//! Row and column boundaries of a table region.

use tracing::{debug, warn};

use crate::page::{PageSource, TextLine};

use super::clustering::{cluster, distinct_sorted};
use super::settings::TableSettings;
use super::types::{BBox, TableRegion, normalize_cells};

/// Ascending row (y) and column (x) boundaries tiling a region.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    pub rows: Vec<f64>,
    pub cols: Vec<f64>,
}

impl Structure {
    pub fn row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn col_count(&self) -> usize {
        self.cols.len().saturating_sub(1)
    }

    /// Row and column index of the cell containing `(x, y)`.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        Some((band_index(&self.rows, y)?, band_index(&self.cols, x)?))
    }
}

/// Index `i` such that `bounds[i] <= v <= bounds[i + 1]`.
fn band_index(bounds: &[f64], v: f64) -> Option<usize> {
    if bounds.len() < 2 || v < bounds[0] || v > bounds[bounds.len() - 1] {
        return None;
    }
    let i = bounds.partition_point(|b| *b <= v);
    Some(i.saturating_sub(1).min(bounds.len() - 2))
}

/// Derive the structure of `region` (whose rectangle is `bbox`) from the
/// page text inside it.
///
/// Returns `None` when the region has no usable structure; the caller then
/// falls back to capturing the region as an image.
pub fn extract_structure(
    region: &TableRegion,
    bbox: BBox,
    page: &dyn PageSource,
    settings: &TableSettings,
) -> Option<Structure> {
    if let Some(explicit) = explicit_structure(region) {
        return Some(explicit);
    }
    let lines = match page.text_lines_in(bbox) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(error = %e, "cannot read text inside region");
            return None;
        }
    };
    structure_from_geometry(region, bbox, &lines, settings)
}

/// Boundaries given by the region itself.
fn explicit_structure(region: &TableRegion) -> Option<Structure> {
    let rows = distinct_sorted(region.rows.clone()?);
    let cols = distinct_sorted(region.cols.clone()?);
    (rows.len() >= 2 && cols.len() >= 2).then_some(Structure { rows, cols })
}

/// Cluster cell edges, or else line tops and span left edges, into
/// boundaries and snap them to the region edges.
pub fn structure_from_geometry(
    region: &TableRegion,
    bbox: BBox,
    lines: &[TextLine],
    settings: &TableSettings,
) -> Option<Structure> {
    let cells = normalize_cells(&region.cells);
    let (ys, xs): (Vec<f64>, Vec<f64>) = if cells.is_empty() {
        let ys = lines.iter().map(|l| l.bbox.top).collect();
        let xs = lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.bbox.x0))
            .collect();
        (ys, xs)
    } else {
        let ys = cells.iter().flat_map(|c| [c.bbox.top, c.bbox.bottom]).collect();
        let xs = cells.iter().flat_map(|c| [c.bbox.x0, c.bbox.x1]).collect();
        (ys, xs)
    };

    let row_tol = bbox.height() * settings.structure_tolerance_ratio + settings.row_tolerance_extra;
    let col_tol = bbox.width() * settings.structure_tolerance_ratio + settings.col_tolerance_extra;
    let rows = snap_to_edges(cluster(&ys, row_tol), bbox.top, bbox.bottom, settings.edge_snap);
    let cols = snap_to_edges(cluster(&xs, col_tol), bbox.x0, bbox.x1, settings.edge_snap);

    let structure = Structure { rows, cols };
    debug!(
        rows = structure.row_count(),
        cols = structure.col_count(),
        "region structure"
    );
    if structure.row_count() == 0 || structure.col_count() == 0 {
        return None;
    }
    Some(structure)
}

/// Insert `start` / append `end` when the outermost boundaries stop more than
/// `snap` short of them.
fn snap_to_edges(mut bounds: Vec<f64>, start: f64, end: f64, snap: f64) -> Vec<f64> {
    if bounds.first().is_none_or(|first| first - start > snap) {
        bounds.insert(0, start);
    }
    if bounds.last().is_none_or(|last| end - last > snap) {
        bounds.push(end);
    }
    bounds
}
