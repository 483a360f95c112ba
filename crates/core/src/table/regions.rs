//! Turning detected regions into table blocks and ordering the page stream.

use ordered_float::OrderedFloat;
use tracing::{debug, warn};

use crate::page::PageSource;

use super::detect::region_bbox;
use super::geometry::covered_fraction;
use super::grid::{build_grid, fill_from_structure, trim_empty_margins};
use super::merge::detect_merges;
use super::settings::TableSettings;
use super::structure::extract_structure;
use super::types::{BBox, ContentBlock, Grid, MergeSpan, PageBlock, TableBlock, TableRegion};
use super::validate::Validator;

/// What became of one region.
#[derive(Clone, Debug, PartialEq)]
pub enum RegionOutcome {
    Table(TableBlock),
    /// No usable table data; the region must be captured as an image.
    Fallback(BBox),
    /// The region has no geometry at all and cannot even be rendered.
    Unlocated,
}

/// Tables and content of a page in reading order, plus the regions that
/// still need an image fallback.
#[derive(Clone, Debug, Default)]
pub struct MergeResult {
    pub blocks: Vec<PageBlock>,
    pub fallbacks: Vec<BBox>,
    /// Regions dropped because they have no geometry.
    pub unlocated: usize,
}

/// Extract the grid of one region and wrap it as a table block.
pub fn resolve_region(
    region: &TableRegion,
    page: &dyn PageSource,
    settings: &TableSettings,
) -> RegionOutcome {
    let Some(bbox) = region_bbox(region) else {
        warn!("table region without bbox or cells, skipped");
        return RegionOutcome::Unlocated;
    };
    let (grid, merges) = region_grid(region, bbox, page, settings);
    match TableBlock::new(bbox, grid, merges) {
        Some(table) => {
            debug!(
                rows = table.row_count,
                cols = table.col_count,
                row_hint = ?region.row_hint,
                col_hint = ?region.col_hint,
                origin = ?region.origin,
                "table block built"
            );
            RegionOutcome::Table(table)
        }
        None => {
            debug!(?bbox, "region has no table data, falling back to image");
            RegionOutcome::Fallback(bbox)
        }
    }
}

/// Grid and merges of a region, validated.
///
/// Sources are tried in order: a precomputed grid, the native string
/// matrix, the cell list, and finally text filled into the structure
/// derived from the page. A source without a single non-blank cell counts
/// as absent. An empty result means no usable table data.
fn region_grid(
    region: &TableRegion,
    bbox: BBox,
    page: &dyn PageSource,
    settings: &TableSettings,
) -> (Grid, Vec<MergeSpan>) {
    let validator = Validator::from(settings);

    if let Some(data) = region.table_data.as_ref().filter(|d| !d.is_empty()) {
        if !has_text(data, |s| s.as_str()) {
            debug!("precomputed grid is blank");
            return (Vec::new(), Vec::new());
        }
        return validator.validate(data.clone(), &region.merged_cells);
    }

    if let Some(matrix) = region.matrix.as_ref().filter(|m| !m.is_empty()) {
        if !has_text(matrix, |s| s.as_deref().unwrap_or_default()) {
            debug!("native matrix is blank");
            return (Vec::new(), Vec::new());
        }
        let merges: Vec<[i64; 4]> = detect_merges(region, settings.boundary_match)
            .into_iter()
            .map(Into::into)
            .collect();
        return validator.validate(matrix.clone(), &merges);
    }

    if !region.cells.is_empty() {
        let (grid, merges) = build_grid(&region.cells, settings.boundary_match);
        if !has_text(&grid, |s| s.as_str()) {
            debug!(cells = region.cells.len(), "no cell could be placed with text");
            return (Vec::new(), Vec::new());
        }
        let merges: Vec<[i64; 4]> = merges.into_iter().map(Into::into).collect();
        return validator.validate(grid, &merges);
    }

    let Some(structure) = extract_structure(region, bbox, page, settings) else {
        return (Vec::new(), Vec::new());
    };
    let lines = match page.text_lines_in(bbox) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(error = %e, "cannot read text inside region");
            return (Vec::new(), Vec::new());
        }
    };
    let grid = trim_empty_margins(fill_from_structure(&structure, &lines));
    if !has_text(&grid, |s| s.as_str()) {
        return (Vec::new(), Vec::new());
    }
    validator.validate(grid, &[])
}

/// Whether any cell of `grid` holds non-whitespace text.
fn has_text<T>(grid: &[Vec<T>], text: impl Fn(&T) -> &str) -> bool {
    grid.iter().flatten().any(|cell| !text(cell).trim().is_empty())
}

/// Resolve every region and merge the resulting tables with the page
/// content. A failing region never affects the others.
pub fn merge_regions(
    content: Vec<ContentBlock>,
    regions: &[TableRegion],
    page: &dyn PageSource,
    settings: &TableSettings,
) -> MergeResult {
    let mut tables = Vec::new();
    let mut fallbacks = Vec::new();
    let mut unlocated = 0;
    for region in regions {
        match resolve_region(region, page, settings) {
            RegionOutcome::Table(table) => tables.push(PageBlock::Table(table)),
            RegionOutcome::Fallback(bbox) => fallbacks.push(bbox),
            RegionOutcome::Unlocated => unlocated += 1,
        }
    }
    MergeResult {
        blocks: order_blocks(content, tables, settings.overlap_ratio),
        fallbacks,
        unlocated,
    }
}

/// Drop content blocks covered by any of `covering` beyond `overlap_ratio`
/// of their area, then sort everything by top.
///
/// The sort is stable; on equal tops covering blocks precede content.
pub fn order_blocks(
    content: Vec<ContentBlock>,
    covering: Vec<PageBlock>,
    overlap_ratio: f64,
) -> Vec<PageBlock> {
    let areas: Vec<BBox> = covering.iter().map(PageBlock::bbox).collect();
    let mut blocks = covering;
    for block in content {
        let covered = areas
            .iter()
            .any(|area| covered_fraction(block.bbox, *area) > overlap_ratio);
        if covered {
            debug!(bbox = ?block.bbox, "content block inside table, dropped");
        } else {
            blocks.push(PageBlock::Content(block));
        }
    }
    blocks.sort_by_key(|b| OrderedFloat(b.top()));
    blocks
}
