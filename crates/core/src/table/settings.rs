//! Pipeline settings.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

use super::detect::DetectorKind;

// Default constants
pub(crate) const DEFAULT_RASTER_ZOOM: f64 = 3.0;
pub(crate) const DEFAULT_MIN_REGION_AREA: f64 = 5000.0;
pub(crate) const DEFAULT_EDGE_SNAP: f64 = 5.0;
pub(crate) const DEFAULT_OVERLAP_RATIO: f64 = 0.5;
pub(crate) const DEFAULT_MAX_CELL_CHARS: usize = 32767;
pub(crate) const DEFAULT_PLACEHOLDER: &str = "no data";

/// How cell edges are matched against the derived boundary lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum BoundaryMatch {
    /// An edge must equal a boundary exactly; otherwise the cell is skipped.
    #[default]
    Exact,
    /// Boundaries are clustered with `tolerance` and edges snap to the
    /// nearest boundary within `tolerance`.
    Nearest { tolerance: f64 },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Detectors in fallback order.
    pub detectors: Vec<DetectorKind>,
    /// Run every detector and merge their regions instead of stopping at the
    /// first one that finds something.
    pub collect_all: bool,

    // ruled-line detector
    pub raster_zoom: f64,
    pub adaptive_block_size: u32,
    pub adaptive_c: f64,
    pub line_kernel: u32,
    pub line_dilate: u32,
    pub merge_dilate: u8,
    pub min_region_area: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,

    // text-row/column layout detector
    pub layout_row_tolerance_ratio: f64,
    pub layout_col_tolerance_ratio: f64,
    pub min_candidate_blocks: usize,

    // regular-grid detector
    pub grid_gap_tolerance_ratio: f64,
    pub min_grid_rows: usize,

    // text-alignment detector
    pub alignment_tolerance_ratio: f64,
    pub min_aligned_lines: usize,
    pub min_aligned_columns: usize,

    /// Padding around heuristic regions, as a fraction of the shorter page side.
    pub region_padding_ratio: f64,

    // structure extraction
    pub structure_tolerance_ratio: f64,
    pub row_tolerance_extra: f64,
    pub col_tolerance_extra: f64,
    pub edge_snap: f64,

    pub boundary_match: BoundaryMatch,

    // validation
    pub placeholder: String,
    pub max_cell_chars: usize,

    /// Blocks covered by a table beyond this fraction of their area are dropped.
    pub overlap_ratio: f64,
    /// Pixels per page unit for image fallbacks.
    pub fallback_scale: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            detectors: DetectorKind::DEFAULT_ORDER.to_vec(),
            collect_all: false,
            raster_zoom: DEFAULT_RASTER_ZOOM,
            adaptive_block_size: 11,
            adaptive_c: 2.0,
            line_kernel: 30,
            line_dilate: 2,
            merge_dilate: 5,
            min_region_area: DEFAULT_MIN_REGION_AREA,
            min_aspect: 0.1,
            max_aspect: 10.0,
            layout_row_tolerance_ratio: 0.01,
            layout_col_tolerance_ratio: 0.03,
            min_candidate_blocks: 4,
            grid_gap_tolerance_ratio: 0.5,
            min_grid_rows: 3,
            alignment_tolerance_ratio: 0.02,
            min_aligned_lines: 3,
            min_aligned_columns: 2,
            region_padding_ratio: 0.01,
            structure_tolerance_ratio: 0.01,
            row_tolerance_extra: 2.0,
            col_tolerance_extra: 3.0,
            edge_snap: DEFAULT_EDGE_SNAP,
            boundary_match: BoundaryMatch::Exact,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_cell_chars: DEFAULT_MAX_CELL_CHARS,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            fallback_scale: 2.0,
        }
    }
}

impl TableSettings {
    /// Parse settings from JSON; missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Replace the detector order.
    pub fn with_detectors(mut self, detectors: Vec<DetectorKind>) -> Self {
        self.detectors = detectors;
        self
    }
}
