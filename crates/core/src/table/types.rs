//! Table pipeline types.

use serde::{Deserialize, Serialize};

use crate::page::TextBlock;

use super::detect::DetectorKind;

/// An axis-aligned rectangle in page units, top-left origin.
///
/// Serialized as `[x0, top, x1, bottom]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    /// Build a box, swapping coordinates so that `x1 >= x0` and `bottom >= top`.
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    /// Read the first four components of a coordinate list.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        if values.len() < 4 || values[..4].iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self::new(values[0], values[1], values[2], values[3]))
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
    pub fn h_center(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }
    pub fn v_center(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.top, b.x1, b.bottom]
    }
}

impl From<(f64, f64, f64, f64)> for BBox {
    fn from(v: (f64, f64, f64, f64)) -> Self {
        BBox::new(v.0, v.1, v.2, v.3)
    }
}

/// A table cell after normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub bbox: BBox,
    pub text: String,
}

impl Cell {
    pub fn new(bbox: impl Into<BBox>, text: impl Into<String>) -> Self {
        Self {
            bbox: bbox.into(),
            text: text.into(),
        }
    }
}

/// A cell as handed over by a collaborator.
///
/// Native extraction results arrive as [`RawCell::Cell`], page dumps carry
/// either `{"bbox": [...], "text": "..."}` records or `[x0, top, x1, bottom, text?]`
/// tuples. Everything is funnelled through [`RawCell::normalize`].
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Record {
        bbox: Vec<f64>,
        #[serde(default)]
        text: Option<String>,
    },
    Tuple(Vec<serde_json::Value>),
    #[serde(skip)]
    Cell(Cell),
}

impl RawCell {
    /// Map any representation onto a [`Cell`]. Returns `None` when fewer than
    /// four numeric coordinates are available.
    pub fn normalize(&self) -> Option<Cell> {
        match self {
            RawCell::Cell(cell) => Some(cell.clone()),
            RawCell::Record { bbox, text } => Some(Cell {
                bbox: BBox::from_slice(bbox)?,
                text: text.clone().unwrap_or_default(),
            }),
            RawCell::Tuple(values) => {
                if values.len() < 4 {
                    return None;
                }
                let coords: Option<Vec<f64>> = values[..4].iter().map(|v| v.as_f64()).collect();
                let bbox = BBox::from_slice(&coords?)?;
                let text = values
                    .get(4)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(Cell { bbox, text })
            }
        }
    }
}

impl From<Cell> for RawCell {
    fn from(cell: Cell) -> Self {
        RawCell::Cell(cell)
    }
}

impl From<(f64, f64, f64, f64)> for RawCell {
    fn from(v: (f64, f64, f64, f64)) -> Self {
        RawCell::Cell(Cell::new(v, ""))
    }
}

impl From<(f64, f64, f64, f64, &str)> for RawCell {
    fn from(v: (f64, f64, f64, f64, &str)) -> Self {
        RawCell::Cell(Cell::new((v.0, v.1, v.2, v.3), v.4))
    }
}

/// Normalize a cell list, dropping entries without usable geometry.
pub fn normalize_cells(cells: &[RawCell]) -> Vec<Cell> {
    cells.iter().filter_map(RawCell::normalize).collect()
}

/// A plain string matrix as returned by a native table's `extract()`.
pub type Matrix = Vec<Vec<Option<String>>>;

/// Logical rows x cols array of cell text.
pub type Grid = Vec<Vec<String>>;

/// A candidate table area proposed by a detector or a native extractor.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TableRegion {
    #[serde(default)]
    pub bbox: Option<BBox>,
    #[serde(default)]
    pub cells: Vec<RawCell>,
    /// Explicit row boundaries (ascending y).
    #[serde(default)]
    pub rows: Option<Vec<f64>>,
    /// Explicit column boundaries (ascending x).
    #[serde(default)]
    pub cols: Option<Vec<f64>>,
    #[serde(default)]
    pub matrix: Option<Matrix>,
    /// Already assembled grid and spans.
    #[serde(default)]
    pub table_data: Option<Grid>,
    #[serde(default)]
    pub merged_cells: Vec<[i64; 4]>,
    #[serde(default)]
    pub row_hint: Option<usize>,
    #[serde(default)]
    pub col_hint: Option<usize>,
    #[serde(skip)]
    pub origin: Option<DetectorKind>,
}

impl TableRegion {
    /// A bare rectangle produced by a layout heuristic.
    pub fn detected(bbox: BBox, origin: DetectorKind) -> Self {
        Self {
            bbox: Some(bbox),
            origin: Some(origin),
            ..Default::default()
        }
    }

    pub fn with_hints(mut self, rows: Option<usize>, cols: Option<usize>) -> Self {
        self.row_hint = rows;
        self.col_hint = cols;
        self
    }
}

/// A merged range of grid positions, inclusive on all bounds.
///
/// Serialized as `[row_start, col_start, row_end, col_end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 4]", into = "[usize; 4]")]
pub struct MergeSpan {
    pub row_start: usize,
    pub col_start: usize,
    pub row_end: usize,
    pub col_end: usize,
}

impl MergeSpan {
    pub const fn new(row_start: usize, col_start: usize, row_end: usize, col_end: usize) -> Self {
        Self {
            row_start,
            col_start,
            row_end,
            col_end,
        }
    }

    /// A 1x1 span, which writers must treat as a no-op.
    pub fn is_single_cell(&self) -> bool {
        self.row_start == self.row_end && self.col_start == self.col_end
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_start..=self.row_end).contains(&row)
            && (self.col_start..=self.col_end).contains(&col)
    }
}

impl From<[usize; 4]> for MergeSpan {
    fn from(v: [usize; 4]) -> Self {
        MergeSpan::new(v[0], v[1], v[2], v[3])
    }
}

impl From<MergeSpan> for [usize; 4] {
    fn from(s: MergeSpan) -> Self {
        [s.row_start, s.col_start, s.row_end, s.col_end]
    }
}

impl From<MergeSpan> for [i64; 4] {
    fn from(s: MergeSpan) -> Self {
        [
            s.row_start as i64,
            s.col_start as i64,
            s.row_end as i64,
            s.col_end as i64,
        ]
    }
}

/// Final pipeline output for one detected table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableBlock {
    pub bbox: BBox,
    pub grid: Grid,
    pub merges: Vec<MergeSpan>,
    pub row_count: usize,
    pub col_count: usize,
}

impl TableBlock {
    /// Wrap a validated grid. Returns `None` for an empty grid.
    pub fn new(bbox: BBox, grid: Grid, merges: Vec<MergeSpan>) -> Option<Self> {
        let row_count = grid.len();
        let col_count = grid.first().map_or(0, Vec::len);
        if row_count == 0 || col_count == 0 {
            return None;
        }
        Some(Self {
            bbox,
            grid,
            merges,
            row_count,
            col_count,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.grid.get(row)?.get(col).map(String::as_str)
    }

    /// Merge operations a writer has to issue, with 1x1 spans filtered out.
    pub fn merge_ops(&self) -> impl Iterator<Item = (usize, usize, usize, usize)> + '_ {
        self.merges
            .iter()
            .filter(|s| !s.is_single_cell())
            .map(|s| (s.row_start, s.col_start, s.row_end, s.col_end))
    }
}

/// A region rendered as a raster image instead of a native table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageBlock {
    pub bbox: BBox,
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub png: Vec<u8>,
}

/// Non-table page content.
pub type ContentBlock = TextBlock;

/// One entry of the ordered page stream handed to the document writer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageBlock {
    Content(ContentBlock),
    Table(TableBlock),
    Image(ImageBlock),
}

impl PageBlock {
    pub fn bbox(&self) -> BBox {
        match self {
            PageBlock::Content(b) => b.bbox,
            PageBlock::Table(t) => t.bbox,
            PageBlock::Image(i) => i.bbox,
        }
    }

    pub fn top(&self) -> f64 {
        self.bbox().top
    }

    pub fn as_table(&self) -> Option<&TableBlock> {
        match self {
            PageBlock::Table(t) => Some(t),
            _ => None,
        }
    }
}
