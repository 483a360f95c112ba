//! Grid validation and repair.
//!
//! Grids reach the writer through this module only. Whatever the extraction
//! stage produced, the output is rectangular, holds only printable text and
//! carries merge spans that lie inside the grid.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::settings::{DEFAULT_MAX_CELL_CHARS, DEFAULT_PLACEHOLDER, TableSettings};
use super::types::{Grid, MergeSpan};

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

const ELLIPSIS: &str = "...";

/// A cell value of arbitrary type.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Anything else (objects, nested lists); rendered as JSON.
    Other(Value),
}

impl CellValue {
    fn into_string(self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s,
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format!("{f:?}"),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Other(v) => v.to_string(),
        }
    }
}

impl From<Value> for CellValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => CellValue::Empty,
            Value::String(s) => CellValue::Text(s),
            Value::Bool(b) => CellValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map_or(CellValue::Other(Value::Number(n)), CellValue::Float),
            },
            other => CellValue::Other(other),
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Empty, Into::into)
    }
}

/// One row of an unvalidated grid.
#[derive(Clone, Debug, PartialEq)]
pub enum RawRow {
    Cells(Vec<CellValue>),
    /// Not a list at all; becomes an empty row.
    Malformed,
}

/// An unvalidated grid.
#[derive(Clone, Debug, PartialEq)]
pub enum RawGrid {
    Missing,
    Rows(Vec<RawRow>),
}

impl<T: Into<CellValue>> From<Vec<Vec<T>>> for RawGrid {
    fn from(rows: Vec<Vec<T>>) -> Self {
        RawGrid::Rows(
            rows.into_iter()
                .map(|r| RawRow::Cells(r.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

impl<T: Into<CellValue>> From<Option<Vec<Vec<T>>>> for RawGrid {
    fn from(rows: Option<Vec<Vec<T>>>) -> Self {
        rows.map_or(RawGrid::Missing, RawGrid::from)
    }
}

impl From<Value> for RawGrid {
    fn from(v: Value) -> Self {
        match v {
            Value::Array(rows) => RawGrid::Rows(
                rows.into_iter()
                    .map(|row| match row {
                        Value::Array(cells) => {
                            RawRow::Cells(cells.into_iter().map(CellValue::from).collect())
                        }
                        _ => RawRow::Malformed,
                    })
                    .collect(),
            ),
            _ => RawGrid::Missing,
        }
    }
}

/// Repair limits.
#[derive(Clone, Debug)]
pub struct Validator {
    pub placeholder: String,
    pub max_cell_chars: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_cell_chars: DEFAULT_MAX_CELL_CHARS,
        }
    }
}

impl From<&TableSettings> for Validator {
    fn from(s: &TableSettings) -> Self {
        Self {
            placeholder: s.placeholder.clone(),
            max_cell_chars: s.max_cell_chars,
        }
    }
}

impl Validator {
    /// Repair `grid` and `merges`.
    ///
    /// An absent or empty grid yields empty output, which callers treat as
    /// "no table data". Any other input yields a rectangular grid of at least
    /// one cell and spans clamped into it.
    pub fn validate(
        &self,
        grid: impl Into<RawGrid>,
        merges: &[[i64; 4]],
    ) -> (Grid, Vec<MergeSpan>) {
        let rows = match grid.into() {
            RawGrid::Rows(rows) if !rows.is_empty() => rows,
            _ => return (Vec::new(), Vec::new()),
        };

        let col_count = rows
            .iter()
            .map(|r| match r {
                RawRow::Cells(cells) => cells.len(),
                RawRow::Malformed => 0,
            })
            .max()
            .unwrap_or(0);

        let mut fixed: Grid = if col_count == 0 {
            debug!("grid has no columns, using placeholder");
            vec![vec![self.placeholder.clone()]]
        } else {
            rows.into_iter()
                .map(|row| {
                    let mut cells: Vec<String> = match row {
                        RawRow::Cells(cells) => cells
                            .into_iter()
                            .take(col_count)
                            .map(|v| self.clean(v.into_string()))
                            .collect(),
                        RawRow::Malformed => Vec::new(),
                    };
                    cells.resize(col_count, String::new());
                    cells
                })
                .collect()
        };
        if fixed.is_empty() {
            fixed = vec![vec![self.placeholder.clone()]];
        }

        let spans = clamp_spans(merges, fixed.len(), fixed[0].len());
        (fixed, spans)
    }

    fn clean(&self, text: String) -> String {
        let collapsed = SPACE_RUNS.replace_all(&text, " ");
        let cleaned: String = collapsed
            .trim()
            .chars()
            .map(|c| if is_printable(c) || c == '\n' || c == '\t' { c } else { ' ' })
            .collect();
        if cleaned.chars().count() > self.max_cell_chars {
            let marker = &ELLIPSIS[..ELLIPSIS.len().min(self.max_cell_chars)];
            let keep = self.max_cell_chars - marker.len();
            let mut truncated: String = cleaned.chars().take(keep).collect();
            truncated.push_str(marker);
            truncated
        } else {
            cleaned
        }
    }
}

/// Validate with the default placeholder and cell length limit.
pub fn validate(grid: impl Into<RawGrid>, merges: &[[i64; 4]]) -> (Grid, Vec<MergeSpan>) {
    Validator::default().validate(grid, merges)
}

/// Clamp every span into a `rows` x `cols` grid, swapping reversed bounds.
fn clamp_spans(merges: &[[i64; 4]], rows: usize, cols: usize) -> Vec<MergeSpan> {
    let clamp = |start: i64, end: i64, n: usize| -> (usize, usize) {
        let last = n.saturating_sub(1) as i64;
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let lo = lo.clamp(0, last);
        let hi = hi.clamp(lo, last);
        (lo as usize, hi as usize)
    };
    merges
        .iter()
        .map(|&[rs, cs, re, ce]| {
            let (row_start, row_end) = clamp(rs, re, rows);
            let (col_start, col_end) = clamp(cs, ce, cols);
            MergeSpan::new(row_start, col_start, row_end, col_end)
        })
        .collect()
}

/// Whether a character renders as visible text or a plain space.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}
