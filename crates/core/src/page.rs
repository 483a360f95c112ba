//! Page collaborator interfaces.
//!
//! PDF decoding and rasterization live outside this crate. A page engine
//! implements [`PageSource`] (and [`DocumentSource`] for whole documents);
//! the table pipeline only ever talks to these traits.

use image::DynamicImage;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::{BBox, Matrix, RawCell, TableRegion};

/// A run of text sharing one font.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub bbox: BBox,
    pub text: String,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub size: f64,
}

/// A line of spans.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: BBox,
    #[serde(default)]
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn has_text(&self) -> bool {
        self.spans.iter().any(|s| !s.text.trim().is_empty())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Text,
    Image,
}

/// A page block as reported by the text layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: BBox,
    #[serde(default, rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Concatenated span text, lines separated by `\n`.
    pub fn text(&self) -> String {
        self.lines.iter().map(TextLine::text).join("\n")
    }

    pub fn has_text(&self) -> bool {
        self.kind == BlockKind::Text && self.lines.iter().any(TextLine::has_text)
    }
}

/// A table object from a native extraction engine.
///
/// Engines expose either a cell list, a plain matrix, or both.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NativeTable {
    #[serde(default)]
    pub bbox: Option<BBox>,
    #[serde(default)]
    pub cells: Vec<RawCell>,
    #[serde(default)]
    pub matrix: Option<Matrix>,
}

impl From<NativeTable> for TableRegion {
    fn from(t: NativeTable) -> Self {
        TableRegion {
            bbox: t.bbox,
            cells: t.cells,
            matrix: t.matrix,
            ..Default::default()
        }
    }
}

/// One page of a source document.
pub trait PageSource {
    /// Page rectangle in page units, top-left origin.
    fn page_rect(&self) -> BBox;

    /// All blocks of the page in engine order.
    fn text_blocks(&self) -> Result<Vec<TextBlock>>;

    /// Every text line on the page.
    fn text_lines(&self) -> Result<Vec<TextLine>> {
        Ok(self
            .text_blocks()?
            .into_iter()
            .filter(|b| b.kind == BlockKind::Text)
            .flat_map(|b| b.lines)
            .collect())
    }

    /// Lines restricted to `clip`: spans whose center lies outside are removed
    /// and lines left without spans are dropped.
    fn text_lines_in(&self, clip: BBox) -> Result<Vec<TextLine>> {
        let mut out = Vec::new();
        for mut line in self.text_lines()? {
            line.spans
                .retain(|s| clip.contains_point(s.bbox.h_center(), s.bbox.v_center()));
            if !line.spans.is_empty() {
                out.push(line);
            }
        }
        Ok(out)
    }

    /// Render `rect` at `scale` pixels per page unit.
    fn render_region(&self, rect: BBox, scale: f64) -> Result<DynamicImage>;

    /// Tables found by the engine itself, if it has such a facility.
    fn native_tables(&self) -> Result<Vec<NativeTable>> {
        Ok(Vec::new())
    }
}

impl<P: PageSource + ?Sized> PageSource for &P {
    fn page_rect(&self) -> BBox {
        (**self).page_rect()
    }
    fn text_blocks(&self) -> Result<Vec<TextBlock>> {
        (**self).text_blocks()
    }
    fn text_lines(&self) -> Result<Vec<TextLine>> {
        (**self).text_lines()
    }
    fn text_lines_in(&self, clip: BBox) -> Result<Vec<TextLine>> {
        (**self).text_lines_in(clip)
    }
    fn render_region(&self, rect: BBox, scale: f64) -> Result<DynamicImage> {
        (**self).render_region(rect, scale)
    }
    fn native_tables(&self) -> Result<Vec<NativeTable>> {
        (**self).native_tables()
    }
}

/// An opened source document.
pub trait DocumentSource {
    type Page<'a>: PageSource
    where
        Self: 'a;

    fn page_count(&self) -> usize;

    fn page(&self, index: usize) -> Result<Self::Page<'_>>;
}
