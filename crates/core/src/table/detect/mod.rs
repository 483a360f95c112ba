//! Table region detectors.
//!
//! Each detector proposes candidate table rectangles for a page. They are
//! tried in the order configured by [`TableSettings::detectors`]; the first
//! one returning a region wins unless `collect_all` is set.

mod alignment;
mod layout;
mod native;
mod ruled;
mod spacing;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page::PageSource;

use super::geometry::covered_fraction;
use super::settings::TableSettings;
use super::types::{BBox, TableRegion, normalize_cells};

pub use alignment::TextAlignmentDetector;
pub use layout::LayoutDetector;
pub use native::NativeDetector;
pub use ruled::{RuledLineDetector, line_mask};
pub use spacing::RegularGridDetector;

/// Identifies one detection strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Tables reported by the page engine itself.
    Native,
    RuledLines,
    Layout,
    RegularGrid,
    TextAlignment,
}

impl DetectorKind {
    pub const DEFAULT_ORDER: [DetectorKind; 5] = [
        DetectorKind::Native,
        DetectorKind::RuledLines,
        DetectorKind::Layout,
        DetectorKind::RegularGrid,
        DetectorKind::TextAlignment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Native => "native",
            DetectorKind::RuledLines => "ruled_lines",
            DetectorKind::Layout => "layout",
            DetectorKind::RegularGrid => "regular_grid",
            DetectorKind::TextAlignment => "text_alignment",
        }
    }

    /// The detector implementing this strategy.
    pub fn detector(&self) -> &'static dyn TableDetector {
        match self {
            DetectorKind::Native => &NativeDetector,
            DetectorKind::RuledLines => &RuledLineDetector,
            DetectorKind::Layout => &LayoutDetector,
            DetectorKind::RegularGrid => &RegularGridDetector,
            DetectorKind::TextAlignment => &TextAlignmentDetector,
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "native" => Ok(DetectorKind::Native),
            "ruled_lines" | "ruled" | "lines" => Ok(DetectorKind::RuledLines),
            "layout" => Ok(DetectorKind::Layout),
            "regular_grid" | "grid" => Ok(DetectorKind::RegularGrid),
            "text_alignment" | "alignment" => Ok(DetectorKind::TextAlignment),
            other => Err(format!("unknown detector: {other}")),
        }
    }
}

/// A strategy proposing table regions for a page.
///
/// Detectors never fail: missing evidence or collaborator errors both
/// produce an empty list.
pub trait TableDetector: Sync {
    fn kind(&self) -> DetectorKind;

    fn detect(&self, page: &dyn PageSource, settings: &TableSettings) -> Vec<TableRegion>;
}

/// Result of running the detector chain on one page.
#[derive(Debug, Default)]
pub struct Detection {
    pub regions: Vec<TableRegion>,
    /// Detector that produced the regions (the first contributor when
    /// collecting from all of them).
    pub detector: Option<DetectorKind>,
}

/// Run the configured detectors on `page`.
pub fn detect_regions(page: &dyn PageSource, settings: &TableSettings) -> Detection {
    let mut detection = Detection::default();
    for kind in &settings.detectors {
        let found = kind.detector().detect(page, settings);
        debug!(detector = %kind, regions = found.len(), "detector finished");
        if found.is_empty() {
            continue;
        }
        if !settings.collect_all {
            return Detection {
                regions: found,
                detector: Some(*kind),
            };
        }
        detection.detector.get_or_insert(*kind);
        for region in found {
            let duplicate = region_bbox(&region).is_some_and(|bbox| {
                detection.regions.iter().any(|kept| {
                    region_bbox(kept)
                        .is_some_and(|other| covered_fraction(bbox, other) > settings.overlap_ratio)
                })
            });
            if !duplicate {
                detection.regions.push(region);
            }
        }
    }
    detection
}

/// Bounding box of a region: its own rectangle or the union of its cells.
pub fn region_bbox(region: &TableRegion) -> Option<BBox> {
    region.bbox.or_else(|| {
        super::geometry::union_all(normalize_cells(&region.cells).into_iter().map(|c| c.bbox))
    })
}

/// Union of `members`, padded and clamped to the page.
fn padded_union<I>(members: I, page: BBox, settings: &TableSettings) -> Option<BBox>
where
    I: IntoIterator<Item = BBox>,
{
    let union = super::geometry::union_all(members)?;
    let pad = super::geometry::region_padding(page, settings.region_padding_ratio);
    Some(super::geometry::pad_and_clamp(union, pad, page))
}

/// Non-blank text lines of a page; collaborator failures yield nothing.
fn content_lines(page: &dyn PageSource, detector: DetectorKind) -> Vec<crate::page::TextLine> {
    match page.text_lines() {
        Ok(lines) => lines.into_iter().filter(|l| l.has_text()).collect(),
        Err(e) => {
            tracing::warn!(detector = %detector, error = %e, "cannot read text lines");
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory pages for detector tests.

    use image::DynamicImage;

    use crate::error::{Result, TableError};
    use crate::page::{BlockKind, NativeTable, PageSource, TextBlock, TextLine, TextSpan};
    use crate::table::BBox;

    pub struct TestPage {
        pub rect: BBox,
        pub blocks: Vec<TextBlock>,
        pub tables: Vec<NativeTable>,
        pub raster: Option<DynamicImage>,
    }

    impl TestPage {
        pub fn new(width: f64, height: f64) -> Self {
            Self {
                rect: BBox::new(0.0, 0.0, width, height),
                blocks: Vec::new(),
                tables: Vec::new(),
                raster: None,
            }
        }

        /// Add a single-line, single-span text block.
        pub fn text(mut self, x0: f64, top: f64, x1: f64, bottom: f64, text: &str) -> Self {
            let bbox = BBox::new(x0, top, x1, bottom);
            self.blocks.push(TextBlock {
                bbox,
                kind: BlockKind::Text,
                lines: vec![TextLine {
                    bbox,
                    spans: vec![TextSpan {
                        bbox,
                        text: text.to_string(),
                        font: String::new(),
                        size: bottom - top,
                    }],
                }],
            });
            self
        }
    }

    impl PageSource for TestPage {
        fn page_rect(&self) -> BBox {
            self.rect
        }

        fn text_blocks(&self) -> Result<Vec<TextBlock>> {
            Ok(self.blocks.clone())
        }

        fn render_region(&self, rect: BBox, scale: f64) -> Result<DynamicImage> {
            let raster = self.raster.as_ref().ok_or(TableError::RenderUnavailable)?;
            let x = (rect.x0 * scale).max(0.0) as u32;
            let y = (rect.top * scale).max(0.0) as u32;
            let w = (rect.width() * scale).round().max(1.0) as u32;
            let h = (rect.height() * scale).round().max(1.0) as u32;
            Ok(raster.crop_imm(x, y, w, h))
        }

        fn native_tables(&self) -> Result<Vec<NativeTable>> {
            Ok(self.tables.clone())
        }
    }
}
