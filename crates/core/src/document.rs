//! A document backed by a JSON page dump.
//!
//! The dump carries what a PDF engine would report for each page: its size,
//! text blocks with lines and spans, optional native tables, and optionally
//! a pre-rendered raster of the page used for ruled-line detection and image
//! fallbacks.
//!
//! ```json
//! {"pages": [{"width": 612, "height": 792,
//!             "raster": "page-1.png", "raster_scale": 2.0,
//!             "blocks": [{"bbox": [72, 72, 300, 90], "type": "text",
//!                         "lines": [{"bbox": [72, 72, 300, 90],
//!                                    "spans": [{"bbox": [72, 72, 300, 90], "text": "Title"}]}]}],
//!             "tables": [{"cells": [[72, 100, 200, 120, "A1"]]}]}]}
//! ```

use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::imageops::FilterType;
use serde::Deserialize;

use crate::error::{Result, TableError};
use crate::page::{DocumentSource, NativeTable, PageSource, TextBlock};
use crate::table::BBox;

fn default_raster_scale() -> f64 {
    1.0
}

/// One page of a [`JsonDocument`].
#[derive(Clone, Debug, Deserialize)]
pub struct JsonPage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    #[serde(default)]
    pub tables: Vec<NativeTable>,
    /// Raster image of the whole page.
    #[serde(default)]
    pub raster: Option<PathBuf>,
    /// Raster pixels per page unit.
    #[serde(default = "default_raster_scale")]
    pub raster_scale: f64,
}

impl PageSource for JsonPage {
    fn page_rect(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    fn text_blocks(&self) -> Result<Vec<TextBlock>> {
        Ok(self.blocks.clone())
    }

    fn render_region(&self, rect: BBox, scale: f64) -> Result<DynamicImage> {
        let path = self.raster.as_ref().ok_or(TableError::RenderUnavailable)?;
        if !(scale > 0.0 && self.raster_scale > 0.0) {
            return Err(TableError::RenderFailed(format!("invalid scale {scale}")));
        }
        let raster = image::open(path)
            .map_err(|e| TableError::RenderFailed(format!("{}: {e}", path.display())))?;

        let (w, h) = (f64::from(raster.width()), f64::from(raster.height()));
        let x0 = (rect.x0 * self.raster_scale).clamp(0.0, w);
        let y0 = (rect.top * self.raster_scale).clamp(0.0, h);
        let x1 = (rect.x1 * self.raster_scale).clamp(x0, w);
        let y1 = (rect.bottom * self.raster_scale).clamp(y0, h);
        let (cw, ch) = ((x1 - x0).round() as u32, (y1 - y0).round() as u32);
        if cw == 0 || ch == 0 {
            return Err(TableError::RenderFailed(format!(
                "region {:?} lies outside the page raster",
                <[f64; 4]>::from(rect)
            )));
        }
        let crop = raster.crop_imm(x0 as u32, y0 as u32, cw, ch);

        let tw = (rect.width() * scale).round().max(1.0) as u32;
        let th = (rect.height() * scale).round().max(1.0) as u32;
        if (tw, th) == (crop.width(), crop.height()) {
            Ok(crop)
        } else {
            Ok(crop.resize_exact(tw, th, FilterType::Triangle))
        }
    }

    fn native_tables(&self) -> Result<Vec<NativeTable>> {
        Ok(self.tables.clone())
    }
}

/// Pages loaded from a JSON dump.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JsonDocument {
    #[serde(default)]
    pub pages: Vec<JsonPage>,
}

impl JsonDocument {
    /// Parse a dump. Relative raster paths stay relative to the working
    /// directory.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a dump from disk. Relative raster paths are resolved against the
    /// directory of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TableError::DocumentUnavailable(format!("{}: {e}", path.display())))?;
        let mut doc = Self::from_json_str(&text)?;
        if let Some(dir) = path.parent() {
            for page in &mut doc.pages {
                if let Some(raster) = page.raster.as_mut().filter(|r| r.is_relative()) {
                    *raster = dir.join(&*raster);
                }
            }
        }
        Ok(doc)
    }
}

impl DocumentSource for JsonDocument {
    type Page<'a> = &'a JsonPage;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Self::Page<'_>> {
        self.pages.get(index).ok_or(TableError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}
