//! Page and document drivers.
//!
//! A page is processed in isolation: detection, region merging, and the
//! image fallback for regions without table data. Collaborator failures
//! become diagnostics on the page output, never errors.

use std::io::Cursor;

use image::ImageFormat;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::page::{DocumentSource, PageSource};
use crate::table::{
    BBox, DetectorKind, ImageBlock, PageBlock, TableBlock, TableSettings, detect_regions,
    merge_regions, order_blocks,
};

/// Ordered block stream of one page.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PageOutput {
    pub index: usize,
    pub blocks: Vec<PageBlock>,
    /// Detector whose regions were used.
    pub detector: Option<DetectorKind>,
    /// Recoverable problems met while processing the page.
    pub diagnostics: Vec<String>,
}

impl PageOutput {
    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(PageBlock::as_table)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageBlock> {
        self.blocks.iter().filter_map(|b| match b {
            PageBlock::Image(img) => Some(img),
            _ => None,
        })
    }
}

/// Runs the table pipeline over pages and documents.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    settings: TableSettings,
}

impl Converter {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    /// Process one page.
    pub fn process_page(&self, page: &dyn PageSource, index: usize) -> PageOutput {
        let mut output = PageOutput {
            index,
            ..Default::default()
        };
        let content = match page.text_blocks() {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!(page = index, error = %e, "cannot read page content");
                output.diagnostics.push(format!("page content unavailable: {e}"));
                Vec::new()
            }
        };

        let detection = detect_regions(page, &self.settings);
        output.detector = detection.detector;
        let merged = merge_regions(content, &detection.regions, page, &self.settings);
        for _ in 0..merged.unlocated {
            output
                .diagnostics
                .push("table region without bbox or cells skipped".into());
        }

        let mut images = Vec::new();
        for bbox in merged.fallbacks {
            match render_fallback(page, bbox, self.settings.fallback_scale) {
                Ok(image) => images.push(PageBlock::Image(image)),
                Err(e) => {
                    warn!(
                        page = index,
                        ?bbox,
                        error = %e,
                        "region omitted, fallback render failed"
                    );
                    output
                        .diagnostics
                        .push(format!("region {:?} omitted: {e}", <[f64; 4]>::from(bbox)));
                }
            }
        }

        output.blocks = if images.is_empty() {
            merged.blocks
        } else {
            let (content, mut covering): (Vec<_>, Vec<_>) = merged
                .blocks
                .into_iter()
                .partition(|b| matches!(b, PageBlock::Content(_)));
            covering.extend(images);
            let content = content
                .into_iter()
                .filter_map(|b| match b {
                    PageBlock::Content(c) => Some(c),
                    _ => None,
                })
                .collect();
            order_blocks(content, covering, self.settings.overlap_ratio)
        };

        info!(
            page = index,
            detector = ?output.detector,
            tables = output.tables().count(),
            images = output.images().count(),
            blocks = output.blocks.len(),
            "page processed"
        );
        output
    }

    /// Process the page at `index` of `doc`; an unreadable page yields an
    /// empty output carrying the error as a diagnostic.
    pub fn convert_page<D: DocumentSource>(&self, doc: &D, index: usize) -> PageOutput {
        match doc.page(index) {
            Ok(page) => self.process_page(&page, index),
            Err(e) => {
                warn!(page = index, error = %e, "page skipped");
                PageOutput {
                    index,
                    diagnostics: vec![e.to_string()],
                    ..Default::default()
                }
            }
        }
    }

    /// Process every page in order.
    pub fn convert_document<D: DocumentSource>(&self, doc: &D) -> Vec<PageOutput> {
        (0..doc.page_count()).map(|i| self.convert_page(doc, i)).collect()
    }

    /// Process selected pages in the given order.
    pub fn convert_pages<D: DocumentSource>(&self, doc: &D, indices: &[usize]) -> Vec<PageOutput> {
        indices.iter().map(|&i| self.convert_page(doc, i)).collect()
    }

    /// Same result as [`Converter::convert_document`], pages spread over the
    /// rayon pool.
    pub fn convert_document_parallel<D>(&self, doc: &D) -> Vec<PageOutput>
    where
        D: DocumentSource + Sync,
    {
        (0..doc.page_count())
            .into_par_iter()
            .map(|i| self.convert_page(doc, i))
            .collect()
    }
}

/// Render `bbox` and encode it as PNG.
fn render_fallback(page: &dyn PageSource, bbox: BBox, scale: f64) -> Result<ImageBlock> {
    let image = page.render_region(bbox, scale)?;
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(ImageBlock {
        bbox,
        scale,
        width: image.width(),
        height: image.height(),
        png,
    })
}
