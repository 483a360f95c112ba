use tracing::{debug, warn};

use crate::page::PageSource;
use crate::table::clustering::{cluster, group_by_anchor};
use crate::table::settings::TableSettings;
use crate::table::types::TableRegion;

use super::{DetectorKind, TableDetector, padded_union};

/// Finds tables laid out as text blocks arranged in rows and columns.
///
/// Blocks are grouped into rows by vertical center; rows with at least two
/// blocks are kept, and their horizontal centers must form at least two
/// column clusters.
pub struct LayoutDetector;

impl TableDetector for LayoutDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Layout
    }

    fn detect(&self, page: &dyn PageSource, settings: &TableSettings) -> Vec<TableRegion> {
        let blocks = match page.text_blocks() {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!(error = %e, "cannot read text blocks");
                return Vec::new();
            }
        };
        let candidates: Vec<_> = blocks.into_iter().filter(|b| b.has_text()).collect();
        if candidates.len() < settings.min_candidate_blocks {
            return Vec::new();
        }

        let rect = page.page_rect();
        let row_tol = rect.height() * settings.layout_row_tolerance_ratio;
        let rows: Vec<_> = group_by_anchor(&candidates, |b| b.bbox.v_center(), row_tol)
            .into_iter()
            .map(|(_, members)| members)
            .filter(|members| members.len() >= 2)
            .collect();
        if rows.len() < 2 {
            debug!(rows = rows.len(), "not enough block rows");
            return Vec::new();
        }

        let centers: Vec<f64> = rows.iter().flatten().map(|b| b.bbox.h_center()).collect();
        let col_tol = rect.width() * settings.layout_col_tolerance_ratio;
        let cols = cluster(&centers, col_tol);
        if cols.len() < 2 {
            debug!("block centers form a single column");
            return Vec::new();
        }

        let Some(bbox) = padded_union(rows.iter().flatten().map(|b| b.bbox), rect, settings)
        else {
            return Vec::new();
        };
        vec![
            TableRegion::detected(bbox, DetectorKind::Layout)
                .with_hints(Some(rows.len()), Some(cols.len())),
        ]
    }
}
