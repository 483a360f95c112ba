use tracing::debug;

use crate::page::PageSource;
use crate::table::clustering::group_by_anchor;
use crate::table::settings::TableSettings;
use crate::table::types::TableRegion;

use super::{DetectorKind, TableDetector, content_lines, padded_union};

const MIN_LINES: usize = 4;

/// Finds tables from text lines sharing a left edge.
///
/// Each group of at least `min_aligned_lines` lines starting at the same x
/// is taken as a column; `min_aligned_columns` such columns make a table.
pub struct TextAlignmentDetector;

impl TableDetector for TextAlignmentDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TextAlignment
    }

    fn detect(&self, page: &dyn PageSource, settings: &TableSettings) -> Vec<TableRegion> {
        let lines = content_lines(page, self.kind());
        if lines.len() < MIN_LINES {
            return Vec::new();
        }

        let rect = page.page_rect();
        let tolerance = rect.width() * settings.alignment_tolerance_ratio;
        let columns: Vec<_> = group_by_anchor(&lines, |l| l.bbox.x0, tolerance)
            .into_iter()
            .filter(|(_, members)| members.len() >= settings.min_aligned_lines)
            .collect();
        debug!(columns = columns.len(), "aligned line groups");
        if columns.len() < settings.min_aligned_columns {
            return Vec::new();
        }

        let members = columns.iter().flat_map(|(_, m)| m.iter().map(|l| l.bbox));
        let Some(bbox) = padded_union(members, rect, settings) else {
            return Vec::new();
        };
        vec![TableRegion::detected(bbox, self.kind()).with_hints(None, Some(columns.len()))]
    }
}
