use tracing::debug;

use crate::page::PageSource;
use crate::table::settings::TableSettings;
use crate::table::types::TableRegion;
use crate::utils::{cmp_f64, median};

use super::{DetectorKind, TableDetector, content_lines, padded_union};

const MIN_LINES: usize = 4;

/// Finds tables from the vertical rhythm of text lines.
///
/// Lines are sorted by top and the median of the positive gaps between
/// consecutive lines is taken as the reference spacing. A line whose gap
/// to its predecessor deviates from the median by more than the tolerance
/// starts a new row.
pub struct RegularGridDetector;

impl TableDetector for RegularGridDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RegularGrid
    }

    fn detect(&self, page: &dyn PageSource, settings: &TableSettings) -> Vec<TableRegion> {
        let mut lines = content_lines(page, self.kind());
        if lines.len() < MIN_LINES {
            return Vec::new();
        }
        lines.sort_by(|a, b| cmp_f64(&a.bbox.top, &b.bbox.top));

        let gaps: Vec<f64> = lines
            .windows(2)
            .map(|w| w[1].bbox.top - w[0].bbox.bottom)
            .collect();
        let positive: Vec<f64> = gaps.iter().copied().filter(|g| *g > 0.0).collect();
        let Some(median_gap) = median(&positive) else {
            return Vec::new();
        };
        let tolerance = median_gap * settings.grid_gap_tolerance_ratio;

        let mut row_count = 1;
        for gap in &gaps {
            if (gap - median_gap).abs() > tolerance {
                row_count += 1;
            }
        }
        debug!(median_gap, row_count, "line spacing rows");
        if row_count < settings.min_grid_rows {
            return Vec::new();
        }

        let rect = page.page_rect();
        let Some(bbox) = padded_union(lines.iter().map(|l| l.bbox), rect, settings) else {
            return Vec::new();
        };
        vec![TableRegion::detected(bbox, self.kind()).with_hints(Some(row_count), None)]
    }
}
