//! Table region detection and reconstruction.
//!
//! Pipeline stages, leaf first: coordinate clustering, region detection,
//! structure extraction, cell grid building, merge detection, grid
//! validation, and the region-to-block merger producing the page stream.

pub mod clustering;
pub mod detect;
pub mod geometry;
pub mod grid;
pub mod merge;
pub mod regions;
pub mod settings;
pub mod structure;
pub mod types;
pub mod validate;

// Re-export public types
pub use detect::{Detection, DetectorKind, TableDetector, detect_regions, region_bbox};
pub use regions::{MergeResult, RegionOutcome, merge_regions, order_blocks, resolve_region};
pub use settings::{BoundaryMatch, TableSettings};
pub use structure::{Structure, extract_structure};
pub use types::{
    BBox, Cell, ContentBlock, Grid, ImageBlock, Matrix, MergeSpan, PageBlock, RawCell, TableBlock,
    TableRegion, normalize_cells,
};
pub use validate::{CellValue, RawGrid, RawRow, Validator, validate};

// Re-export stage functions
pub use clustering::cluster;
pub use grid::build_grid;
pub use merge::{detect_merges, merges_from_cells, merges_from_matrix};

#[cfg(test)]
mod pipeline_tests {
    use super::detect::testing::TestPage;
    use super::*;

    /// A page with a heading, a 3x3 text table and a footer paragraph.
    fn report_page() -> TestPage {
        let mut page =
            TestPage::new(600.0, 800.0).text(50.0, 40.0, 400.0, 60.0, "Quarterly report");
        let rows = [
            ["Region", "Units", "Revenue"],
            ["North", "120", "4.5"],
            ["South", "98", "3.1"],
        ];
        for (r, row) in rows.iter().enumerate() {
            let top = 100.0 + r as f64 * 30.0;
            for (c, text) in row.iter().enumerate() {
                let x0 = 50.0 + c as f64 * 200.0;
                page = page.text(x0, top, x0 + 80.0, top + 12.0, text);
            }
        }
        page.text(50.0, 400.0, 500.0, 420.0, "Figures are unaudited.")
    }

    #[test]
    fn detected_table_replaces_its_text() {
        let page = report_page();
        let settings = TableSettings::default();
        let detection = detect_regions(&page, &settings);
        assert_eq!(detection.detector, Some(DetectorKind::Layout));

        let content = crate::page::PageSource::text_blocks(&page).unwrap();
        let result = merge_regions(content, &detection.regions, &page, &settings);
        assert!(result.fallbacks.is_empty());
        assert_eq!(result.blocks.len(), 3);

        let table = result.blocks[1].as_table().unwrap();
        assert_eq!(
            table.grid,
            vec![
                vec!["Region", "Units", "Revenue"],
                vec!["North", "120", "4.5"],
                vec!["South", "98", "3.1"],
            ]
        );
        let text = |i: usize| match &result.blocks[i] {
            PageBlock::Content(b) => b.text(),
            other => panic!("expected content, got {other:?}"),
        };
        assert_eq!(text(0), "Quarterly report");
        assert_eq!(text(2), "Figures are unaudited.");
    }

    #[test]
    fn validated_grids_stay_rectangular() {
        let grid = build_grid(
            &[
                RawCell::from((0.0, 0.0, 30.0, 10.0, "wide")),
                RawCell::from((0.0, 10.0, 10.0, 20.0, "a")),
                RawCell::from((10.0, 10.0, 30.0, 20.0, "b")),
                RawCell::from((20.0, 10.0, 30.0, 20.0, "skipped")),
            ],
            BoundaryMatch::Exact,
        );
        let spans: Vec<[i64; 4]> = grid.1.iter().map(|s| (*s).into()).collect();
        let (grid, merges) = validate(grid.0, &spans);
        let cols = grid[0].len();
        assert!(grid.iter().all(|r| r.len() == cols));
        for s in merges {
            assert!(s.row_end < grid.len() && s.col_end < cols);
        }
    }
}
