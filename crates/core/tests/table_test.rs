//! Tests for table reconstruction through the public API

use pdfgrid_core::page::{BlockKind, TextBlock};
use pdfgrid_core::table::{
    BBox, BoundaryMatch, MergeSpan, PageBlock, RawCell, TableBlock, TableRegion, build_grid,
    cluster, detect_merges, merges_from_matrix, order_blocks,
};

fn cells(list: &[(f64, f64, f64, f64, &str)]) -> Vec<RawCell> {
    list.iter().map(|&c| RawCell::from(c)).collect()
}

fn block(x0: f64, top: f64, x1: f64, bottom: f64) -> TextBlock {
    TextBlock {
        bbox: BBox::new(x0, top, x1, bottom),
        kind: BlockKind::Text,
        lines: Vec::new(),
    }
}

#[test]
fn test_cluster_is_idempotent() {
    let mut seed: u64 = 7;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (seed >> 40) as f64 / 1000.0
    };
    for round in 0..200 {
        let tolerance = (round % 7) as f64 * 1.5;
        let xs: Vec<f64> = (0..1 + round % 40).map(|_| next()).collect();
        let once = cluster(&xs, tolerance);
        assert!(!once.is_empty());
        assert!(once.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(cluster(&once, tolerance), once, "tolerance {tolerance}, input {xs:?}");
    }
}

#[test]
fn test_cluster_chains_close_values() {
    assert_eq!(cluster(&[0.0, 2.0, 4.0, 6.0], 2.5), vec![3.0]);
    assert_eq!(cluster(&[1.0, 1.0, 2.0], 0.0), vec![1.0, 2.0]);
    assert!(cluster(&[], 1.0).is_empty());
}

#[test]
fn test_build_grid_simple_two_by_two() {
    let input = cells(&[
        (0.0, 0.0, 50.0, 50.0, "A1"),
        (50.0, 0.0, 100.0, 50.0, "B1"),
        (0.0, 50.0, 50.0, 100.0, "A2"),
        (50.0, 50.0, 100.0, 100.0, "B2"),
    ]);
    let (grid, merges) = build_grid(&input, BoundaryMatch::Exact);
    assert_eq!(grid, vec![vec!["A1", "B1"], vec!["A2", "B2"]]);
    assert!(merges.is_empty());
}

#[test]
fn test_build_grid_records_spanning_header() {
    let input = cells(&[
        (0.0, 0.0, 100.0, 20.0, "Header"),
        (0.0, 20.0, 50.0, 40.0, "a"),
        (50.0, 20.0, 100.0, 40.0, "b"),
    ]);
    let (grid, merges) = build_grid(&input, BoundaryMatch::Exact);
    assert_eq!(grid, vec![vec!["Header", ""], vec!["a", "b"]]);
    assert_eq!(merges, vec![MergeSpan::new(0, 0, 0, 1)]);
}

#[test]
fn test_build_grid_empty_input() {
    let (grid, merges) = build_grid(&[], BoundaryMatch::Exact);
    assert!(grid.is_empty());
    assert!(merges.is_empty());

    let from_json: Vec<RawCell> = serde_json::from_str("[]").unwrap();
    assert_eq!(build_grid(&from_json, BoundaryMatch::Exact), (Vec::new(), Vec::new()));
}

#[test]
fn test_matrix_merges_follow_value_equality() {
    let matrix = vec![
        vec!["X", "X", "Y"],
        vec!["X", "X", "Y"],
        vec!["Z", "Z", "Z"],
    ];
    let spans = merges_from_matrix(&matrix);
    assert_eq!(
        spans,
        vec![
            MergeSpan::new(0, 0, 1, 1),
            MergeSpan::new(0, 2, 1, 2),
            MergeSpan::new(2, 0, 2, 2),
        ]
    );
}

#[test]
fn test_detect_merges_prefers_cell_geometry() {
    let region = TableRegion {
        cells: cells(&[
            (0.0, 0.0, 50.0, 40.0, "tall"),
            (50.0, 0.0, 100.0, 20.0, "b"),
            (50.0, 20.0, 100.0, 40.0, "c"),
        ]),
        matrix: Some(vec![vec![Some("same".into()), Some("same".into())]]),
        ..Default::default()
    };
    assert_eq!(
        detect_merges(&region, BoundaryMatch::Exact),
        vec![MergeSpan::new(0, 0, 1, 0)]
    );

    // Without spanning cells the matrix path decides.
    let flat = TableRegion {
        cells: cells(&[(0.0, 0.0, 50.0, 20.0, "a"), (50.0, 0.0, 100.0, 20.0, "b")]),
        ..region
    };
    assert_eq!(
        detect_merges(&flat, BoundaryMatch::Exact),
        vec![MergeSpan::new(0, 0, 0, 1)]
    );
}

#[test]
fn test_overlap_suppression() {
    let table = TableBlock::new(
        BBox::new(0.0, 100.0, 100.0, 200.0),
        vec![vec!["A1".into()]],
        Vec::new(),
    )
    .unwrap();
    let ordered = order_blocks(
        vec![
            block(10.0, 110.0, 110.0, 120.0),
            block(90.0, 160.0, 190.0, 170.0),
        ],
        vec![PageBlock::Table(table)],
        0.5,
    );
    assert_eq!(ordered.len(), 2);
    assert!(matches!(ordered[0], PageBlock::Table(_)));
    assert_eq!(ordered[1].bbox(), BBox::new(90.0, 160.0, 190.0, 170.0));
}
