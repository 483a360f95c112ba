//! Tests for grid validation and repair

use pdfgrid_core::table::{MergeSpan, RawGrid, Validator, validate};
use serde_json::{Value, json};

/// Small deterministic generator for arbitrary-looking inputs.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    fn value(&mut self) -> Value {
        match self.below(7) {
            0 => Value::Null,
            1 => json!(self.below(1000)),
            2 => json!(self.below(100) as f64 / 7.0),
            3 => json!(self.below(2) == 1),
            4 => json!({"k": self.below(10)}),
            5 => json!([self.below(3), "x"]),
            _ => json!(format!("  cell  {}\u{0007} ", self.below(50))),
        }
    }

    fn row(&mut self) -> Value {
        if self.below(8) == 0 {
            return json!("not a row");
        }
        let len = self.below(6);
        Value::Array((0..len).map(|_| self.value()).collect())
    }
}

fn assert_well_formed(grid: &[Vec<String>], merges: &[MergeSpan]) {
    assert!(!grid.is_empty());
    let cols = grid[0].len();
    assert!(cols >= 1);
    assert!(grid.iter().all(|row| row.len() == cols));
    for span in merges {
        assert!(span.row_start <= span.row_end && span.row_end < grid.len(), "{span:?}");
        assert!(span.col_start <= span.col_end && span.col_end < cols, "{span:?}");
    }
}

#[test]
fn test_validate_arbitrary_input_is_well_formed() {
    let mut rng = Lcg(42);
    for _ in 0..500 {
        let rows = 1 + rng.below(6);
        let grid = Value::Array((0..rows).map(|_| rng.row()).collect());
        let merges: Vec<[i64; 4]> = (0..rng.below(4))
            .map(|_| {
                [
                    rng.below(20) as i64 - 10,
                    rng.below(20) as i64 - 10,
                    rng.below(20) as i64 - 10,
                    rng.below(20) as i64 - 10,
                ]
            })
            .collect();
        let (grid, merges) = validate(grid, &merges);
        assert_well_formed(&grid, &merges);
        for cell in grid.iter().flatten() {
            assert!(!cell.contains('\u{0007}'));
            assert!(!cell.contains("  "));
        }
    }
}

#[test]
fn test_validate_missing_grid_is_empty() {
    assert_eq!(validate(Value::Null, &[[0, 0, 1, 1]]), (Vec::new(), Vec::new()));
    assert_eq!(validate(json!({"rows": 2}), &[]), (Vec::new(), Vec::new()));
    assert_eq!(validate(RawGrid::Missing, &[]), (Vec::new(), Vec::new()));
    assert_eq!(validate(Vec::<Vec<String>>::new(), &[]), (Vec::new(), Vec::new()));
}

#[test]
fn test_validate_columnless_grid_gets_placeholder() {
    let (grid, merges) = validate(json!([[], "junk"]), &[[0, 0, 3, 3]]);
    assert_eq!(grid, vec![vec!["no data".to_string()]]);
    assert_eq!(merges, vec![MergeSpan::new(0, 0, 0, 0)]);

    let custom = Validator {
        placeholder: "-".into(),
        ..Validator::default()
    };
    assert_eq!(custom.validate(json!([[]]), &[]).0, vec![vec!["-".to_string()]]);
}

#[test]
fn test_validate_round_trip_three_by_three() {
    let input: Vec<Vec<String>> = (0..3)
        .map(|r| (0..3).map(|c| format!("r{r}  c{c} ")).collect())
        .collect();
    let (grid, merges) = validate(input, &[]);
    let expected: Vec<Vec<String>> = (0..3)
        .map(|r| (0..3).map(|c| format!("r{r} c{c}")).collect())
        .collect();
    assert_eq!(grid, expected);
    assert!(merges.is_empty());
}

#[test]
fn test_validate_stringifies_values() {
    let (grid, _) = validate(json!([[1, 2.5, true, null, {"a": 1}]]), &[]);
    assert_eq!(grid[0], vec!["1", "2.5", "true", "", r#"{"a":1}"#]);
}

#[test]
fn test_validate_keeps_multiline_cells() {
    let (grid, _) = validate(vec![vec![" Total\n  net  \tvalue "]], &[]);
    assert_eq!(grid[0][0], "Total\n net \tvalue");
}

#[test]
fn test_validate_truncates_long_cells() {
    let validator = Validator {
        max_cell_chars: 10,
        ..Validator::default()
    };
    let (grid, _) = validator.validate(vec![vec!["abcdefghijklmnop"]], &[]);
    assert_eq!(grid[0][0], "abcdefg...");
    assert_eq!(grid[0][0].chars().count(), 10);

    for (limit, expected) in [(2, ".."), (3, "..."), (0, "")] {
        let tight = Validator {
            max_cell_chars: limit,
            ..Validator::default()
        };
        assert_eq!(tight.validate(vec![vec!["abcdef"]], &[]).0[0][0], expected);
    }
}

#[test]
fn test_validate_swaps_and_clamps_spans() {
    let grid = vec![vec!["a", "b"], vec!["c", "d"]];
    let (_, merges) = validate(grid, &[[1, 1, 0, 0], [-3, 0, 9, 0]]);
    assert_eq!(merges, vec![MergeSpan::new(0, 0, 1, 1), MergeSpan::new(0, 0, 1, 0)]);
}
