//! Small numeric helpers shared by the table heuristics.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

/// Total order for finite floats; NaN compares equal so sorting never panics.
#[inline]
pub fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Sorted copy of the finite values in `xs`.
pub fn sorted_finite(xs: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by_key(|v| OrderedFloat(*v));
    out
}

/// Median of a sample; even-length samples average the two middle values.
pub fn median(xs: &[f64]) -> Option<f64> {
    let sorted = sorted_finite(xs);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}
