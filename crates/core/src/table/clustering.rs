//! Tolerance-based clustering of coordinates.
//!
//! Every geometric heuristic in the pipeline reduces jittery positions to
//! representative values through these functions.

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::utils::sorted_finite;

/// Group sorted values: a new group starts whenever a value exceeds the
/// last value added to the current group by more than `tolerance`.
///
/// Comparison is against the last member, not the group mean, so evenly
/// spaced values just under `tolerance` apart chain into one group.
pub fn cluster_list(xs: &[f64], tolerance: f64) -> Vec<Vec<f64>> {
    let sorted = sorted_finite(xs);
    let tolerance = tolerance.max(0.0);
    let mut groups: Vec<Vec<f64>> = Vec::new();
    let mut current: Vec<f64> = Vec::new();
    for x in sorted {
        match current.last() {
            Some(&last) if x - last > tolerance => {
                groups.push(std::mem::take(&mut current));
                current.push(x);
            }
            _ => current.push(x),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Cluster centers (group means) in ascending order.
pub fn cluster(xs: &[f64], tolerance: f64) -> Vec<f64> {
    cluster_list(xs, tolerance)
        .into_iter()
        .map(|g| g.iter().sum::<f64>() / g.len() as f64)
        .collect()
}

/// Group items whose key lies within `tolerance` of a group's anchor, the
/// key of the first item that opened the group.
///
/// Items are visited in input order and matched against anchors in
/// ascending order; the first anchor closer than `tolerance` wins. Groups
/// are returned sorted by anchor.
pub fn group_by_anchor<T, F>(items: &[T], key_fn: F, tolerance: f64) -> Vec<(f64, Vec<&T>)>
where
    F: Fn(&T) -> f64,
{
    let mut groups: Vec<(f64, Vec<&T>)> = Vec::new();
    for item in items {
        let key = key_fn(item);
        if !key.is_finite() {
            continue;
        }
        match groups
            .iter_mut()
            .find(|(anchor, _)| (*anchor - key).abs() < tolerance)
        {
            Some((_, members)) => members.push(item),
            None => {
                let at = groups.partition_point(|(anchor, _)| *anchor <= key);
                groups.insert(at, (key, vec![item]));
            }
        }
    }
    groups
}

/// Sort a boundary list ascending and drop exact duplicates.
pub fn distinct_sorted(xs: Vec<f64>) -> Vec<f64> {
    xs.into_iter()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
        .sorted()
        .dedup()
        .map(OrderedFloat::into_inner)
        .collect()
}
