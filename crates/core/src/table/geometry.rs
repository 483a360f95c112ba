//! Rectangle arithmetic for regions and blocks.

use super::types::BBox;

/// Compute the overlap between two bounding boxes.
///
/// Touching boxes (shared edge) yield a zero-area overlap; disjoint boxes
/// yield `None`.
pub fn bbox_overlap(a: BBox, b: BBox) -> Option<BBox> {
    let o_left = a.x0.max(b.x0);
    let o_right = a.x1.min(b.x1);
    let o_top = a.top.max(b.top);
    let o_bottom = a.bottom.min(b.bottom);
    if o_right - o_left >= 0.0 && o_bottom - o_top >= 0.0 {
        Some(BBox {
            x0: o_left,
            top: o_top,
            x1: o_right,
            bottom: o_bottom,
        })
    } else {
        None
    }
}

/// Area of the intersection of two boxes (0 when disjoint).
pub fn intersection_area(a: BBox, b: BBox) -> f64 {
    bbox_overlap(a, b).map_or(0.0, |o| o.area())
}

/// Fraction of `block` covered by `area`.
///
/// Degenerate blocks (zero width or height) count as fully covered when
/// their center lies inside `area`.
pub fn covered_fraction(block: BBox, area: BBox) -> f64 {
    let own = block.area();
    if own <= 0.0 {
        return if area.contains_point(block.h_center(), block.v_center()) {
            1.0
        } else {
            0.0
        };
    }
    intersection_area(block, area) / own
}

/// Smallest box containing every input box.
pub fn union_all<I: IntoIterator<Item = BBox>>(boxes: I) -> Option<BBox> {
    boxes.into_iter().fold(None, |acc, b| {
        Some(match acc {
            None => b,
            Some(a) => BBox {
                x0: a.x0.min(b.x0),
                top: a.top.min(b.top),
                x1: a.x1.max(b.x1),
                bottom: a.bottom.max(b.bottom),
            },
        })
    })
}

/// Grow a box by `pad` on every side, then clamp it to `page`.
pub fn pad_and_clamp(bbox: BBox, pad: f64, page: BBox) -> BBox {
    BBox {
        x0: (bbox.x0 - pad).max(page.x0),
        top: (bbox.top - pad).max(page.top),
        x1: (bbox.x1 + pad).min(page.x1),
        bottom: (bbox.bottom + pad).min(page.bottom),
    }
}

/// Padding used around heuristic regions: a fraction of the shorter page side.
pub fn region_padding(page: BBox, ratio: f64) -> f64 {
    page.width().min(page.height()) * ratio
}
