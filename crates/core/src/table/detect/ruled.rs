//! Ruled-line table detection on a page raster.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use tracing::{debug, warn};

use crate::page::PageSource;
use crate::table::settings::TableSettings;
use crate::table::types::{BBox, TableRegion};

use super::{DetectorKind, TableDetector};

/// Iterations of the square dilation that fuses a table's lines into one blob.
const MERGE_ITERATIONS: u32 = 3;

const FOREGROUND: u8 = 255;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Finds tables drawn with ruling lines.
///
/// The page is rendered at `raster_zoom`, binarized, and reduced to its long
/// horizontal and vertical strokes. Each external contour of the stroke mask
/// whose bounding box is large enough and not a sliver becomes a region.
pub struct RuledLineDetector;

impl TableDetector for RuledLineDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RuledLines
    }

    fn detect(&self, page: &dyn PageSource, settings: &TableSettings) -> Vec<TableRegion> {
        let rect = page.page_rect();
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Vec::new();
        }
        let raster = match page.render_region(rect, settings.raster_zoom) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                debug!(error = %e, "page raster unavailable, skipping ruled-line detection");
                return Vec::new();
            }
        };
        if raster.width() == 0 || raster.height() == 0 {
            warn!("page rendered to an empty raster");
            return Vec::new();
        }

        let mask = line_mask(&raster, settings);
        let scale_x = rect.width() / f64::from(raster.width());
        let scale_y = rect.height() / f64::from(raster.height());
        mask_regions(&mask, settings)
            .into_iter()
            .map(|(x0, y0, x1, y1)| {
                let bbox = BBox::new(
                    rect.x0 + f64::from(x0) * scale_x,
                    rect.top + f64::from(y0) * scale_y,
                    (rect.x0 + f64::from(x1) * scale_x).min(rect.x1),
                    (rect.top + f64::from(y1) * scale_y).min(rect.bottom),
                );
                TableRegion::detected(bbox, DetectorKind::RuledLines)
            })
            .collect()
    }
}

/// Binary mask of the long ruling strokes of a grayscale page, with nearby
/// strokes fused into table-sized blobs.
pub fn line_mask(gray: &GrayImage, settings: &TableSettings) -> GrayImage {
    let binary = adaptive_threshold_inv(gray, settings.adaptive_block_size, settings.adaptive_c);
    let binary = morphology::close(&binary, Norm::LInf, 1);

    let horizontal = keep_long_runs(&binary, settings.line_kernel, Axis::Horizontal);
    let horizontal = dilate_axis(&horizontal, settings.line_dilate, Axis::Horizontal);
    let vertical = keep_long_runs(&binary, settings.line_kernel, Axis::Vertical);
    let vertical = dilate_axis(&vertical, settings.line_dilate, Axis::Vertical);

    let mut combined = horizontal;
    for (out, v) in combined.pixels_mut().zip(vertical.pixels()) {
        out.0[0] = out.0[0].max(v.0[0]);
    }

    let radius = (u32::from(settings.merge_dilate / 2) * MERGE_ITERATIONS).min(u32::from(u8::MAX));
    if radius == 0 {
        return combined;
    }
    morphology::dilate(&combined, Norm::LInf, radius as u8)
}

/// Pixel rectangles `(x0, y0, x1, y1)` (exclusive right/bottom) of the
/// external contours passing the area and aspect filters.
fn mask_regions(mask: &GrayImage, settings: &TableSettings) -> Vec<(u32, u32, u32, u32)> {
    let mut out = Vec::new();
    for contour in find_contours::<u32>(mask) {
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        let Some(first) = contour.points.first() else {
            continue;
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &contour.points {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        let w = f64::from(x1 - x0 + 1);
        let h = f64::from(y1 - y0 + 1);
        let aspect = w / h;
        if w * h > settings.min_region_area
            && aspect > settings.min_aspect
            && aspect < settings.max_aspect
        {
            out.push((x0, y0, x1 + 1, y1 + 1));
        } else {
            debug!(w, h, "contour rejected");
        }
    }
    out
}

/// Inverted adaptive mean threshold: a pixel is foreground when it is not
/// brighter than the mean of its `block` x `block` neighbourhood minus `c`.
fn adaptive_threshold_inv(gray: &GrayImage, block: u32, c: f64) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let src = gray.as_raw();
    let iw = w + 1;
    let mut integral = vec![0u64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(src[y * w + x]);
            integral[(y + 1) * iw + x + 1] = row_sum + integral[y * iw + x + 1];
        }
    }

    let half = (block / 2) as usize;
    let mut out = GrayImage::new(gray.width(), gray.height());
    for y in 0..h {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half).min(h - 1) + 1;
        for x in 0..w {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half).min(w - 1) + 1;
            let area = ((y1 - y0) * (x1 - x0)) as f64;
            let sum = (integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0]) as f64;
            if f64::from(src[y * w + x]) <= sum / area - c {
                out.put_pixel(x as u32, y as u32, Luma([FOREGROUND]));
            }
        }
    }
    out
}

/// Morphological opening with a 1-D line element: keeps only foreground
/// runs along `axis` that are at least `min_len` pixels long.
fn keep_long_runs(mask: &GrayImage, min_len: u32, axis: Axis) -> GrayImage {
    let (w, h) = mask.dimensions();
    let (outer, inner) = match axis {
        Axis::Horizontal => (h, w),
        Axis::Vertical => (w, h),
    };
    let at = |o: u32, i: u32| match axis {
        Axis::Horizontal => (i, o),
        Axis::Vertical => (o, i),
    };

    let mut out = GrayImage::new(w, h);
    for o in 0..outer {
        let mut run_start: Option<u32> = None;
        for i in 0..=inner {
            let on = i < inner && {
                let (x, y) = at(o, i);
                mask.get_pixel(x, y).0[0] > 0
            };
            match (on, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    if i - start >= min_len {
                        for j in start..i {
                            let (x, y) = at(o, j);
                            out.put_pixel(x, y, Luma([FOREGROUND]));
                        }
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }
    out
}

/// Dilation with a `2 * radius + 1` line element along `axis`.
fn dilate_axis(mask: &GrayImage, radius: u32, axis: Axis) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    for (x, y, px) in mask.enumerate_pixels() {
        if px.0[0] == 0 {
            continue;
        }
        match axis {
            Axis::Horizontal => {
                for xx in x.saturating_sub(radius)..=(x + radius).min(w - 1) {
                    out.put_pixel(xx, y, Luma([FOREGROUND]));
                }
            }
            Axis::Vertical => {
                for yy in y.saturating_sub(radius)..=(y + radius).min(h - 1) {
                    out.put_pixel(x, yy, Luma([FOREGROUND]));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::detect::testing::TestPage;
    use image::DynamicImage;

    /// White page with a black ruled grid between the given pixel bounds.
    fn ruled_raster(w: u32, h: u32, xs: &[u32], ys: &[u32]) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        for &y in ys {
            for x in left..=right {
                for t in 0..2 {
                    img.put_pixel(x, y + t, Luma([0]));
                }
            }
        }
        for &x in xs {
            for y in top..=bottom + 1 {
                for t in 0..2 {
                    img.put_pixel(x + t, y, Luma([0]));
                }
            }
        }
        img
    }

    #[test]
    fn run_opening_drops_short_strokes() {
        let mut img = GrayImage::new(50, 3);
        for x in 0..40 {
            img.put_pixel(x, 0, Luma([255]));
        }
        for x in 5..15 {
            img.put_pixel(x, 2, Luma([255]));
        }
        let kept = keep_long_runs(&img, 30, Axis::Horizontal);
        assert_eq!(kept.get_pixel(39, 0).0[0], 255);
        assert_eq!(kept.get_pixel(10, 2).0[0], 0);
        let vertical = keep_long_runs(&img, 2, Axis::Vertical);
        assert!(vertical.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn threshold_marks_dark_strokes() {
        let raster = ruled_raster(100, 100, &[10, 80], &[10, 80]);
        let binary = adaptive_threshold_inv(&raster, 11, 2.0);
        assert_eq!(binary.get_pixel(40, 10).0[0], 255);
        assert_eq!(binary.get_pixel(40, 40).0[0], 0);
    }

    #[test]
    fn ruled_grid_is_found_in_page_units() {
        // 200x200 page rendered at zoom 3.
        let raster = ruled_raster(600, 600, &[60, 200, 340, 480], &[60, 140, 220, 300]);
        let mut page = TestPage::new(200.0, 200.0);
        page.raster = Some(DynamicImage::ImageLuma8(raster));

        let regions = RuledLineDetector.detect(&page, &TableSettings::default());
        assert_eq!(regions.len(), 1);
        let bbox = regions[0].bbox.unwrap();
        assert!((bbox.x0 - 20.0).abs() < 5.0, "{bbox:?}");
        assert!((bbox.top - 20.0).abs() < 5.0, "{bbox:?}");
        assert!((bbox.x1 - 160.0).abs() < 5.0, "{bbox:?}");
        assert!((bbox.bottom - 100.0).abs() < 5.0, "{bbox:?}");
    }

    #[test]
    fn blank_page_has_no_ruled_regions() {
        let mut page = TestPage::new(100.0, 100.0);
        page.raster = Some(DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 300, Luma([255]))));
        assert!(RuledLineDetector.detect(&page, &TableSettings::default()).is_empty());
    }

    #[test]
    fn area_threshold_filters_regions() {
        // An 80 px box grows to roughly 98 x 98 px after dilation.
        let raster = ruled_raster(300, 300, &[100, 180], &[100, 180]);
        let mut page = TestPage::new(100.0, 100.0);
        page.raster = Some(DynamicImage::ImageLuma8(raster));
        let settings = TableSettings::default();
        let strict = TableSettings {
            min_region_area: 10_000.0,
            ..TableSettings::default()
        };
        assert_eq!(RuledLineDetector.detect(&page, &settings).len(), 1);
        assert!(RuledLineDetector.detect(&page, &strict).is_empty());
    }

    #[test]
    fn missing_raster_is_not_an_error() {
        let page = TestPage::new(100.0, 100.0);
        assert!(RuledLineDetector.detect(&page, &TableSettings::default()).is_empty());
    }
}
