//! Boundary extraction from a binary mask

use crate::processing::contour::Contour;
use crate::Mask;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use tracing::trace;

/// How boundary chains are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainApproximation {
    /// Every boundary pixel
    None,
    /// Straight horizontal, vertical and diagonal runs reduced to their end points
    Simple,
}

pub struct ContourExtractor {
    external_only: bool,
    approximation: ChainApproximation,
}

impl ContourExtractor {
    pub fn new(external_only: bool) -> Self {
        Self {
            external_only,
            approximation: ChainApproximation::Simple,
        }
    }

    pub fn with_approximation(mut self, approximation: ChainApproximation) -> Self {
        self.approximation = approximation;
        self
    }

    pub fn external_only(&self) -> bool {
        self.external_only
    }

    /// Boundaries of every foreground region
    ///
    /// With `external_only` only the outermost borders are kept; otherwise
    /// hole borders and nested regions are included. Order follows a raster
    /// scan of the mask, so identical input yields identical output.
    pub fn extract(&self, mask: &Mask) -> Vec<Contour> {
        if mask.width() == 0 || mask.height() == 0 {
            return Vec::new();
        }

        let contours: Vec<Contour> = find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| {
                !self.external_only || (c.border_type == BorderType::Outer && c.parent.is_none())
            })
            .filter_map(|c| {
                let points = match self.approximation {
                    ChainApproximation::None => c.points,
                    ChainApproximation::Simple => compress_runs(c.points),
                };
                Contour::new(points)
            })
            .collect();

        trace!("Extracted {} contours", contours.len());
        contours
    }
}

/// Drop points that continue the step direction of the previous point
///
/// Expects a closed chain of unit steps, as produced by border following.
fn compress_runs(points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 2 {
        return points;
    }

    let step = |from: Point<i32>, to: Point<i32>| ((to.x - from.x).signum(), (to.y - from.y).signum());
    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        points
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::segmentation::FOREGROUND;

    fn mask_with_rect(w: u32, h: u32, x: u32, y: u32, rw: u32, rh: u32) -> Mask {
        let mut mask = Mask::new(w, h);
        for py in y..y + rh {
            for px in x..x + rw {
                mask.put_pixel(px, py, FOREGROUND);
            }
        }
        mask
    }

    #[test]
    fn test_background_mask_has_no_contours() {
        let extractor = ContourExtractor::new(false);
        assert!(extractor.extract(&Mask::new(64, 48)).is_empty());
        assert!(extractor.extract(&Mask::new(0, 0)).is_empty());
    }

    #[test]
    fn test_filled_rectangle_compresses_to_corners() {
        let mask = mask_with_rect(40, 30, 5, 6, 12, 8);
        let contours = ContourExtractor::new(false).extract(&mask);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.vertex_count(), 4);
        let bbox = c.bounding_rect();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (5, 6, 12, 8));
        assert_eq!(c.area(), 11.0 * 7.0);
    }

    #[test]
    fn test_no_approximation_keeps_every_border_pixel() {
        let mask = mask_with_rect(20, 20, 2, 2, 5, 5);
        let contours = ContourExtractor::new(false)
            .with_approximation(ChainApproximation::None)
            .extract(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].vertex_count(), 16);
    }

    #[test]
    fn test_hole_only_listed_when_not_external() {
        // Ring: 10x10 square with a 4x4 hole
        let mut mask = mask_with_rect(30, 30, 5, 5, 10, 10);
        for py in 8..12 {
            for px in 8..12 {
                mask.put_pixel(px, py, image::Luma([0]));
            }
        }
        assert_eq!(ContourExtractor::new(false).extract(&mask).len(), 2);
        assert_eq!(ContourExtractor::new(true).extract(&mask).len(), 1);
    }

    #[test]
    fn test_nested_region_excluded_when_external() {
        let mut mask = mask_with_rect(40, 40, 2, 2, 30, 30);
        for py in 6..28 {
            for px in 6..28 {
                mask.put_pixel(px, py, image::Luma([0]));
            }
        }
        for py in 12..20 {
            for px in 12..20 {
                mask.put_pixel(px, py, FOREGROUND);
            }
        }
        let all = ContourExtractor::new(false).extract(&mask);
        let outer = ContourExtractor::new(true).extract(&mask);
        assert_eq!(all.len(), 3);
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].bounding_rect().width, 30);
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let mut mask = mask_with_rect(50, 50, 1, 1, 5, 5);
        for py in 20..30 {
            for px in 30..45 {
                mask.put_pixel(px, py, FOREGROUND);
            }
        }
        let extractor = ContourExtractor::new(false);
        assert_eq!(extractor.extract(&mask), extractor.extract(&mask));
    }

    #[test]
    fn test_single_pixel_region() {
        let mask = mask_with_rect(10, 10, 4, 4, 1, 1);
        let contours = ContourExtractor::new(true).extract(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].vertex_count(), 1);
    }
}
