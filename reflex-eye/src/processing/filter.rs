//! Multi-criterion contour filtering

use crate::config::FilterCriteria;
use crate::processing::contour::{polygon_area, BoundingBox, Contour};
use tracing::trace;

/// First criterion a contour failed
///
/// Tests run in declaration order and stop at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Width,
    Height,
    Area,
    Perimeter,
    /// Also covers a convex hull with zero area, where solidity is undefined
    Solidity,
    Vertices,
    Ratio,
}

/// Measurements of a contour that passed every test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourMetrics {
    pub bounding_box: BoundingBox,
    pub area: f64,
    pub perimeter: f64,
    pub solidity: f64,
    pub vertices: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Survivors in input order
    pub accepted: Vec<Contour>,
    /// Bounding box of the first contour examined, pass or fail
    pub first_candidate: Option<BoundingBox>,
    /// Failure reason per rejected contour, in input order
    pub rejections: Vec<Rejection>,
}

pub struct ContourFilter {
    criteria: FilterCriteria,
}

impl ContourFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filter(&self, contours: Vec<Contour>) -> FilterOutcome {
        let mut outcome = FilterOutcome {
            first_candidate: contours.first().map(Contour::bounding_rect),
            ..Default::default()
        };

        for contour in contours {
            match self.evaluate(&contour) {
                Ok(_) => outcome.accepted.push(contour),
                Err(reason) => outcome.rejections.push(reason),
            }
        }

        trace!(
            "Filter kept {} contours, rejected {}",
            outcome.accepted.len(),
            outcome.rejections.len()
        );
        outcome
    }

    pub fn evaluate(&self, contour: &Contour) -> Result<ContourMetrics, Rejection> {
        let c = &self.criteria;

        let bounding_box = contour.bounding_rect();
        let width = bounding_box.width as f64;
        let height = bounding_box.height as f64;
        if !c.width.contains(width) {
            return Err(Rejection::Width);
        }
        if !c.height.contains(height) {
            return Err(Rejection::Height);
        }

        let area = contour.area();
        if area < c.min_area {
            return Err(Rejection::Area);
        }

        let perimeter = contour.perimeter();
        if perimeter < c.min_perimeter {
            return Err(Rejection::Perimeter);
        }

        let hull_area = polygon_area(&contour.convex_hull());
        if hull_area <= 0.0 {
            return Err(Rejection::Solidity);
        }
        let solidity = 100.0 * area / hull_area;
        if !c.solidity.contains(solidity) {
            return Err(Rejection::Solidity);
        }

        let vertices = contour.vertex_count();
        if !c.vertices.contains(vertices as f64) {
            return Err(Rejection::Vertices);
        }

        let ratio = width / height;
        if !c.ratio.contains(ratio) {
            return Err(Rejection::Ratio);
        }

        Ok(ContourMetrics {
            bounding_box,
            area,
            perimeter,
            solidity,
            vertices,
            ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    fn open_criteria() -> FilterCriteria {
        FilterCriteria {
            min_area: 0.0,
            min_perimeter: 0.0,
            width: Bounds::new(0.0, f64::INFINITY),
            height: Bounds::new(0.0, f64::INFINITY),
            solidity: Bounds::new(0.0, 100.0),
            vertices: Bounds::new(0.0, f64::INFINITY),
            ratio: Bounds::new(0.0, f64::INFINITY),
        }
    }

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Contour {
        Contour::from_xy(&[(x, y), (x, y + h - 1), (x + w - 1, y + h - 1), (x + w - 1, y)]).unwrap()
    }

    #[test]
    fn test_rectangle_passes_open_criteria() {
        let filter = ContourFilter::new(open_criteria());
        let metrics = filter.evaluate(&rect(0, 0, 20, 10)).unwrap();
        assert_eq!(metrics.solidity, 100.0);
        assert_eq!(metrics.vertices, 4);
        assert_eq!(metrics.ratio, 2.0);
    }

    #[test]
    fn test_width_checked_before_area() {
        let mut criteria = open_criteria();
        criteria.width = Bounds::new(50.0, 100.0);
        criteria.min_area = 1e9;
        let filter = ContourFilter::new(criteria);
        assert_eq!(filter.evaluate(&rect(0, 0, 20, 10)), Err(Rejection::Width));
    }

    #[test]
    fn test_each_criterion() {
        let c = rect(0, 0, 20, 10);

        let mut criteria = open_criteria();
        criteria.height = Bounds::new(11.0, 20.0);
        assert_eq!(ContourFilter::new(criteria).evaluate(&c), Err(Rejection::Height));

        let mut criteria = open_criteria();
        criteria.min_area = 19.0 * 9.0 + 1.0;
        assert_eq!(ContourFilter::new(criteria).evaluate(&c), Err(Rejection::Area));

        let mut criteria = open_criteria();
        criteria.min_perimeter = 100.0;
        assert_eq!(ContourFilter::new(criteria).evaluate(&c), Err(Rejection::Perimeter));

        let mut criteria = open_criteria();
        criteria.solidity = Bounds::new(0.0, 53.0);
        assert_eq!(ContourFilter::new(criteria).evaluate(&c), Err(Rejection::Solidity));

        let mut criteria = open_criteria();
        criteria.vertices = Bounds::new(5.0, 10.0);
        assert_eq!(ContourFilter::new(criteria).evaluate(&c), Err(Rejection::Vertices));

        let mut criteria = open_criteria();
        criteria.ratio = Bounds::new(2.5, 3.0);
        assert_eq!(ContourFilter::new(criteria).evaluate(&c), Err(Rejection::Ratio));
    }

    #[test]
    fn test_zero_area_hull_is_rejected() {
        let line = Contour::from_xy(&[(0, 0), (5, 0), (10, 0)]).unwrap();
        let filter = ContourFilter::new(open_criteria());
        assert_eq!(filter.evaluate(&line), Err(Rejection::Solidity));
    }

    #[test]
    fn test_filter_preserves_order_and_reports_first() {
        let mut criteria = open_criteria();
        criteria.min_area = 50.0;
        let filter = ContourFilter::new(criteria);
        let input = vec![
            rect(100, 5, 3, 3),
            rect(0, 0, 20, 10),
            rect(40, 40, 2, 2),
            rect(60, 0, 10, 10),
        ];
        let outcome = filter.filter(input.clone());
        assert_eq!(outcome.accepted, vec![input[1].clone(), input[3].clone()]);
        assert_eq!(outcome.rejections, vec![Rejection::Area, Rejection::Area]);
        assert_eq!(outcome.first_candidate.map(|b| b.x), Some(100));
    }

    #[test]
    fn test_filter_empty_input() {
        let outcome = ContourFilter::new(FilterCriteria::default()).filter(Vec::new());
        assert!(outcome.accepted.is_empty());
        assert!(outcome.first_candidate.is_none());
    }
}
