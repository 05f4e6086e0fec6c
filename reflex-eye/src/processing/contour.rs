//! Contour type and the planar measurements taken on it

use imageproc::geometry::arc_length;
use imageproc::point::Point;

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    /// Width over height. Height is at least one pixel for any real contour.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Closed boundary of a foreground region, as an ordered point list
///
/// Never empty; never mutated after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    /// `None` for an empty point list
    pub fn new(points: Vec<Point<i32>>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn from_xy(coords: &[(i32, i32)]) -> Option<Self> {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Smallest upright rectangle containing every point, inclusive of edge pixels
    pub fn bounding_rect(&self) -> BoundingBox {
        let first = self.points[0];
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Closed-path arc length
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    pub fn convex_hull(&self) -> Vec<Point<i32>> {
        convex_hull(&self.points)
    }

    /// Leftmost point; the first one wins on ties
    pub fn extreme_left(&self) -> Point<i32> {
        let mut best = self.points[0];
        for p in &self.points[1..] {
            if p.x < best.x {
                best = *p;
            }
        }
        best
    }

    /// Rightmost point; the first one wins on ties
    pub fn extreme_right(&self) -> Point<i32> {
        let mut best = self.points[0];
        for p in &self.points[1..] {
            if p.x > best.x {
                best = *p;
            }
        }
        best
    }
}

/// Absolute shoelace area of a closed polygon
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice: i64 = 0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (twice as f64 / 2.0).abs()
}

/// Convex hull by monotone chain, counter-clockwise in image coordinates
///
/// Duplicates and collinear points are dropped. Fewer than three distinct
/// points, or all of them on one line, give a hull with zero area.
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| (a.x, a.y).cmp(&(b.x, b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
        (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
    }

    let mut lower: Vec<Point<i32>> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point<i32>> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
