//! Bearing, elevation and distance from a target contour
//!
//! The two horizontal extreme points of the contour are projected to angles
//! using the fixed field of view, each is ranged from the known height
//! difference between lens and target, and the resulting pair of slant
//! distances plus the known target width is solved as a triangle seen from
//! above to find the bearing and range of the target's midpoint.
//!
//! Numeric edge cases never surface as errors. A value that cannot be
//! computed is left as `None` and the estimate carries a [`GeometryFault`].

use crate::config::CameraConstants;
use crate::processing::contour::{BoundingBox, Contour};
use tracing::debug;

/// Below this magnitude a sine or cosine is treated as zero
const TRIG_EPSILON: f64 = 1e-12;

/// Extra slack on the second cosine quotient, which is algebraically within
/// [-1, 1] whenever the first one is but can land just outside after rounding
const ROUNDING_SLACK: f64 = 1e-9;

/// Why the angle/distance refinement stopped for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFault {
    /// A per-point tangent was zero or infinite
    DistanceUnavailable,
    /// The law-of-cosines quotient fell outside [-1, 1]
    CosineOutOfRange,
    /// The median came out zero or not finite
    DegenerateMedian,
}

/// Solved top-down triangle: lens, left point, right point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleSolution {
    /// Interior angle at the left point, degrees
    pub angle_at_left: f64,
    pub median: f64,
    /// Angle between the left ray and the median, degrees
    pub mid_angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetEstimate {
    pub bounding_box: BoundingBox,
    pub left_point: (i32, i32),
    pub right_point: (i32, i32),
    pub bearing_left: f64,
    pub bearing_right: f64,
    pub elevation_left: f64,
    pub elevation_right: f64,
    pub left_distance: Option<f64>,
    pub right_distance: Option<f64>,
    /// Raw cosine quotient, published for diagnosis even when invalid
    pub cosine_quotient: Option<f64>,
    pub bearing: Option<f64>,
    /// Radians, unlike the per-point elevations
    pub elevation: Option<f64>,
    pub distance: Option<f64>,
    pub fault: Option<GeometryFault>,
}

impl TargetEstimate {
    pub fn is_complete(&self) -> bool {
        self.fault.is_none()
    }
}

/// Pixel coordinates to [-1,1]x[-1,1], y pointing up
pub fn normalize(res_x: f64, res_y: f64, point: (f64, f64)) -> (f64, f64) {
    let nx = (2.0 / res_x) * (point.0 - res_x / 2.0 + 0.5);
    let ny = (-2.0 / res_y) * (point.1 - res_y / 2.0 + 0.5);
    (nx, ny)
}

/// Horizontal range to a point seen `elevation` degrees off axis
pub fn slant_distance(height_delta: f64, tilt_angle: f64, elevation: f64) -> Option<f64> {
    let (sin, cos) = (tilt_angle + elevation).to_radians().sin_cos();
    if sin.abs() < TRIG_EPSILON || cos.abs() < TRIG_EPSILON {
        return None;
    }
    let distance = (height_delta * cos / sin).abs();
    distance.is_finite().then_some(distance)
}

/// Cosine of the interior angle at the left point
pub fn cosine_quotient(left_d: f64, right_d: f64, target_width: f64) -> f64 {
    (left_d * left_d - right_d * right_d + target_width * target_width)
        / (2.0 * target_width * left_d)
}

pub fn solve_triangle(
    left_d: f64,
    right_d: f64,
    target_width: f64,
) -> Result<TriangleSolution, GeometryFault> {
    let quotient = cosine_quotient(left_d, right_d, target_width);
    if !quotient.is_finite() || quotient.abs() > 1.0 {
        return Err(GeometryFault::CosineOutOfRange);
    }
    let angle_at_left = quotient.acos();

    let median = (left_d * left_d + target_width * target_width
        - 2.0 * left_d * target_width * angle_at_left.cos())
    .sqrt();
    if !median.is_finite() || median <= 0.0 {
        return Err(GeometryFault::DegenerateMedian);
    }

    let mid_quotient = (median * median + left_d * left_d - target_width * target_width)
        / (2.0 * left_d * median);
    if !mid_quotient.is_finite() || mid_quotient.abs() > 1.0 + ROUNDING_SLACK {
        return Err(GeometryFault::CosineOutOfRange);
    }
    let mid_angle = mid_quotient.clamp(-1.0, 1.0).acos().to_degrees();

    Ok(TriangleSolution {
        angle_at_left: angle_at_left.to_degrees(),
        median,
        mid_angle,
    })
}

pub struct Localizer {
    constants: CameraConstants,
}

impl Localizer {
    pub fn new(constants: CameraConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &CameraConstants {
        &self.constants
    }

    pub fn localize(&self, contour: &Contour) -> TargetEstimate {
        let k = &self.constants;
        let res_x = k.resolution.0 as f64;
        let res_y = k.resolution.1 as f64;
        let dh = k.height_delta();

        let bounding_box = contour.bounding_rect();
        let left = contour.extreme_left();
        let right = contour.extreme_right();

        let n_left = normalize(res_x, res_y, (left.x as f64, left.y as f64));
        let n_right = normalize(res_x, res_y, (right.x as f64, right.y as f64));

        let bearing_left = n_left.0 * k.hfov;
        let bearing_right = n_right.0 * k.hfov;
        let elevation_left = n_left.1 * k.vfov;
        let elevation_right = n_right.1 * k.vfov;

        let left_distance = slant_distance(dh, k.tilt_angle, elevation_left);
        let right_distance = slant_distance(dh, k.tilt_angle, elevation_right);

        let mut estimate = TargetEstimate {
            bounding_box,
            left_point: (left.x, left.y),
            right_point: (right.x, right.y),
            bearing_left,
            bearing_right,
            elevation_left,
            elevation_right,
            left_distance,
            right_distance,
            cosine_quotient: None,
            bearing: None,
            elevation: None,
            distance: None,
            fault: None,
        };

        let (left_d, right_d) = match (left_distance, right_distance) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                estimate.fault = Some(GeometryFault::DistanceUnavailable);
                return estimate;
            }
        };

        let quotient = cosine_quotient(left_d, right_d, k.target_width);
        estimate.cosine_quotient = Some(quotient);

        match solve_triangle(left_d, right_d, k.target_width) {
            Ok(solution) => {
                estimate.bearing = Some(bearing_left + solution.mid_angle);
                estimate.elevation = Some((dh / solution.median).atan());
                estimate.distance = Some(solution.median);
            }
            Err(fault) => {
                debug!("Triangle solve skipped ({:?}), cosine quotient {}", fault, quotient);
                estimate.fault = Some(fault);
            }
        }
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_normalize_center() {
        for (rx, ry) in [(1280.0, 720.0), (640.0, 480.0), (3.0, 7.0)] {
            let (nx, ny) = normalize(rx, ry, (rx / 2.0 - 0.5, ry / 2.0 - 0.5));
            assert!(nx.abs() < TOL && ny.abs() < TOL);
        }
    }

    #[test]
    fn test_normalize_corners() {
        let (nx, ny) = normalize(1280.0, 720.0, (-0.5, -0.5));
        assert!((nx + 1.0).abs() < TOL);
        assert!((ny - 1.0).abs() < TOL);
        let (nx, ny) = normalize(1280.0, 720.0, (1279.5, 719.5));
        assert!((nx - 1.0).abs() < TOL);
        assert!((ny + 1.0).abs() < TOL);
    }

    #[test]
    fn test_slant_distance_45_degrees() {
        let d = slant_distance(0.5, 30.0, 15.0).unwrap();
        assert!((d - 0.5).abs() < TOL);
        let d = slant_distance(0.5, -30.0, -15.0).unwrap();
        assert!((d - 0.5).abs() < TOL);
    }

    #[test]
    fn test_slant_distance_undefined_at_right_angles() {
        assert_eq!(slant_distance(0.44, 0.0, 0.0), None);
        assert_eq!(slant_distance(0.44, 8.32, -8.32), None);
        assert_eq!(slant_distance(0.44, 45.0, 45.0), None);
        assert_eq!(slant_distance(0.44, 90.0, 90.0), None);
    }

    #[test]
    fn test_equilateral_triangle() {
        let w = 0.99695;
        let solution = solve_triangle(w, w, w).unwrap();
        assert!((solution.angle_at_left - 60.0).abs() < 1e-6);
        assert!((solution.median - w).abs() < 1e-9);
        assert!((solution.mid_angle - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_inconsistent_triangle() {
        // Sides 1, 5, 1 violate the triangle inequality
        assert!(cosine_quotient(1.0, 5.0, 1.0).abs() > 1.0);
        assert_eq!(
            solve_triangle(1.0, 5.0, 1.0),
            Err(GeometryFault::CosineOutOfRange)
        );
    }

    #[test]
    fn test_zero_left_distance() {
        assert!(solve_triangle(0.0, 1.0, 1.0).is_err());
    }

    fn constants() -> CameraConstants {
        CameraConstants::default()
    }

    #[test]
    fn test_localize_symmetric_target() {
        let localizer = Localizer::new(constants());
        // Columns 600 and 679 sit symmetrically about the 639.5 center
        let contour = Contour::from_xy(&[(600, 100), (679, 100), (679, 120), (600, 120)]).unwrap();
        let est = localizer.localize(&contour);
        assert_eq!(est.left_point, (600, 100));
        assert_eq!(est.right_point, (679, 100));
        assert_eq!(
            est.bounding_box,
            BoundingBox { x: 600, y: 100, width: 80, height: 21 }
        );
        assert!(est.bearing_left < 0.0 && est.bearing_right > 0.0);
        assert!((est.bearing_left + est.bearing_right).abs() < 1e-9);
        assert!(est.elevation_left > 0.0);
        assert_eq!(est.left_distance, est.right_distance);

        assert!(est.is_complete());
        let left_d = est.left_distance.unwrap();
        assert!((est.distance.unwrap() - left_d).abs() < 1e-9);
        assert!(est.bearing.unwrap() > est.bearing_left);
        let expected = (constants().height_delta() / est.distance.unwrap()).atan();
        assert_eq!(est.elevation, Some(expected));
        assert!(expected > 0.0 && expected < std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_combined_elevation_is_radians() {
        let localizer = Localizer::new(constants());
        let contour = Contour::from_xy(&[(580, 320), (699, 320), (699, 399), (580, 399)]).unwrap();
        let est = localizer.localize(&contour);
        let median = est.distance.unwrap();
        let elevation = est.elevation.unwrap();
        assert_eq!(elevation, (constants().height_delta() / median).atan());
        assert!(elevation.abs() < std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_localize_distance_unavailable() {
        // Odd height puts row 360 exactly on the optical axis; zero tilt
        // then makes the tangent zero for both points.
        let localizer = Localizer::new(CameraConstants {
            resolution: (1280, 721),
            tilt_angle: 0.0,
            ..constants()
        });
        let contour = Contour::from_xy(&[(100, 360), (300, 360)]).unwrap();
        let est = localizer.localize(&contour);
        assert_eq!(est.fault, Some(GeometryFault::DistanceUnavailable));
        assert!(est.left_distance.is_none() && est.right_distance.is_none());
        assert!(est.bearing.is_none() && est.distance.is_none());
        assert!(est.cosine_quotient.is_none());
        assert!(!est.is_complete());
        assert!(est.bearing_left < 0.0);
    }

    #[test]
    fn test_localize_inconsistent_geometry_keeps_raw_angles() {
        // A very narrow physical target makes the two ranges disagree by
        // more than its width, so the triangle cannot close.
        let localizer = Localizer::new(CameraConstants {
            target_width: 0.001,
            ..constants()
        });
        let contour = Contour::from_xy(&[(100, 100), (1100, 600)]).unwrap();
        let est = localizer.localize(&contour);
        assert_eq!(est.fault, Some(GeometryFault::CosineOutOfRange));
        assert!(est.cosine_quotient.unwrap().abs() > 1.0);
        assert!(est.left_distance.is_some() && est.right_distance.is_some());
        assert!(est.bearing.is_none() && est.elevation.is_none() && est.distance.is_none());
        assert!(est.bearing_right > est.bearing_left);
    }
}
