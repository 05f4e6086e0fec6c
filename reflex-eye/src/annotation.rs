//! Debug overlay drawn on frames with a target

use crate::processing::TargetEstimate;
use crate::Frame;
use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const POINT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const POINT_RADIUS: i32 = 8;

/// Bounding box, both extreme points, and the line joining them
pub fn annotate(frame: &mut Frame, estimate: &TargetEstimate) {
    let b = estimate.bounding_box;
    let rect = Rect::at(b.x, b.y).of_size(b.width.max(1) as u32, b.height.max(1) as u32);
    draw_hollow_rect_mut(frame, rect, BOX_COLOR);

    draw_filled_circle_mut(frame, estimate.left_point, POINT_RADIUS, POINT_COLOR);
    draw_filled_circle_mut(frame, estimate.right_point, POINT_RADIUS, POINT_COLOR);

    let (lx, ly) = estimate.left_point;
    let (rx, ry) = estimate.right_point;
    draw_line_segment_mut(
        frame,
        (lx as f32, ly as f32),
        (rx as f32, ry as f32),
        LINE_COLOR,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::BoundingBox;

    fn estimate() -> TargetEstimate {
        TargetEstimate {
            bounding_box: BoundingBox {
                x: 20,
                y: 20,
                width: 60,
                height: 30,
            },
            left_point: (20, 40),
            right_point: (79, 40),
            bearing_left: 0.0,
            bearing_right: 0.0,
            elevation_left: 0.0,
            elevation_right: 0.0,
            left_distance: None,
            right_distance: None,
            cosine_quotient: None,
            bearing: None,
            elevation: None,
            distance: None,
            fault: None,
        }
    }

    #[test]
    fn test_overlay_pixels() {
        let mut frame = Frame::new(100, 100);
        annotate(&mut frame, &estimate());
        assert_eq!(frame.get_pixel(50, 20), &BOX_COLOR);
        assert_eq!(frame.get_pixel(20, 40), &POINT_COLOR);
        assert_eq!(frame.get_pixel(79, 46), &POINT_COLOR);
        assert_eq!(frame.get_pixel(50, 40), &LINE_COLOR);
        assert_eq!(frame.get_pixel(5, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_overlay_clips_at_frame_edge() {
        let mut frame = Frame::new(30, 30);
        let mut e = estimate();
        e.left_point = (0, 0);
        e.right_point = (29, 29);
        annotate(&mut frame, &e);
        assert_eq!(frame.get_pixel(0, 0), &POINT_COLOR);
    }
}
