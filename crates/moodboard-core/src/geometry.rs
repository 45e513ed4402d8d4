//! Geometry kernel: rotation-aware hit testing in canvas pixel space.
//!
//! All queries share one local-frame transform: translate the probe point to
//! the box center, then rotate by the negated stored rotation. The rotation
//! is a free real number (never normalized); `sin`/`cos` are taken from the
//! current stored value at query time so accumulated rotation cannot drift
//! from what the renderer paints.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Lower bound for either dimension after an interactive resize.
pub const MIN_ITEM_SIZE: f64 = 20.0;

/// Side length of the resize/rotate handle square.
pub const HANDLE_SIZE: f64 = 12.0;

/// Side length of the link-glyph square shown on items with a source URL.
pub const LINK_GLYPH_SIZE: f64 = 16.0;

/// Unrotated bounding box plus a rotation about its own center.
///
/// `x`/`y` is the top-left corner of the unrotated box; the rotation is
/// applied after translation, around `center()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl Frame {
    /// Create an axis-aligned frame.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Center of the box, which is also the rotation pivot.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Transform a canvas-space point into the frame's local (unrotated)
    /// coordinates, with the origin at the box center.
    pub fn to_local(&self, point: Point) -> Vec2 {
        let center = self.center();
        let angle = -self.rotation;
        let (sin, cos) = angle.sin_cos();
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        Vec2::new(dx * cos - dy * sin, dx * sin + dy * cos)
    }
}

/// Whether a canvas-space point lies inside the rotated box.
///
/// Comparisons are strict, so a point exactly on the boundary (including the
/// rotated corners) is outside.
pub fn contains_point(frame: &Frame, point: Point) -> bool {
    let local = frame.to_local(point);
    local.x > -frame.width / 2.0
        && local.x < frame.width / 2.0
        && local.y > -frame.height / 2.0
        && local.y < frame.height / 2.0
}

/// Whether a point hits the resize/rotate handle square centered on the
/// box's local bottom-right corner. Only meaningful for the selected item;
/// callers enforce that.
pub fn hits_handle(frame: &Frame, point: Point) -> bool {
    let local = frame.to_local(point);
    let half = HANDLE_SIZE / 2.0;
    (local.x - frame.width / 2.0).abs() <= half && (local.y - frame.height / 2.0).abs() <= half
}

/// Whether a point hits the link glyph square tucked inside the box's local
/// top-right corner. Only meaningful for a selected item carrying a source
/// URL; callers enforce that.
pub fn hits_link_glyph(frame: &Frame, point: Point) -> bool {
    let local = frame.to_local(point);
    let half = LINK_GLYPH_SIZE / 2.0;
    let cx = frame.width / 2.0 - half;
    let cy = -frame.height / 2.0 + half;
    (local.x - cx).abs() <= half && (local.y - cy).abs() <= half
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn rotated(rotation: f64) -> Frame {
        let mut frame = Frame::new(100.0, 50.0, 200.0, 80.0);
        frame.rotation = rotation;
        frame
    }

    /// Rotate a local offset from the center out into canvas space.
    fn world_point(frame: &Frame, dx: f64, dy: f64) -> Point {
        let center = frame.center();
        let (sin, cos) = frame.rotation.sin_cos();
        Point::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }

    #[test]
    fn center_is_inside_for_any_rotation() {
        for rotation in [0.0, 0.3, FRAC_PI_2, PI, -2.4, 7.9] {
            let frame = rotated(rotation);
            assert!(contains_point(&frame, frame.center()), "rotation {rotation}");
        }
    }

    #[test]
    fn exact_corners_are_outside_when_axis_aligned() {
        let frame = rotated(0.0);
        for (sx, sy) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
            let corner = world_point(&frame, sx * frame.width / 2.0, sy * frame.height / 2.0);
            assert!(!contains_point(&frame, corner), "corner ({sx},{sy})");
        }
    }

    #[test]
    fn corner_probes_under_rotation() {
        // Away from rotation zero the exact corner is ill-conditioned in
        // floating point; probe just inside and just outside instead.
        for rotation in [0.37, FRAC_PI_2, -1.1, PI, 2.6, 3.0 * FRAC_PI_2] {
            let frame = rotated(rotation);
            let hw = frame.width / 2.0;
            let hh = frame.height / 2.0;
            let inside = world_point(&frame, hw - 1e-6, hh - 1e-6);
            let outside = world_point(&frame, hw + 1e-6, hh + 1e-6);
            assert!(contains_point(&frame, inside), "rotation {rotation}");
            assert!(!contains_point(&frame, outside), "rotation {rotation}");
        }
    }

    #[test]
    fn containment_follows_the_rotated_box() {
        let frame = rotated(FRAC_PI_2);
        // After a quarter turn the 200x80 box occupies an 80x200 region
        // around the center.
        let center = frame.center();
        assert!(contains_point(&frame, Point::new(center.x, center.y + 90.0)));
        assert!(!contains_point(&frame, Point::new(center.x + 90.0, center.y)));
    }

    #[test]
    fn handle_sits_on_the_rotated_bottom_right_corner() {
        for rotation in [0.0, 0.8, -2.3] {
            let frame = rotated(rotation);
            let corner = world_point(&frame, frame.width / 2.0, frame.height / 2.0);
            assert!(hits_handle(&frame, corner), "rotation {rotation}");

            let off = world_point(
                &frame,
                frame.width / 2.0 + HANDLE_SIZE,
                frame.height / 2.0 + HANDLE_SIZE,
            );
            assert!(!hits_handle(&frame, off), "rotation {rotation}");
        }
    }

    #[test]
    fn link_glyph_sits_inside_the_top_right_corner() {
        let frame = rotated(0.0);
        let half = LINK_GLYPH_SIZE / 2.0;
        let glyph_center = world_point(&frame, frame.width / 2.0 - half, -frame.height / 2.0 + half);
        assert!(hits_link_glyph(&frame, glyph_center));
        // The glyph and the handle occupy different corners.
        assert!(!hits_handle(&frame, glyph_center));
        let opposite = world_point(&frame, -frame.width / 2.0 + half, frame.height / 2.0 - half);
        assert!(!hits_link_glyph(&frame, opposite));
    }

    #[test]
    fn rotation_is_not_normalized() {
        // 4 full turns plus a quarter behaves exactly like a quarter turn.
        let frame = rotated(FRAC_PI_2 + 8.0 * PI);
        let center = frame.center();
        assert!(contains_point(&frame, Point::new(center.x, center.y + 90.0)));
        assert!(!contains_point(&frame, Point::new(center.x + 90.0, center.y)));
    }
}
