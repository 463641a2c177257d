//! Pure geometry for direct manipulation.
//!
//! Every function here converts pointer deltas measured in screen space into
//! canvas-space changes. They take the active zoom `scale` explicitly and never
//! read any editor state, so gestures can recompute from a fixed start snapshot on
//! each pointer move.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::block::{Position, Size};
use crate::consts::MIN_BLOCK_SIZE;
use crate::viewport::Point;

/// Axis-aligned rectangle before rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn from_parts(position: Position, size: Size) -> Self {
        Self { x: position.x, y: position.y, width: size.width, height: size.height }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

fn effective_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = ((degrees % 360.0) + 360.0) % 360.0;
    // Tiny negative inputs round up to exactly 360.0.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Move `position` by a screen-space pointer delta at zoom `scale`.
#[must_use]
pub fn translate(position: Position, screen_dx: f64, screen_dy: f64, scale: f64) -> Position {
    let scale = effective_scale(scale);
    position.offset(screen_dx / scale, screen_dy / scale)
}

/// Grow or shrink `size` by a screen-space pointer delta at zoom `scale`, keeping
/// both dimensions at or above [`MIN_BLOCK_SIZE`].
#[must_use]
pub fn resize(size: Size, screen_dx: f64, screen_dy: f64, scale: f64) -> Size {
    let scale = effective_scale(scale);
    Size::new(
        (size.width + screen_dx / scale).max(MIN_BLOCK_SIZE),
        (size.height + screen_dy / scale).max(MIN_BLOCK_SIZE),
    )
}

/// Angle of `pointer` around `center` in degrees, with straight up as 0°.
#[must_use]
pub fn pointer_angle(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() + 90.0
}

/// Rotation after sweeping the pointer from `start` to `current` around `center`.
///
/// All three points are in the same (screen) space. The result is normalized.
#[must_use]
pub fn rotate(center: Point, start: Point, current: Point, start_rotation: f64) -> f64 {
    let swept = pointer_angle(center, current) - pointer_angle(center, start);
    normalize_degrees(start_rotation + swept)
}

/// Canvas position for a drop at viewport coordinates `(x, y)` inside a scrolled
/// container. Both axes are clamped to be non-negative.
#[must_use]
pub fn drop_position(x: f64, y: f64, scroll_top: f64, scroll_left: f64) -> Position {
    Position::new((x + scroll_left).max(0.0), (y + scroll_top).max(0.0))
}

/// Rotate `point` around `pivot` by `degrees` (clockwise in screen coordinates).
#[must_use]
pub fn rotate_point(point: Point, pivot: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;
    Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
}

/// Whether `point` lies inside `rect` rotated by `rotation` degrees about its centre.
#[must_use]
pub fn rect_contains(rect: Rect, rotation: f64, point: Point) -> bool {
    let local = rotate_point(point, rect.center(), -rotation);
    local.x >= rect.x && local.x <= rect.x + rect.width && local.y >= rect.y && local.y <= rect.y + rect.height
}
