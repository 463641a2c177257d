#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::block::Position;
use crate::consts::{MAX_SCALE, MIN_SCALE, SCALE_STEP};

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Position> for Point {
    fn from(p: Position) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Zoom and placement of the canvas on screen.
///
/// `origin_x` / `origin_y` are the screen coordinates of the scroll container's
/// top-left corner (CSS pixels). `scroll_left` / `scroll_top` are that container's
/// scroll offsets, in screen pixels of the zoomed content. `scale` is the zoom
/// factor (1.0 = no zoom).
///
/// `canvas = (screen - origin + scroll) / scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { origin_x: 0.0, origin_y: 0.0, scale: 1.0, scroll_left: 0.0, scroll_top: 0.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.origin_x + self.scroll_left) / self.scale,
            y: (screen.y - self.origin_y + self.scroll_top) / self.scale,
        }
    }

    /// Convert a canvas-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point {
            x: canvas.x * self.scale + self.origin_x - self.scroll_left,
            y: canvas.y * self.scale + self.origin_y - self.scroll_top,
        }
    }

    /// Convert a screen-space distance (pixels) to canvas-space distance.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Set the zoom scale, clamped to the supported range.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = if scale.is_finite() { round_step(scale.clamp(MIN_SCALE, MAX_SCALE)) } else { 1.0 };
    }

    /// Zoom in by one step.
    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + SCALE_STEP);
    }

    /// Zoom out by one step.
    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - SCALE_STEP);
    }

    /// Back to 100%.
    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }
}

/// Snap accumulated float steps (0.1 + 0.1 + ...) back onto the two-decimal grid.
fn round_step(scale: f64) -> f64 {
    (scale * 100.0).round() / 100.0
}
