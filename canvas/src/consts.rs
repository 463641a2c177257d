//! Shared numeric constants for the canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height a block may be resized to, in canvas units.
pub const MIN_BLOCK_SIZE: f64 = 20.0;

/// Screen-space distance the pointer must travel before a gesture mutates anything.
pub const DRAG_THRESHOLD_PX: f64 = 2.0;

// ── Clipboard ───────────────────────────────────────────────────

/// Offset applied to a pasted block relative to the clipboard snapshot.
pub const PASTE_OFFSET: f64 = 30.0;

/// Offset applied to a duplicated block relative to its source.
pub const DUPLICATE_OFFSET: f64 = 20.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Lower bound of the zoom scale.
pub const MIN_SCALE: f64 = 0.1;

/// Upper bound of the zoom scale.
pub const MAX_SCALE: f64 = 2.0;

/// Increment used by the zoom in / zoom out controls.
pub const SCALE_STEP: f64 = 0.1;

// ── Hit-testing ─────────────────────────────────────────────────

/// Side length of the square resize handle, in screen pixels.
pub const RESIZE_HANDLE_PX: f64 = 12.0;

/// How far the resize handle sticks out past the bottom-right corner, in screen pixels.
pub const RESIZE_HANDLE_OUTSET_PX: f64 = 4.0;

/// Radius of the circular rotate handle, in screen pixels.
pub const ROTATE_HANDLE_RADIUS_PX: f64 = 12.0;

/// Distance from the top edge to the rotate handle's centre, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 20.0;
