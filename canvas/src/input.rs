//! Input model: modifier keys, focus context, pointer capture and the gesture state machine.
//!
//! This module defines the types consumed by the editor core. `Modifiers`,
//! `Key` and `FocusContext` describe a keyboard event and where focus was when
//! it fired. `InputState` is the gesture being tracked between pointer-down and
//! pointer-up: it is armed on pointer-down, becomes active once the pointer has
//! travelled past [`DRAG_THRESHOLD_PX`], and returns to idle on pointer-up or
//! cancel.
//!
//! A gesture owns a [`CaptureLease`] for the document-level move/up listeners the
//! host registered when it started. Dropping the gesture, on any path, drops the
//! lease and the listeners go with it.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;

use crate::block::{BlockId, Position, Size};
use crate::consts::DRAG_THRESHOLD_PX;
use crate::geometry::{normalize_degrees, resize, rotate, translate};
use crate::viewport::Point;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Windows/Linux or Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"d"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Whether this key is exactly `letter`. Shifted keys report uppercase and
    /// do not match a lowercase letter.
    #[must_use]
    pub fn is_letter(&self, letter: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c == letter)
    }
}

/// Kind of element that held focus when a key event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// The canvas or any non-editable element.
    #[default]
    Canvas,
    /// An `<input>` element.
    Input,
    /// A `<textarea>` element.
    TextArea,
    /// An element with `contenteditable`.
    ContentEditable,
}

/// Focus state reported by the host alongside a key event.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusContext {
    /// Element holding focus.
    pub target: FocusTarget,
    /// Whether the document currently has a non-empty text selection.
    pub has_text_selection: bool,
}

impl FocusContext {
    /// Classify a DOM element by tag name and its `isContentEditable` flag.
    #[must_use]
    pub fn from_element(tag_name: &str, content_editable: bool, has_text_selection: bool) -> Self {
        let target = if tag_name.eq_ignore_ascii_case("input") {
            FocusTarget::Input
        } else if tag_name.eq_ignore_ascii_case("textarea") {
            FocusTarget::TextArea
        } else if content_editable {
            FocusTarget::ContentEditable
        } else {
            FocusTarget::Canvas
        };
        Self { target, has_text_selection }
    }

    /// Whether focus is inside a text-editing control.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        !matches!(self.target, FocusTarget::Canvas)
    }
}

// =============================================================
// Pointer capture
// =============================================================

/// Host hook that registers document-level pointer-move/up listeners for the
/// duration of a gesture.
pub trait PointerCapture {
    /// Register the listeners. They stay registered until the returned lease is dropped.
    fn capture(&mut self) -> CaptureLease;
}

/// Keeps gesture listeners registered; releases them exactly once when dropped.
pub struct CaptureLease {
    release: Option<Box<dyn FnOnce()>>,
}

impl CaptureLease {
    /// A lease that runs `release` when dropped.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// A lease with nothing to release.
    #[must_use]
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for CaptureLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for CaptureLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureLease")
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// Capture for hosts that deliver every pointer event to the engine anyway.
#[derive(Debug, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn capture(&mut self) -> CaptureLease {
        CaptureLease::detached()
    }
}

// =============================================================
// Gestures
// =============================================================

/// What a gesture does to its block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    /// Body drag: moves the block.
    Drag,
    /// Bottom-right corner drag: resizes the block.
    Resize,
    /// Top handle drag: rotates the block around `pivot`, the block's screen-space
    /// centre at gesture start.
    Rotate { pivot: Point },
}

/// Block and pointer state captured at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStart {
    /// Screen-space pointer position at pointer-down.
    pub pointer: Point,
    /// Block position at pointer-down (in its parent's space).
    pub position: Position,
    /// Block size at pointer-down.
    pub size: Size,
    /// Block rotation at pointer-down, in degrees.
    pub rotation: f64,
    /// Zoom scale at pointer-down.
    pub scale: f64,
}

/// The geometry a gesture wants its block to have for a given pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    Move(Position),
    Resize(Size),
    Rotate(f64),
}

/// One pointer-down→move→up interaction on one block through one handle.
#[derive(Debug)]
pub struct Gesture {
    /// Block being manipulated.
    pub id: BlockId,
    pub kind: GestureKind,
    pub start: GestureStart,
    lease: CaptureLease,
}

impl Gesture {
    #[must_use]
    pub fn new(id: BlockId, kind: GestureKind, start: GestureStart, lease: CaptureLease) -> Self {
        Self { id, kind, start, lease }
    }

    /// Whether `pointer` is far enough from the start to count as movement.
    #[must_use]
    pub fn passes_threshold(&self, pointer: Point) -> bool {
        (pointer.x - self.start.pointer.x).abs() > DRAG_THRESHOLD_PX
            || (pointer.y - self.start.pointer.y).abs() > DRAG_THRESHOLD_PX
    }

    /// Target geometry for `pointer`, computed from the start snapshot only.
    #[must_use]
    pub fn effect(&self, pointer: Point) -> GestureEffect {
        let dx = pointer.x - self.start.pointer.x;
        let dy = pointer.y - self.start.pointer.y;
        match self.kind {
            GestureKind::Drag => GestureEffect::Move(translate(self.start.position, dx, dy, self.start.scale)),
            GestureKind::Resize => GestureEffect::Resize(resize(self.start.size, dx, dy, self.start.scale)),
            GestureKind::Rotate { pivot } => {
                let raw = rotate(pivot, self.start.pointer, pointer, self.start.rotation);
                GestureEffect::Rotate(normalize_degrees(raw.round()))
            }
        }
    }

    /// Whether this gesture still holds its listeners.
    #[must_use]
    pub fn holds_capture(&self) -> bool {
        self.lease.release.is_some()
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Pointer is down on a block but has not moved past the threshold yet.
    Armed(Gesture),
    /// Pointer has moved past the threshold; every move updates the block.
    Active(Gesture),
}

impl InputState {
    /// The gesture in progress, armed or active.
    #[must_use]
    pub fn gesture(&self) -> Option<&Gesture> {
        match self {
            Self::Idle => None,
            Self::Armed(g) | Self::Active(g) => Some(g),
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}
