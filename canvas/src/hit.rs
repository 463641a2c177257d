//! Hit-testing: which block, and which part of it, lies under a screen point.
//!
//! Blocks are tested in their own rotated frame using absolute canvas geometry
//! (section offsets composed). Handle sizes are fixed in screen pixels and are
//! converted to canvas units with the current zoom, so handles stay the same size
//! on screen at every scale.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use std::sync::Arc;

use crate::block::{Block, BlockId, Position};
use crate::consts::{RESIZE_HANDLE_OUTSET_PX, RESIZE_HANDLE_PX, ROTATE_HANDLE_OFFSET_PX, ROTATE_HANDLE_RADIUS_PX};
use crate::geometry::{Rect, rect_contains, rotate_point};
use crate::scene::Scene;
use crate::viewport::{Point, Viewport};

/// Which part of a block was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle,
    RotateHandle,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub block_id: BlockId,
    pub part: HitPart,
}

/// Absolute canvas rectangle and rotation of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub rect: Rect,
    pub rotation: f64,
}

/// Absolute frame of block `id`, or `None` if it is not in the scene.
#[must_use]
pub fn frame(scene: &Scene, id: &BlockId) -> Option<Frame> {
    let position = scene.absolute_position(id)?;
    let block = scene.find(id)?;
    Some(Frame { rect: Rect::from_parts(position, block.size), rotation: block.rotation() })
}

/// Test which block (if any) is under `screen_pt`.
///
/// The selected block's handles are checked first, then block bodies from the
/// topmost down, with a section's children checked before the section itself.
#[must_use]
pub fn hit_test(screen_pt: Point, scene: &Scene, viewport: &Viewport, selected: Option<&BlockId>) -> Option<Hit> {
    let pt = viewport.screen_to_canvas(screen_pt);

    if let Some(id) = selected
        && let Some(frame) = frame(scene, id)
        && let Some(part) = handle_at(pt, frame, viewport)
    {
        return Some(Hit { block_id: id.clone(), part });
    }

    body_at(pt, scene.blocks(), Position::default())
        .map(|block_id| Hit { block_id, part: HitPart::Body })
}

fn handle_at(pt: Point, frame: Frame, viewport: &Viewport) -> Option<HitPart> {
    let rect = frame.rect;
    let local = rotate_point(pt, rect.center(), -frame.rotation);

    let radius = viewport.screen_dist_to_canvas(ROTATE_HANDLE_RADIUS_PX);
    let knob = Point::new(rect.x + rect.width * 0.5, rect.y - viewport.screen_dist_to_canvas(ROTATE_HANDLE_OFFSET_PX));
    if (local.x - knob.x).hypot(local.y - knob.y) <= radius {
        return Some(HitPart::RotateHandle);
    }

    let side = viewport.screen_dist_to_canvas(RESIZE_HANDLE_PX);
    let outset = viewport.screen_dist_to_canvas(RESIZE_HANDLE_OUTSET_PX);
    let right = rect.x + rect.width + outset;
    let bottom = rect.y + rect.height + outset;
    if local.x >= right - side && local.x <= right && local.y >= bottom - side && local.y <= bottom {
        return Some(HitPart::ResizeHandle);
    }

    None
}

fn body_at(pt: Point, list: &[Arc<Block>], origin: Position) -> Option<BlockId> {
    list.iter().rev().find_map(|block| {
        let abs = origin.offset(block.position.x, block.position.y);
        body_at(pt, block.children(), abs).or_else(|| {
            rect_contains(Rect::from_parts(abs, block.size), block.rotation(), pt).then(|| block.id.clone())
        })
    })
}
