//! Draw list: the scene flattened into paint order.
//!
//! Hosts render blocks as absolutely positioned elements, so nested sections must
//! be resolved to canvas coordinates before painting. [`draw_list`] walks the tree
//! once, composing each section's offset into its children, and yields one
//! [`DrawItem`] per block: parents before children, earlier siblings before later
//! ones. It receives read-only views of the scene and does not mutate anything.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::sync::Arc;

use crate::block::{Block, BlockId, BlockKind, Position};
use crate::geometry::Rect;
use crate::scene::Scene;

/// One block resolved to absolute canvas geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Absolute canvas rectangle before rotation.
    pub rect: Rect,
    /// Rotation in degrees about the rectangle's centre.
    pub rotation: f64,
    pub opacity: f64,
    /// Nesting depth; top-level blocks are 0.
    pub depth: usize,
    /// Whether the block is selected (draws the outline and handles).
    pub selected: bool,
    /// The block itself, for styles and content.
    pub block: Arc<Block>,
}

/// Flatten `scene` into paint order.
#[must_use]
pub fn draw_list(scene: &Scene, selected: Option<&BlockId>) -> Vec<DrawItem> {
    let mut out = Vec::with_capacity(scene.total_len());
    push_items(scene.blocks(), Position::default(), 0, selected, &mut out);
    out
}

fn push_items(list: &[Arc<Block>], origin: Position, depth: usize, selected: Option<&BlockId>, out: &mut Vec<DrawItem>) {
    for block in list {
        let abs = origin.offset(block.position.x, block.position.y);
        out.push(DrawItem {
            id: block.id.clone(),
            kind: block.kind(),
            rect: Rect::from_parts(abs, block.size),
            rotation: block.rotation(),
            opacity: block.opacity(),
            depth,
            selected: selected == Some(&block.id),
            block: Arc::clone(block),
        });
        push_items(block.children(), abs, depth + 1, selected, out);
    }
}
