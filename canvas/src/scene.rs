//! Scene tree: the ordered, possibly nested collection of blocks.
//!
//! A [`Scene`] is an immutable value. Every mutation returns a new scene that
//! shares the `Arc` of every block it did not touch; a nested edit path-copies
//! only the ancestors of the edited block. Hosts can therefore detect changes
//! with [`Arc::ptr_eq`] instead of deep comparison.
//!
//! All operations are total: an id that is not in the scene yields an unchanged
//! scene. Z-order is the index in a sibling list, later entries on top.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::{Block, BlockBody, BlockId, BlockPatch, Position};

/// Which end of its sibling list a block is moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Rendered last, on top of its siblings.
    Front,
    /// Rendered first, beneath its siblings.
    Back,
}

/// Ordered block collection owned by the editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Scene {
    blocks: Vec<Arc<Block>>,
}

impl Scene {
    /// An empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from loaded blocks.
    ///
    /// Any id that repeats somewhere in the tree is replaced with a fresh one so
    /// that ids stay unique across the whole scene.
    #[must_use]
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let blocks: Vec<Arc<Block>> = blocks.into_iter().map(Arc::new).collect();
        let mut seen = HashSet::new();
        Self { blocks: rekey_duplicates(&blocks, &mut seen) }
    }

    /// Top-level blocks in z-order (bottom first).
    #[must_use]
    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    /// Iterate top-level blocks in z-order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Block>> {
        self.blocks.iter()
    }

    /// Number of top-level blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the scene has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of blocks including nested children.
    #[must_use]
    pub fn total_len(&self) -> usize {
        fn count(list: &[Arc<Block>]) -> usize {
            list.iter().map(|b| 1 + count(b.children())).sum()
        }
        count(&self.blocks)
    }

    /// Every id in the tree, in pre-order.
    #[must_use]
    pub fn ids(&self) -> Vec<BlockId> {
        fn walk(list: &[Arc<Block>], out: &mut Vec<BlockId>) {
            for block in list {
                out.push(block.id.clone());
                walk(block.children(), out);
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }

    /// Look up a block anywhere in the tree.
    #[must_use]
    pub fn find(&self, id: &BlockId) -> Option<&Arc<Block>> {
        fn search<'a>(list: &'a [Arc<Block>], id: &BlockId) -> Option<&'a Arc<Block>> {
            list.iter().find_map(|b| if &b.id == id { Some(b) } else { search(b.children(), id) })
        }
        search(&self.blocks, id)
    }

    #[must_use]
    pub fn contains(&self, id: &BlockId) -> bool {
        self.find(id).is_some()
    }

    /// Canvas position of a block's top-left corner, composing the offsets of
    /// every enclosing section.
    #[must_use]
    pub fn absolute_position(&self, id: &BlockId) -> Option<Position> {
        fn search(list: &[Arc<Block>], id: &BlockId, origin: Position) -> Option<Position> {
            list.iter().find_map(|b| {
                let abs = origin.offset(b.position.x, b.position.y);
                if &b.id == id { Some(abs) } else { search(b.children(), id, abs) }
            })
        }
        search(&self.blocks, id, Position::default())
    }

    /// Every id in the tree except those nested under `id`, which stays in the
    /// set itself. `None` if `id` is unknown.
    fn ids_outside_children_of(&self, id: &BlockId) -> Option<HashSet<BlockId>> {
        fn walk(list: &[Arc<Block>], skip_under: &BlockId, out: &mut HashSet<BlockId>) {
            for block in list {
                out.insert(block.id.clone());
                if &block.id != skip_under {
                    walk(block.children(), skip_under, out);
                }
            }
        }
        if !self.contains(id) {
            return None;
        }
        let mut out = HashSet::new();
        walk(&self.blocks, id, &mut out);
        Some(out)
    }

    // --- Mutations ---

    /// Append a block at the top level, on top of everything.
    #[must_use]
    pub fn insert(&self, block: Block) -> Scene {
        let mut blocks = self.blocks.clone();
        blocks.push(Arc::new(block));
        Scene { blocks }
    }

    /// Merge `patch` into the block with `id`.
    ///
    /// Returns `None` if the id is unknown or the patch does not fit the block.
    #[must_use]
    pub fn try_update(&self, id: &BlockId, patch: &BlockPatch) -> Option<Scene> {
        let keyed;
        let patch = match &patch.children {
            Some(children) => {
                let mut taken = self.ids_outside_children_of(id)?;
                keyed = BlockPatch { children: Some(rekey_duplicates(children, &mut taken)), ..patch.clone() };
                &keyed
            }
            None => patch,
        };
        let blocks = edit_siblings(&self.blocks, id, &mut |list, idx| {
            let current = list.get(idx)?;
            match current.patched(patch) {
                Ok(next) => Some(replace_at(list, idx, next)),
                Err(e) => {
                    warn!(%id, error = %e, "rejected block patch");
                    None
                }
            }
        })?;
        Some(Scene { blocks })
    }

    /// Merge `patch` into the block with `id`; unchanged scene when that fails.
    #[must_use]
    pub fn update(&self, id: &BlockId, patch: &BlockPatch) -> Scene {
        self.try_update(id, patch).unwrap_or_else(|| self.clone())
    }

    /// Replace the position of the block with `id` wholesale.
    #[must_use]
    pub fn move_to(&self, id: &BlockId, position: Position) -> Scene {
        self.edit(id, |list, idx| {
            let mut next = (**list.get(idx)?).clone();
            next.position = position;
            Some(replace_at(list, idx, next))
        })
    }

    /// Move a block to the front or back of its own sibling list.
    #[must_use]
    pub fn reorder(&self, id: &BlockId, layer: Layer) -> Scene {
        self.edit(id, |list, idx| {
            let mut next = list.to_vec();
            let moved = next.remove(idx);
            match layer {
                Layer::Front => next.push(moved),
                Layer::Back => next.insert(0, moved),
            }
            Some(next)
        })
    }

    /// Remove the block with `id` together with its children.
    #[must_use]
    pub fn remove(&self, id: &BlockId) -> Scene {
        self.edit(id, |list, idx| {
            let mut next = list.to_vec();
            next.remove(idx);
            Some(next)
        })
    }

    /// Copy the block with `id` (fresh ids for it and its subtree), offset by
    /// `(dx, dy)`, and place the copy on top of the same sibling list.
    ///
    /// Returns the new scene and the id of the copy, or `None` if `id` is unknown.
    #[must_use]
    pub fn duplicate(&self, id: &BlockId, dx: f64, dy: f64) -> Option<(Scene, BlockId)> {
        let mut new_id = None;
        let blocks = edit_siblings(&self.blocks, id, &mut |list, idx| {
            let source = list.get(idx)?;
            let mut copy = source.with_fresh_ids();
            copy.position = copy.position.offset(dx, dy);
            new_id = Some(copy.id.clone());
            let mut next = list.to_vec();
            next.push(Arc::new(copy));
            Some(next)
        })?;
        let new_id = new_id?;
        debug!(source = %id, copy = %new_id, "duplicated block");
        Some((Scene { blocks }, new_id))
    }

    fn edit<F>(&self, id: &BlockId, mut f: F) -> Scene
    where
        F: FnMut(&[Arc<Block>], usize) -> Option<Vec<Arc<Block>>>,
    {
        match edit_siblings(&self.blocks, id, &mut f) {
            Some(blocks) => Scene { blocks },
            None => self.clone(),
        }
    }
}

/// Find the sibling list that holds `id` and rebuild it with `edit`, path-copying
/// every enclosing section. Returns `None` when nothing changed.
fn edit_siblings<F>(list: &[Arc<Block>], id: &BlockId, edit: &mut F) -> Option<Vec<Arc<Block>>>
where
    F: FnMut(&[Arc<Block>], usize) -> Option<Vec<Arc<Block>>>,
{
    if let Some(idx) = list.iter().position(|b| &b.id == id) {
        return edit(list, idx);
    }
    for (i, block) in list.iter().enumerate() {
        if block.children().is_empty() {
            continue;
        }
        if let Some(children) = edit_siblings(block.children(), id, edit) {
            return Some(replace_at(list, i, with_children(block, children)));
        }
    }
    None
}

fn replace_at(list: &[Arc<Block>], idx: usize, block: Block) -> Vec<Arc<Block>> {
    let mut next = list.to_vec();
    if let Some(slot) = next.get_mut(idx) {
        *slot = Arc::new(block);
    }
    next
}

fn with_children(block: &Block, children: Vec<Arc<Block>>) -> Block {
    let mut next = block.clone();
    if let BlockBody::Section { children: slot, .. } = &mut next.body {
        *slot = children;
    }
    next
}

fn rekey_duplicates(list: &[Arc<Block>], seen: &mut HashSet<BlockId>) -> Vec<Arc<Block>> {
    list.iter()
        .map(|block| {
            let mut changed: Option<Block> = None;
            if !seen.insert(block.id.clone()) {
                let mut copy = (**block).clone();
                copy.id = BlockId::generate();
                warn!(duplicate = %block.id, replacement = %copy.id, "re-keyed duplicate block id");
                seen.insert(copy.id.clone());
                changed = Some(copy);
            }

            let children = rekey_duplicates(block.children(), seen);
            let children_changed = children
                .iter()
                .zip(block.children())
                .any(|(a, b)| !Arc::ptr_eq(a, b));
            if children_changed {
                let base = changed.take().unwrap_or_else(|| (**block).clone());
                changed = Some(with_children(&base, children));
            }

            changed.map_or_else(|| Arc::clone(block), Arc::new)
        })
        .collect()
}
