//! Single selection plus an in-memory block clipboard.
//!
//! The selection holds only an id (a lookup key into the scene). The clipboard
//! holds a value snapshot, so it survives deletion of the block it was copied
//! from and pasting always starts from the same stored position.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use tracing::debug;

use crate::block::{Block, BlockId};
use crate::consts::{DUPLICATE_OFFSET, PASTE_OFFSET};
use crate::scene::Scene;

#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected_id: Option<BlockId>,
    clipboard: Option<Block>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected block id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&BlockId> {
        self.selected_id.as_ref()
    }

    /// The clipboard snapshot, if any.
    #[must_use]
    pub fn clipboard(&self) -> Option<&Block> {
        self.clipboard.as_ref()
    }

    /// Select a block, or deselect with `None`. Returns `true` if the selection changed.
    pub fn select(&mut self, id: Option<BlockId>) -> bool {
        if self.selected_id == id {
            return false;
        }
        self.selected_id = id;
        true
    }

    /// Store a value snapshot of block `id`. No-op (returns `false`) if it is not in `scene`.
    ///
    /// The snapshot carries the block's absolute canvas position, since a paste
    /// always lands at the top level.
    pub fn copy(&mut self, scene: &Scene, id: &BlockId) -> bool {
        let (Some(block), Some(absolute)) = (scene.find(id), scene.absolute_position(id)) else {
            return false;
        };
        let mut snapshot = (**block).clone();
        snapshot.position = absolute;
        self.clipboard = Some(snapshot);
        debug!(%id, "copied block to clipboard");
        true
    }

    /// Paste the clipboard at its stored position plus the paste offset.
    ///
    /// The copy gets fresh ids, is appended on top of the scene and becomes the
    /// selection. Returns `None` when the clipboard is empty.
    #[must_use]
    pub fn paste(&mut self, scene: &Scene) -> Option<(Scene, BlockId)> {
        let source = self.clipboard.as_ref()?;
        let mut copy = source.with_fresh_ids();
        copy.position = source.position.offset(PASTE_OFFSET, PASTE_OFFSET);
        let id = copy.id.clone();
        let next = scene.insert(copy);
        self.selected_id = Some(id.clone());
        debug!(%id, "pasted block");
        Some((next, id))
    }

    /// Copy live block `id` next to itself and select the copy. The clipboard is untouched.
    #[must_use]
    pub fn duplicate(&mut self, scene: &Scene, id: &BlockId) -> Option<(Scene, BlockId)> {
        let (next, new_id) = scene.duplicate(id, DUPLICATE_OFFSET, DUPLICATE_OFFSET)?;
        self.selected_id = Some(new_id.clone());
        Some((next, new_id))
    }

    /// Drop the selection if it no longer resolves in `scene`. Returns `true` if it was cleared.
    pub fn forget_missing(&mut self, scene: &Scene) -> bool {
        match &self.selected_id {
            Some(id) if !scene.contains(id) => {
                self.selected_id = None;
                true
            }
            _ => false,
        }
    }
}
