#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::block::{Block, BlockId, BlockKind, BlockPatch, DropPayload, Extra, PayloadError, Position, create_block};
use crate::geometry::{Rect, drop_position};
use crate::hit::{Hit, HitPart, frame, hit_test};
use crate::input::{
    Button, FocusContext, Gesture, GestureEffect, GestureKind, GestureStart, InputState, Key, Modifiers, NoCapture,
    PointerCapture,
};
use crate::keymap::{self, Command};
use crate::render::{DrawItem, draw_list};
use crate::scene::{Layer, Scene};
use crate::selection::Selection;
use crate::viewport::{Point, Viewport};

const CURSOR_DEFAULT: &str = "default";
const CURSOR_MOVE: &str = "move";
const CURSOR_RESIZE: &str = "se-resize";
const CURSOR_ROTATE: &str = "grabbing";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A block was added (add, drop, duplicate, paste).
    BlockCreated(Block),
    /// A block's geometry, styles or content changed.
    BlockUpdated { id: BlockId },
    /// A block and its subtree were removed.
    BlockDeleted { id: BlockId },
    SelectionChanged(Option<BlockId>),
    /// The whole scene was swapped (loaded layout or AI result).
    SceneReplaced,
    /// Suppress the browser's native handling of the current key event.
    PreventDefault,
    SetCursor(&'static str),
    RenderNeeded,
}

/// Core editor state: scene, viewport, selection and the gesture in progress.
///
/// Holds no browser handles, so it can be driven entirely from tests. The host
/// forwards DOM events and applies the returned [`Action`]s.
pub struct EditorCore {
    scene: Scene,
    viewport: Viewport,
    selection: Selection,
    input: InputState,
    capture: Box<dyn PointerCapture>,
}

impl Default for EditorCore {
    fn default() -> Self {
        Self::with_capture(NoCapture)
    }
}

impl EditorCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An editor whose gestures register listeners through `capture`.
    #[must_use]
    pub fn with_capture(capture: impl PointerCapture + 'static) -> Self {
        Self {
            scene: Scene::new(),
            viewport: Viewport::default(),
            selection: Selection::new(),
            input: InputState::Idle,
            capture: Box::new(capture),
        }
    }

    // --- Layout ---

    /// Hydrate the scene from a stored layout.
    pub fn load_layout(&mut self, blocks: Vec<Block>) -> Vec<Action> {
        debug!(count = blocks.len(), "loading layout");
        self.replace_scene(Scene::from_blocks(blocks))
    }

    /// Replace every block wholesale, e.g. with an AI-proposed layout.
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) -> Vec<Action> {
        debug!(count = blocks.len(), "replacing blocks");
        self.replace_scene(Scene::from_blocks(blocks))
    }

    fn replace_scene(&mut self, scene: Scene) -> Vec<Action> {
        self.input = InputState::Idle;
        self.scene = scene;
        let mut actions = vec![Action::SceneReplaced];
        if self.selection.forget_missing(&self.scene) {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Create a block of `kind` at canvas `position`, put it on top and select it.
    pub fn add_block(&mut self, kind: BlockKind, position: Position) -> Vec<Action> {
        let block = create_block(kind, position);
        let id = block.id.clone();
        debug!(%id, %kind, "added block");
        self.scene = self.scene.insert(block.clone());
        self.selection.select(Some(id.clone()));
        vec![Action::BlockCreated(block), Action::SelectionChanged(Some(id)), Action::RenderNeeded]
    }

    /// Handle a toolbar drop: parse the `{type}` payload and create that block under
    /// the drop point.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] if the payload is malformed; nothing changes.
    pub fn drop_payload(&mut self, raw: &str, screen_pt: Point) -> Result<Vec<Action>, PayloadError> {
        let payload = DropPayload::parse(raw).inspect_err(|e| warn!(error = %e, "rejected drop payload"))?;
        let vp = self.viewport;
        let local = drop_position(screen_pt.x - vp.origin_x, screen_pt.y - vp.origin_y, vp.scroll_top, vp.scroll_left);
        let position = Position::new(vp.screen_dist_to_canvas(local.x), vp.screen_dist_to_canvas(local.y));
        Ok(self.add_block(payload.kind, position))
    }

    // --- Block edits ---

    /// Merge `patch` into block `id`. Unknown ids and rejected patches change nothing.
    pub fn update_block(&mut self, id: &BlockId, patch: &BlockPatch) -> Vec<Action> {
        let Some(next) = self.scene.try_update(id, patch) else {
            return Vec::new();
        };
        self.scene = next;
        let mut actions = vec![Action::BlockUpdated { id: id.clone() }];
        if self.selection.forget_missing(&self.scene) {
            actions.push(Action::SelectionChanged(None));
        }
        self.drop_orphaned_gesture();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Set block `id`'s position wholesale.
    pub fn move_block(&mut self, id: &BlockId, position: Position) -> Vec<Action> {
        if !self.scene.contains(id) {
            return Vec::new();
        }
        self.scene = self.scene.move_to(id, position);
        vec![Action::BlockUpdated { id: id.clone() }, Action::RenderNeeded]
    }

    /// Bring block `id` to the front or send it to the back of its sibling list.
    pub fn reorder_block(&mut self, id: &BlockId, layer: Layer) -> Vec<Action> {
        if !self.scene.contains(id) {
            return Vec::new();
        }
        debug!(%id, ?layer, "reordered block");
        self.scene = self.scene.reorder(id, layer);
        vec![Action::BlockUpdated { id: id.clone() }, Action::RenderNeeded]
    }

    /// Remove block `id` and its subtree.
    ///
    /// Clears the selection if it pointed into the removed subtree and ends any
    /// gesture on it.
    pub fn delete_block(&mut self, id: &BlockId) -> Vec<Action> {
        if !self.scene.contains(id) {
            return Vec::new();
        }
        debug!(%id, "deleted block");
        self.scene = self.scene.remove(id);
        self.drop_orphaned_gesture();

        let mut actions = vec![Action::BlockDeleted { id: id.clone() }];
        if self.selection.forget_missing(&self.scene) {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Copy block `id` (offset 20) next to itself and select the copy.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Vec<Action> {
        let Some((next, new_id)) = self.selection.duplicate(&self.scene, id) else {
            return Vec::new();
        };
        self.scene = next;
        self.created(new_id)
    }

    /// Snapshot block `id` into the clipboard.
    pub fn copy_block(&mut self, id: &BlockId) -> Vec<Action> {
        self.selection.copy(&self.scene, id);
        Vec::new()
    }

    /// Paste the clipboard (offset 30 from where it was copied) and select the copy.
    pub fn paste(&mut self) -> Vec<Action> {
        let Some((next, new_id)) = self.selection.paste(&self.scene) else {
            return Vec::new();
        };
        self.scene = next;
        self.created(new_id)
    }

    fn created(&self, id: BlockId) -> Vec<Action> {
        let mut actions = Vec::with_capacity(3);
        if let Some(block) = self.scene.find(&id) {
            actions.push(Action::BlockCreated((**block).clone()));
        }
        actions.push(Action::SelectionChanged(Some(id)));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Select block `id`, or clear the selection with `None`. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<BlockId>) -> Vec<Action> {
        if id.as_ref().is_some_and(|id| !self.scene.contains(id)) {
            return Vec::new();
        }
        if !self.selection.select(id.clone()) {
            return Vec::new();
        }
        vec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    /// Replace the text of text block `id` with an AI rewrite.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::EmptyText`] for blank text and
    /// [`PayloadError::NotText`] if `id` is not a text block.
    pub fn apply_rewrite(&mut self, id: &BlockId, text: &str) -> Result<Vec<Action>, PayloadError> {
        if text.trim().is_empty() {
            return Err(PayloadError::EmptyText);
        }
        let Some(block) = self.scene.find(id) else {
            return Ok(Vec::new());
        };
        if block.kind() != BlockKind::Text {
            return Err(PayloadError::NotText(id.clone()));
        }
        let mut content = Extra::new();
        content.insert("text".into(), text.into());
        Ok(self.update_block(id, &BlockPatch::content(content)))
    }

    // --- Pointer input ---

    /// Pointer pressed at `screen_pt`: hit-test and start a gesture on whatever is
    /// under the pointer, or clear the selection on empty canvas.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        match hit_test(screen_pt, &self.scene, &self.viewport, self.selection.selected()) {
            Some(hit) => {
                let client_rect = self.client_rect(&hit.block_id);
                self.on_pointer_down_on(&hit, screen_pt, client_rect)
            }
            None => {
                self.input = InputState::Idle;
                self.select(None)
            }
        }
    }

    /// Pointer pressed on a part of a block the host has already identified.
    ///
    /// `client_rect` is the block's on-screen bounding rectangle; a rotate gesture
    /// needs it for its pivot and is refused without one.
    pub fn on_pointer_down_on(&mut self, hit: &Hit, screen_pt: Point, client_rect: Option<Rect>) -> Vec<Action> {
        self.input = InputState::Idle;

        let Some(block) = self.scene.find(&hit.block_id) else {
            debug!(id = %hit.block_id, "pointer down on missing block");
            return Vec::new();
        };
        let kind = match hit.part {
            HitPart::Body => GestureKind::Drag,
            HitPart::ResizeHandle => GestureKind::Resize,
            HitPart::RotateHandle => {
                let Some(rect) = client_rect else {
                    debug!(id = %hit.block_id, "rotate without client rect");
                    return Vec::new();
                };
                GestureKind::Rotate { pivot: rect.center() }
            }
        };
        let start = GestureStart {
            pointer: screen_pt,
            position: block.position,
            size: block.size,
            rotation: block.rotation(),
            scale: self.viewport.scale,
        };

        let lease = self.capture.capture();
        self.input = InputState::Armed(Gesture::new(hit.block_id.clone(), kind, start, lease));
        debug!(id = %hit.block_id, ?kind, "gesture armed");

        let mut actions = self.select(Some(hit.block_id.clone()));
        actions.push(Action::SetCursor(cursor_for(kind)));
        actions
    }

    /// Pointer moved: activate an armed gesture past the threshold, then apply it.
    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        let gesture = match std::mem::take(&mut self.input) {
            InputState::Idle => return Vec::new(),
            InputState::Armed(gesture) => {
                if !gesture.passes_threshold(screen_pt) {
                    self.input = InputState::Armed(gesture);
                    return Vec::new();
                }
                debug!(id = %gesture.id, "gesture active");
                gesture
            }
            InputState::Active(gesture) => gesture,
        };
        let actions = self.apply_gesture(&gesture, screen_pt);
        if !actions.is_empty() {
            self.input = InputState::Active(gesture);
        }
        actions
    }

    /// Pointer released: commit the reached state and end the gesture.
    pub fn on_pointer_up(&mut self, screen_pt: Point) -> Vec<Action> {
        let mut actions = match std::mem::take(&mut self.input) {
            InputState::Idle => return Vec::new(),
            InputState::Armed(_) => Vec::new(),
            InputState::Active(gesture) => {
                debug!(id = %gesture.id, "gesture committed");
                self.apply_gesture(&gesture, screen_pt)
            }
        };
        actions.push(Action::SetCursor(CURSOR_DEFAULT));
        actions
    }

    /// End any gesture without reverting what it already applied.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        if self.input.is_idle() {
            return Vec::new();
        }
        debug!("gesture cancelled");
        self.input = InputState::Idle;
        vec![Action::SetCursor(CURSOR_DEFAULT)]
    }

    fn apply_gesture(&mut self, gesture: &Gesture, screen_pt: Point) -> Vec<Action> {
        let id = &gesture.id;
        if !self.scene.contains(id) {
            return Vec::new();
        }
        self.scene = match gesture.effect(screen_pt) {
            GestureEffect::Move(position) => self.scene.move_to(id, position),
            GestureEffect::Resize(size) => self.scene.update(id, &BlockPatch::size(size)),
            GestureEffect::Rotate(degrees) => self.scene.update(id, &BlockPatch::rotation(degrees)),
        };
        vec![Action::BlockUpdated { id: id.clone() }, Action::RenderNeeded]
    }

    fn drop_orphaned_gesture(&mut self) {
        if self.input.gesture().is_some_and(|g| !self.scene.contains(&g.id)) {
            debug!("gesture target removed");
            self.input = InputState::Idle;
        }
    }

    fn client_rect(&self, id: &BlockId) -> Option<Rect> {
        let frame = frame(&self.scene, id)?;
        let top_left = self.viewport.canvas_to_screen(Point::new(frame.rect.x, frame.rect.y));
        let scale = self.viewport.scale;
        Some(Rect::new(top_left.x, top_left.y, frame.rect.width * scale, frame.rect.height * scale))
    }

    // --- Keyboard ---

    /// Key pressed with focus described by `focus`.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, focus: FocusContext) -> Vec<Action> {
        let selected = self.selection.selected().cloned();
        let has_clipboard = self.selection.clipboard().is_some();
        let Some(command) = keymap::dispatch(key, modifiers, focus, selected.is_some(), has_clipboard) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if command.prevents_default() {
            actions.push(Action::PreventDefault);
        }
        match (command, selected) {
            (Command::Delete, Some(id)) => actions.extend(self.delete_block(&id)),
            (Command::Duplicate, Some(id)) => actions.extend(self.duplicate_block(&id)),
            (Command::Copy, Some(id)) => actions.extend(self.copy_block(&id)),
            (Command::Paste, _) => actions.extend(self.paste()),
            (Command::Delete | Command::Duplicate | Command::Copy, None) => {}
        }
        actions
    }

    // --- Viewport ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.rescale(Viewport::zoom_in)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.rescale(Viewport::zoom_out)
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        self.rescale(Viewport::reset_zoom)
    }

    fn rescale(&mut self, f: fn(&mut Viewport)) -> Vec<Action> {
        let before = self.viewport.scale;
        f(&mut self.viewport);
        if (self.viewport.scale - before).abs() < f64::EPSILON {
            return Vec::new();
        }
        debug!(scale = self.viewport.scale, "zoom changed");
        vec![Action::RenderNeeded]
    }

    /// Screen position of the scroll container's top-left corner.
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.viewport.origin_x = x;
        self.viewport.origin_y = y;
    }

    /// Scroll offsets of the container, in screen pixels.
    pub fn set_scroll(&mut self, left: f64, top: f64) {
        self.viewport.scroll_left = left;
        self.viewport.scroll_top = top;
    }

    // --- Queries ---

    /// The currently selected block id, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&BlockId> {
        self.selection.selected()
    }

    /// The block held in the clipboard, if any.
    #[must_use]
    pub fn clipboard(&self) -> Option<&Block> {
        self.selection.clipboard()
    }

    /// Look up a block anywhere in the tree.
    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.scene.find(id).map(|b| &**b)
    }

    /// Top-level blocks in z-order.
    #[must_use]
    pub fn blocks(&self) -> &[Arc<Block>] {
        self.scene.blocks()
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The gesture state machine.
    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// The scene in paint order with absolute geometry.
    #[must_use]
    pub fn draw_list(&self) -> Vec<DrawItem> {
        draw_list(&self.scene, self.selection.selected())
    }
}

fn cursor_for(kind: GestureKind) -> &'static str {
    match kind {
        GestureKind::Drag => CURSOR_MOVE,
        GestureKind::Resize => CURSOR_RESIZE,
        GestureKind::Rotate { .. } => CURSOR_ROTATE,
    }
}
