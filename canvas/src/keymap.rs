//! Keyboard shortcuts for the editor.
//!
//! | Input | Command | Guard |
//! |-------|---------|-------|
//! | Delete / Backspace | [`Command::Delete`] | selection, not typing |
//! | Ctrl/Cmd + D | [`Command::Duplicate`] | selection |
//! | Ctrl/Cmd + C | [`Command::Copy`] | selection, not (typing with text selected) |
//! | Ctrl/Cmd + V | [`Command::Paste`] | clipboard, not typing |
//!
//! "Typing" means focus is in an input, a textarea or a content-editable element,
//! so native text editing keeps working while a block is selected.

#[cfg(test)]
#[path = "keymap_test.rs"]
mod keymap_test;

use crate::input::{FocusContext, Key, Modifiers};

/// Editor command bound to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Delete,
    Duplicate,
    Copy,
    Paste,
}

impl Command {
    /// Whether the host should suppress the browser's native handling of the key.
    ///
    /// Delete is left to propagate.
    #[must_use]
    pub fn prevents_default(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

/// Map a key-down event to a command, or `None` if the editor should ignore it.
#[must_use]
pub fn dispatch(key: &Key, modifiers: Modifiers, focus: FocusContext, has_selection: bool, has_clipboard: bool) -> Option<Command> {
    let typing = focus.is_typing();

    if matches!(key.0.as_str(), "Delete" | "Backspace") {
        return (has_selection && !typing).then_some(Command::Delete);
    }
    if !modifiers.command() {
        return None;
    }
    if key.is_letter('d') {
        return has_selection.then_some(Command::Duplicate);
    }
    if key.is_letter('c') {
        return (has_selection && !(typing && focus.has_text_selection)).then_some(Command::Copy);
    }
    if key.is_letter('v') {
        return (has_clipboard && !typing).then_some(Command::Paste);
    }
    None
}
