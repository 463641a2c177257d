use super::*;
use crate::input::FocusTarget;

fn key(name: &str) -> Key {
    Key::new(name)
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn meta() -> Modifiers {
    Modifiers { meta: true, ..Default::default() }
}

fn canvas() -> FocusContext {
    FocusContext::default()
}

fn typing(has_text_selection: bool) -> FocusContext {
    FocusContext { target: FocusTarget::Input, has_text_selection }
}

// =============================================================
// Delete
// =============================================================

#[test]
fn delete_and_backspace_delete_selection() {
    assert_eq!(dispatch(&key("Delete"), Modifiers::default(), canvas(), true, false), Some(Command::Delete));
    assert_eq!(dispatch(&key("Backspace"), Modifiers::default(), canvas(), true, false), Some(Command::Delete));
}

#[test]
fn delete_needs_selection() {
    assert_eq!(dispatch(&key("Delete"), Modifiers::default(), canvas(), false, true), None);
}

#[test]
fn delete_ignored_while_typing() {
    for target in [FocusTarget::Input, FocusTarget::TextArea, FocusTarget::ContentEditable] {
        let focus = FocusContext { target, has_text_selection: false };
        assert_eq!(dispatch(&key("Backspace"), Modifiers::default(), focus, true, false), None, "{target:?}");
    }
}

#[test]
fn delete_does_not_prevent_default() {
    assert!(!Command::Delete.prevents_default());
    assert!(Command::Copy.prevents_default());
    assert!(Command::Paste.prevents_default());
    assert!(Command::Duplicate.prevents_default());
}

// =============================================================
// Duplicate
// =============================================================

#[test]
fn ctrl_or_cmd_d_duplicates() {
    assert_eq!(dispatch(&key("d"), ctrl(), canvas(), true, false), Some(Command::Duplicate));
    assert_eq!(dispatch(&key("d"), meta(), canvas(), true, false), Some(Command::Duplicate));
}

#[test]
fn plain_d_does_nothing() {
    assert_eq!(dispatch(&key("d"), Modifiers::default(), canvas(), true, false), None);
}

#[test]
fn duplicate_needs_selection() {
    assert_eq!(dispatch(&key("d"), ctrl(), canvas(), false, true), None);
}

// =============================================================
// Copy
// =============================================================

#[test]
fn ctrl_c_copies_selection() {
    assert_eq!(dispatch(&key("c"), ctrl(), canvas(), true, false), Some(Command::Copy));
    assert_eq!(dispatch(&key("c"), ctrl(), canvas(), false, false), None);
}

#[test]
fn copy_defers_to_native_text_copy() {
    assert_eq!(dispatch(&key("c"), ctrl(), typing(true), true, false), None);
}

#[test]
fn copy_in_text_control_without_text_selection_copies_block() {
    assert_eq!(dispatch(&key("c"), ctrl(), typing(false), true, false), Some(Command::Copy));
}

#[test]
fn text_selection_outside_controls_does_not_block_copy() {
    let focus = FocusContext { target: FocusTarget::Canvas, has_text_selection: true };
    assert_eq!(dispatch(&key("c"), meta(), focus, true, false), Some(Command::Copy));
}

// =============================================================
// Paste
// =============================================================

#[test]
fn ctrl_v_pastes_when_clipboard_full() {
    assert_eq!(dispatch(&key("v"), ctrl(), canvas(), false, true), Some(Command::Paste));
    assert_eq!(dispatch(&key("v"), meta(), canvas(), true, true), Some(Command::Paste));
}

#[test]
fn shifted_letters_are_left_to_the_browser() {
    let shifted = Modifiers { ctrl: true, shift: true, ..Default::default() };
    assert_eq!(dispatch(&key("C"), shifted, canvas(), true, true), None);
    assert_eq!(dispatch(&key("V"), shifted, canvas(), true, true), None);
    assert_eq!(dispatch(&key("D"), shifted, canvas(), true, true), None);
}

#[test]
fn paste_needs_clipboard() {
    assert_eq!(dispatch(&key("v"), ctrl(), canvas(), true, false), None);
}

#[test]
fn paste_ignored_while_typing() {
    assert_eq!(dispatch(&key("v"), ctrl(), typing(false), true, true), None);
}

// =============================================================
// Unbound keys
// =============================================================

#[test]
fn other_keys_are_ignored() {
    assert_eq!(dispatch(&key("x"), ctrl(), canvas(), true, true), None);
    assert_eq!(dispatch(&key("Escape"), Modifiers::default(), canvas(), true, true), None);
    assert_eq!(dispatch(&key("cc"), ctrl(), canvas(), true, true), None);
}
