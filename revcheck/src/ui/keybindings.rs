//! Key dispatcher.
//!
//! Turns crossterm key events into `AppState` changes and tells the main
//! loop what to do next. Anything that touches review data comes back as a
//! [`ReviewAction`] for the loop to run against the controller.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{AppState, Editor, Mode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
    Review(ReviewAction),
}

/// Review commands that need the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Accept,
    Reject,
    /// Open the manual editor on the selected row.
    BeginEdit,
    SubmitManual(Editor),
    Save,
    Export,
    PrevSession,
    NextSession,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::Normal => handle_normal(key, state),
        Mode::Edit => handle_edit(key, state),
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Details => handle_details(key, state),
    }
}

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.select_next(),
        KeyCode::Char('k') | KeyCode::Up => state.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => state.select_first(),
        KeyCode::Char('G') | KeyCode::End => state.select_last(),

        KeyCode::Char('[') => return KeyAction::Review(ReviewAction::PrevSession),
        KeyCode::Char(']') => return KeyAction::Review(ReviewAction::NextSession),

        KeyCode::Char('a') => return KeyAction::Review(ReviewAction::Accept),
        KeyCode::Char('r') => return KeyAction::Review(ReviewAction::Reject),
        KeyCode::Char('e') | KeyCode::Enter => return KeyAction::Review(ReviewAction::BeginEdit),
        KeyCode::Char('s') => return KeyAction::Review(ReviewAction::Save),
        KeyCode::Char('x') => return KeyAction::Review(ReviewAction::Export),

        KeyCode::Char('d') if state.row_count > 0 => {
            state.details_scroll = 0;
            state.mode = Mode::Details;
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        _ => {}
    }
    KeyAction::Continue
}

/// Editor keys. Enter submits, Esc discards the draft.
fn handle_edit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            state.close_editor();
        }
        KeyCode::Enter => {
            if let Some(editor) = state.close_editor() {
                return KeyAction::Review(ReviewAction::SubmitManual(editor));
            }
        }
        KeyCode::Char('u') if ctrl => {
            if let Some(editor) = state.editor.as_mut() {
                editor.clear();
            }
        }
        KeyCode::Backspace => {
            if let Some(editor) = state.editor.as_mut() {
                editor.backspace();
            }
        }
        KeyCode::Char(c) if !ctrl => {
            if let Some(editor) = state.editor.as_mut() {
                editor.insert(c);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_details(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.details_scroll = state.details_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.details_scroll = state.details_scroll.saturating_sub(1);
        }
        KeyCode::Char('d') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// Scroll wheel moves the row cursor, or scrolls whichever overlay is open.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    let down = match mouse.kind {
        MouseEventKind::ScrollDown => true,
        MouseEventKind::ScrollUp => false,
        _ => return KeyAction::Continue,
    };
    match (state.mode, down) {
        (Mode::Normal, true) => state.select_next(),
        (Mode::Normal, false) => state.select_prev(),
        (Mode::HelpOverlay, true) => state.help_scroll = state.help_scroll.saturating_add(3),
        (Mode::HelpOverlay, false) => state.help_scroll = state.help_scroll.saturating_sub(3),
        (Mode::Details, true) => state.details_scroll = state.details_scroll.saturating_add(3),
        (Mode::Details, false) => state.details_scroll = state.details_scroll.saturating_sub(3),
        (Mode::Edit, _) => {}
    }
    KeyAction::Continue
}
