//! Rendering. [`render`] is the only function the event loop draws with.

mod details;
mod editor;
pub mod help;
pub mod keybindings;
mod layout;
pub mod session_view;

use ratatui::Frame;
use revcheck_core::{ReviewController, ReviewStore, Row};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_status_bar};

/// The row under the cursor in the loaded session.
pub fn selected_row<'a, S: ReviewStore>(
    state: &AppState,
    review: &'a ReviewController<S>,
) -> Option<&'a Row> {
    review.session().and_then(|s| s.rows.get(state.selected))
}

/// Draws one frame: row table, comparison panes, status bar, then whichever
/// overlay the mode calls for.
pub fn render<S: ReviewStore>(
    frame: &mut Frame,
    state: &mut AppState,
    review: &ReviewController<S>,
    theme: &Theme,
) {
    let layout = compute_layout(frame);
    let row = selected_row(state, review);

    session_view::render_rows(frame, layout.rows, state, review.session(), theme);
    session_view::render_comparison(frame, layout.original, layout.current, row, theme);
    render_status_bar(frame, layout.status_bar, state, review, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::Details => {
            if let Some(row) = row {
                details::render_details_overlay(frame, row, theme, state.details_scroll);
            }
        }
        Mode::Edit => {
            if let Some(editor) = &state.editor {
                let target = review.session().and_then(|s| s.row(editor.row_index));
                editor::render_editor_overlay(frame, editor, target, theme);
            }
        }
        Mode::Normal => {}
    }
}
