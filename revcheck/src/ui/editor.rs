//! Manual correction editor overlay.

use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};
use revcheck_core::Row;

use crate::app::Editor;
use crate::theme::Theme;

/// Draws the draft under the row's original text. The cursor always sits at
/// the end of the buffer.
pub fn render_editor_overlay(frame: &mut Frame, editor: &Editor, row: Option<&Row>, theme: &Theme) {
    let area = frame.area().centered(Constraint::Percentage(70), Constraint::Percentage(40));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(format!(" 人工修正 · row {}  Enter submit, Esc cancel, Ctrl-u clear ", editor.row_index))
        .border_style(Style::default().fg(theme.status_mode_edit));

    let mut lines = Vec::new();
    if let Some(row) = row {
        lines.push(Line::from(Span::styled(
            format!("原话术: {}", row.original_content),
            Style::default().fg(theme.muted),
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled(editor.buffer.as_str(), Style::default().fg(theme.text)),
        Span::styled(
            "▏",
            Style::default().fg(theme.status_mode_edit).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]));

    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
