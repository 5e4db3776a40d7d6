//! Help overlay, drawn over the main screen after a `Clear`.

use ratatui::{
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

/// Skipped below 60 columns, where the centred box would collapse.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Rows"),
        Line::from("  j / k         Next / previous row"),
        Line::from("  g / G         First / last row"),
        Line::from("  d             Row details (check result, LLM output)"),
        Line::from(""),
        Line::from("Decisions"),
        Line::from("  a             Accept the automatic update"),
        Line::from("  r             Reject it and keep the original"),
        Line::from("  e / Enter     Edit manually (starts from the current content)"),
        Line::from(""),
        Line::from("Sessions"),
        Line::from("  [ / ]         Previous / next session"),
        Line::from("  s             Save the session"),
        Line::from("  x             Export the batch (xlsx or csv)"),
        Line::from(""),
        Line::from("Editor"),
        Line::from("  Enter         Submit the correction"),
        Line::from("  Esc           Cancel"),
        Line::from("  Ctrl-u        Clear the draft"),
        Line::from(""),
        Line::from("Status bar counts"),
        Line::from("  1 saved, no change    2 saved, changed"),
        Line::from("  3 unsaved, no change  4 unsaved, changed"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Esc       Quit"),
    ])
}
