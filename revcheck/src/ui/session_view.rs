//! The row table and the side-by-side comparison of the selected row.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Cell, Paragraph, Row as TableRow, Table, Wrap},
    Frame,
};
use revcheck_core::{highlight_row, Decision, Role, Row, Segment, Session};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Styles changed segments with `changed_fg`; unchanged ones use the body color.
pub fn segments_line<'a>(
    segments: &[Segment<'a>],
    changed_fg: ratatui::style::Color,
    theme: &Theme,
) -> Line<'a> {
    let changed = Style::default().fg(changed_fg).add_modifier(Modifier::BOLD);
    let plain = Style::default().fg(theme.text);
    Line::from(
        segments
            .iter()
            .map(|s| Span::styled(s.text, if s.changed { changed } else { plain }))
            .collect::<Vec<_>>(),
    )
}

pub fn decision_badge(decision: Decision, theme: &Theme) -> Span<'static> {
    match decision {
        Decision::Unset => Span::styled("未决", Style::default().fg(theme.muted)),
        Decision::Accepted => Span::styled("接受", Style::default().fg(theme.decision_accepted)),
        Decision::Rejected => Span::styled("拒绝", Style::default().fg(theme.decision_rejected)),
        Decision::Manual => Span::styled("人工", Style::default().fg(theme.decision_manual)),
    }
}

fn role_span<'a>(role: &'a Role, theme: &Theme) -> Span<'a> {
    let fg = match role {
        Role::Customer => theme.role_customer,
        Role::Agent => theme.role_agent,
        Role::Other(_) => theme.muted,
    };
    Span::styled(role.label(), Style::default().fg(fg))
}

fn table_row<'a>(row: &'a Row, theme: &Theme) -> TableRow<'a> {
    let views = highlight_row(row);
    TableRow::new(vec![
        Cell::from(Span::styled(row.index.to_string(), Style::default().fg(theme.muted))),
        Cell::from(role_span(&row.role, theme)),
        Cell::from(segments_line(&views.original, theme.diff_removed, theme)),
        Cell::from(segments_line(&views.current, theme.diff_added, theme)),
        Cell::from(decision_badge(row.decision(), theme)),
        Cell::from(Span::styled(row.check_result.as_str(), Style::default().fg(theme.muted))),
    ])
}

/// Renders one table line per row; each line carries both highlighted views.
pub fn render_rows(
    frame: &mut Frame,
    area: Rect,
    state: &mut AppState,
    session: Option<&Session>,
    theme: &Theme,
) {
    let block = panel_block("对话", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(session) = session else {
        let msg = if state.loading {
            "Loading session…"
        } else {
            "No session loaded. Import a sheet with `revcheck import`."
        };
        frame.render_widget(Paragraph::new(msg).style(Style::default().fg(theme.muted)), inner);
        return;
    };

    let header = TableRow::new(vec!["#", "角色", "原话术", "当前内容", "决定", "检查"])
        .style(Style::default().fg(theme.muted).add_modifier(Modifier::BOLD));
    let table = Table::new(
        session.rows.iter().map(|r| table_row(r, theme)),
        [
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(5),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(theme.selection_bg));

    frame.render_stateful_widget(table, inner, &mut state.table_state);
}

/// Full, wrapped text of the selected row: original against the automatic
/// update on the left, current content against the original on the right.
pub fn render_comparison(
    frame: &mut Frame,
    original_area: Rect,
    current_area: Rect,
    row: Option<&Row>,
    theme: &Theme,
) {
    frame.render_widget(panel_block("原话术", false, theme), original_area);
    frame.render_widget(panel_block("当前内容", false, theme), current_area);

    let Some(row) = row else {
        return;
    };
    let views = highlight_row(row);

    let left = Text::from(segments_line(&views.original, theme.diff_removed, theme));
    frame.render_widget(
        Paragraph::new(left).wrap(Wrap { trim: false }),
        inner_rect(original_area),
    );

    let mut right = vec![segments_line(&views.current, theme.diff_added, theme)];
    if !row.update_status.is_empty() {
        right.push(Line::from(""));
        right.push(Line::from(Span::styled(
            format!("更新情况: {}", row.update_status),
            Style::default().fg(theme.muted),
        )));
    }
    frame.render_widget(
        Paragraph::new(Text::from(right)).wrap(Wrap { trim: false }),
        inner_rect(current_area),
    );
}
