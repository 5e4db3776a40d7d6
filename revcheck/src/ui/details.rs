//! Annotation overlay for the selected row (`d`). Display only.

use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};
use revcheck_core::Row;

use crate::theme::Theme;
use crate::ui::session_view::decision_badge;

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &'static str, body: &'a str, theme: &Theme) {
    lines.push(Line::from(Span::styled(
        title,
        Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD),
    )));
    if body.is_empty() {
        lines.push(Line::from(Span::styled("  (empty)", Style::default().fg(theme.muted))));
    } else {
        lines.extend(body.lines().map(|l| Line::from(format!("  {l}"))));
    }
    lines.push(Line::from(""));
}

pub fn render_details_overlay(frame: &mut Frame, row: &Row, theme: &Theme, scroll: u16) {
    if frame.area().width < 40 {
        return;
    }
    let area = frame.area().centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, area);

    let title = format!(" Row {}  ({})  j/k scroll, d or Esc to close ", row.index, row.role);
    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(theme.border_active));

    let mut lines = vec![
        Line::from(vec![Span::raw("决定: "), decision_badge(row.decision(), theme)]),
        Line::from(""),
    ];
    section(&mut lines, "话术内容", &row.original_content, theme);
    section(&mut lines, "变更后的内容", row.updated_content.as_deref().unwrap_or(""), theme);
    if let Some(manual) = row.manually_corrected_content() {
        section(&mut lines, "人工校验修正后的内容", manual, theme);
    }
    section(&mut lines, "更新情况", &row.update_status, theme);
    section(&mut lines, "更新结果检查", &row.check_result, theme);
    section(&mut lines, "更新结果检查详情", &row.check_details, theme);
    section(&mut lines, "LLM完整输出", &row.llm_output, theme);

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}
