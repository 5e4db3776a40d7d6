//! Layout arithmetic, panel chrome, and the status bar.
//!
//! Recomputed inside every `terminal.draw()` so resizes need no handling.
//!
//! ```text
//! ┌ rows ────────────────────────────────────────┐
//! │ # 角色 原话术           当前内容      决定 检查 │
//! ├ 原话术 ───────────────┬ 当前内容 ──────────────┤
//! │ selected row, wrapped │ selected row, wrapped │
//! └───────────────────────┴───────────────────────┘
//!  NORMAL  session 2 / 9  conv-17  未保存-有变更  …
//! ```

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};
use revcheck_core::{ConversationType, ReviewController, ReviewStore};

use crate::app::{AppState, Mode, NoticeKind};
use crate::theme::Theme;

pub struct ScreenLayout {
    pub rows: Rect,
    pub original: Rect,
    pub current: Rect,
    pub status_bar: Rect,
}

/// Below 100 columns the comparison panes stack vertically.
pub fn compute_layout(frame: &Frame) -> ScreenLayout {
    let area = frame.area();
    let [main_area, status_bar] =
        area.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));
    let [rows, compare] = main_area.layout(
        &Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
            .spacing(Spacing::Overlap(1)),
    );

    let split = if area.width >= 100 {
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
    } else {
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
    };
    let [original, current] = compare.layout(&split.spacing(Spacing::Overlap(1)));

    ScreenLayout { rows, original, current, status_bar }
}

/// Inner area of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered block; thick when focused. `Fuzzy` merging keeps junctions right
/// when thick and plain borders meet.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

fn conversation_style(ct: ConversationType, theme: &Theme) -> Style {
    let fg = if ct.is_saved() { theme.saved } else { theme.unsaved };
    Style::default().fg(fg)
}

/// Mode, progress, session id, conversation type, batch counts, and the
/// current notice if any.
pub fn render_status_bar<S: ReviewStore>(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    review: &ReviewController<S>,
    theme: &Theme,
) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Edit => (" EDIT ", theme.status_mode_edit),
        Mode::Normal | Mode::HelpOverlay | Mode::Details => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", review.progress_label())),
    ];

    if let Some(session) = review.session() {
        let ct = session.classify();
        spans.push(Span::styled(
            format!(" {} ", session.session_id),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" [{}] {} ", ct.code(), ct.label()),
            conversation_style(ct, theme),
        ));
    } else if state.loading {
        spans.push(Span::styled(" loading… ", Style::default().fg(theme.muted)));
    }

    let stats = review.statistics();
    spans.push(Span::styled(
        format!(
            " │ 1:{} 2:{} 3:{} 4:{} ",
            stats.saved_no_change,
            stats.saved_has_change,
            stats.unsaved_no_change,
            stats.unsaved_has_change
        ),
        Style::default().fg(theme.muted),
    ));

    if let Some(notice) = &state.notice {
        let fg = match notice.kind {
            NoticeKind::Info => theme.notice_info,
            NoticeKind::Error => theme.notice_error,
        };
        spans.push(Span::styled(format!(" {} ", notice.text), Style::default().fg(fg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
