//! UI state for the review screen.
//!
//! Pure state: read by `ui::render`, mutated by the key dispatcher and the
//! main loop. Review data itself lives in the `ReviewController`.

use std::fmt::Display;
use std::time::{Duration, Instant};

use ratatui::widgets::TableState;

/// How long a notice stays in the status bar.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Manual correction editor is open.
    Edit,
    HelpOverlay,
    /// Annotation overlay for the selected row.
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient status message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    shown_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>, now: Instant) -> Self {
        Self { text: text.into(), kind, shown_at: now }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= NOTICE_TTL
    }
}

/// Manual correction draft for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    /// Stable row index the draft will be submitted for.
    pub row_index: usize,
    pub buffer: String,
}

impl Editor {
    pub fn insert(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

pub struct AppState {
    pub mode: Mode,
    /// Position of the selected row within the loaded session.
    pub selected: usize,
    /// Row count of the loaded session; zero while loading.
    pub row_count: usize,
    pub table_state: TableState,
    pub editor: Option<Editor>,
    pub notice: Option<Notice>,
    /// True between a navigation and the matching session load.
    pub loading: bool,
    pub help_scroll: u16,
    pub details_scroll: u16,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            selected: 0,
            row_count: 0,
            table_state: TableState::default(),
            editor: None,
            notice: None,
            loading: false,
            help_scroll: 0,
            details_scroll: 0,
        }
    }
}

impl AppState {
    /// Resets the row cursor after a session (re)load.
    pub fn reset_rows(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.selected = 0;
        self.loading = false;
        self.sync_table();
    }

    /// Keeps the cursor but clamps it, for reloads of the same session.
    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.loading = false;
        self.selected = self.selected.min(row_count.saturating_sub(1));
        self.sync_table();
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.row_count {
            self.selected += 1;
        }
        self.sync_table();
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.sync_table();
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.sync_table();
    }

    pub fn select_last(&mut self) {
        self.selected = self.row_count.saturating_sub(1);
        self.sync_table();
    }

    fn sync_table(&mut self) {
        let selection = (self.row_count > 0).then_some(self.selected);
        self.table_state.select(selection);
    }

    /// Marks the view as waiting for a session load.
    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.row_count = 0;
        self.selected = 0;
        self.mode = Mode::Normal;
        self.editor = None;
        self.sync_table();
    }

    pub fn open_editor(&mut self, row_index: usize, seed: &str) {
        self.editor = Some(Editor { row_index, buffer: seed.to_owned() });
        self.mode = Mode::Edit;
    }

    /// Closes the editor and hands back the draft.
    pub fn close_editor(&mut self) -> Option<Editor> {
        self.mode = Mode::Normal;
        self.editor.take()
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::new(NoticeKind::Info, text, Instant::now()));
    }

    pub fn notify_error(&mut self, err: impl Display) {
        self.notice = Some(Notice::new(NoticeKind::Error, err.to_string(), Instant::now()));
    }

    /// Drops the notice once it has been visible for [`NOTICE_TTL`].
    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
    }
}
