//! Session-level save state and change classification.

use crate::error::{Result, ReviewError};
use crate::row::{Command, ManualPolicy};
use crate::types::{ConversationType, Row, Session};

impl Session {
    /// A freshly imported, unsaved session.
    pub fn new(session_id: impl Into<String>, rows: Vec<Row>) -> Self {
        Self { session_id: session_id.into(), rows, is_saved: false, revision: 0 }
    }

    /// Rebuilds a session from stored state.
    pub(crate) fn restore(
        session_id: String,
        rows: Vec<Row>,
        is_saved: bool,
        revision: u64,
    ) -> Self {
        Self { session_id, rows, is_saved, revision }
    }

    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    /// True when any row's effective content differs from its original.
    pub fn has_any_change(&self) -> bool {
        self.rows.iter().any(Row::is_changed)
    }

    pub fn classify(&self) -> ConversationType {
        ConversationType::from_flags(self.is_saved, self.has_any_change())
    }

    /// Marks the session saved. Saving an already saved session is a no-op.
    pub fn mark_saved(&mut self) {
        self.is_saved = true;
    }

    /// Invalidates a previous save after an edit.
    pub fn mark_dirty(&mut self) {
        self.is_saved = false;
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.iter().find(|r| r.index == index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.index == index)
    }

    /// Applies `command` to the row with `row_index` and marks the session
    /// dirty. Nothing changes when the row is missing or validation fails.
    pub fn apply(
        &mut self,
        row_index: usize,
        command: &Command,
        policy: ManualPolicy,
    ) -> Result<()> {
        let row = self
            .row_mut(row_index)
            .ok_or_else(|| ReviewError::row_not_found(row_index))?;
        row.apply(command, policy)?;
        self.mark_dirty();
        Ok(())
    }
}

/// Free-function form of [`Session::classify`].
pub fn classify(session: &Session) -> ConversationType {
    session.classify()
}
