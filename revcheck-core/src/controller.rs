//! The reviewer-facing command surface.
//!
//! A [`ReviewController`] owns the navigation position, the loaded session,
//! and the last statistics snapshot. UIs hold one and route every reviewer
//! action through it.

use crate::error::{Result, ReviewError};
use crate::row::{Command, ManualPolicy};
use crate::sheet::SheetFormat;
use crate::store::ReviewStore;
use crate::types::{Ack, ConversationType, ExportArtifact, Session, Statistics};

pub struct ReviewController<S> {
    store: S,
    policy: ManualPolicy,
    current_index: usize,
    total_sessions: usize,
    session: Option<Session>,
    statistics: Statistics,
}

impl<S: ReviewStore> ReviewController<S> {
    pub fn new(store: S, policy: ManualPolicy) -> Self {
        Self {
            store,
            policy,
            current_index: 0,
            total_sessions: 0,
            session: None,
            statistics: Statistics::default(),
        }
    }

    /// Reads the batch size and statistics, then loads the first session.
    ///
    /// # Errors
    ///
    /// Whatever the store returns, usually `Transport`.
    pub async fn start(&mut self) -> Result<()> {
        self.total_sessions = self.store.session_count().await?;
        self.statistics = self.store.fetch_statistics().await?;
        self.current_index = 0;
        self.session = None;
        if self.total_sessions > 0 {
            self.load_current().await?;
        }
        tracing::info!(total_sessions = self.total_sessions, "review started");
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> ManualPolicy {
        self.policy
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_sessions(&self) -> usize {
        self.total_sessions
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn conversation_type(&self) -> Option<ConversationType> {
        self.session.as_ref().map(Session::classify)
    }

    /// "session 3 / 12", one-based for display.
    pub fn progress_label(&self) -> String {
        if self.total_sessions == 0 {
            return "no sessions".to_owned();
        }
        format!("session {} / {}", self.current_index + 1, self.total_sessions)
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.total_sessions
    }

    /// Moves the navigation position by `delta`. Returns the new index, or
    /// `None` when the move would leave the batch. The caller fetches the
    /// session at the returned index.
    pub fn navigate(&mut self, delta: isize) -> Option<usize> {
        let target = self.current_index.checked_add_signed(delta)?;
        if target >= self.total_sessions || target == self.current_index {
            return None;
        }
        self.current_index = target;
        self.session = None;
        Some(target)
    }

    /// Jumps to `index` directly.
    ///
    /// # Errors
    ///
    /// `NotFound` when `index` is past the end of the batch.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.total_sessions {
            return Err(ReviewError::session_not_found(index));
        }
        self.current_index = index;
        self.session = None;
        Ok(())
    }

    /// Applies a fetch result for `index`.
    ///
    /// Returns `Ok(false)` when the reviewer has moved on since the fetch was
    /// issued; the response is dropped without touching state.
    pub fn apply_loaded(&mut self, index: usize, result: Result<Session>) -> Result<bool> {
        if index != self.current_index {
            tracing::debug!(index, current = self.current_index, "discarding stale session load");
            return Ok(false);
        }
        let session = result?;
        tracing::debug!(index, session_id = %session.session_id, "session loaded");
        self.session = Some(session);
        Ok(true)
    }

    /// Fetches and installs the session at the current position.
    pub async fn load_current(&mut self) -> Result<()> {
        let index = self.current_index;
        let result = self.store.fetch_session(index).await;
        self.apply_loaded(index, result).map(|_| ())
    }

    pub async fn refresh_statistics(&mut self) -> Result<Statistics> {
        self.statistics = self.store.fetch_statistics().await?;
        Ok(self.statistics)
    }

    /// Routes `command` to the row with `row_index` in the loaded session.
    ///
    /// The store is asked first; local state only changes once it
    /// acknowledges, so a failed call leaves the row and session as they were.
    ///
    /// # Errors
    ///
    /// `Validation` with no session loaded or for a command the manual
    /// policy refuses, `NotFound` for a row outside the loaded session, and
    /// whatever the store returns (`Transport`, `NotFound`).
    pub async fn dispatch(&mut self, row_index: usize, command: Command) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| ReviewError::validation("no session loaded"))?;
        if session.row(row_index).is_none() {
            return Err(ReviewError::row_not_found(row_index));
        }
        command.validate(self.policy)?;

        let ack = self
            .store
            .submit_row_decision(row_index, command.decision(), command.manual_text())
            .await
            .inspect_err(|err| tracing::warn!(row_index, %err, "row decision not recorded"))?;

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.apply(row_index, &command, self.policy)?;
        session.revision = ack.revision;

        if let Err(err) = self.refresh_statistics().await {
            tracing::warn!(%err, "statistics refresh failed");
        }
        Ok(())
    }

    /// Saves the loaded session. Saving a session that is already saved is a
    /// no-op and does not reach the store.
    ///
    /// # Errors
    ///
    /// `Validation` with no session loaded, `Conflict` when the store holds
    /// a newer revision than the one loaded, `Transport` when the store fails.
    pub async fn save(&mut self) -> Result<Ack> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| ReviewError::validation("no session loaded"))?;
        if session.is_saved() {
            return Ok(Ack { revision: session.revision });
        }

        let ack = self
            .store
            .submit_session_save(&session.session_id, session.revision)
            .await
            .inspect_err(|err| tracing::warn!(%err, "session save failed"))?;

        if let Some(session) = self.session.as_mut() {
            session.mark_saved();
        }
        if let Err(err) = self.refresh_statistics().await {
            tracing::warn!(%err, "statistics refresh failed");
        }
        Ok(ack)
    }

    pub async fn export(&self, format: SheetFormat) -> Result<ExportArtifact> {
        self.store.request_export(format).await
    }
}
