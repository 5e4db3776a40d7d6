use crate::types::{ConversationType, Session, Statistics};

/// Counts sessions per conversation type. Always a full recount.
pub fn compute<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Statistics {
    sessions
        .into_iter()
        .map(Session::classify)
        .fold(Statistics::default(), |mut stats, ct| {
            stats.record(ct);
            stats
        })
}

impl Statistics {
    pub fn record(&mut self, ct: ConversationType) {
        match ct {
            ConversationType::SavedUnchanged => self.saved_no_change += 1,
            ConversationType::SavedChanged => self.saved_has_change += 1,
            ConversationType::UnsavedUnchanged => self.unsaved_no_change += 1,
            ConversationType::UnsavedChanged => self.unsaved_has_change += 1,
        }
    }

    pub fn count(&self, ct: ConversationType) -> usize {
        match ct {
            ConversationType::SavedUnchanged => self.saved_no_change,
            ConversationType::SavedChanged => self.saved_has_change,
            ConversationType::UnsavedUnchanged => self.unsaved_no_change,
            ConversationType::UnsavedChanged => self.unsaved_has_change,
        }
    }

    pub fn total(&self) -> usize {
        ConversationType::ALL.iter().map(|&ct| self.count(ct)).sum()
    }
}
