//! Per-utterance review state machine.
//!
//! Every decision can be replaced by any other; there is no terminal state
//! while the batch is under review.

use crate::error::{Result, ReviewError};
use crate::types::{Decision, Role, Row};

/// A reviewer action targeting one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Accept,
    Reject,
    Manual(String),
}

impl Command {
    pub fn decision(&self) -> Decision {
        match self {
            Command::Accept => Decision::Accepted,
            Command::Reject => Decision::Rejected,
            Command::Manual(_) => Decision::Manual,
        }
    }

    pub fn manual_text(&self) -> Option<&str> {
        match self {
            Command::Manual(text) => Some(text.as_str()),
            Command::Accept | Command::Reject => None,
        }
    }

    /// Checks the command against `policy` without touching any row.
    pub fn validate(&self, policy: ManualPolicy) -> Result<()> {
        match self {
            Command::Manual(text) => policy.check(text),
            Command::Accept | Command::Reject => Ok(()),
        }
    }
}

/// Whether an empty manual correction is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualPolicy {
    pub require_nonempty: bool,
}

impl ManualPolicy {
    pub fn check(self, text: &str) -> Result<()> {
        if text.is_empty() && self.require_nonempty {
            return Err(ReviewError::validation("manual correction must not be empty"));
        }
        Ok(())
    }
}

impl Default for ManualPolicy {
    fn default() -> Self {
        Self { require_nonempty: true }
    }
}

impl Row {
    /// Creates a freshly imported row with no decision and empty annotations.
    pub fn new(
        index: usize,
        role: Role,
        original_content: impl Into<String>,
        updated_content: Option<&str>,
    ) -> Self {
        Self {
            index,
            role,
            original_content: original_content.into(),
            updated_content: updated_content.map(str::to_owned),
            update_status: String::new(),
            check_result: String::new(),
            check_details: String::new(),
            llm_output: String::new(),
            decision: Decision::Unset,
            manual_draft: None,
        }
    }

    /// Rebuilds a row from stored state.
    ///
    /// A `Manual` decision without text is rejected so the presence invariant
    /// of the manual content holds for every row in memory.
    pub(crate) fn with_review_state(
        mut self,
        decision: Decision,
        manual_draft: Option<String>,
    ) -> Result<Self> {
        if decision == Decision::Manual && manual_draft.is_none() {
            return Err(ReviewError::validation(format!(
                "row {} is marked manual but has no manual content",
                self.index
            )));
        }
        self.decision = decision;
        self.manual_draft = manual_draft;
        Ok(self)
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// The manual correction, present iff the decision is `Manual`.
    pub fn manually_corrected_content(&self) -> Option<&str> {
        match self.decision {
            Decision::Manual => self.manual_draft.as_deref(),
            _ => None,
        }
    }

    /// The last manual text entered, regardless of the current decision.
    pub fn manual_draft(&self) -> Option<&str> {
        self.manual_draft.as_deref()
    }

    /// The content currently representing the reviewer's decision.
    ///
    /// Manual text while manual, the original when rejected, otherwise the
    /// automatic update if there is one and the original if not.
    pub fn effective_content(&self) -> &str {
        match self.decision {
            Decision::Manual => self.manual_draft.as_deref().unwrap_or(&self.original_content),
            Decision::Rejected => &self.original_content,
            Decision::Accepted | Decision::Unset => {
                self.updated_content.as_deref().unwrap_or(&self.original_content)
            }
        }
    }

    /// True when the effective content differs from the original.
    pub fn is_changed(&self) -> bool {
        self.effective_content() != self.original_content
    }

    /// Text to pre-fill the manual editor with: whatever the reviewer sees now.
    pub fn editor_seed(&self) -> &str {
        self.effective_content()
    }

    pub fn accept(&mut self) {
        self.decision = Decision::Accepted;
    }

    pub fn reject(&mut self) {
        self.decision = Decision::Rejected;
    }

    pub fn manual(&mut self, text: impl Into<String>, policy: ManualPolicy) -> Result<()> {
        let text = text.into();
        policy.check(&text)?;
        self.decision = Decision::Manual;
        self.manual_draft = Some(text);
        Ok(())
    }

    /// Applies `command`; the row is unchanged when validation fails.
    pub fn apply(&mut self, command: &Command, policy: ManualPolicy) -> Result<()> {
        match command {
            Command::Accept => {
                self.accept();
                Ok(())
            }
            Command::Reject => {
                self.reject();
                Ok(())
            }
            Command::Manual(text) => self.manual(text.as_str(), policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(0, Role::Customer, "A", Some("B"))
    }

    #[test]
    fn unset_row_shows_update() {
        assert_eq!(row().effective_content(), "B");
        assert!(row().is_changed());
    }

    #[test]
    fn missing_update_falls_back_to_original() {
        let r = Row::new(1, Role::Agent, "A", None);
        assert_eq!(r.effective_content(), "A");
        assert!(!r.is_changed());
    }

    #[test]
    fn each_decision_picks_exactly_one_source() {
        let mut r = row();
        r.accept();
        assert_eq!(r.effective_content(), "B");
        r.reject();
        assert_eq!(r.effective_content(), "A");
        r.manual("C", ManualPolicy::default()).unwrap();
        assert_eq!(r.effective_content(), "C");
        assert_eq!(r.decision(), Decision::Manual);
    }

    #[test]
    fn manual_content_visible_only_while_manual() {
        let mut r = row();
        assert_eq!(r.manually_corrected_content(), None);
        r.manual("C", ManualPolicy::default()).unwrap();
        assert_eq!(r.manually_corrected_content(), Some("C"));
        r.accept();
        assert_eq!(r.manually_corrected_content(), None);
        assert_eq!(r.manual_draft(), Some("C"));
        assert_eq!(r.editor_seed(), "B");
    }

    #[test]
    fn empty_manual_rejected_by_default_policy() {
        let mut r = row();
        r.accept();
        let err = r.manual("", ManualPolicy::default()).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        assert_eq!(r.decision(), Decision::Accepted);
        assert_eq!(r.manual_draft(), None);
    }

    #[test]
    fn empty_manual_allowed_when_policy_permits() {
        let mut r = row();
        r.manual("", ManualPolicy { require_nonempty: false }).unwrap();
        assert_eq!(r.effective_content(), "");
        assert_eq!(r.manually_corrected_content(), Some(""));
    }

    #[test]
    fn manual_back_to_original_text_counts_as_unchanged() {
        let mut r = row();
        r.manual("A", ManualPolicy::default()).unwrap();
        assert!(!r.is_changed());
    }

    #[test]
    fn restored_manual_row_requires_text() {
        let err = row().with_review_state(Decision::Manual, None).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        let restored = row()
            .with_review_state(Decision::Rejected, Some("draft".to_owned()))
            .unwrap();
        assert_eq!(restored.effective_content(), "A");
        assert_eq!(restored.manual_draft(), Some("draft"));
    }

    #[test]
    fn apply_routes_commands() {
        let mut r = row();
        r.apply(&Command::Reject, ManualPolicy::default()).unwrap();
        assert_eq!(r.decision(), Decision::Rejected);
        r.apply(&Command::Manual("X".to_owned()), ManualPolicy::default()).unwrap();
        assert_eq!(r.effective_content(), "X");
        assert_eq!(Command::Manual("X".to_owned()).manual_text(), Some("X"));
        assert_eq!(Command::Accept.decision(), Decision::Accepted);
    }
}
