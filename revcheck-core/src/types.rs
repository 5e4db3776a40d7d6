use std::fmt;
use std::str::FromStr;

use crate::error::ReviewError;

/// Speaker category of an utterance.
///
/// Labels other than the known customer/agent spellings are kept verbatim so
/// that an export reproduces the imported sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Customer,
    Agent,
    Other(String),
}

impl Role {
    /// Parses a role cell from an imported sheet. Never fails.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "客户" | "customer" | "Customer" => Role::Customer,
            "客服" | "坐席" | "agent" | "Agent" => Role::Agent,
            other => Role::Other(other.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Role::Customer => "客户",
            Role::Agent => "客服",
            Role::Other(label) => label,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The reviewer's last action on a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    #[default]
    Unset,
    Accepted,
    Rejected,
    Manual,
}

impl Decision {
    /// Stable text form used in the database and in exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Unset => "unset",
            Decision::Accepted => "accepted",
            Decision::Rejected => "rejected",
            Decision::Manual => "manual",
        }
    }
}

impl FromStr for Decision {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unset" => Ok(Decision::Unset),
            "accepted" => Ok(Decision::Accepted),
            "rejected" => Ok(Decision::Rejected),
            "manual" => Ok(Decision::Manual),
            other => Err(ReviewError::validation(format!("unknown decision '{other}'"))),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One utterance under review.
///
/// `original_content`, `updated_content`, and the annotation strings are set
/// at import and never modified. The decision and manual text change only
/// through the transitions in [`crate::row`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Zero-based record position in the imported sheet; unique per batch.
    pub index: usize,
    pub role: Role,
    pub original_content: String,
    /// Automatic revision; `None` when the sheet cell was empty.
    pub updated_content: Option<String>,
    pub update_status: String,
    pub check_result: String,
    pub check_details: String,
    pub llm_output: String,
    pub(crate) decision: Decision,
    /// Last manual text entered. Kept across accept/reject but only counts
    /// while `decision == Manual`.
    pub(crate) manual_draft: Option<String>,
}

/// A conversation: the rows sharing one session id, plus its save flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub rows: Vec<Row>,
    pub(crate) is_saved: bool,
    /// Bumped by the store on every accepted row mutation; a save must name
    /// the revision the reviewer looked at.
    pub revision: u64,
}

/// Save state × change state of a session.
///
/// Discriminants match the codes the review sheet has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationType {
    SavedUnchanged = 1,
    SavedChanged = 2,
    UnsavedUnchanged = 3,
    UnsavedChanged = 4,
}

impl ConversationType {
    pub const ALL: [ConversationType; 4] = [
        ConversationType::SavedUnchanged,
        ConversationType::SavedChanged,
        ConversationType::UnsavedUnchanged,
        ConversationType::UnsavedChanged,
    ];

    pub fn from_flags(is_saved: bool, has_any_change: bool) -> Self {
        match (is_saved, has_any_change) {
            (true, false) => ConversationType::SavedUnchanged,
            (true, true) => ConversationType::SavedChanged,
            (false, false) => ConversationType::UnsavedUnchanged,
            (false, true) => ConversationType::UnsavedChanged,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_saved(self) -> bool {
        matches!(self, ConversationType::SavedUnchanged | ConversationType::SavedChanged)
    }

    pub fn has_change(self) -> bool {
        matches!(self, ConversationType::SavedChanged | ConversationType::UnsavedChanged)
    }

    pub fn label(self) -> &'static str {
        match self {
            ConversationType::SavedUnchanged => "已保存-无变更",
            ConversationType::SavedChanged => "已保存-有变更",
            ConversationType::UnsavedUnchanged => "未保存-无变更",
            ConversationType::UnsavedChanged => "未保存-有变更",
        }
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Session counts per [`ConversationType`] across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub saved_no_change: usize,
    pub saved_has_change: usize,
    pub unsaved_no_change: usize,
    pub unsaved_has_change: usize,
}

/// Summary of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// UUID v4 assigned to the imported batch.
    pub batch_id: String,
    pub total_sessions: usize,
    pub total_rows: usize,
}

/// Success acknowledgement from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Session revision after the mutation was applied.
    pub revision: u64,
}

/// A binary artifact produced by an export, with the filename to offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}
