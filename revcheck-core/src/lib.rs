//! Review engine for machine-revised conversation transcripts.
//!
//! Sentence-level alignment and change highlighting, the per-row decision
//! state machine, session save state, and a SQLite-backed store.

pub mod align;
pub mod controller;
pub mod db;
pub mod error;
pub mod highlight;
pub mod row;
pub mod schema;
pub mod session;
pub mod sheet;
pub mod stats;
pub mod store;
pub mod tokenize;
pub mod types;

pub use align::{align, Alignment, Side};
pub use controller::ReviewController;
pub use db::SqliteStore;
pub use error::{Result, ReviewError};
pub use highlight::{highlight, highlight_row, RowHighlights, Segment};
pub use row::{Command, ManualPolicy};
pub use sheet::SheetFormat;
pub use store::ReviewStore;
pub use tokenize::tokenize;
pub use types::{
    Ack, ConversationType, Decision, ExportArtifact, ImportSummary, Role, Row, Session,
    Statistics,
};
