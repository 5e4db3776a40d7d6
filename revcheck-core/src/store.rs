//! The persistence collaborator the review core talks to.
//!
//! Every call is a single request/response that either fully succeeds or
//! fails as a whole. Callers never retry on their own; a failure is reported
//! to the reviewer, who decides whether to try again.

use crate::error::Result;
use crate::sheet::SheetFormat;
use crate::types::{Ack, Decision, ExportArtifact, Session, Statistics};

#[allow(async_fn_in_trait)]
pub trait ReviewStore {
    /// Number of sessions in the current batch.
    async fn session_count(&self) -> Result<usize>;

    /// The session at navigation position `index`, or `NotFound`.
    async fn fetch_session(&self, index: usize) -> Result<Session>;

    /// Records a decision for one row. `manual_text` is required for
    /// [`Decision::Manual`] and ignored otherwise.
    async fn submit_row_decision(
        &self,
        row_index: usize,
        decision: Decision,
        manual_text: Option<&str>,
    ) -> Result<Ack>;

    /// Marks a session saved. Fails with `Conflict` when `revision` is not
    /// the session's current revision.
    async fn submit_session_save(&self, session_id: &str, revision: u64) -> Result<Ack>;

    async fn fetch_statistics(&self) -> Result<Statistics>;

    /// The whole batch as a sheet in `format`, with each row's effective
    /// content and decision.
    async fn request_export(&self, format: SheetFormat) -> Result<ExportArtifact>;
}
