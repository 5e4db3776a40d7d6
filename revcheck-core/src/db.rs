//! SQLite-backed [`ReviewStore`].
//!
//! Every mutation runs in a `BEGIN IMMEDIATE` transaction on the single
//! background connection thread, so a request either lands completely or not
//! at all.

use std::path::Path;
use std::time::Duration;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::{Result, ReviewError};
use crate::row::ManualPolicy;
use crate::sheet::{self, SheetFormat, SheetRecord};
use crate::stats;
use crate::store::ReviewStore;
use crate::types::{
    Ack, Decision, ExportArtifact, ImportSummary, Role, Row, Session, Statistics,
};

/// Opens (or creates) the database at `path`, configures WAL mode, and
/// applies schema migrations.
///
/// `busy_timeout` is set through the connection method rather than a pragma
/// string so it survives pragma caching.
///
/// # Errors
///
/// `Transport` if the file cannot be opened, a pragma fails, or a migration
/// fails.
pub async fn open_db(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).await?;

    conn.call(|db| -> rusqlite::Result<()> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        // Leftover WAL from a previous run.
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        crate::schema::migrate(db)
    })
    .await?;

    tracing::debug!(path, "database opened");
    Ok(conn)
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Row columns as stored, before decision parsing.
struct StoredRow {
    index: i64,
    role: String,
    original: String,
    updated: Option<String>,
    update_status: String,
    llm_output: String,
    check_result: String,
    check_details: String,
    decision: String,
    manual: Option<String>,
}

impl StoredRow {
    const COLUMNS: &'static str = "row_index, role, original_content, updated_content, \
         update_status, llm_output, check_result, check_details, decision, manual_content";

    fn read(r: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            index: r.get(0)?,
            role: r.get(1)?,
            original: r.get(2)?,
            updated: r.get(3)?,
            update_status: r.get(4)?,
            llm_output: r.get(5)?,
            check_result: r.get(6)?,
            check_details: r.get(7)?,
            decision: r.get(8)?,
            manual: r.get(9)?,
        })
    }

    fn into_row(self) -> Result<Row> {
        let mut row = Row::new(
            self.index as usize,
            Role::from_label(&self.role),
            self.original,
            self.updated.as_deref(),
        );
        row.update_status = self.update_status;
        row.llm_output = self.llm_output;
        row.check_result = self.check_result;
        row.check_details = self.check_details;
        row.with_review_state(self.decision.parse()?, self.manual)
    }
}

struct StoredSession {
    session_id: String,
    is_saved: bool,
    revision: i64,
    rows: Vec<StoredRow>,
}

impl StoredSession {
    fn into_session(self) -> Result<Session> {
        let rows = self
            .rows
            .into_iter()
            .map(StoredRow::into_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Session::restore(self.session_id, rows, self.is_saved, self.revision as u64))
    }
}

fn read_rows(db: &rusqlite::Connection, session_id: &str) -> rusqlite::Result<Vec<StoredRow>> {
    let mut stmt = db.prepare_cached(&format!(
        "SELECT {} FROM rows WHERE session_id = ?1 ORDER BY row_index",
        StoredRow::COLUMNS
    ))?;
    let rows = stmt
        .query_map([session_id], StoredRow::read)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn read_session_at(
    db: &rusqlite::Connection,
    position: i64,
) -> rusqlite::Result<Option<StoredSession>> {
    let head = db
        .query_row(
            "SELECT session_id, is_saved, revision FROM sessions WHERE position = ?1",
            [position],
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, bool>(1)?, r.get::<_, i64>(2)?)),
        )
        .optional()?;
    let Some((session_id, is_saved, revision)) = head else {
        return Ok(None);
    };
    let rows = read_rows(db, &session_id)?;
    Ok(Some(StoredSession { session_id, is_saved, revision, rows }))
}

fn read_all_sessions(db: &rusqlite::Connection) -> rusqlite::Result<Vec<StoredSession>> {
    let mut stmt =
        db.prepare("SELECT session_id, is_saved, revision FROM sessions ORDER BY position")?;
    let heads = stmt
        .query_map([], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, bool>(1)?, r.get::<_, i64>(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    heads
        .into_iter()
        .map(|(session_id, is_saved, revision)| {
            let rows = read_rows(db, &session_id)?;
            Ok(StoredSession { session_id, is_saved, revision, rows })
        })
        .collect()
}

enum SaveOutcome {
    Saved,
    Missing,
    Stale(u64),
}

/// Review state persisted in a local SQLite file.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
    policy: ManualPolicy,
}

impl SqliteStore {
    /// Opens the store at `path`; see [`open_db`].
    ///
    /// # Errors
    ///
    /// `Transport` as for [`open_db`].
    pub async fn open(path: &str, policy: ManualPolicy) -> Result<Self> {
        let conn = open_db(path).await?;
        Ok(Self { conn, policy })
    }

    /// The underlying connection, for inspection in tests and diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn policy(&self) -> ManualPolicy {
        self.policy
    }

    /// Reads the sheet at `path` and replaces the stored batch with it.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing, unsupported, or malformed sheet (see
    /// [`sheet::load_path`]) and for one without rows; `Transport` when the
    /// file or the database fails.
    pub async fn import_path(&self, path: &Path) -> Result<ImportSummary> {
        let records = sheet::load_path(path)?;
        self.import_batch(&path.display().to_string(), records).await
    }

    /// Replaces whatever batch is stored with `records`, grouped into
    /// sessions by first appearance. Every session starts unsaved.
    ///
    /// # Errors
    ///
    /// `Validation` when `records` is empty; `Transport` if the write
    /// transaction fails, in which case the previous batch is kept.
    pub async fn import_batch(
        &self,
        source: &str,
        records: Vec<SheetRecord>,
    ) -> Result<ImportSummary> {
        if records.is_empty() {
            return Err(ReviewError::validation("sheet contains no rows"));
        }
        let total_rows = records.len();
        let sessions = sheet::group_sessions(records);
        let total_sessions = sessions.len();
        let batch_id = uuid::Uuid::new_v4().to_string();

        let source = source.to_owned();
        let id = batch_id.clone();
        self.conn
            .call(move |db| -> rusqlite::Result<()> {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                tx.execute("DELETE FROM batches", [])?;
                tx.execute(
                    "INSERT INTO batches (id, source, imported_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![&id, &source, now_secs()],
                )?;
                {
                    let mut ins_session = tx.prepare(
                        "INSERT INTO sessions (position, session_id, batch_id) VALUES (?1, ?2, ?3)",
                    )?;
                    let mut ins_row = tx.prepare(
                        "INSERT INTO rows (row_index, session_id, role, original_content,
                                           updated_content, update_status, llm_output,
                                           check_result, check_details)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    )?;
                    for (position, session) in sessions.iter().enumerate() {
                        ins_session.execute(rusqlite::params![
                            position as i64,
                            &session.session_id,
                            &id
                        ])?;
                        for row in &session.rows {
                            ins_row.execute(rusqlite::params![
                                row.index as i64,
                                &session.session_id,
                                row.role.label(),
                                &row.original_content,
                                &row.updated_content,
                                &row.update_status,
                                &row.llm_output,
                                &row.check_result,
                                &row.check_details,
                            ])?;
                        }
                    }
                }
                tx.commit()
            })
            .await?;

        tracing::info!(%batch_id, total_sessions, total_rows, "batch imported");
        Ok(ImportSummary { batch_id, total_sessions, total_rows })
    }

    async fn load_all(&self) -> Result<Vec<Session>> {
        let stored = self
            .conn
            .call(|db| -> rusqlite::Result<Vec<StoredSession>> { read_all_sessions(db) })
            .await?;
        stored.into_iter().map(StoredSession::into_session).collect()
    }
}

impl ReviewStore for SqliteStore {
    async fn session_count(&self) -> Result<usize> {
        let n = self
            .conn
            .call(|db| -> rusqlite::Result<i64> {
                db.query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))
            })
            .await?;
        Ok(n as usize)
    }

    async fn fetch_session(&self, index: usize) -> Result<Session> {
        let position = index as i64;
        let stored = self
            .conn
            .call(move |db| -> rusqlite::Result<Option<StoredSession>> {
                read_session_at(db, position)
            })
            .await?;
        let session = stored
            .ok_or_else(|| ReviewError::session_not_found(index))?
            .into_session()?;
        tracing::debug!(
            index,
            session_id = %session.session_id,
            rows = session.rows.len(),
            "session fetched"
        );
        Ok(session)
    }

    async fn submit_row_decision(
        &self,
        row_index: usize,
        decision: Decision,
        manual_text: Option<&str>,
    ) -> Result<Ack> {
        let manual = match decision {
            Decision::Unset => {
                return Err(ReviewError::validation("a decision cannot be reset to unset"));
            }
            Decision::Manual => {
                let text = manual_text
                    .ok_or_else(|| ReviewError::validation("manual decision needs manual text"))?;
                self.policy.check(text)?;
                Some(text.to_owned())
            }
            Decision::Accepted | Decision::Rejected => None,
        };

        let key = row_index as i64;
        let revision = self
            .conn
            .call(move |db| -> rusqlite::Result<Option<i64>> {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                let session_id: Option<String> = tx
                    .query_row("SELECT session_id FROM rows WHERE row_index = ?1", [key], |r| {
                        r.get(0)
                    })
                    .optional()?;
                let Some(session_id) = session_id else {
                    return Ok(None);
                };
                // Accept/reject keep the last manual text as a draft.
                tx.execute(
                    "UPDATE rows
                     SET decision = ?1,
                         manual_content = COALESCE(?2, manual_content),
                         decided_at = ?3
                     WHERE row_index = ?4",
                    rusqlite::params![decision.as_str(), &manual, now_secs(), key],
                )?;
                let revision: i64 = tx.query_row(
                    "UPDATE sessions
                     SET is_saved = 0, saved_at = NULL, revision = revision + 1
                     WHERE session_id = ?1
                     RETURNING revision",
                    [&session_id],
                    |r| r.get(0),
                )?;
                tx.commit()?;
                Ok(Some(revision))
            })
            .await?
            .ok_or_else(|| ReviewError::row_not_found(row_index))?;

        tracing::info!(row_index, %decision, revision, "row decision recorded");
        Ok(Ack { revision: revision as u64 })
    }

    async fn submit_session_save(&self, session_id: &str, revision: u64) -> Result<Ack> {
        let id = session_id.to_owned();
        let seen = revision as i64;
        let outcome = self
            .conn
            .call(move |db| -> rusqlite::Result<SaveOutcome> {
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                let current: Option<i64> = tx
                    .query_row(
                        "SELECT revision FROM sessions WHERE session_id = ?1",
                        [&id],
                        |r| r.get(0),
                    )
                    .optional()?;
                let outcome = match current {
                    None => SaveOutcome::Missing,
                    Some(current) if current != seen => SaveOutcome::Stale(current as u64),
                    Some(_) => {
                        tx.execute(
                            "UPDATE sessions
                             SET is_saved = 1, saved_at = COALESCE(saved_at, ?1)
                             WHERE session_id = ?2",
                            rusqlite::params![now_secs(), &id],
                        )?;
                        SaveOutcome::Saved
                    }
                };
                tx.commit()?;
                Ok(outcome)
            })
            .await?;

        match outcome {
            SaveOutcome::Saved => {
                tracing::info!(session_id, revision, "session saved");
                Ok(Ack { revision })
            }
            SaveOutcome::Missing => Err(ReviewError::session_id_not_found(session_id)),
            SaveOutcome::Stale(actual) => {
                tracing::warn!(session_id, expected = revision, actual, "save rejected as stale");
                Err(ReviewError::Conflict {
                    session_id: session_id.to_owned(),
                    expected: revision,
                    actual,
                })
            }
        }
    }

    async fn fetch_statistics(&self) -> Result<Statistics> {
        let sessions = self.load_all().await?;
        Ok(stats::compute(&sessions))
    }

    async fn request_export(&self, format: SheetFormat) -> Result<ExportArtifact> {
        let sessions = self.load_all().await?;
        if sessions.is_empty() {
            return Err(ReviewError::validation("no data to export"));
        }
        let bytes = sheet::write_sheet(&sessions, format)?;
        let filename = sheet::export_filename(&chrono::Local::now(), format);
        tracing::info!(
            %filename,
            %format,
            sessions = sessions.len(),
            bytes = bytes.len(),
            "export produced"
        );
        Ok(ExportArtifact { filename, bytes })
    }
}
