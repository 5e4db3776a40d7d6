/// DDL for the version tracking table. Safe to run on every open.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// Tables left behind by databases created before versioning existed.
/// They are dropped on first migration; their contents are not carried over.
const LEGACY_TABLES: &[&str] = &["rows", "sessions", "batches"];

/// DDL for the v1 schema.
///
/// - `batches`: one row per import. Only the latest batch is under review.
/// - `sessions`: one row per conversation; `position` is the navigation index.
/// - `rows`: one row per utterance; `row_index` is the record position in the
///   imported sheet and is unique across the batch.
///
/// Every table is `STRICT`. Deleting a batch cascades to its sessions and rows.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS batches (
        id          TEXT    PRIMARY KEY,
        source      TEXT    NOT NULL,
        imported_at INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS sessions (
        position    INTEGER PRIMARY KEY,
        session_id  TEXT    NOT NULL UNIQUE,
        batch_id    TEXT    NOT NULL REFERENCES batches(id) ON DELETE CASCADE,
        is_saved    INTEGER NOT NULL DEFAULT 0 CHECK(is_saved IN (0, 1)),
        revision    INTEGER NOT NULL DEFAULT 0,
        saved_at    INTEGER
    ) STRICT;

    CREATE TABLE IF NOT EXISTS rows (
        row_index        INTEGER PRIMARY KEY,
        session_id       TEXT    NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
        role             TEXT    NOT NULL,
        original_content TEXT    NOT NULL,
        updated_content  TEXT,
        update_status    TEXT    NOT NULL DEFAULT '',
        llm_output       TEXT    NOT NULL DEFAULT '',
        check_result     TEXT    NOT NULL DEFAULT '',
        check_details    TEXT    NOT NULL DEFAULT '',
        decision         TEXT    NOT NULL DEFAULT 'unset'
                                 CHECK(decision IN ('unset', 'accepted', 'rejected', 'manual')),
        manual_content   TEXT,
        decided_at       INTEGER,
        CHECK(decision <> 'manual' OR manual_content IS NOT NULL)
    ) STRICT;

    CREATE INDEX IF NOT EXISTS rows_by_session ON rows(session_id, row_index);
";

/// Forward-only migration to the latest schema. Idempotent.
///
/// Below version 1 any unversioned tables with clashing names are dropped
/// before the v1 DDL runs, all inside one `BEGIN IMMEDIATE` transaction.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        for table in LEGACY_TABLES {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
        tracing::info!(from = version, to = 1, "schema migrated");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_twice_records_one_version() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        migrate(&mut db).unwrap();
        let n: i64 = db
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn manual_decision_requires_text() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        db.execute_batch(
            "INSERT INTO batches VALUES ('b', 'x.csv', 0);
             INSERT INTO sessions (position, session_id, batch_id) VALUES (0, 's', 'b');",
        )
        .unwrap();
        let res = db.execute(
            "INSERT INTO rows (row_index, session_id, role, original_content, decision)
             VALUES (0, 's', '客户', 'a', 'manual')",
            [],
        );
        assert!(res.is_err());
    }
}
