//! Integration tests for the SQLite store.
//!
//! Exercises: open_db, migrate, import_batch, fetch_session,
//! submit_row_decision, submit_session_save, fetch_statistics, request_export
//! in both sheet formats.

use std::io::Cursor;

use revcheck_core::db::{self, SqliteStore};
use revcheck_core::sheet::{read_records, read_workbook};
use revcheck_core::{
    ConversationType, Decision, ManualPolicy, ReviewError, ReviewStore, SheetFormat, Statistics,
};

const SHEET: &str = "\
sessionId,角色,话术内容,变更后的内容,更新情况,LLM完整输出,更新结果检查,更新结果检查详情
conv-a,客户,你好，我的订单到哪了？,,未更新,,,
conv-a,客服,您好。订单已发货！,您好。订单已经发货！,已更新,\"{\"\"ok\"\":true}\",通过,措辞优化
conv-b,客户,谢谢,,未更新,,,
conv-a,客服,还有别的问题吗？,请问还有其他问题吗？,已更新,,通过,
";

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("test.db");
    path.to_string_lossy().to_string()
}

async fn seeded_store(path: &str) -> SqliteStore {
    let store = SqliteStore::open(path, ManualPolicy::default()).await.unwrap();
    let records = read_records(SHEET.as_bytes()).unwrap();
    let summary = store.import_batch("batch.csv", records).await.unwrap();
    assert_eq!(summary.total_sessions, 2);
    assert_eq!(summary.total_rows, 4);
    assert!(!summary.batch_id.is_empty());
    store
}

#[tokio::test]
async fn open_db_configures_wal_and_schema() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let pk_type: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT type FROM pragma_table_info('sessions') WHERE name = 'session_id'",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(pk_type, "TEXT");
}

#[tokio::test]
async fn full_review_lifecycle() {
    let path = temp_db_path();
    let store = seeded_store(&path).await;

    assert_eq!(store.session_count().await.unwrap(), 2);

    // Sessions come back in first-appearance order with rows in file order.
    let a = store.fetch_session(0).await.unwrap();
    assert_eq!(a.session_id, "conv-a");
    let indexes: Vec<usize> = a.rows.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![0, 1, 3]);
    assert_eq!(a.rows[1].check_details, "措辞优化");
    assert_eq!(a.rows[1].llm_output, "{\"ok\":true}");
    assert_eq!(a.rows[0].updated_content, None);
    assert_eq!(a.revision, 0);
    assert_eq!(a.classify(), ConversationType::UnsavedChanged);

    let b = store.fetch_session(1).await.unwrap();
    assert_eq!(b.classify(), ConversationType::UnsavedUnchanged);

    assert_eq!(
        store.fetch_session(2).await.unwrap_err(),
        ReviewError::session_not_found(2)
    );

    // Decisions bump the revision and persist the manual text.
    let ack = store
        .submit_row_decision(1, Decision::Manual, Some("您好，订单已经发出。"))
        .await
        .unwrap();
    assert_eq!(ack.revision, 1);
    let ack = store.submit_row_decision(3, Decision::Rejected, None).await.unwrap();
    assert_eq!(ack.revision, 2);

    let a = store.fetch_session(0).await.unwrap();
    assert_eq!(a.revision, 2);
    assert_eq!(a.rows[1].decision(), Decision::Manual);
    assert_eq!(a.rows[1].effective_content(), "您好，订单已经发出。");
    assert_eq!(a.rows[2].effective_content(), "还有别的问题吗？");

    // Accepting keeps the manual text as a draft but drops it from view.
    store.submit_row_decision(1, Decision::Accepted, None).await.unwrap();
    let a = store.fetch_session(0).await.unwrap();
    assert_eq!(a.rows[1].manually_corrected_content(), None);
    assert_eq!(a.rows[1].manual_draft(), Some("您好，订单已经发出。"));
    assert_eq!(a.rows[1].effective_content(), "您好。订单已经发货！");

    // Saving needs the current revision.
    let err = store.submit_session_save("conv-a", 0).await.unwrap_err();
    assert_eq!(
        err,
        ReviewError::Conflict { session_id: "conv-a".to_owned(), expected: 0, actual: 3 }
    );
    store.submit_session_save("conv-a", 3).await.unwrap();
    store.submit_session_save("conv-a", 3).await.unwrap();
    assert!(store.fetch_session(0).await.unwrap().is_saved());

    store.submit_session_save("conv-b", 0).await.unwrap();
    assert_eq!(
        store.fetch_statistics().await.unwrap(),
        Statistics {
            saved_no_change: 1,
            saved_has_change: 1,
            unsaved_no_change: 0,
            unsaved_has_change: 0,
        }
    );

    // An edit after saving invalidates the save.
    store.submit_row_decision(0, Decision::Accepted, None).await.unwrap();
    let a = store.fetch_session(0).await.unwrap();
    assert!(!a.is_saved());
    assert_eq!(a.classify(), ConversationType::UnsavedChanged);

    // Persistence across connections.
    let again = SqliteStore::open(&path, ManualPolicy::default()).await.unwrap();
    assert_eq!(again.fetch_session(0).await.unwrap(), a);
}

#[tokio::test]
async fn invalid_requests_leave_the_store_untouched() {
    let path = temp_db_path();
    let store = seeded_store(&path).await;

    assert!(matches!(
        store.submit_row_decision(1, Decision::Manual, Some("")).await,
        Err(ReviewError::Validation(_))
    ));
    assert!(matches!(
        store.submit_row_decision(1, Decision::Manual, None).await,
        Err(ReviewError::Validation(_))
    ));
    assert!(matches!(
        store.submit_row_decision(1, Decision::Unset, None).await,
        Err(ReviewError::Validation(_))
    ));
    assert_eq!(
        store.submit_row_decision(42, Decision::Accepted, None).await.unwrap_err(),
        ReviewError::row_not_found(42)
    );
    assert_eq!(
        store.submit_session_save("nope", 0).await.unwrap_err(),
        ReviewError::session_id_not_found("nope")
    );

    let a = store.fetch_session(0).await.unwrap();
    assert_eq!(a.revision, 0);
    assert!(a.rows.iter().all(|r| r.decision() == Decision::Unset));
}

#[tokio::test]
async fn empty_manual_text_allowed_when_policy_permits() {
    let path = temp_db_path();
    let store = SqliteStore::open(&path, ManualPolicy { require_nonempty: false })
        .await
        .unwrap();
    store
        .import_batch("batch.csv", read_records(SHEET.as_bytes()).unwrap())
        .await
        .unwrap();

    store.submit_row_decision(0, Decision::Manual, Some("")).await.unwrap();
    let a = store.fetch_session(0).await.unwrap();
    assert_eq!(a.rows[0].manually_corrected_content(), Some(""));
    assert!(a.rows[0].is_changed());
}

#[tokio::test]
async fn reimport_replaces_the_batch() {
    let path = temp_db_path();
    let store = seeded_store(&path).await;
    store.submit_session_save("conv-b", 0).await.unwrap();

    let sheet = "sessionId,角色,话术内容,变更后的内容,更新情况,LLM完整输出,更新结果检查,更新结果检查详情\n\
                 conv-z,客户,新的,,,,,\n";
    let summary = store
        .import_batch("second.csv", read_records(sheet.as_bytes()).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.total_sessions, 1);
    assert_eq!(store.session_count().await.unwrap(), 1);
    assert_eq!(store.fetch_session(0).await.unwrap().session_id, "conv-z");
    assert_eq!(store.fetch_statistics().await.unwrap().unsaved_no_change, 1);

    assert!(matches!(
        store.import_batch("empty.csv", Vec::new()).await,
        Err(ReviewError::Validation(_))
    ));
}

#[tokio::test]
async fn export_carries_effective_content() {
    let path = temp_db_path();
    let empty = SqliteStore::open(&path, ManualPolicy::default()).await.unwrap();
    assert_eq!(
        empty.request_export(SheetFormat::Excel).await.unwrap_err(),
        ReviewError::validation("no data to export")
    );

    let store = seeded_store(&path).await;
    store.submit_row_decision(1, Decision::Rejected, None).await.unwrap();

    let artifact = store.request_export(SheetFormat::Csv).await.unwrap();
    assert!(artifact.filename.starts_with("话术示例库更新校验结果_"));
    assert!(artifact.filename.ends_with(".csv"));

    let text = String::from_utf8(artifact.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[2].starts_with("conv-a,客服,您好。订单已发货！,您好。订单已经发货！"));
    assert!(lines[2].ends_with(",您好。订单已发货！,rejected"));
    assert!(lines[3].starts_with("conv-b,"));
}

#[tokio::test]
async fn migration_handles_legacy_db() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("legacy.db").to_string_lossy().to_string();

    // An unversioned database with a clashing `sessions` table.
    {
        let db = rusqlite::Connection::open(&path).unwrap();
        db.execute_batch(
            "CREATE TABLE sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                repo_path TEXT NOT NULL
            );
            INSERT INTO sessions (repo_path) VALUES ('/old');",
        )
        .unwrap();
    }

    let store = SqliteStore::open(&path, ManualPolicy::default()).await.unwrap();
    assert_eq!(store.session_count().await.unwrap(), 0, "legacy rows are dropped");

    store
        .import_batch("batch.csv", read_records(SHEET.as_bytes()).unwrap())
        .await
        .unwrap();
    assert_eq!(store.session_count().await.unwrap(), 2);
}

#[tokio::test]
async fn excel_export_round_trips_through_import() {
    let path = temp_db_path();
    let store = seeded_store(&path).await;
    store
        .submit_row_decision(3, Decision::Manual, Some("还需要别的帮助吗？"))
        .await
        .unwrap();

    let artifact = store.request_export(SheetFormat::Excel).await.unwrap();
    assert!(artifact.filename.starts_with("话术示例库更新校验结果_"));
    assert!(artifact.filename.ends_with(".xlsx"));

    let records = read_workbook(Cursor::new(artifact.bytes.clone())).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[1].row.llm_output, "{\"ok\":true}");
    assert_eq!(records[2].session_id, "conv-b");

    // Written to disk, the workbook imports like any reviewer sheet.
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join(&artifact.filename);
    std::fs::write(&file, &artifact.bytes).unwrap();

    let fresh = SqliteStore::open(&temp_db_path(), ManualPolicy::default()).await.unwrap();
    let summary = fresh.import_path(&file).await.unwrap();
    assert_eq!((summary.total_sessions, summary.total_rows), (2, 4));
    let a = fresh.fetch_session(0).await.unwrap();
    assert_eq!(a.session_id, "conv-a");
    assert_eq!(a.rows[2].updated_content.as_deref(), Some("请问还有其他问题吗？"));
    assert!(a.rows.iter().all(|r| r.decision() == Decision::Unset));

    // The reviewer's text travels in the manual column.
    let mut workbook = calamine::open_workbook_auto(&file).unwrap();
    let range = calamine::Reader::worksheet_range_at(&mut workbook, 0).unwrap().unwrap();
    assert_eq!(
        range.get_value((4, 8)),
        Some(&calamine::Data::String("还需要别的帮助吗？".to_owned()))
    );
    assert_eq!(range.get_value((4, 9)), Some(&calamine::Data::String("manual".to_owned())));
}

#[tokio::test]
async fn import_path_refuses_unknown_formats() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("batch.json");
    std::fs::write(&file, "[]").unwrap();

    let store = SqliteStore::open(&temp_db_path(), ManualPolicy::default()).await.unwrap();
    assert!(matches!(store.import_path(&file).await, Err(ReviewError::Validation(_))));
    assert_eq!(store.session_count().await.unwrap(), 0);
}
