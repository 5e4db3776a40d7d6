//! Intake and export of review batches as Excel workbooks or CSV.
//!
//! Column headers are the ones the review sheet has always carried. Workbooks
//! are read from their first worksheet. CSV exports start with a UTF-8
//! byte-order mark so spreadsheet tools detect the encoding; imports strip it.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;
use std::str::FromStr;

use calamine::{Data, Reader, Sheets};
use chrono::{DateTime, TimeZone};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::{Result, ReviewError};
use crate::types::{Role, Row, Session};

pub const COL_SESSION_ID: &str = "sessionId";
pub const COL_ROLE: &str = "角色";
pub const COL_ORIGINAL: &str = "话术内容";
pub const COL_UPDATED: &str = "变更后的内容";
pub const COL_UPDATE_STATUS: &str = "更新情况";
pub const COL_LLM_OUTPUT: &str = "LLM完整输出";
pub const COL_CHECK_RESULT: &str = "更新结果检查";
pub const COL_CHECK_DETAILS: &str = "更新结果检查详情";
pub const COL_MANUAL: &str = "人工校验修正后的内容";
pub const COL_DECISION: &str = "校验决定";

/// Columns an imported sheet must contain, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_SESSION_ID,
    COL_ROLE,
    COL_ORIGINAL,
    COL_UPDATED,
    COL_UPDATE_STATUS,
    COL_LLM_OUTPUT,
    COL_CHECK_RESULT,
    COL_CHECK_DETAILS,
];

/// Columns of an exported sheet.
pub const EXPORT_COLUMNS: [&str; 10] = [
    COL_SESSION_ID,
    COL_ROLE,
    COL_ORIGINAL,
    COL_UPDATED,
    COL_UPDATE_STATUS,
    COL_LLM_OUTPUT,
    COL_CHECK_RESULT,
    COL_CHECK_DETAILS,
    COL_MANUAL,
    COL_DECISION,
];

const BOM: char = '\u{feff}';

/// File format of a review sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetFormat {
    /// `.xlsx` on export; `.xlsx`, `.xlsm` and `.xls` on import.
    #[default]
    Excel,
    Csv,
}

impl SheetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SheetFormat::Excel => "xlsx",
            SheetFormat::Csv => "csv",
        }
    }

    /// Picks the format from the file extension, case-insensitively.
    ///
    /// # Errors
    ///
    /// `Validation` for any extension other than xlsx, xlsm, xls or csv.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" => Ok(SheetFormat::Excel),
            "csv" => Ok(SheetFormat::Csv),
            _ => Err(ReviewError::validation(format!(
                "expected an Excel (.xlsx, .xls) or .csv sheet, got {}",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SheetFormat {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(SheetFormat::Excel),
            "csv" => Ok(SheetFormat::Csv),
            other => Err(ReviewError::validation(format!("unknown sheet format: {other}"))),
        }
    }
}

/// One imported record: a fresh row and the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecord {
    pub session_id: String,
    pub row: Row,
}

/// Positions of the required columns in one sheet's header.
struct Columns {
    session: usize,
    role: usize,
    original: usize,
    updated: usize,
    status: usize,
    llm: usize,
    check: usize,
    details: usize,
}

impl Columns {
    fn locate<'h>(headers: impl IntoIterator<Item = &'h str>) -> Result<Self> {
        let positions: HashMap<String, usize> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches(BOM).trim().to_owned(), i))
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !positions.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(ReviewError::validation(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let at = |name: &str| positions[name];
        Ok(Self {
            session: at(COL_SESSION_ID),
            role: at(COL_ROLE),
            original: at(COL_ORIGINAL),
            updated: at(COL_UPDATED),
            status: at(COL_UPDATE_STATUS),
            llm: at(COL_LLM_OUTPUT),
            check: at(COL_CHECK_RESULT),
            details: at(COL_CHECK_DETAILS),
        })
    }

    /// Builds the record at position `index` from a cell lookup that yields
    /// `""` for cells past the end of the line.
    fn record<'c>(&self, index: usize, cell: impl Fn(usize) -> &'c str) -> Result<SheetRecord> {
        let session_id = cell(self.session).trim();
        if session_id.is_empty() {
            return Err(ReviewError::validation(format!("row {index} has no {COL_SESSION_ID}")));
        }
        let updated = Some(cell(self.updated)).filter(|s| !s.is_empty());

        let role = Role::from_label(cell(self.role));
        let mut row = Row::new(index, role, cell(self.original), updated);
        row.update_status = cell(self.status).to_owned();
        row.llm_output = cell(self.llm).to_owned();
        row.check_result = cell(self.check).to_owned();
        row.check_details = cell(self.details).to_owned();

        Ok(SheetRecord { session_id: session_id.to_owned(), row })
    }
}

/// Parses CSV sheet contents into records, assigning each row its zero-based
/// record position as index.
///
/// # Errors
///
/// `Validation` when required columns are missing or a row has no session
/// id; `Transport` when the bytes are not readable CSV.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<SheetRecord>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns = Columns::locate(rdr.headers()?.iter())?;

    let mut records = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        records.push(columns.record(index, |i| record.get(i).unwrap_or(""))?);
    }
    Ok(records)
}

/// Parses an in-memory workbook (xlsx, xls, xlsb or ods).
///
/// # Errors
///
/// As [`read_records`]; `Transport` when the bytes are not a workbook.
pub fn read_workbook<RS: Read + Seek + Clone>(reader: RS) -> Result<Vec<SheetRecord>> {
    records_from_workbook(calamine::open_workbook_auto_from_rs(reader)?)
}

/// Text of one cell as the sheet shows it. Whole numbers print without a
/// fractional part, so numeric session ids stay stable.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn records_from_workbook<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<Vec<SheetRecord>> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReviewError::validation("workbook has no worksheets"))??;

    let mut lines = range.rows();
    let Some(header) = lines.next() else {
        return Err(ReviewError::validation("sheet has no header row"));
    };
    let header: Vec<String> = header.iter().map(cell_text).collect();
    let columns = Columns::locate(header.iter().map(String::as_str))?;

    // Blank lines inside the used range carry no record.
    lines
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .enumerate()
        .map(|(index, cells)| {
            let texts: Vec<String> = cells.iter().map(cell_text).collect();
            columns.record(index, |i| texts.get(i).map_or("", String::as_str))
        })
        .collect()
}

/// Reads a sheet from disk; the extension picks the format.
///
/// # Errors
///
/// `Validation` for a missing file, an unsupported extension, or sheet
/// contents [`read_records`] would refuse; `Transport` when the file cannot
/// be opened or decoded.
pub fn load_path(path: &Path) -> Result<Vec<SheetRecord>> {
    if !path.exists() {
        return Err(ReviewError::validation(format!("file not found: {}", path.display())));
    }
    match SheetFormat::from_path(path)? {
        SheetFormat::Csv => read_records(std::fs::File::open(path)?),
        SheetFormat::Excel => records_from_workbook(calamine::open_workbook_auto(path)?),
    }
}

/// Groups records into sessions ordered by first appearance; rows keep file
/// order within each session.
pub fn group_sessions(records: Vec<SheetRecord>) -> Vec<Session> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<Row>> = HashMap::new();

    for SheetRecord { session_id, row } in records {
        grouped
            .entry(session_id)
            .or_insert_with_key(|id| {
                order.push(id.clone());
                Vec::new()
            })
            .push(row);
    }

    order
        .into_iter()
        .map(|id| {
            let rows = grouped.remove(&id).unwrap_or_default();
            Session::new(id, rows)
        })
        .collect()
}

/// Export lines in original record order. An absent update is written as
/// the original text.
fn export_lines(sessions: &[Session]) -> Vec<[&str; 10]> {
    let mut rows: Vec<(&str, &Row)> = sessions
        .iter()
        .flat_map(|s| s.rows.iter().map(move |r| (s.session_id.as_str(), r)))
        .collect();
    rows.sort_by_key(|(_, r)| r.index);

    rows.into_iter()
        .map(|(session_id, row)| {
            [
                session_id,
                row.role.label(),
                row.original_content.as_str(),
                row.updated_content.as_deref().unwrap_or(&row.original_content),
                row.update_status.as_str(),
                row.llm_output.as_str(),
                row.check_result.as_str(),
                row.check_details.as_str(),
                row.effective_content(),
                row.decision().as_str(),
            ]
        })
        .collect()
}

/// Serializes the batch as CSV, appending the reviewer's effective content
/// and decision.
///
/// # Errors
///
/// `Transport` if the CSV writer fails.
pub fn write_records(sessions: &[Session]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(BOM.to_string().as_bytes());
    let mut wtr = csv::Writer::from_writer(buf);

    wtr.write_record(EXPORT_COLUMNS)?;
    for line in export_lines(sessions) {
        wtr.write_record(line)?;
    }

    wtr.into_inner().map_err(|e| ReviewError::Transport(e.to_string()))
}

/// Serializes the batch as a single-sheet xlsx workbook with a bold header.
///
/// # Errors
///
/// `Transport` if the workbook cannot be assembled.
pub fn write_workbook(sessions: &[Session]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in (0u16..).zip(EXPORT_COLUMNS) {
        sheet.write_string_with_format(0, col, name, &bold)?;
    }
    for (row, line) in (1u32..).zip(export_lines(sessions)) {
        for (col, text) in (0u16..).zip(line) {
            if !text.is_empty() {
                sheet.write_string(row, col, text)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Serializes the batch in `format`.
///
/// # Errors
///
/// See [`write_records`] and [`write_workbook`].
pub fn write_sheet(sessions: &[Session], format: SheetFormat) -> Result<Vec<u8>> {
    match format {
        SheetFormat::Excel => write_workbook(sessions),
        SheetFormat::Csv => write_records(sessions),
    }
}

/// Filename offered for an export in `format` produced at `at`.
pub fn export_filename<Tz: TimeZone>(at: &DateTime<Tz>, format: SheetFormat) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("话术示例库更新校验结果_{}.{}", at.format("%Y%m%d_%H%M%S"), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{Command, ManualPolicy};
    use crate::types::Decision;
    use std::io::Cursor;

    const HEADER: &str = "sessionId,角色,话术内容,变更后的内容,更新情况,LLM完整输出,更新结果检查,更新结果检查详情";

    fn sheet(lines: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for l in lines {
            s.push('\n');
            s.push_str(l);
        }
        s
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let err = read_records("sessionId,角色\ns1,客户".as_bytes()).unwrap_err();
        let msg = match err {
            ReviewError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(msg.contains("话术内容, 变更后的内容, 更新情况"), "{msg}");
        assert!(!msg.contains("sessionId"));
    }

    #[test]
    fn records_get_positional_indexes_and_empty_updates_become_none() {
        let csv = sheet(&[
            "s1,客户,你好,,,,,",
            "s1,客服,请稍等。,请您稍等。,已更新,raw,通过,ok",
        ]);
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row.index, 0);
        assert_eq!(records[0].row.updated_content, None);
        assert_eq!(records[1].row.index, 1);
        assert_eq!(records[1].row.role, Role::Agent);
        assert_eq!(records[1].row.updated_content.as_deref(), Some("请您稍等。"));
        assert_eq!(records[1].row.check_details, "ok");
        assert_eq!(records[1].row.decision(), Decision::Unset);
    }

    #[test]
    fn bom_on_first_header_is_ignored() {
        let csv = format!("{BOM}{}", sheet(&["s1,客户,a,b,,,,"]));
        assert_eq!(read_records(csv.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn blank_session_id_is_rejected() {
        let csv = sheet(&[" ,客户,a,b,,,,"]);
        assert!(matches!(read_records(csv.as_bytes()), Err(ReviewError::Validation(_))));
    }

    #[test]
    fn sessions_follow_first_appearance() {
        let csv = sheet(&["b,客户,1,,,,,", "a,客户,2,,,,,", "b,客服,3,,,,,"]);
        let sessions = group_sessions(read_records(csv.as_bytes()).unwrap());
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        let b_rows: Vec<usize> = sessions[0].rows.iter().map(|r| r.index).collect();
        assert_eq!(b_rows, vec![0, 2]);
        assert!(sessions.iter().all(|s| !s.is_saved()));
    }

    fn reviewed_batch() -> Vec<Session> {
        let csv = sheet(&["b,客户,1,,,,,", "a,客服,旧,新,,,,", "b,客服,3,三,,,,"]);
        let mut sessions = group_sessions(read_records(csv.as_bytes()).unwrap());
        sessions[0].apply(2, &Command::Reject, ManualPolicy::default()).unwrap();
        sessions[1]
            .apply(1, &Command::Manual("手改".to_owned()), ManualPolicy::default())
            .unwrap();
        sessions
    }

    #[test]
    fn export_writes_effective_content_in_record_order() {
        let bytes = write_records(&reviewed_batch()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with(BOM));
        assert!(header.ends_with("人工校验修正后的内容,校验决定"));
        assert_eq!(lines.next(), Some("b,客户,1,1,,,,,1,unset"));
        assert_eq!(lines.next(), Some("a,客服,旧,新,,,,,手改,manual"));
        assert_eq!(lines.next(), Some("b,客服,3,三,,,,,3,rejected"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn exported_sheet_can_be_imported_again() {
        let csv = sheet(&["s1,客户,你好，在吗？,你好，请问在吗？,,,,"]);
        let sessions = group_sessions(read_records(csv.as_bytes()).unwrap());
        let bytes = write_records(&sessions).unwrap();
        let again = group_sessions(read_records(bytes.as_slice()).unwrap());
        assert_eq!(again, sessions);
    }

    #[test]
    fn workbook_export_reads_back() {
        let sessions = reviewed_batch();
        let bytes = write_workbook(&sessions).unwrap();

        let mut workbook =
            calamine::open_workbook_auto_from_rs(Cursor::new(bytes.clone())).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.get_value((0, 9)), Some(&Data::String(COL_DECISION.to_owned())));
        assert_eq!(range.get_value((2, 8)), Some(&Data::String("手改".to_owned())));
        assert_eq!(range.get_value((3, 9)), Some(&Data::String("rejected".to_owned())));

        // A re-import starts a fresh review pass over the same rows.
        let again = group_sessions(read_workbook(Cursor::new(bytes)).unwrap());
        let ids: Vec<&str> = again.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(again[1].rows[0].updated_content.as_deref(), Some("新"));
        assert_eq!(again[0].rows[1].original_content, "3");
        assert!(again.iter().flat_map(|s| &s.rows).all(|r| r.decision() == Decision::Unset));
    }

    /// A workbook as a spreadsheet tool leaves it: numeric ids, a blank
    /// line, and columns in a different order.
    fn handmade_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        let header = [
            COL_ROLE,
            COL_SESSION_ID,
            COL_ORIGINAL,
            COL_UPDATED,
            COL_UPDATE_STATUS,
            COL_LLM_OUTPUT,
            COL_CHECK_RESULT,
            COL_CHECK_DETAILS,
        ];
        for (col, name) in (0u16..).zip(header) {
            ws.write_string(0, col, name).unwrap();
        }
        ws.write_string(1, 0, "客户").unwrap();
        ws.write_number(1, 1, 1001).unwrap();
        ws.write_string(1, 2, "你好").unwrap();
        ws.write_string(3, 0, "客服").unwrap();
        ws.write_number(3, 1, 1001).unwrap();
        ws.write_string(3, 2, "请稍等。").unwrap();
        ws.write_string(3, 3, "请您稍等。").unwrap();
        ws.write_string(3, 6, "通过").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn workbook_cells_map_through_the_header() {
        let records = read_workbook(Cursor::new(handmade_workbook())).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.session_id == "1001"));
        assert_eq!(records[0].row.index, 0);
        assert_eq!(records[0].row.updated_content, None);
        assert_eq!(records[1].row.index, 1);
        assert_eq!(records[1].row.role, Role::Agent);
        assert_eq!(records[1].row.updated_content.as_deref(), Some("请您稍等。"));
        assert_eq!(records[1].row.check_result, "通过");
    }

    #[test]
    fn workbook_missing_columns_are_reported() {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.write_string(0, 0, COL_SESSION_ID).unwrap();
        ws.write_string(1, 0, "s1").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        match read_workbook(Cursor::new(bytes)) {
            Err(ReviewError::Validation(msg)) => assert!(msg.contains(COL_ROLE), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn export_filename_uses_timestamp_and_format() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_filename(&at, SheetFormat::Excel),
            "话术示例库更新校验结果_20240309_140507.xlsx"
        );
        assert_eq!(
            export_filename(&at, SheetFormat::Csv),
            "话术示例库更新校验结果_20240309_140507.csv"
        );
    }

    #[test]
    fn format_follows_extension_and_name() {
        assert_eq!(SheetFormat::from_path(Path::new("a/batch.XLSX")).unwrap(), SheetFormat::Excel);
        assert_eq!(SheetFormat::from_path(Path::new("batch.xls")).unwrap(), SheetFormat::Excel);
        assert_eq!(SheetFormat::from_path(Path::new("batch.csv")).unwrap(), SheetFormat::Csv);
        assert!(SheetFormat::from_path(Path::new("batch.txt")).is_err());
        assert!(SheetFormat::from_path(Path::new("batch")).is_err());

        assert_eq!("xlsx".parse::<SheetFormat>().unwrap(), SheetFormat::Excel);
        assert_eq!("CSV".parse::<SheetFormat>().unwrap(), SheetFormat::Csv);
        assert!("ods".parse::<SheetFormat>().is_err());
        assert_eq!(SheetFormat::default().to_string(), "xlsx");
    }

    #[test]
    fn load_path_reads_both_formats() {
        let dir = tempfile::TempDir::new().unwrap();

        let xlsx = dir.path().join("batch.xlsx");
        std::fs::write(&xlsx, handmade_workbook()).unwrap();
        assert_eq!(load_path(&xlsx).unwrap().len(), 2);

        let csv = dir.path().join("batch.csv");
        std::fs::write(&csv, sheet(&["s1,客户,a,,,,,"])).unwrap();
        assert_eq!(load_path(&csv).unwrap().len(), 1);
    }

    #[test]
    fn unsupported_or_missing_paths_are_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("batch.txt");
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(load_path(&path), Err(ReviewError::Validation(_))));
        assert!(matches!(
            load_path(&dir.path().join("missing.xlsx")),
            Err(ReviewError::Validation(_))
        ));

        // Right extension, wrong contents.
        let bogus = dir.path().join("bogus.xlsx");
        std::fs::write(&bogus, "not a workbook").unwrap();
        assert!(matches!(load_path(&bogus), Err(ReviewError::Transport(_))));
    }
}
