//! Spreadsheet and delimited-text I/O for record sets.
//!
//! [`load`] and [`save`] pick a codec from the file extension:
//! - `.xlsx`, `.xlsm`, `.xls`, `.ods`: first worksheet, via `calamine` (read)
//!   and `rust_xlsxwriter` (write)
//! - `.tsv`, `.txt`: tab-separated, via `csv`
//! - `.csv`: comma-separated, via `csv`
//!
//! Empty cells load as empty strings. On save, `QnaId` is written as an
//! integer and `IsContextOnly` as a boolean, whatever text they carried.

mod delimited;
mod xlsx;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use qnasync_shared::{
    IS_CONTEXT_ONLY, QNA_ID, Record, RecordSet, Result, SUGGESTED_QUESTIONS, SyncError,
    parse_context_only, parse_qna_id,
};

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

/// On-disk encoding of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Workbook,
    Tsv,
    Csv,
}

impl Format {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Self::Workbook),
            "tsv" | "txt" => Ok(Self::Tsv),
            "csv" => Ok(Self::Csv),
            other => Err(SyncError::validation(format!(
                "unsupported file extension {other:?} for {}",
                path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load a record set from `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<RecordSet> {
    let set = match Format::from_path(path)? {
        Format::Workbook => xlsx::read(path)?,
        Format::Tsv => delimited::read(path, b'\t')?,
        Format::Csv => delimited::read(path, b',')?,
    };

    info!(rows = set.len(), columns = set.columns.len(), "loaded record set");
    Ok(set)
}

/// Persist `set` to `path`, creating parent directories as needed.
#[instrument(skip_all, fields(path = %path.display(), rows = set.len()))]
pub fn save(path: &Path, set: &RecordSet) -> Result<()> {
    let format = Format::from_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
    }

    match format {
        Format::Workbook => xlsx::write(path, set)?,
        Format::Tsv => delimited::write(path, set, b'\t')?,
        Format::Csv => delimited::write(path, set, b',')?,
    }

    debug!("record set written");
    Ok(())
}

/// Verify every row of `set` survives output typing, so a run can fail
/// before anything is written.
pub fn check_writable(set: &RecordSet) -> Result<()> {
    let columns = output_columns(set);
    for record in set.iter() {
        typed_row(record, &columns)?;
    }
    Ok(())
}

/// Persist `set` to `path` and to a `.tsv` sibling next to it.
/// Returns the sibling's path.
pub fn save_with_tsv_sibling(path: &Path, set: &RecordSet) -> Result<PathBuf> {
    save(path, set)?;
    let sibling = path.with_extension("tsv");
    if sibling != path {
        save(&sibling, set)?;
    }
    Ok(sibling)
}

// ---------------------------------------------------------------------------
// Typed cells shared by the writers
// ---------------------------------------------------------------------------

/// A cell after output typing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Cell<'a> {
    Int(i64),
    Bool(bool),
    Text(&'a str),
}

/// Header written for `set`: its own columns plus any missing standard
/// column, so every output carries `SuggestedQuestions` and `IsContextOnly`.
pub(crate) fn output_columns(set: &RecordSet) -> Vec<String> {
    let mut columns = set.columns.clone();
    for standard in [SUGGESTED_QUESTIONS, IS_CONTEXT_ONLY] {
        if !columns.iter().any(|c| c == standard) {
            columns.push(standard.to_string());
        }
    }
    columns
}

/// Type one record's cells in `columns` order.
pub(crate) fn typed_row<'a>(record: &'a Record, columns: &[String]) -> Result<Vec<Cell<'a>>> {
    columns
        .iter()
        .map(|column| {
            let raw = record.cell(column);
            Ok(match column.as_str() {
                QNA_ID => Cell::Int(parse_qna_id(raw)?),
                IS_CONTEXT_ONLY => Cell::Bool(parse_context_only(raw)),
                _ => Cell::Text(raw),
            })
        })
        .collect()
}
