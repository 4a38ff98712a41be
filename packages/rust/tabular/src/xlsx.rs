//! Workbook codec: calamine for reading, rust_xlsxwriter for writing.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;

use qnasync_shared::{RecordSet, Result, SyncError};

use crate::{Cell, output_columns, typed_row};

/// Excel's hard row limit (header included).
const MAX_ROWS: usize = 1_048_576;

/// Read the first worksheet. The first row is the header; fully blank rows
/// are dropped.
pub(crate) fn read(path: &Path) -> Result<RecordSet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SyncError::load(path, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SyncError::load(path, "workbook has no worksheets"))?
        .map_err(|e| SyncError::load(path, e))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .ok_or_else(|| SyncError::load(path, "first worksheet is empty"))?;

    let body: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    RecordSet::from_rows(header, body).map_err(|e| SyncError::load(path, e))
}

/// Write `set` as a single-sheet workbook.
pub(crate) fn write(path: &Path, set: &RecordSet) -> Result<()> {
    if set.len() + 1 > MAX_ROWS {
        return Err(SyncError::write(
            path,
            format!("{} rows exceed the worksheet limit", set.len()),
        ));
    }

    let columns = output_columns(set);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in columns.iter().enumerate() {
        worksheet
            .write_string(0, column_index(path, col)?, name.as_str())
            .map_err(|e| SyncError::write(path, e))?;
    }

    for (i, record) in set.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, cell) in typed_row(record, &columns)?.into_iter().enumerate() {
            let col = column_index(path, col)?;
            match cell {
                Cell::Int(value) => worksheet.write_number(row, col, value as f64),
                Cell::Bool(value) => worksheet.write_boolean(row, col, value),
                Cell::Text(value) => worksheet.write_string(row, col, value),
            }
            .map_err(|e| SyncError::write(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| SyncError::write(path, e))
}

fn column_index(path: &Path, col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| SyncError::write(path, format!("too many columns ({col})")))
}

/// Render a cell the way the rest of the pipeline sees it: plain text,
/// integral floats without a fractional part, booleans as `True`/`False`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

fn float_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_renders_numbers_and_flags() {
        assert_eq!(cell_text(&Data::Float(7.0)), "7");
        assert_eq!(cell_text(&Data::Float(7.5)), "7.5");
        assert_eq!(cell_text(&Data::Int(12)), "12");
        assert_eq!(cell_text(&Data::Bool(true)), "True");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("hi".into())), "hi");
    }
}
