//! Tab- and comma-separated codec.

use std::path::Path;

use qnasync_shared::{RecordSet, Result, SyncError};

use crate::{Cell, output_columns, typed_row};

pub(crate) fn read(path: &Path, delimiter: u8) -> Result<RecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SyncError::load(path, e))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| SyncError::load(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| SyncError::load(path, e))?;
        let row: Vec<String> = record.iter().map(String::from).collect();
        if row.iter().any(|cell| !cell.is_empty()) {
            rows.push(row);
        }
    }

    RecordSet::from_rows(header, rows).map_err(|e| SyncError::load(path, e))
}

pub(crate) fn write(path: &Path, set: &RecordSet, delimiter: u8) -> Result<()> {
    let columns = output_columns(set);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)
        .map_err(|e| SyncError::write(path, e))?;

    writer
        .write_record(&columns)
        .map_err(|e| SyncError::write(path, e))?;

    for record in set.iter() {
        let cells: Vec<String> = typed_row(record, &columns)?
            .into_iter()
            .map(|cell| match cell {
                Cell::Int(value) => value.to_string(),
                Cell::Bool(true) => "True".to_string(),
                Cell::Bool(false) => "False".to_string(),
                Cell::Text(value) => value.to_string(),
            })
            .collect();
        writer
            .write_record(&cells)
            .map_err(|e| SyncError::write(path, e))?;
    }

    writer.flush().map_err(|e| SyncError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_tsv_with_bom_and_blank_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("qa.tsv");
        std::fs::write(
            &path,
            "\u{feff}Question\tAnswer\tQnaId\tIsContextOnly\nhi\thello\t1\tFalse\n\t\t\t\nbye\tsee you\t2.0\n",
        )
        .expect("write tsv");

        let set = read(&path, b'\t').expect("read");
        assert_eq!(set.columns[0], "Question");
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[1].qna_id, "2.0");
        assert_eq!(set.records[1].is_context_only, "");
    }

    #[test]
    fn csv_quotes_embedded_delimiters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let set = RecordSet::from_rows(
            vec!["Question".into(), "Answer".into(), "QnaId".into()],
            vec![vec!["a, b".into(), "c".into(), "4.0".into()]],
        )
        .expect("valid");

        write(&path, &set, b',').expect("write");
        let back = read(&path, b',').expect("read back");
        assert_eq!(back.records[0].question, "a, b");
        assert_eq!(back.records[0].qna_id, "4");
        assert_eq!(back.records[0].is_context_only, "False");
    }
}
