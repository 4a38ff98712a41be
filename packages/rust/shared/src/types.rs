//! Core domain types for Q&A knowledge base exports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SyncError};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const QNA_ID: &str = "QnaId";
pub const QUESTION: &str = "Question";
pub const ANSWER: &str = "Answer";
pub const SUGGESTED_QUESTIONS: &str = "SuggestedQuestions";
pub const IS_CONTEXT_ONLY: &str = "IsContextOnly";

/// Cell value meaning "no suggested questions".
pub const EMPTY_SUGGESTIONS: &str = "[]";

/// Columns a sheet must carry to take part in a sync.
const REQUIRED_COLUMNS: [&str; 3] = [QNA_ID, QUESTION, ANSWER];

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one sync run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One question/answer row of an export.
///
/// Every cell is kept as the text it was loaded with; typed conversion of
/// `QnaId` and `IsContextOnly` happens only when a set is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Group identifier. Integer-valued, but may arrive as `"3"` or `"3.0"`.
    pub qna_id: String,
    pub question: String,
    pub answer: String,
    /// String-encoded list; [`EMPTY_SUGGESTIONS`] means none.
    pub suggested_questions: String,
    pub is_context_only: String,
    /// Cells of any other column (`Source`, `Metadata`, `Prompts`, ...).
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// Build a record from a header and its row of cells. Missing cells are
    /// empty strings.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        let mut record = Record {
            suggested_questions: EMPTY_SUGGESTIONS.to_string(),
            ..Record::default()
        };

        for (i, column) in header.iter().enumerate() {
            let value = row.get(i).cloned().unwrap_or_default();
            match column.as_str() {
                QNA_ID => record.qna_id = value,
                QUESTION => record.question = value,
                ANSWER => record.answer = value,
                SUGGESTED_QUESTIONS => record.suggested_questions = value,
                IS_CONTEXT_ONLY => record.is_context_only = value,
                _ => {
                    record.extra.insert(column.clone(), value);
                }
            }
        }

        record
    }

    /// Cell text for `column`, empty if the record has none.
    pub fn cell(&self, column: &str) -> &str {
        match column {
            QNA_ID => &self.qna_id,
            QUESTION => &self.question,
            ANSWER => &self.answer,
            SUGGESTED_QUESTIONS => &self.suggested_questions,
            IS_CONTEXT_ONLY => &self.is_context_only,
            other => self.extra.get(other).map(String::as_str).unwrap_or(""),
        }
    }

    /// Whether the QA service attached suggested questions to this row.
    /// Only the literal `[]` means none.
    pub fn has_suggestions(&self) -> bool {
        self.suggested_questions != EMPTY_SUGGESTIONS
    }
}

// ---------------------------------------------------------------------------
// RecordSet
// ---------------------------------------------------------------------------

/// An ordered sheet of records. Row order encodes group adjacency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    /// Column names in sheet order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Header used for sets built in memory.
    pub fn standard_columns() -> Vec<String> {
        [QUESTION, ANSWER, SUGGESTED_QUESTIONS, IS_CONTEXT_ONLY, QNA_ID]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Build a set from raw rows, checking that the required columns exist.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let header: Vec<String> = header.into_iter().map(|c| c.trim().to_string()).collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|required| !header.iter().any(|c| c == required))
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::schema(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let records = rows
            .iter()
            .map(|row| Record::from_row(&header, row))
            .collect();

        Ok(Self {
            columns: header,
            records,
        })
    }

    /// A new set with this set's header and the given records.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            columns: self.columns.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Parse a `QnaId` cell, truncating float representations (`"7.0"` → 7).
pub fn parse_qna_id(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(id);
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(SyncError::UnparseableQnaId {
            value: value.to_string(),
        }),
    }
}

/// Coerce an `IsContextOnly` cell to a boolean.
///
/// Empty cells and the false literals (`false`, `0`, `0.0`, `no`, any case)
/// are `false`; any other text is `true`.
pub fn parse_context_only(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "0" | "0.0" | "no"
    )
}
