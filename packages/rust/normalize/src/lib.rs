//! Text normalization and identity keys for question/answer matching.
//!
//! [`normalize`] folds a question or answer into a comparison key by
//! lowercasing and stripping punctuation, symbols, and whitespace across the
//! ASCII and full-width ranges. [`identity_key`] concatenates the normalized
//! question and answer; two records are "the same row" across exports iff
//! their identity keys are equal.

mod passes;

use qnasync_shared::{Record, RecordSet};

/// Canonicalize `text` into its comparison form.
///
/// Deterministic and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    passes::run_pipeline(text)
}

/// `normalize(question) + normalize(answer)`.
pub fn identity_key(question: &str, answer: &str) -> String {
    let mut key = normalize(question);
    key.push_str(&normalize(answer));
    key
}

/// Comparison view of a [`Record`]. Never written back to a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Raw group identifier, copied from the record.
    pub qna_id: String,
    pub question: String,
    pub answer: String,
    /// Identity key (`question + answer`).
    pub key: String,
}

impl From<&Record> for NormalizedRecord {
    fn from(record: &Record) -> Self {
        let question = normalize(&record.question);
        let answer = normalize(&record.answer);
        let key = format!("{question}{answer}");
        Self {
            qna_id: record.qna_id.clone(),
            question,
            answer,
            key,
        }
    }
}

/// Normalized views of every record in `set`, in row order.
pub fn normalize_set(set: &RecordSet) -> Vec<NormalizedRecord> {
    let normalized: Vec<NormalizedRecord> = set.iter().map(NormalizedRecord::from).collect();
    tracing::trace!(rows = normalized.len(), "normalized record set");
    normalized
}
