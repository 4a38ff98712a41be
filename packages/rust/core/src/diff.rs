//! Set differences between the source-of-truth export (SP) and the live
//! Q&A service export (QA).

use std::collections::HashSet;

use qnasync_normalize::normalize_set;
use qnasync_shared::RecordSet;
use tracing::debug;

/// QA records whose identity key appears nowhere in SP.
///
/// Matching runs on normalized views; the returned records are the original
/// QA rows, in QA order, with QA's header.
pub fn only_in_qa(sp: &RecordSet, qa: &RecordSet) -> RecordSet {
    let sp_keys: HashSet<String> = normalize_set(sp).into_iter().map(|v| v.key).collect();

    let records: Vec<_> = qa
        .iter()
        .zip(normalize_set(qa))
        .filter(|(_, view)| !sp_keys.contains(&view.key))
        .map(|(record, _)| record.clone())
        .collect();

    debug!(qa_rows = qa.len(), only_in_qa = records.len(), "computed QA-only rows");
    qa.with_records(records)
}

/// QA records that carry suggested questions.
pub fn with_suggestions(qa: &RecordSet) -> RecordSet {
    let records: Vec<_> = qa.iter().filter(|r| r.has_suggestions()).cloned().collect();

    debug!(suggested = records.len(), "computed rows with suggestions");
    qa.with_records(records)
}
