//! Merging QA-side changes into SP.
//!
//! Three passes run in order over one [`WorkingSet`], each observing the
//! changes of the previous ones:
//!
//! 1. [`backfill_suggestions`]: copy QA's suggested questions onto the SP rows
//!    with the same identity key.
//! 2. [`insert_matched`]: insert QA-only rows after the last child of their
//!    matched SP group.
//! 3. [`append_unmatched`]: append the rest as new singleton groups with fresh
//!    consecutive ids.

use serde::Serialize;
use tracing::{debug, info, instrument};

use qnasync_normalize::{NormalizedRecord, identity_key, normalize_set};
use qnasync_shared::{Record, RecordSet, Result, SyncError, parse_qna_id};

use crate::diff;
use crate::matcher::{candidates, find_insertion_anchor};

// ---------------------------------------------------------------------------
// Working set
// ---------------------------------------------------------------------------

/// SP records plus their normalized views, kept index-aligned so matcher
/// lookups always see the rows inserted so far.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    set: RecordSet,
    views: Vec<NormalizedRecord>,
}

impl WorkingSet {
    pub fn new(set: RecordSet) -> Self {
        let views = normalize_set(&set);
        Self { set, views }
    }

    pub fn records(&self) -> &[Record] {
        &self.set.records
    }

    pub fn views(&self) -> &[NormalizedRecord] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Insert `record` at `at`, shifting every later row down by one.
    pub fn insert(&mut self, at: usize, record: Record) {
        self.views.insert(at, NormalizedRecord::from(&record));
        self.set.records.insert(at, record);
    }

    pub fn push(&mut self, record: Record) {
        self.views.push(NormalizedRecord::from(&record));
        self.set.records.push(record);
    }

    /// Position of the first row with identity key `key`.
    pub fn position_of_key(&self, key: &str) -> Option<usize> {
        self.views.iter().position(|v| v.key == key)
    }

    /// `QnaId` of the last row, `None` for an empty set.
    pub fn last_qna_id(&self) -> Result<Option<i64>> {
        self.records()
            .last()
            .map(|record| parse_qna_id(&record.qna_id))
            .transpose()
    }

    /// Copy of the current state as a plain record set.
    pub fn snapshot(&self) -> RecordSet {
        self.set.clone()
    }

    pub fn into_set(self) -> RecordSet {
        self.set
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Overwrite `SuggestedQuestions` on the first SP row sharing each suggested
/// record's identity key. Rows SP does not have are skipped.
///
/// Returns `(applied, skipped)`.
pub fn backfill_suggestions(working: &mut WorkingSet, suggested: &RecordSet) -> (usize, usize) {
    let mut applied = 0;
    let mut skipped = 0;

    for record in suggested.iter() {
        let key = identity_key(&record.question, &record.answer);
        match working.position_of_key(&key) {
            Some(position) => {
                working.set.records[position].suggested_questions =
                    record.suggested_questions.clone();
                applied += 1;
            }
            None => {
                debug!(question = %record.question, "no SP row for suggestion, skipping");
                skipped += 1;
            }
        }
    }

    (applied, skipped)
}

/// Insert each QA-only record after the anchor the group matcher finds,
/// inheriting the anchor's `QnaId`.
///
/// Returns the number inserted and the unmatched records in their original
/// order.
pub fn insert_matched(
    working: &mut WorkingSet,
    qa_views: &[NormalizedRecord],
    only_in_qa: &RecordSet,
) -> (usize, Vec<Record>) {
    let mut inserted = 0;
    let mut unmatched = Vec::new();

    for record in only_in_qa.iter() {
        let view = NormalizedRecord::from(record);

        let anchor = {
            let sp_candidates = candidates(working.views(), &view.answer);
            let qa_candidates = candidates(qa_views, &view.answer);
            find_insertion_anchor(&view.question, &sp_candidates, &qa_candidates)
        };

        match anchor {
            Some(position) => {
                let mut new_record = record.clone();
                new_record.qna_id = working.records()[position].qna_id.clone();
                debug!(
                    question = %new_record.question,
                    qna_id = %new_record.qna_id,
                    at = position + 1,
                    "inserting into existing group"
                );
                working.insert(position + 1, new_record);
                inserted += 1;
            }
            None => unmatched.push(record.clone()),
        }
    }

    (inserted, unmatched)
}

/// Append `unmatched` as new groups, numbering them from the last row's
/// `QnaId` + 1 (1 for an empty set).
///
/// Returns the ids assigned, in order.
pub fn append_unmatched(working: &mut WorkingSet, unmatched: Vec<Record>) -> Result<Vec<i64>> {
    if unmatched.is_empty() {
        return Ok(Vec::new());
    }

    let mut next_id = match working.last_qna_id()? {
        Some(last) => successor(last)?,
        None => 1,
    };
    let mut assigned = Vec::with_capacity(unmatched.len());

    for (i, mut record) in unmatched.into_iter().enumerate() {
        if i > 0 {
            next_id = successor(next_id)?;
        }
        record.qna_id = next_id.to_string();
        debug!(question = %record.question, qna_id = next_id, "appending new group");
        working.push(record);
        assigned.push(next_id);
    }

    Ok(assigned)
}

fn successor(id: i64) -> Result<i64> {
    id.checked_add(1).ok_or_else(|| SyncError::UnparseableQnaId {
        value: id.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Full reconciliation
// ---------------------------------------------------------------------------

/// Counters describing one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub sp_rows: usize,
    pub qa_rows: usize,
    pub only_in_qa: usize,
    pub suggested: usize,
    pub suggestions_applied: usize,
    pub suggestions_skipped: usize,
    pub inserted_into_groups: usize,
    pub appended_groups: usize,
    /// Ids given to appended groups.
    pub new_qna_ids: Vec<i64>,
    pub merged_rows: usize,
}

/// Everything one reconciliation produces. Nothing here has been persisted.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// QA rows missing from SP.
    pub only_in_qa: RecordSet,
    /// QA rows carrying suggested questions.
    pub suggested: RecordSet,
    /// SP after the suggestion back-fill.
    pub after_suggestions: RecordSet,
    /// SP after all three passes.
    pub merged: RecordSet,
    pub stats: MergeStats,
}

/// Diff SP against QA and run the three merge passes.
#[instrument(skip_all, fields(sp_rows = sp.len(), qa_rows = qa.len()))]
pub fn reconcile(sp: &RecordSet, qa: &RecordSet) -> Result<Reconciliation> {
    let only_in_qa = diff::only_in_qa(sp, qa);
    let suggested = diff::with_suggestions(qa);
    let qa_views = normalize_set(qa);

    let mut working = WorkingSet::new(sp.clone());

    let (suggestions_applied, suggestions_skipped) =
        backfill_suggestions(&mut working, &suggested);
    let after_suggestions = working.snapshot();

    let (inserted_into_groups, unmatched) = insert_matched(&mut working, &qa_views, &only_in_qa);
    let new_qna_ids = append_unmatched(&mut working, unmatched)?;

    let merged = working.into_set();
    let stats = MergeStats {
        sp_rows: sp.len(),
        qa_rows: qa.len(),
        only_in_qa: only_in_qa.len(),
        suggested: suggested.len(),
        suggestions_applied,
        suggestions_skipped,
        inserted_into_groups,
        appended_groups: new_qna_ids.len(),
        new_qna_ids,
        merged_rows: merged.len(),
    };

    info!(
        only_in_qa = stats.only_in_qa,
        suggestions_applied = stats.suggestions_applied,
        inserted = stats.inserted_into_groups,
        appended = stats.appended_groups,
        merged_rows = stats.merged_rows,
        "reconciliation complete"
    );

    Ok(Reconciliation {
        only_in_qa,
        suggested,
        after_suggestions,
        merged,
        stats,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(id: &str, q: &str, a: &str) -> Record {
        Record {
            qna_id: id.into(),
            question: q.into(),
            answer: a.into(),
            suggested_questions: "[]".into(),
            is_context_only: "False".into(),
            ..Record::default()
        }
    }

    fn set(records: Vec<Record>) -> RecordSet {
        RecordSet::new(RecordSet::standard_columns(), records)
    }

    fn ids(set: &RecordSet) -> Vec<&str> {
        set.iter().map(|r| r.qna_id.as_str()).collect()
    }

    fn questions(set: &RecordSet) -> Vec<&str> {
        set.iter().map(|r| r.question.as_str()).collect()
    }

    /// Every id's rows form one contiguous run.
    fn assert_contiguous(set: &RecordSet) {
        let mut seen = HashSet::new();
        let mut previous: Option<i64> = None;
        for r in set.iter() {
            let id = parse_qna_id(&r.qna_id).expect("numeric id");
            if previous != Some(id) {
                assert!(seen.insert(id), "group {id} is split");
            }
            previous = Some(id);
        }
    }

    #[test]
    fn working_set_insert_keeps_views_aligned() {
        let mut working = WorkingSet::new(set(vec![record("1", "A?", "x"), record("2", "B?", "y")]));
        working.insert(1, record("1", "C?", "x"));

        assert_eq!(working.len(), 3);
        let view_questions: Vec<_> = working.views().iter().map(|v| v.question.as_str()).collect();
        assert_eq!(view_questions, vec!["a", "c", "b"]);
        assert_eq!(working.position_of_key("cx"), Some(1));
    }

    #[test]
    fn backfill_overwrites_first_match_only() {
        let mut working = WorkingSet::new(set(vec![
            record("1", "What is X?", "X is Y."),
            record("2", "what is x", "x is y"),
        ]));
        let mut qa_row = record("9", "WHAT IS X", "X is Y!");
        qa_row.suggested_questions = r#"["Explain X"]"#.into();

        let (applied, skipped) = backfill_suggestions(&mut working, &set(vec![qa_row]));

        assert_eq!((applied, skipped), (1, 0));
        assert_eq!(working.records()[0].suggested_questions, r#"["Explain X"]"#);
        assert_eq!(working.records()[1].suggested_questions, "[]");
    }

    #[test]
    fn backfill_is_noop_on_mismatch() {
        let original = set(vec![record("1", "What is X?", "X is Y.")]);
        let mut working = WorkingSet::new(original.clone());
        let mut qa_row = record("1", "Unknown", "Nothing");
        qa_row.suggested_questions = r#"["a"]"#.into();

        let (applied, skipped) = backfill_suggestions(&mut working, &set(vec![qa_row]));

        assert_eq!((applied, skipped), (0, 1));
        assert_eq!(working.snapshot(), original);
    }

    #[test]
    fn matched_record_lands_after_existing_child() {
        let sp = set(vec![
            record("1", "Hello", "Hi"),
            record("3", "What is X", "X is Y"),
            record("3", "Explain X", "X is Y"),
            record("4", "Bye", "See you"),
        ]);
        let qa = set(vec![
            record("1", "Hello", "Hi"),
            record("12", "what is x?", "X is Y."),
            record("12", "Explain X", "X is Y"),
            record("12", "Describe X", "X is Y"),
            record("13", "Bye", "See you"),
        ]);

        let result = reconcile(&sp, &qa).expect("reconcile");

        assert_eq!(
            questions(&result.merged),
            vec!["Hello", "What is X", "Explain X", "Describe X", "Bye"]
        );
        assert_eq!(ids(&result.merged), vec!["1", "3", "3", "3", "4"]);
        assert_eq!(result.stats.inserted_into_groups, 1);
        assert_eq!(result.stats.appended_groups, 0);
        assert_contiguous(&result.merged);
    }

    #[test]
    fn unmatched_records_get_consecutive_ids() {
        let sp = set(vec![
            record("5", "a", "1"),
            record("6", "b", "2"),
            record("7", "c", "3"),
        ]);
        let qa = set(vec![
            record("100", "new one", "n1"),
            record("101", "new two", "n2"),
            record("102", "new three", "n3"),
        ]);

        let result = reconcile(&sp, &qa).expect("reconcile");

        assert_eq!(ids(&result.merged), vec!["5", "6", "7", "8", "9", "10"]);
        assert_eq!(
            questions(&result.merged)[3..],
            ["new one", "new two", "new three"]
        );
        assert_eq!(result.stats.new_qna_ids, vec![8, 9, 10]);
    }

    #[test]
    fn float_text_ids_are_truncated_when_minting() {
        let sp = set(vec![record("7.0", "a", "1")]);
        let qa = set(vec![record("1", "new", "n")]);
        let result = reconcile(&sp, &qa).expect("reconcile");
        assert_eq!(result.merged.records[1].qna_id, "8");
    }

    #[test]
    fn unparseable_id_aborts_when_minting() {
        let sp = set(vec![record("seven", "a", "1")]);
        let qa = set(vec![record("1", "new", "n")]);
        let err = reconcile(&sp, &qa).unwrap_err();
        assert!(matches!(err, SyncError::UnparseableQnaId { .. }));
    }

    #[test]
    fn unparseable_id_is_fine_without_new_groups() {
        let sp = set(vec![record("seven", "a", "1")]);
        let qa = set(vec![record("1", "a", "1")]);
        let result = reconcile(&sp, &qa).expect("nothing to mint");
        assert_eq!(result.merged, sp);
    }

    #[test]
    fn new_ids_follow_the_last_row_not_the_highest() {
        let sp = set(vec![record("9", "a", "1"), record("5", "b", "2")]);
        let qa = set(vec![record("1", "new", "n")]);
        let result = reconcile(&sp, &qa).expect("reconcile");
        assert_eq!(ids(&result.merged), vec!["9", "5", "6"]);
        assert_eq!(result.stats.new_qna_ids, vec![6]);
    }

    #[test]
    fn only_the_last_id_needs_to_parse() {
        let sp = set(vec![record("seven", "a", "1"), record("8", "b", "2")]);
        let qa = set(vec![record("1", "new", "n")]);
        let result = reconcile(&sp, &qa).expect("reconcile");
        assert_eq!(result.merged.records[2].qna_id, "9");
    }

    #[test]
    fn id_overflow_aborts_instead_of_wrapping() {
        let sp = set(vec![record("1e300", "a", "1")]);
        let qa = set(vec![record("1", "new", "n")]);
        let err = reconcile(&sp, &qa).unwrap_err();
        assert!(matches!(err, SyncError::UnparseableQnaId { .. }));

        let sp = set(vec![record(&(i64::MAX - 1).to_string(), "a", "1")]);
        let qa = set(vec![record("1", "one", "n1"), record("2", "two", "n2")]);
        let err = reconcile(&sp, &qa).unwrap_err();
        assert!(matches!(err, SyncError::UnparseableQnaId { .. }));
    }

    #[test]
    fn empty_sp_starts_ids_at_one() {
        let sp = set(vec![]);
        let qa = set(vec![record("40", "q", "a")]);
        let result = reconcile(&sp, &qa).expect("reconcile");
        assert_eq!(ids(&result.merged), vec!["1"]);
    }

    #[test]
    fn later_insertions_see_earlier_ones() {
        let sp = set(vec![record("2", "Parent", "Ans"), record("3", "Other", "Else")]);
        let qa = set(vec![
            record("8", "Parent", "Ans"),
            record("8", "Child one", "Ans"),
            record("8", "Child two", "Ans"),
        ]);

        let result = reconcile(&sp, &qa).expect("reconcile");

        assert_eq!(
            questions(&result.merged),
            vec!["Parent", "Child one", "Child two", "Other"]
        );
        assert_eq!(ids(&result.merged), vec!["2", "2", "2", "3"]);
        assert_contiguous(&result.merged);
    }

    #[test]
    fn mixed_run_preserves_untouched_rows_and_contiguity() {
        let sp = set(vec![
            record("1", "P1", "A1"),
            record("1", "C1", "A1"),
            record("2", "P2", "A2"),
            record("3", "P3", "A3"),
            record("3", "C3", "A3"),
        ]);
        let mut suggested = record("2", "P2", "A2");
        suggested.suggested_questions = r#"["S"]"#.into();
        let qa = set(vec![
            record("1", "P1", "A1"),
            record("1", "C1", "A1"),
            record("1", "N1", "A1"),
            suggested,
            record("3", "P3", "A3"),
            record("3", "N3", "A3"),
            record("4", "Lonely", "A4"),
        ]);

        let result = reconcile(&sp, &qa).expect("reconcile");

        assert_eq!(
            questions(&result.merged),
            vec!["P1", "C1", "N1", "P2", "P3", "C3", "N3", "Lonely"]
        );
        assert_eq!(ids(&result.merged), vec!["1", "1", "1", "2", "3", "3", "3", "4"]);
        assert_eq!(result.merged.records[3].suggested_questions, r#"["S"]"#);
        assert_eq!(result.after_suggestions.len(), sp.len());
        assert_eq!(result.after_suggestions.records[3].suggested_questions, "[]");
        assert_eq!(result.after_suggestions.records[2].suggested_questions, r#"["S"]"#);
        assert_eq!(result.stats.only_in_qa, 3);
        assert_eq!(result.stats.suggested, 1);
        assert_contiguous(&result.merged);

        // Untouched SP rows are carried over unchanged.
        for original in sp.iter().filter(|r| r.question != "P2") {
            assert!(result.merged.records.contains(original));
        }
    }
}
