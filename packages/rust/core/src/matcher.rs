//! Group matching: where does a QA-only question belong in SP?
//!
//! A QA-only record is placed by its QA group's parent question. If some SP
//! group sharing the record's answer also contains that parent question, the
//! record joins that SP group as its new last child.

use qnasync_normalize::NormalizedRecord;
use qnasync_shared::parse_qna_id;

/// A row taking part in a match: its position in the owning set plus its
/// normalized view.
pub type Candidate<'a> = (usize, &'a NormalizedRecord);

/// Rows of `view` whose normalized answer equals `answer`, in row order.
pub fn candidates<'a>(view: &'a [NormalizedRecord], answer: &str) -> Vec<Candidate<'a>> {
    view.iter()
        .enumerate()
        .filter(|(_, record)| record.answer == answer)
        .collect()
}

/// Find the SP position after which a record with normalized `question`
/// should be inserted.
///
/// QA groups are visited in first-appearance order. In the first group that
/// contains `question`, the group's first member is the parent; the SP group
/// holding any member with the parent's question yields its last member as
/// the anchor. A QA group with no SP counterpart is passed over. First match
/// wins.
pub fn find_insertion_anchor(
    question: &str,
    sp_candidates: &[Candidate<'_>],
    qa_candidates: &[Candidate<'_>],
) -> Option<usize> {
    let sp_groups = group_by_id(sp_candidates);

    for qa_group in group_by_id(qa_candidates) {
        if !qa_group.iter().any(|(_, r)| r.question == question) {
            continue;
        }

        let parent_question = &qa_group[0].1.question;

        let anchor = sp_groups
            .iter()
            .find(|group| group.iter().any(|(_, r)| &r.question == parent_question))
            .and_then(|group| group.last())
            .map(|(position, _)| *position);

        if anchor.is_some() {
            return anchor;
        }
    }

    None
}

/// Split candidates into groups by `QnaId`, groups in first-appearance order
/// and members in row order. `"3"` and `"3.0"` are the same group.
fn group_by_id<'a>(candidates: &[Candidate<'a>]) -> Vec<Vec<Candidate<'a>>> {
    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<Candidate<'a>>> = Vec::new();

    for candidate in candidates {
        let key = group_key(&candidate.1.qna_id);
        match keys.iter().position(|k| *k == key) {
            Some(i) => groups[i].push(*candidate),
            None => {
                keys.push(key);
                groups.push(vec![*candidate]);
            }
        }
    }

    groups
}

fn group_key(raw: &str) -> String {
    parse_qna_id(raw)
        .map(|id| id.to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}
