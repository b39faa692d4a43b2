//! Record-level field checks reported under `fields`.

use pqa_model::IssueRecord;

use crate::collector::IssueCollector;
use crate::context::CheckContext;
use crate::votes::VoteValue;

/// Rows with an empty candidate and rows reporting exactly zero votes.
pub fn check(ctx: &CheckContext<'_>) -> Vec<IssueRecord> {
    let limit = ctx.config.sample_limit;
    let mut records = Vec::new();

    if let Some(candidates) = ctx.dataset.column("candidate") {
        let mut empty = IssueCollector::plain("empty_candidates", limit);
        for (pos, value) in candidates.iter().enumerate() {
            if ctx.config.is_missing(value) {
                empty.record_row(pos, value);
            }
        }
        records.extend(empty.finish());
    }

    if let Some(votes) = ctx.dataset.column("votes") {
        let mut zero = IssueCollector::plain("zero_vote_rows", limit);
        for (pos, value) in votes.iter().enumerate() {
            if VoteValue::classify(value, ctx.config).numeric() == Some(0.0) {
                zero.record_row(pos, value);
            }
        }
        records.extend(zero.finish());
    }

    records
}

#[cfg(test)]
mod tests {
    use pqa_model::{Dataset, QaConfig, References};

    use super::*;

    #[test]
    fn flags_empty_candidates_and_zero_rows() {
        let dataset = Dataset::new(
            ["candidate", "votes"],
            vec![vec!["SMITH", "0"], vec!["", "4"], vec!["NULL", "*"], vec!["JONES", "0.0"]],
        )
        .unwrap();
        let config = QaConfig::default();
        let references = References::default();
        let ctx = CheckContext::new(&dataset, &references, &config, None);
        let records = check(&ctx);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].issue, "empty_candidates");
        assert_eq!(records[0].issue_row_numbers, vec![2, 3]);
        assert_eq!(records[1].issue, "zero_vote_rows");
        assert_eq!(records[1].issue_row_numbers, vec![1, 4]);
    }
}
