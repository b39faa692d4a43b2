//! Builds [`IssueRecord`]s from per-row findings.

use std::collections::BTreeSet;

use pqa_model::{IssueRecord, KindSummary, row_number};

struct KindState {
    kind: String,
    rows: BTreeSet<usize>,
    values: Vec<String>,
    seen: BTreeSet<String>,
}

/// Accumulates findings for one subject (a column or a named check).
///
/// Row numbers are kept in full; sample values are distinct and capped at
/// the sample limit, both overall and per kind.
pub(crate) struct IssueCollector {
    subject: String,
    sample_limit: usize,
    kinds: Vec<KindState>,
    rows: BTreeSet<usize>,
    values: Vec<String>,
    seen: BTreeSet<String>,
}

impl IssueCollector {
    /// A collector with a fixed, ordered list of problem kinds.
    pub(crate) fn with_kinds<I, S>(subject: &str, kinds: I, sample_limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kinds = kinds
            .into_iter()
            .map(|kind| KindState {
                kind: kind.into(),
                rows: BTreeSet::new(),
                values: Vec::new(),
                seen: BTreeSet::new(),
            })
            .collect();
        Self {
            subject: subject.to_string(),
            sample_limit,
            kinds,
            rows: BTreeSet::new(),
            values: Vec::new(),
            seen: BTreeSet::new(),
        }
    }

    /// A collector for a record-level check without a kind breakdown.
    pub(crate) fn plain(subject: &str, sample_limit: usize) -> Self {
        Self::with_kinds(subject, Vec::<String>::new(), sample_limit)
    }

    /// Records a finding of `kind` at zero-based row `position`.
    pub(crate) fn record(&mut self, kind: &str, position: usize, value: &str) {
        let limit = self.sample_limit;
        if let Some(state) = self.kinds.iter_mut().find(|state| state.kind == kind) {
            state.rows.insert(position);
            push_sample(&mut state.values, &mut state.seen, value, limit);
        }
        self.record_row(position, value);
    }

    /// Records a finding that has no kind.
    pub(crate) fn record_row(&mut self, position: usize, value: &str) {
        self.rows.insert(position);
        push_sample(&mut self.values, &mut self.seen, value, self.sample_limit);
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `None` when nothing was recorded.
    pub(crate) fn finish(self) -> Option<IssueRecord> {
        if self.rows.is_empty() {
            return None;
        }
        let breakdown: Vec<KindSummary> = self
            .kinds
            .into_iter()
            .filter(|state| !state.rows.is_empty())
            .map(|state| KindSummary {
                kind: state.kind,
                count: state.rows.len(),
                values: state.values,
            })
            .collect();
        Some(IssueRecord {
            issue: self.subject,
            issues: breakdown.iter().map(|k| k.kind.clone()).collect(),
            count: self.rows.len(),
            issue_values: self.values,
            issue_row_numbers: self.rows.into_iter().map(row_number).collect(),
            breakdown,
        })
    }
}

fn push_sample(values: &mut Vec<String>, seen: &mut BTreeSet<String>, value: &str, limit: usize) {
    if values.len() < limit && seen.insert(value.to_string()) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_registration_order() {
        let mut collector = IssueCollector::with_kinds("votes", ["A", "B"], 10);
        collector.record("B", 4, "x");
        collector.record("A", 1, "y");
        collector.record("B", 1, "y");
        let record = collector.finish().unwrap();
        assert_eq!(record.issues, vec!["A", "B"]);
        assert_eq!(record.count, 2);
        assert_eq!(record.issue_row_numbers, vec![2, 5]);
        assert_eq!(record.breakdown[1].count, 2);
    }

    #[test]
    fn samples_are_distinct_and_capped() {
        let mut collector = IssueCollector::plain("empty_candidates", 2);
        for (pos, value) in ["a", "a", "b", "c"].iter().enumerate() {
            collector.record_row(pos, value);
        }
        let record = collector.finish().unwrap();
        assert_eq!(record.issue_values, vec!["a", "b"]);
        assert_eq!(record.issue_row_numbers, vec![1, 2, 3, 4]);
        assert!(record.issues.is_empty());
    }

    #[test]
    fn empty_collector_yields_nothing() {
        assert!(IssueCollector::plain("x", 10).finish().is_none());
    }
}
