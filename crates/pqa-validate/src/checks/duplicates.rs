//! Exact duplicates and same-key vote conflicts.

use std::collections::{BTreeMap, BTreeSet};

use pqa_model::{DetailTable, Metrics, format_numeric, row_number};

use super::{Checked, SkipReason};
use crate::context::CheckContext;
use crate::votes::VoteValue;

pub const EXACT: &str = "exact";
pub const CONFLICT: &str = "conflict";

/// Output of the duplicate detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    pub table: DetailTable,
    pub summary: Metrics,
}

/// Identity key columns after county/jurisdiction fallback.
fn key_columns(ctx: &CheckContext<'_>) -> Vec<&'static str> {
    let dataset = ctx.dataset;
    let slots: [&[&'static str]; 8] = [
        &["state"],
        &["county_fips", "county_name"],
        &["jurisdiction_fips", "jurisdiction_name"],
        &["precinct"],
        &["office"],
        &["district"],
        &["candidate"],
        &["mode"],
    ];
    slots
        .iter()
        .filter_map(|candidates| dataset.first_present(candidates))
        .collect()
}

struct Cluster {
    dup_type: &'static str,
    rows: Vec<usize>,
    differing: String,
}

pub fn check(ctx: &CheckContext<'_>) -> Checked<DuplicateReport> {
    let dataset = ctx.dataset;
    let keys = key_columns(ctx);
    if keys.is_empty() {
        return Err(SkipReason::new("no identity key columns present"));
    }

    let mut markers = 0usize;
    let mut groups: BTreeMap<Vec<&str>, Vec<usize>> = BTreeMap::new();
    for row in 0..dataset.height() {
        if ctx.is_marker_row(row) {
            markers += 1;
            continue;
        }
        let key: Vec<&str> = keys
            .iter()
            .map(|column| dataset.value_or_empty(column, row))
            .collect();
        groups.entry(key).or_default().push(row);
    }

    // Report groups in the order their first row appears.
    let mut ordered: Vec<Vec<usize>> = groups
        .into_values()
        .filter(|rows| rows.len() >= 2)
        .collect();
    ordered.sort_by_key(|rows| rows[0]);

    let mut clusters = Vec::new();
    for rows in ordered {
        let mut identical: BTreeMap<Vec<&str>, Vec<usize>> = BTreeMap::new();
        for &row in &rows {
            identical.entry(dataset.row_values(row)).or_default().push(row);
        }
        let mut exact: Vec<Vec<usize>> = identical
            .into_values()
            .filter(|members| members.len() >= 2)
            .collect();
        exact.sort_by_key(|members| members[0]);
        clusters.extend(exact.into_iter().map(|members| Cluster {
            dup_type: EXACT,
            rows: members,
            differing: String::new(),
        }));

        if let Some(votes) = dataset.column("votes") {
            let distinct: BTreeSet<String> = rows
                .iter()
                .map(|&row| vote_key(ctx, &votes[row]))
                .collect();
            if distinct.len() >= 2 {
                clusters.push(Cluster {
                    dup_type: CONFLICT,
                    differing: differing_columns(ctx, &rows).join(";"),
                    rows,
                });
            }
        }
    }

    let mut columns = vec!["cluster", "dup_type", "row_number", "differing_fields"];
    columns.extend(keys.iter().copied());
    let has_votes = dataset.has_column("votes");
    if has_votes {
        columns.push("votes");
    }
    let mut table = DetailTable::new(columns);
    let mut summary = Summary::default();
    for (idx, cluster) in clusters.iter().enumerate() {
        summary.add(cluster);
        for &row in &cluster.rows {
            let mut cells = vec![
                (idx + 1).to_string(),
                cluster.dup_type.to_string(),
                row_number(row).to_string(),
                cluster.differing.clone(),
            ];
            cells.extend(
                keys.iter()
                    .map(|column| dataset.value_or_empty(column, row).to_string()),
            );
            if has_votes {
                cells.push(dataset.value_or_empty("votes", row).to_string());
            }
            table.push_row(cells);
        }
    }

    Ok(DuplicateReport {
        table,
        summary: Metrics::new()
            .with("exact", summary.exact)
            .with("conflicts", summary.conflicts)
            .with("exact_rows", summary.exact_rows)
            .with("conflict_rows", summary.conflict_rows)
            .with("aggregate_rows_excluded", markers),
    })
}

#[derive(Default)]
struct Summary {
    exact: usize,
    conflicts: usize,
    exact_rows: usize,
    conflict_rows: usize,
}

impl Summary {
    fn add(&mut self, cluster: &Cluster) {
        if cluster.dup_type == EXACT {
            self.exact += 1;
            self.exact_rows += cluster.rows.len();
        } else {
            self.conflicts += 1;
            self.conflict_rows += cluster.rows.len();
        }
    }
}

/// Comparable form of a vote cell: numeric cells by value, anything else as trimmed text.
fn vote_key(ctx: &CheckContext<'_>, raw: &str) -> String {
    match VoteValue::classify(raw, ctx.config).numeric() {
        Some(value) => format_numeric(value),
        None => raw.trim().to_string(),
    }
}

/// Columns whose values are not all equal across `rows`, in dataset order.
fn differing_columns(ctx: &CheckContext<'_>, rows: &[usize]) -> Vec<String> {
    let dataset = ctx.dataset;
    dataset
        .column_names()
        .iter()
        .filter(|name| {
            let first = dataset.value_or_empty(name, rows[0]);
            rows[1..]
                .iter()
                .any(|&row| dataset.value_or_empty(name, row) != first)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use pqa_model::{Dataset, QaConfig, References};

    use super::*;

    fn run(rows: Vec<Vec<&str>>) -> DuplicateReport {
        let dataset = Dataset::new(
            ["precinct", "office", "candidate", "mode", "votes", "party_detailed"],
            rows,
        )
        .unwrap();
        let config = QaConfig::default();
        let references = References::default();
        check(&CheckContext::new(&dataset, &references, &config, None)).unwrap()
    }

    #[test]
    fn conflict_names_differing_fields() {
        let report = run(vec![
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "10", "DEMOCRAT"],
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "12", "DEMOCRATIC"],
            vec!["002", "US HOUSE", "SMITH", "TOTAL", "10", "DEMOCRAT"],
        ]);
        assert_eq!(report.summary.integer("conflicts"), Some(1));
        assert_eq!(report.summary.integer("conflict_rows"), Some(2));
        assert_eq!(report.table.column_values("differing_fields"), vec![
            "votes;party_detailed",
            "votes;party_detailed"
        ]);
        assert_eq!(report.table.column_values("row_number"), vec!["1", "2"]);
    }

    #[test]
    fn exact_and_conflict_in_same_group() {
        let report = run(vec![
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "10", "DEMOCRAT"],
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "10", "DEMOCRAT"],
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "11", "DEMOCRAT"],
        ]);
        assert_eq!(report.summary.integer("exact"), Some(1));
        assert_eq!(report.summary.integer("exact_rows"), Some(2));
        assert_eq!(report.summary.integer("conflicts"), Some(1));
        assert_eq!(report.summary.integer("conflict_rows"), Some(3));
        assert_eq!(report.table.column_values("cluster"), vec!["1", "1", "2", "2", "2"]);
    }

    #[test]
    fn equal_numeric_votes_do_not_conflict() {
        let report = run(vec![
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "10", "DEMOCRAT"],
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "10.0", "DEMOCRAT"],
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "010", "DEMOCRAT"],
        ]);
        assert_eq!(report.summary.integer("conflicts"), Some(0));
        assert_eq!(report.summary.integer("exact"), Some(0));
        assert!(report.table.is_empty());
    }

    #[test]
    fn non_numeric_votes_compare_as_text() {
        let report = run(vec![
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "*", "DEMOCRAT"],
            vec!["001", "US HOUSE", "SMITH", "TOTAL", "N/A", "DEMOCRAT"],
        ]);
        assert_eq!(report.summary.integer("conflicts"), Some(1));
    }

    #[test]
    fn county_falls_back_to_name() {
        let dataset = Dataset::new(["county_name", "precinct"], Vec::<Vec<&str>>::new()).unwrap();
        let config = QaConfig::default();
        let references = References::default();
        let ctx = CheckContext::new(&dataset, &references, &config, None);
        assert_eq!(key_columns(&ctx), vec!["county_name", "precinct"]);
    }
}
