//! Cross-record grouping: zero-vote groups, magnitude consistency,
//! statewide totals and stage validation.

use std::collections::{BTreeMap, BTreeSet};

use pqa_model::{DetailTable, IssueRecord, format_numeric, parse_f64, row_number};

use super::{Checked, SkipReason, present_columns, require_columns};
use crate::context::CheckContext;
use crate::votes::VoteValue;

const ZERO_VOTE_GROUP_COLUMNS: [&str; 5] = [
    "county_fips",
    "jurisdiction_fips",
    "precinct",
    "office",
    "district",
];

/// Groups whose votes sum to exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroVoteGroups {
    pub table: DetailTable,
    /// Summary for the `fields` list; `None` when no group sums to zero.
    pub record: Option<IssueRecord>,
}

#[derive(Default)]
struct GroupTotals {
    sum: f64,
    rows: Vec<usize>,
    has_redacted: bool,
}

pub fn zero_vote_groups(ctx: &CheckContext<'_>) -> Checked<ZeroVoteGroups> {
    let dataset = ctx.dataset;
    require_columns(dataset, &["votes"])?;
    let group_columns = present_columns(dataset, &ZERO_VOTE_GROUP_COLUMNS);
    if group_columns.is_empty() {
        return Err(SkipReason::new("no grouping columns present"));
    }

    let mut groups: BTreeMap<Vec<&str>, GroupTotals> = BTreeMap::new();
    for row in 0..dataset.height() {
        let key = group_columns
            .iter()
            .map(|column| dataset.value_or_empty(column, row))
            .collect();
        let vote = VoteValue::classify(dataset.value_or_empty("votes", row), ctx.config);
        let totals = groups.entry(key).or_default();
        totals.sum += vote.or_zero();
        totals.has_redacted |= vote == VoteValue::Redacted;
        totals.rows.push(row);
    }

    let mut zero: Vec<(Vec<&str>, GroupTotals)> = groups
        .into_iter()
        .filter(|(_, totals)| totals.sum == 0.0)
        .collect();
    zero.sort_by_key(|(_, totals)| totals.rows[0]);

    let mut columns = group_columns.clone();
    columns.extend(["votes_sum", "row_count", "has_redacted"]);
    let mut table = DetailTable::new(columns);
    let mut sample = Vec::new();
    let mut rows = BTreeSet::new();
    for (key, totals) in &zero {
        let mut cells: Vec<String> = key.iter().map(|v| (*v).to_string()).collect();
        cells.push(format_numeric(totals.sum));
        cells.push(totals.rows.len().to_string());
        cells.push(totals.has_redacted.to_string());
        table.push_row(cells);
        if sample.len() < ctx.config.sample_limit {
            sample.push(key.join("|"));
        }
        rows.extend(totals.rows.iter().copied());
    }

    let record = (!zero.is_empty()).then(|| IssueRecord {
        issue: "zero_vote_precinct_groups".to_string(),
        count: zero.len(),
        issue_values: sample,
        issue_row_numbers: rows.into_iter().map(row_number).collect(),
        ..IssueRecord::default()
    });
    Ok(ZeroVoteGroups { table, record })
}

/// Magnitude values per office.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeReport {
    pub map: DetailTable,
    pub inconsistent: Vec<IssueRecord>,
}

/// Orders numerically when every value parses, otherwise lexically.
fn sort_magnitudes(values: BTreeSet<&str>) -> Vec<String> {
    let mut values: Vec<&str> = values.into_iter().collect();
    if values.iter().all(|v| parse_f64(v).is_some()) {
        values.sort_by(|a, b| {
            let a = parse_f64(a).unwrap_or_default();
            let b = parse_f64(b).unwrap_or_default();
            a.total_cmp(&b)
        });
    }
    values.into_iter().map(str::to_string).collect()
}

pub fn magnitudes(ctx: &CheckContext<'_>) -> Checked<MagnitudeReport> {
    let dataset = ctx.dataset;
    require_columns(dataset, &["office", "magnitude"])?;

    let mut by_office: BTreeMap<&str, (BTreeSet<&str>, Vec<usize>)> = BTreeMap::new();
    for row in 0..dataset.height() {
        let office = dataset.value_or_empty("office", row);
        let magnitude = dataset.value_or_empty("magnitude", row).trim();
        let entry = by_office.entry(office).or_default();
        entry.0.insert(magnitude);
        entry.1.push(row);
    }

    let mut map = DetailTable::new(["office", "magnitudes", "row_count"]);
    let mut inconsistent = Vec::new();
    for (office, (values, rows)) in by_office {
        let values = sort_magnitudes(values);
        map.push_row(vec![
            office.to_string(),
            values.join(", "),
            rows.len().to_string(),
        ]);
        if values.len() > 1 {
            inconsistent.push(IssueRecord {
                issue: office.to_string(),
                count: rows.len(),
                issue_values: values.into_iter().take(ctx.config.sample_limit).collect(),
                issue_row_numbers: rows.into_iter().map(row_number).collect(),
                ..IssueRecord::default()
            });
        }
    }
    Ok(MagnitudeReport { map, inconsistent })
}

pub const STATEWIDE_COLUMNS: [&str; 6] =
    ["office", "candidate", "parties", "votes", "rows", "redacted_rows"];

#[derive(Default)]
struct CandidateTotal<'a> {
    parties: BTreeSet<&'a str>,
    votes: f64,
    rows: usize,
    redacted: usize,
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("TRUE")
}

/// Sums votes by office and candidate.
///
/// Aggregate-marker rows and generic write-in rows are excluded. An office
/// that reports explicit `TOTAL` mode rows is summed from those rows only.
pub fn statewide_totals(ctx: &CheckContext<'_>) -> Checked<DetailTable> {
    let dataset = ctx.dataset;
    let config = ctx.config;
    require_columns(dataset, &["office", "candidate", "votes"])?;
    let party_column = dataset.first_present(&["party_simplified", "party_detailed"]);

    let total_mode_offices: BTreeSet<&str> = match dataset.column("mode") {
        Some(modes) => (0..dataset.height())
            .filter(|&row| modes[row].trim().eq_ignore_ascii_case("TOTAL"))
            .map(|row| dataset.value_or_empty("office", row))
            .collect(),
        None => BTreeSet::new(),
    };

    let mut totals: BTreeMap<(&str, &str), CandidateTotal<'_>> = BTreeMap::new();
    for row in 0..dataset.height() {
        let office = dataset.value_or_empty("office", row);
        let candidate = dataset.value_or_empty("candidate", row);
        if config.is_aggregate_marker(candidate) {
            continue;
        }
        if is_true(dataset.value_or_empty("writein", row)) && config.is_writein_token(candidate) {
            continue;
        }
        if total_mode_offices.contains(office)
            && !dataset
                .value_or_empty("mode", row)
                .trim()
                .eq_ignore_ascii_case("TOTAL")
        {
            continue;
        }
        let vote = VoteValue::classify(dataset.value_or_empty("votes", row), config);
        let entry = totals.entry((office, candidate)).or_default();
        entry.votes += vote.numeric().unwrap_or(0.0);
        entry.rows += 1;
        if vote == VoteValue::Redacted {
            entry.redacted += 1;
        }
        if let Some(column) = party_column {
            let party = dataset.value_or_empty(column, row);
            if !party.is_empty() {
                entry.parties.insert(party);
            }
        }
    }

    let mut ordered: Vec<((&str, &str), CandidateTotal<'_>)> = totals.into_iter().collect();
    ordered.sort_by(|((office_a, cand_a), a), ((office_b, cand_b), b)| {
        office_a
            .cmp(office_b)
            .then_with(|| b.votes.total_cmp(&a.votes))
            .then_with(|| cand_a.cmp(cand_b))
    });

    let mut table = DetailTable::new(STATEWIDE_COLUMNS);
    for ((office, candidate), total) in ordered {
        table.push_row(vec![
            office.to_string(),
            candidate.to_string(),
            total.parties.into_iter().collect::<Vec<_>>().join("; "),
            format_numeric(total.votes),
            total.rows.to_string(),
            total.redacted.to_string(),
        ]);
    }
    Ok(table)
}

pub const STAGE_COLUMNS: [&str; 5] = ["row_number", "precinct", "office", "candidate", "stage"];

/// Rows whose `stage` is outside the configured set.
pub fn stage_invalid_rows(ctx: &CheckContext<'_>) -> Checked<DetailTable> {
    let dataset = ctx.dataset;
    require_columns(dataset, &["stage"])?;
    let mut table = DetailTable::new(STAGE_COLUMNS);
    for row in 0..dataset.height() {
        let stage = dataset.value_or_empty("stage", row);
        if ctx.config.valid_stages.iter().any(|valid| valid == stage) {
            continue;
        }
        table.push_row(vec![
            row_number(row).to_string(),
            dataset.value_or_empty("precinct", row).to_string(),
            dataset.value_or_empty("office", row).to_string(),
            dataset.value_or_empty("candidate", row).to_string(),
            stage.to_string(),
        ]);
    }
    Ok(table)
}
