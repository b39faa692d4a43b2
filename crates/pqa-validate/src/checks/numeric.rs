//! `votes` coercion summary and MAD outlier detection.

use std::collections::BTreeMap;

use pqa_model::{DetailTable, IssueRecord, Metrics, OutlierGrouping, format_numeric, row_number};

use super::{Checked, require_columns};
use crate::collector::IssueCollector;
use crate::context::CheckContext;
use crate::stats::{median, median_absolute_deviation, modified_z};
use crate::votes::VoteValue;

/// Output of the `votes` coercion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub metrics: Metrics,
    pub invalid_votes: Option<IssueRecord>,
    pub negative_votes: Option<IssueRecord>,
}

pub fn summarize(ctx: &CheckContext<'_>) -> Checked<NumericSummary> {
    let dataset = ctx.dataset;
    require_columns(dataset, &["votes"])?;
    let limit = ctx.config.sample_limit;
    let votes = dataset.column("votes").unwrap_or(&[]);

    let mut invalid = IssueCollector::plain("invalid_votes", limit);
    let mut negative = IssueCollector::plain("negative_votes", limit);
    let mut valid = 0usize;
    let mut redacted = 0usize;
    let mut total = 0.0;
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;

    for (pos, raw) in votes.iter().enumerate() {
        match VoteValue::classify(raw, ctx.config) {
            VoteValue::Numeric(value) => {
                valid += 1;
                total += value;
                min = Some(min.map_or(value, |m| m.min(value)));
                max = Some(max.map_or(value, |m| m.max(value)));
                if value < 0.0 {
                    negative.record_row(pos, raw);
                }
            }
            VoteValue::Redacted => redacted += 1,
            VoteValue::Invalid => invalid.record_row(pos, raw),
        }
    }

    let mut metrics = Metrics::new()
        .with("rows", dataset.height())
        .with("valid_numeric", valid)
        .with("redacted", redacted)
        .with("non_numeric_votes", invalid.row_count())
        .with("negative_votes", negative.row_count())
        .with("total_votes", total);
    if let (Some(min), Some(max)) = (min, max) {
        metrics.insert("min_votes", min);
        metrics.insert("max_votes", max);
    }

    Ok(NumericSummary {
        metrics,
        invalid_votes: invalid.finish(),
        negative_votes: negative.finish(),
    })
}

pub const DISTRIBUTION_COLUMNS: [&str; 6] =
    ["group", "row_number", "votes", "median", "mad", "modified_z"];

/// Flags rows whose modified z-score exceeds the configured threshold.
///
/// Only valid, non-negative, non-marker rows take part. Groups smaller than
/// `outlier_min_group_size` or with a zero MAD are skipped.
pub fn outliers(ctx: &CheckContext<'_>) -> Checked<DetailTable> {
    let dataset = ctx.dataset;
    let config = ctx.config;
    require_columns(dataset, &["votes"])?;

    let group_columns: &[&str] = match config.outlier_grouping {
        OutlierGrouping::State => &["state"],
        OutlierGrouping::StateOffice => &["state", "office"],
    };

    let mut groups: BTreeMap<String, Vec<(usize, f64)>> = BTreeMap::new();
    for row in 0..dataset.height() {
        if ctx.is_marker_row(row) {
            continue;
        }
        let Some(value) = VoteValue::classify(dataset.value_or_empty("votes", row), config).numeric()
        else {
            continue;
        };
        if value < 0.0 {
            continue;
        }
        let label = group_columns
            .iter()
            .map(|column| dataset.value_or_empty(column, row))
            .collect::<Vec<_>>()
            .join("|");
        groups.entry(label).or_default().push((row, value));
    }

    let mut table = DetailTable::new(DISTRIBUTION_COLUMNS);
    for (label, members) in &groups {
        if members.len() < config.outlier_min_group_size {
            tracing::debug!(group = %label, size = members.len(), "outlier group too small");
            continue;
        }
        let values: Vec<f64> = members.iter().map(|(_, value)| *value).collect();
        let Some(center) = median(&values) else {
            continue;
        };
        let Some(mad) = median_absolute_deviation(&values, center) else {
            continue;
        };
        if mad == 0.0 {
            tracing::debug!(group = %label, "outlier group has zero MAD");
            continue;
        }
        for &(row, value) in members {
            let Some(z) = modified_z(value, center, mad) else {
                continue;
            };
            if z.abs() > config.outlier_threshold {
                table.push_row(vec![
                    label.clone(),
                    row_number(row).to_string(),
                    dataset.value_or_empty("votes", row).to_string(),
                    format_numeric(center),
                    format_numeric(mad),
                    format!("{z:.4}"),
                ]);
            }
        }
    }
    Ok(table)
}
