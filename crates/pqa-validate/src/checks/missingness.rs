//! Per-column missingness summary.

use std::collections::BTreeMap;

use pqa_model::{DetailTable, QaConfig};

use super::formats::enumerated_values;
use crate::context::CheckContext;

pub const COLUMNS: [&str; 5] = [
    "column",
    "missing_count",
    "percent_empty",
    "alt_missing_count",
    "alt_missing_values",
];

/// One row per dataset column, in dataset order.
pub fn check(ctx: &CheckContext<'_>) -> DetailTable {
    let dataset = ctx.dataset;
    let config = ctx.config;
    let height = dataset.height();
    let mut table = DetailTable::new(COLUMNS);

    for name in dataset.column_names() {
        let values = dataset.column(name).unwrap_or(&[]);
        let mut missing = 0usize;
        let mut alt: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values {
            if config.is_missing(value) {
                missing += 1;
            } else if is_alt_missing(name, value, config) {
                *alt.entry(value.as_str()).or_default() += 1;
            }
        }
        let percent = if height == 0 {
            0.0
        } else {
            missing as f64 * 100.0 / height as f64
        };
        let alt_count: usize = alt.values().sum();
        let alt_values: Vec<String> = alt
            .iter()
            .map(|(value, count)| format!("{value} ({count})"))
            .collect();
        table.push_row(vec![
            name.clone(),
            missing.to_string(),
            format!("{percent:.2}"),
            alt_count.to_string(),
            alt_values.join("; "),
        ]);
    }
    table
}

/// A value that is not technically missing but reads like a placeholder.
///
/// Rejects values the column's own enumerated rule accepts and the
/// redaction sentinel in `votes`.
pub fn is_alt_missing(column: &str, value: &str, config: &QaConfig) -> bool {
    let trimmed = value.trim();
    let looks_missing = config.is_placeholder(trimmed)
        || (!trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_punctuation()));
    if !looks_missing {
        return false;
    }
    if column == "votes" && config.is_redacted(value) {
        return false;
    }
    if let Some(allowed) = enumerated_values(column, config)
        && allowed.iter().any(|v| v == value)
    {
        return false;
    }
    true
}
