//! Required column presence.

use std::collections::BTreeSet;

use pqa_model::{CheckResult, Metrics};

use crate::context::CheckContext;

/// Compare the dataset's columns against the configured required set.
///
/// `missing_columns` follows the required-set order, `extra_columns` the
/// dataset order.
pub fn check(ctx: &CheckContext<'_>) -> CheckResult {
    let dataset = ctx.dataset;
    let required: BTreeSet<&str> = ctx
        .config
        .required_columns
        .iter()
        .map(String::as_str)
        .collect();

    let missing: Vec<String> = ctx
        .config
        .required_columns
        .iter()
        .filter(|column| !dataset.has_column(column))
        .cloned()
        .collect();
    let extra: Vec<String> = dataset
        .column_names()
        .iter()
        .filter(|column| !required.contains(column.as_str()))
        .cloned()
        .collect();

    CheckResult::Scalar(
        Metrics::new()
            .with("column_count", dataset.width())
            .with("missing_columns", missing)
            .with("extra_columns", extra),
    )
}

#[cfg(test)]
mod tests {
    use pqa_model::{Dataset, QaConfig, References};

    use super::*;

    #[test]
    fn reports_missing_and_extra() {
        let dataset = Dataset::new(["state", "notes", "precinct"], Vec::<Vec<&str>>::new()).unwrap();
        let config = QaConfig {
            required_columns: vec!["precinct".into(), "office".into(), "state".into()],
            ..QaConfig::default()
        };
        let references = References::default();
        let ctx = CheckContext::new(&dataset, &references, &config, None);
        let metrics = check(&ctx);
        let metrics = metrics.as_scalar().unwrap();
        assert_eq!(metrics.list("missing_columns").unwrap(), ["office"]);
        assert_eq!(metrics.list("extra_columns").unwrap(), ["notes"]);
        assert_eq!(metrics.integer("column_count"), Some(3));
    }
}
