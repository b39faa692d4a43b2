//! Individual checks.
//!
//! Each check is a pure function of the [`CheckContext`](crate::CheckContext).
//! Checks that cannot apply to a dataset (a required column or reference
//! table is absent) return [`SkipReason`].

pub mod duplicates;
pub mod formats;
pub mod geo;
pub mod grouping;
pub mod missingness;
pub mod numeric;
pub mod patterns;
pub mod records;
pub mod schema;

use pqa_model::Dataset;

/// Why a check did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason(pub String);

impl SkipReason {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Result of a check that may be skipped.
pub type Checked<T> = Result<T, SkipReason>;

/// Skips unless every column in `columns` is present.
pub(crate) fn require_columns(dataset: &Dataset, columns: &[&str]) -> Checked<()> {
    let missing: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|column| !dataset.has_column(column))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SkipReason::new(format!(
            "missing column(s): {}",
            missing.join(", ")
        )))
    }
}

/// The subset of `columns` present in the dataset, in the given order.
pub(crate) fn present_columns<'a>(dataset: &Dataset, columns: &[&'a str]) -> Vec<&'a str> {
    columns
        .iter()
        .copied()
        .filter(|column| dataset.has_column(column))
        .collect()
}
