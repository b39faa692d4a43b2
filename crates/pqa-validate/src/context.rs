//! Shared inputs handed to every check.

use pqa_model::{Dataset, DetectedState, QaConfig, References};

/// Read-only snapshot of one run's inputs.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub dataset: &'a Dataset,
    pub references: &'a References,
    pub config: &'a QaConfig,
    pub detected_state: Option<&'a DetectedState>,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        dataset: &'a Dataset,
        references: &'a References,
        config: &'a QaConfig,
        detected_state: Option<&'a DetectedState>,
    ) -> Self {
        Self {
            dataset,
            references,
            config,
            detected_state,
        }
    }

    /// Whether the row's candidate is an aggregate marker such as `OVERVOTES`.
    pub fn is_marker_row(&self, row: usize) -> bool {
        self.dataset
            .value("candidate", row)
            .is_some_and(|candidate| self.config.is_aggregate_marker(candidate))
    }
}
