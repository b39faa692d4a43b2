//! Engine configuration.
//!
//! Every constant a check consults lives on [`QaConfig`], which is passed by
//! reference into each check. Defaults match the published dataset
//! conventions; a TOML file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// How the outlier analysis partitions rows before computing medians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierGrouping {
    #[default]
    State,
    StateOffice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub required_columns: Vec<String>,
    pub outlier_threshold: f64,
    pub outlier_min_group_size: usize,
    pub outlier_grouping: OutlierGrouping,
    /// Candidate values that mark aggregate rows rather than real candidates.
    pub aggregate_markers: Vec<String>,
    pub missing_tokens: Vec<String>,
    /// Values that look like someone typed "no data" into a cell.
    pub placeholder_tokens: Vec<String>,
    pub redaction_sentinel: String,
    pub sample_limit: usize,
    pub valid_stages: Vec<String>,
    pub valid_modes: Vec<String>,
    pub valid_party_simplified: Vec<String>,
    pub valid_dataverses: Vec<String>,
    pub valid_booleans: Vec<String>,
    pub canonical_candidate_tokens: Vec<String>,
    pub writein_tokens: Vec<String>,
    pub free_text_columns: Vec<String>,
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_timeout_ms: Option<u64>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            required_columns: strings(&[
                "precinct",
                "office",
                "party_detailed",
                "party_simplified",
                "mode",
                "votes",
                "county_name",
                "county_fips",
                "jurisdiction_name",
                "jurisdiction_fips",
                "candidate",
                "district",
                "dataverse",
                "year",
                "stage",
                "state",
                "special",
                "writein",
                "state_po",
                "state_fips",
                "state_cen",
                "state_ic",
                "date",
                "magnitude",
            ]),
            outlier_threshold: 3.5,
            outlier_min_group_size: 5,
            outlier_grouping: OutlierGrouping::State,
            aggregate_markers: strings(&[
                "OVERVOTES",
                "UNDERVOTES",
                "OVERVOTE",
                "UNDERVOTE",
                "OVER VOTES",
                "UNDER VOTES",
                "COUNTY TOTALS",
                "TOTAL",
                "TOTAL VOTES",
                "TOTAL VOTES CAST",
                "VOTE TOTAL",
                "CONTEST TOTAL",
                "BLANK BALLOTS",
                "REGISTERED VOTERS",
                "BALLOTS CAST",
            ]),
            missing_tokens: strings(&["", "NA", "N/A", "NULL", "NAN"]),
            placeholder_tokens: strings(&[
                "NONE",
                "NAN",
                "NULL",
                "NA",
                "N/A",
                "#N/A",
                "MISSING",
                "UNKNOWN",
                "UNK",
                "NOT AVAILABLE",
                "-",
                "--",
                "?",
                ".",
            ]),
            redaction_sentinel: "*".to_string(),
            sample_limit: 10,
            valid_stages: strings(&["PRI", "GEN", "RUNOFF"]),
            valid_modes: strings(&["TOTAL", "ELECTION DAY", "ABSENTEE", "PROVISIONAL", "ONE-STOP"]),
            valid_party_simplified: strings(&[
                "DEMOCRAT",
                "REPUBLICAN",
                "LIBERTARIAN",
                "OTHER",
                "NONPARTISAN",
                "",
            ]),
            valid_dataverses: strings(&["PRESIDENT", "SENATE", "HOUSE", "STATE", "LOCAL", ""]),
            valid_booleans: strings(&["TRUE", "FALSE"]),
            canonical_candidate_tokens: strings(&["OVERVOTES", "UNDERVOTES", "WRITE-IN"]),
            writein_tokens: strings(&[
                "WRITE-IN",
                "WRITE-INS",
                "WRITEIN",
                "WRITEINS",
                "WRITE IN",
                "WRITE INS",
                "SCATTERING",
            ]),
            free_text_columns: strings(&[
                "precinct",
                "office",
                "party_detailed",
                "candidate",
                "county_name",
                "jurisdiction_name",
                "district",
            ]),
            parallel: true,
            check_timeout_ms: None,
        }
    }
}

impl QaConfig {
    /// Loads a TOML configuration file; omitted fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| QaError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| QaError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.outlier_threshold.is_finite() && self.outlier_threshold > 0.0) {
            return Err(QaError::invalid_config(format!(
                "outlier_threshold must be a positive number, got {}",
                self.outlier_threshold
            )));
        }
        if self.outlier_min_group_size < 2 {
            return Err(QaError::invalid_config(format!(
                "outlier_min_group_size must be at least 2, got {}",
                self.outlier_min_group_size
            )));
        }
        if self.sample_limit == 0 {
            return Err(QaError::invalid_config("sample_limit must be at least 1"));
        }
        if self.redaction_sentinel.trim().is_empty() {
            return Err(QaError::invalid_config(
                "redaction_sentinel must not be empty",
            ));
        }
        if self.check_timeout_ms == Some(0) {
            return Err(QaError::invalid_config(
                "check_timeout_ms must be positive when set",
            ));
        }
        Ok(())
    }

    /// Empty, or equal (trimmed, ignoring case) to a configured missing token.
    pub fn is_missing(&self, value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || self
                .missing_tokens
                .iter()
                .any(|token| token.eq_ignore_ascii_case(trimmed))
    }

    pub fn is_aggregate_marker(&self, candidate: &str) -> bool {
        contains_ignore_case(&self.aggregate_markers, candidate)
    }

    pub fn is_writein_token(&self, candidate: &str) -> bool {
        contains_ignore_case(&self.writein_tokens, candidate)
    }

    pub fn is_placeholder(&self, value: &str) -> bool {
        contains_ignore_case(&self.placeholder_tokens, value)
    }

    pub fn is_redacted(&self, votes: &str) -> bool {
        votes.trim() == self.redaction_sentinel
    }
}

fn contains_ignore_case(tokens: &[String], value: &str) -> bool {
    let trimmed = value.trim();
    tokens.iter().any(|token| token.eq_ignore_ascii_case(trimmed))
}
