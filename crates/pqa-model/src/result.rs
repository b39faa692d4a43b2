//! Result model produced by the checks engine.
//!
//! Each check writes one or more [`CheckKey`] slots. A slot holds a
//! [`CheckOutcome`]; completed outcomes carry a [`CheckResult`], which is one
//! of three shapes: scalar metrics, a list of issue records, or a detail table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical result keys, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKey {
    Columns,
    Fields,
    FieldFormats,
    FieldRegexChecks,
    Missingness,
    Duplicates,
    DuplicatesSummary,
    ZeroVotePrecincts,
    StateCodes,
    FipsChecks,
    Numerical,
    Distribution,
    StatewideTotals,
    DatasetInfo,
    MagnitudeOfficesMap,
    OfficesMultipleMagnitudes,
    StageInvalidRows,
    DetectedState,
}

impl CheckKey {
    pub const ALL: [CheckKey; 18] = [
        Self::Columns,
        Self::Fields,
        Self::FieldFormats,
        Self::FieldRegexChecks,
        Self::Missingness,
        Self::Duplicates,
        Self::DuplicatesSummary,
        Self::ZeroVotePrecincts,
        Self::StateCodes,
        Self::FipsChecks,
        Self::Numerical,
        Self::Distribution,
        Self::StatewideTotals,
        Self::DatasetInfo,
        Self::MagnitudeOfficesMap,
        Self::OfficesMultipleMagnitudes,
        Self::StageInvalidRows,
        Self::DetectedState,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Fields => "fields",
            Self::FieldFormats => "field_formats",
            Self::FieldRegexChecks => "field_regex_checks",
            Self::Missingness => "missingness",
            Self::Duplicates => "duplicates",
            Self::DuplicatesSummary => "duplicates_summary",
            Self::ZeroVotePrecincts => "zero_vote_precincts",
            Self::StateCodes => "state_codes",
            Self::FipsChecks => "fips_checks",
            Self::Numerical => "numerical",
            Self::Distribution => "distribution",
            Self::StatewideTotals => "statewide_totals",
            Self::DatasetInfo => "dataset_info",
            Self::MagnitudeOfficesMap => "magnitude_offices_map",
            Self::OfficesMultipleMagnitudes => "offices_multiple_magnitudes",
            Self::StageInvalidRows => "stage_invalid_rows",
            Self::DetectedState => "detected_state",
        }
    }

    /// Whether rows of a completed table under this key are findings.
    ///
    /// Informational tables (totals, missingness, maps) never count as issues.
    pub fn table_rows_are_issues(self) -> bool {
        matches!(
            self,
            Self::Duplicates | Self::ZeroVotePrecincts | Self::Distribution | Self::StageInvalidRows
        )
    }
}

impl fmt::Display for CheckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one result slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Completed { result: CheckResult },
    Skipped { reason: String },
    TimedOut,
    Failed { message: String },
}

impl CheckOutcome {
    pub fn completed(result: CheckResult) -> Self {
        Self::Completed { result }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Skipped { .. } => "skipped",
            Self::TimedOut => "timed_out",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn result(&self) -> Option<&CheckResult> {
        match self {
            Self::Completed { result } => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CheckResult {
    Scalar(Metrics),
    IssueList(Vec<IssueRecord>),
    Table(DetailTable),
}

impl CheckResult {
    pub fn as_scalar(&self) -> Option<&Metrics> {
        match self {
            Self::Scalar(metrics) => Some(metrics),
            _ => None,
        }
    }

    pub fn as_issues(&self) -> Option<&[IssueRecord]> {
        match self {
            Self::IssueList(records) => Some(records),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&DetailTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for MetricValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Named scalar metrics, serialized in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<MetricValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<MetricValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(MetricValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(MetricValue::Float(v)) => Some(*v),
            Some(MetricValue::Integer(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.get(name) {
            Some(MetricValue::List(v)) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(MetricValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.0.iter()
    }
}

/// Count and sample values for one problem kind inside an [`IssueRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    pub kind: String,
    pub count: usize,
    pub values: Vec<String>,
}

/// One reported problem.
///
/// For per-column field checks `issue` is the column name and `issues` lists
/// the distinct problem kinds found; for record-level checks `issue` names the
/// check and `issues` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub issue: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    pub count: usize,
    pub issue_values: Vec<String>,
    pub issue_row_numbers: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<KindSummary>,
}

impl IssueRecord {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DetailTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column across all rows.
    pub fn column_values(&self, name: &str) -> Vec<&str> {
        match self.column_index(name) {
            Some(idx) => self
                .rows
                .iter()
                .filter_map(|row| row.get(idx).map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// The composite result of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QaReport {
    pub checks: BTreeMap<CheckKey, CheckOutcome>,
}

impl QaReport {
    pub fn get(&self, key: CheckKey) -> Option<&CheckOutcome> {
        self.checks.get(&key)
    }

    pub fn result(&self, key: CheckKey) -> Option<&CheckResult> {
        self.get(key).and_then(CheckOutcome::result)
    }

    pub fn issues(&self, key: CheckKey) -> &[IssueRecord] {
        self.result(key)
            .and_then(CheckResult::as_issues)
            .unwrap_or(&[])
    }

    pub fn table(&self, key: CheckKey) -> Option<&DetailTable> {
        self.result(key).and_then(CheckResult::as_table)
    }

    pub fn scalar(&self, key: CheckKey) -> Option<&Metrics> {
        self.result(key).and_then(CheckResult::as_scalar)
    }

    /// Number of findings recorded under one key.
    pub fn issue_count(&self, key: CheckKey) -> usize {
        match self.result(key) {
            Some(CheckResult::IssueList(records)) => records.iter().map(|r| r.count).sum(),
            Some(CheckResult::Table(table)) if key.table_rows_are_issues() => table.len(),
            Some(CheckResult::Scalar(metrics)) if key == CheckKey::Columns => metrics
                .list("missing_columns")
                .map_or(0, <[String]>::len),
            _ => 0,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.checks.keys().map(|&key| self.issue_count(key)).sum()
    }

    /// Keys whose check failed or timed out.
    pub fn incomplete(&self) -> Vec<CheckKey> {
        self.checks
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    CheckOutcome::Failed { .. } | CheckOutcome::TimedOut
                )
            })
            .map(|(&key, _)| key)
            .collect()
    }
}
