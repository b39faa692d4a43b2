//! Data model for the precinct QA checks engine.
//!
//! Everything the engine reads (the [`Dataset`], reference tables, [`QaConfig`])
//! and everything it produces (the [`QaReport`] and its [`CheckResult`] values)
//! lives here so loaders, the engine, and renderers share one vocabulary.

pub mod config;
pub mod dataset;
pub mod error;
pub mod reference;
pub mod result;
pub mod value;

pub use config::{OutlierGrouping, QaConfig};
pub use dataset::{Dataset, row_number};
pub use error::{QaError, Result};
pub use reference::{
    CountyFips, CountyFipsTable, DetectedState, Reference, References, StateCode, StateCodeTable,
};
pub use result::{
    CheckKey, CheckOutcome, CheckResult, DetailTable, IssueRecord, KindSummary, MetricValue,
    Metrics, QaReport,
};
pub use value::{any_to_string, format_numeric, parse_f64};
