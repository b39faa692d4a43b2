//! Checks engine for precinct-level election results.
//!
//! The engine validates one immutable [`Dataset`](pqa_model::Dataset) against
//! the reference tables and a [`QaConfig`](pqa_model::QaConfig):
//!
//! - **Schema**: required column presence
//! - **Field rules**: categorical values, code formats, naming patterns, text hygiene
//! - **Missingness**: empty and placeholder values per column
//! - **Duplicates**: exact duplicate rows and same-key vote conflicts
//! - **Grouping**: zero-vote groups, magnitude consistency, statewide totals, stage values
//! - **Numeric**: `votes` coercion and MAD outlier detection
//! - **Geography**: state identity and county FIPS cross-references
//!
//! # Example
//!
//! ```ignore
//! use pqa_validate::{CheckContext, run_checks};
//!
//! let ctx = CheckContext::new(&dataset, &references, &config, detected.as_ref());
//! let report = run_checks(&ctx)?;
//! println!("{} issues", report.total_issues());
//! ```

pub mod checks;
mod collector;
mod context;
mod engine;
pub mod stats;
mod votes;

pub use checks::{Checked, SkipReason};
pub use context::CheckContext;
pub use engine::{CancelToken, CheckJob, run_checks, run_checks_with_cancel};
pub use votes::VoteValue;
