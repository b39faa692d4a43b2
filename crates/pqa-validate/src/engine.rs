//! Job dispatch and result aggregation.
//!
//! Every check runs as an independent job over the same read-only
//! [`CheckContext`]. Jobs run on the rayon pool (or sequentially), each
//! isolated from panics in the others, and their outputs are merged in job
//! order by [`aggregate`].

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use pqa_model::{
    CheckKey, CheckOutcome, CheckResult, IssueRecord, Metrics, QaReport, Result,
};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{Span, debug, info, info_span, warn};

use crate::checks::{
    Checked, duplicates, formats, geo, grouping, missingness, numeric, patterns, records, schema,
};
use crate::context::CheckContext;

/// Cooperative cancellation shared by all jobs of a run.
///
/// Jobs that observe cancellation are discarded and their keys reported as
/// `timed_out`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One independently scheduled unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckJob {
    Schema,
    Records,
    FieldFormats,
    FieldPatterns,
    Missingness,
    Duplicates,
    ZeroVote,
    StateCodes,
    Fips,
    Numeric,
    Distribution,
    StatewideTotals,
    Magnitude,
    Stage,
}

impl CheckJob {
    pub const ALL: [CheckJob; 14] = [
        Self::Schema,
        Self::Records,
        Self::FieldFormats,
        Self::FieldPatterns,
        Self::Missingness,
        Self::Duplicates,
        Self::ZeroVote,
        Self::StateCodes,
        Self::Fips,
        Self::Numeric,
        Self::Distribution,
        Self::StatewideTotals,
        Self::Magnitude,
        Self::Stage,
    ];

    /// Whether this job appends records to `fields` besides its own keys.
    pub fn feeds_fields(self) -> bool {
        matches!(self, Self::ZeroVote | Self::Numeric)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Records => "records",
            Self::FieldFormats => "field_formats",
            Self::FieldPatterns => "field_patterns",
            Self::Missingness => "missingness",
            Self::Duplicates => "duplicates",
            Self::ZeroVote => "zero_vote",
            Self::StateCodes => "state_codes",
            Self::Fips => "fips",
            Self::Numeric => "numeric",
            Self::Distribution => "distribution",
            Self::StatewideTotals => "statewide_totals",
            Self::Magnitude => "magnitude",
            Self::Stage => "stage",
        }
    }

    /// Result slots this job fills.
    pub fn keys(self) -> &'static [CheckKey] {
        match self {
            Self::Schema => &[CheckKey::Columns],
            Self::Records => &[CheckKey::Fields],
            Self::FieldFormats => &[CheckKey::FieldFormats],
            Self::FieldPatterns => &[CheckKey::FieldRegexChecks],
            Self::Missingness => &[CheckKey::Missingness],
            Self::Duplicates => &[CheckKey::Duplicates, CheckKey::DuplicatesSummary],
            Self::ZeroVote => &[CheckKey::ZeroVotePrecincts],
            Self::StateCodes => &[CheckKey::StateCodes],
            Self::Fips => &[CheckKey::FipsChecks],
            Self::Numeric => &[CheckKey::Numerical],
            Self::Distribution => &[CheckKey::Distribution],
            Self::StatewideTotals => &[CheckKey::StatewideTotals],
            Self::Magnitude => &[
                CheckKey::MagnitudeOfficesMap,
                CheckKey::OfficesMultipleMagnitudes,
            ],
            Self::Stage => &[CheckKey::StageInvalidRows],
        }
    }

    fn run(self, ctx: &CheckContext<'_>) -> JobOutput {
        match self {
            Self::Schema => JobOutput::single(CheckKey::Columns, Ok(schema::check(ctx))),
            Self::Records => JobOutput::single(
                CheckKey::Fields,
                Ok(CheckResult::IssueList(records::check(ctx))),
            ),
            Self::FieldFormats => JobOutput::single(
                CheckKey::FieldFormats,
                Ok(CheckResult::IssueList(formats::check(ctx))),
            ),
            Self::FieldPatterns => JobOutput::single(
                CheckKey::FieldRegexChecks,
                Ok(CheckResult::IssueList(patterns::check(ctx))),
            ),
            Self::Missingness => JobOutput::single(
                CheckKey::Missingness,
                Ok(CheckResult::Table(missingness::check(ctx))),
            ),
            Self::Duplicates => JobOutput::from_checked(self, duplicates::check(ctx), |report| {
                vec![
                    CheckResult::Table(report.table),
                    CheckResult::Scalar(report.summary),
                ]
            }),
            Self::ZeroVote => match grouping::zero_vote_groups(ctx) {
                Ok(groups) => {
                    let mut output = JobOutput::single(
                        CheckKey::ZeroVotePrecincts,
                        Ok(CheckResult::Table(groups.table)),
                    );
                    output.field_records.extend(groups.record);
                    output
                }
                Err(skip) => JobOutput::skipped(self, &skip.0),
            },
            Self::StateCodes => JobOutput::single(
                CheckKey::StateCodes,
                geo::state_codes(ctx).map(CheckResult::IssueList),
            ),
            Self::Fips => JobOutput::single(
                CheckKey::FipsChecks,
                geo::fips(ctx).map(CheckResult::IssueList),
            ),
            Self::Numeric => match numeric::summarize(ctx) {
                Ok(summary) => {
                    let mut output =
                        JobOutput::single(CheckKey::Numerical, Ok(CheckResult::Scalar(summary.metrics)));
                    output.field_records.extend(summary.invalid_votes);
                    output.field_records.extend(summary.negative_votes);
                    output
                }
                Err(skip) => JobOutput::skipped(self, &skip.0),
            },
            Self::Distribution => JobOutput::single(
                CheckKey::Distribution,
                numeric::outliers(ctx).map(CheckResult::Table),
            ),
            Self::StatewideTotals => JobOutput::single(
                CheckKey::StatewideTotals,
                grouping::statewide_totals(ctx).map(CheckResult::Table),
            ),
            Self::Magnitude => JobOutput::from_checked(self, grouping::magnitudes(ctx), |report| {
                vec![
                    CheckResult::Table(report.map),
                    CheckResult::IssueList(report.inconsistent),
                ]
            }),
            Self::Stage => JobOutput::single(
                CheckKey::StageInvalidRows,
                grouping::stage_invalid_rows(ctx).map(CheckResult::Table),
            ),
        }
    }
}

/// Everything one job produced.
#[derive(Debug, Clone, Default)]
pub(crate) struct JobOutput {
    slots: Vec<(CheckKey, CheckOutcome)>,
    /// Records appended to `fields` by the aggregator.
    field_records: Vec<IssueRecord>,
}

impl JobOutput {
    fn single(key: CheckKey, result: Checked<CheckResult>) -> Self {
        let outcome = match result {
            Ok(result) => CheckOutcome::completed(result),
            Err(skip) => CheckOutcome::skipped(skip.0),
        };
        Self {
            slots: vec![(key, outcome)],
            field_records: Vec::new(),
        }
    }

    fn from_checked<T>(
        job: CheckJob,
        checked: Checked<T>,
        split: impl FnOnce(T) -> Vec<CheckResult>,
    ) -> Self {
        match checked {
            Ok(value) => Self {
                slots: job
                    .keys()
                    .iter()
                    .copied()
                    .zip(split(value).into_iter().map(CheckOutcome::completed))
                    .collect(),
                field_records: Vec::new(),
            },
            Err(skip) => Self::skipped(job, &skip.0),
        }
    }

    fn skipped(job: CheckJob, reason: &str) -> Self {
        Self {
            slots: job
                .keys()
                .iter()
                .map(|&key| (key, CheckOutcome::skipped(reason)))
                .collect(),
            field_records: Vec::new(),
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone)]
pub(crate) enum JobOutcome {
    Done(JobOutput),
    Failed(String),
    TimedOut,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "check panicked".to_string()
    }
}

/// Runs one job body with panic isolation, cancellation and an optional deadline.
pub(crate) fn execute(
    name: &str,
    cancel: &CancelToken,
    timeout: Option<Duration>,
    body: impl FnOnce() -> JobOutput,
) -> JobOutcome {
    if cancel.is_cancelled() {
        warn!(job = name, "check cancelled before start");
        return JobOutcome::TimedOut;
    }
    let started = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(body));
    let elapsed = started.elapsed();

    match result {
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(job = name, error = %message, "check failed");
            JobOutcome::Failed(message)
        }
        Ok(_) if cancel.is_cancelled() => {
            warn!(job = name, "check cancelled");
            JobOutcome::TimedOut
        }
        Ok(_) if timeout.is_some_and(|limit| elapsed > limit) => {
            warn!(
                job = name,
                elapsed_ms = elapsed.as_millis() as u64,
                "check exceeded timeout"
            );
            JobOutcome::TimedOut
        }
        Ok(output) => {
            debug!(
                job = name,
                elapsed_ms = elapsed.as_millis() as u64,
                "check finished"
            );
            JobOutcome::Done(output)
        }
    }
}

/// Runs every check and aggregates the results.
///
/// Fails only when the configuration is invalid.
pub fn run_checks(ctx: &CheckContext<'_>) -> Result<QaReport> {
    run_checks_with_cancel(ctx, &CancelToken::new())
}

/// [`run_checks`] with an externally controlled cancellation token.
pub fn run_checks_with_cancel(ctx: &CheckContext<'_>, cancel: &CancelToken) -> Result<QaReport> {
    ctx.config.validate()?;
    let span = info_span!(
        "qa_run",
        rows = ctx.dataset.height(),
        columns = ctx.dataset.width(),
        parallel = ctx.config.parallel
    );
    let _enter = span.enter();
    let timeout = ctx.config.check_timeout_ms.map(Duration::from_millis);
    let started = Instant::now();

    let jobs = CheckJob::ALL;
    let run = |job: &CheckJob| {
        let job = *job;
        execute(job.name(), cancel, timeout, || job.run(ctx))
    };
    let outcomes: Vec<JobOutcome> = if ctx.config.parallel {
        let parent = Span::current();
        jobs.par_iter()
            .map(|job| {
                let _guard = parent.enter();
                run(job)
            })
            .collect()
    } else {
        jobs.iter().map(run).collect()
    };

    let report = aggregate(ctx, &jobs, outcomes);
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        issues = report.total_issues(),
        "qa run finished"
    );
    Ok(report)
}

/// Merges job outcomes in job order and derives the summary keys.
pub(crate) fn aggregate(
    ctx: &CheckContext<'_>,
    jobs: &[CheckJob],
    outcomes: Vec<JobOutcome>,
) -> QaReport {
    let mut checks = BTreeMap::new();
    let mut field_records = Vec::new();
    // First contributor to `fields` that did not finish, in job order.
    let mut fields_incomplete: Option<CheckOutcome> = None;

    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            JobOutcome::Done(output) => {
                for (key, outcome) in output.slots {
                    if let CheckOutcome::Skipped { reason } = &outcome {
                        warn!(check = %key, reason = %reason, "check skipped");
                    }
                    checks.insert(key, outcome);
                }
                field_records.extend(output.field_records);
            }
            JobOutcome::Failed(message) => {
                if job.feeds_fields() && fields_incomplete.is_none() {
                    fields_incomplete = Some(CheckOutcome::Failed {
                        message: format!("{} check failed: {message}", job.name()),
                    });
                }
                for &key in job.keys() {
                    checks.insert(
                        key,
                        CheckOutcome::Failed {
                            message: message.clone(),
                        },
                    );
                }
            }
            JobOutcome::TimedOut => {
                if job.feeds_fields() && fields_incomplete.is_none() {
                    fields_incomplete = Some(CheckOutcome::TimedOut);
                }
                for &key in job.keys() {
                    checks.insert(key, CheckOutcome::TimedOut);
                }
            }
        }
    }

    let fields_completed = matches!(
        checks.get(&CheckKey::Fields),
        Some(CheckOutcome::Completed { .. })
    );
    match fields_incomplete {
        Some(outcome) if fields_completed => {
            warn!(check = %CheckKey::Fields, status = outcome.status(), "fields incomplete");
            checks.insert(CheckKey::Fields, outcome);
        }
        _ => {
            if let Some(CheckOutcome::Completed {
                result: CheckResult::IssueList(records),
            }) = checks.get_mut(&CheckKey::Fields)
            {
                records.extend(field_records);
            }
        }
    }

    checks.insert(
        CheckKey::DatasetInfo,
        CheckOutcome::completed(CheckResult::Scalar(dataset_info(ctx))),
    );
    let detected = match ctx.detected_state {
        Some(state) => {
            let mut metrics = Metrics::new()
                .with("state_po", state.state_po.as_str())
                .with("source", state.source.as_str());
            if let Some(name) = &state.state {
                metrics.insert("state", name.as_str());
            }
            if let Some(fips) = &state.state_fips {
                metrics.insert("state_fips", fips.as_str());
            }
            CheckOutcome::completed(CheckResult::Scalar(metrics))
        }
        None => CheckOutcome::skipped("state could not be detected"),
    };
    checks.insert(CheckKey::DetectedState, detected);

    QaReport { checks }
}

fn unique_count(ctx: &CheckContext<'_>, candidates: &[&str]) -> usize {
    let Some(column) = ctx.dataset.first_present(candidates) else {
        return 0;
    };
    ctx.dataset
        .column(column)
        .unwrap_or(&[])
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

fn dataset_info(ctx: &CheckContext<'_>) -> Metrics {
    Metrics::new()
        .with("rows", ctx.dataset.height())
        .with("columns", ctx.dataset.width())
        .with(
            "unique_counties",
            unique_count(ctx, &["county_fips", "county_name"]),
        )
        .with(
            "unique_jurisdictions",
            unique_count(ctx, &["jurisdiction_fips", "jurisdiction_name"]),
        )
}

#[cfg(test)]
mod tests {
    use pqa_model::{Dataset, QaConfig, References};

    use super::*;

    #[test]
    fn panicking_job_is_isolated() {
        let outcome = execute("boom", &CancelToken::new(), None, || panic!("bad input"));
        assert!(matches!(outcome, JobOutcome::Failed(message) if message == "bad input"));
    }

    #[test]
    fn slow_job_times_out() {
        let outcome = execute(
            "slow",
            &CancelToken::new(),
            Some(Duration::from_millis(1)),
            || {
                std::thread::sleep(Duration::from_millis(20));
                JobOutput::default()
            },
        );
        assert!(matches!(outcome, JobOutcome::TimedOut));
    }

    #[test]
    fn failed_job_marks_all_its_keys() {
        let dataset = Dataset::new(["votes"], vec![vec!["1"]]).unwrap();
        let config = QaConfig::default();
        let references = References::default();
        let ctx = CheckContext::new(&dataset, &references, &config, None);
        let jobs = [CheckJob::Schema, CheckJob::Duplicates];
        let outcomes = vec![
            JobOutcome::Done(CheckJob::Schema.run(&ctx)),
            JobOutcome::Failed("bad".to_string()),
        ];
        let report = aggregate(&ctx, &jobs, outcomes);
        assert_eq!(report.get(CheckKey::Columns).unwrap().status(), "completed");
        for key in [CheckKey::Duplicates, CheckKey::DuplicatesSummary] {
            assert_eq!(
                report.get(key),
                Some(&CheckOutcome::Failed {
                    message: "bad".to_string()
                })
            );
        }
        assert!(report.get(CheckKey::DatasetInfo).is_some());
    }

    fn aggregate_fields(
        outcomes: impl FnOnce(&CheckContext<'_>) -> Vec<JobOutcome>,
    ) -> QaReport {
        let dataset = Dataset::new(
            ["precinct", "office", "candidate", "votes"],
            vec![vec!["001", "US HOUSE", "", "0"], vec!["001", "US HOUSE", "DOE", "x"]],
        )
        .unwrap();
        let config = QaConfig::default();
        let references = References::default();
        let ctx = CheckContext::new(&dataset, &references, &config, None);
        let jobs = [CheckJob::Records, CheckJob::ZeroVote, CheckJob::Numeric];
        aggregate(&ctx, &jobs, outcomes(&ctx))
    }

    #[test]
    fn fields_merges_contributing_records() {
        let report = aggregate_fields(|ctx| {
            vec![
                JobOutcome::Done(CheckJob::Records.run(ctx)),
                JobOutcome::Done(CheckJob::ZeroVote.run(ctx)),
                JobOutcome::Done(CheckJob::Numeric.run(ctx)),
            ]
        });
        let issues: Vec<&str> = report
            .issues(CheckKey::Fields)
            .iter()
            .map(|record| record.issue.as_str())
            .collect();
        assert_eq!(issues, vec![
            "empty_candidates",
            "zero_vote_rows",
            "zero_vote_precinct_groups",
            "invalid_votes"
        ]);
    }

    #[test]
    fn failed_contributor_marks_fields_failed() {
        let report = aggregate_fields(|ctx| {
            vec![
                JobOutcome::Done(CheckJob::Records.run(ctx)),
                JobOutcome::Failed("boom".to_string()),
                JobOutcome::Done(CheckJob::Numeric.run(ctx)),
            ]
        });
        assert_eq!(
            report.get(CheckKey::Fields),
            Some(&CheckOutcome::Failed {
                message: "zero_vote check failed: boom".to_string()
            })
        );
        assert!(matches!(
            report.get(CheckKey::ZeroVotePrecincts),
            Some(CheckOutcome::Failed { .. })
        ));
        assert_eq!(
            report.get(CheckKey::Numerical).map(CheckOutcome::status),
            Some("completed")
        );
    }

    #[test]
    fn timed_out_contributor_marks_fields_timed_out() {
        let report = aggregate_fields(|ctx| {
            vec![
                JobOutcome::Done(CheckJob::Records.run(ctx)),
                JobOutcome::Done(CheckJob::ZeroVote.run(ctx)),
                JobOutcome::TimedOut,
            ]
        });
        assert_eq!(report.get(CheckKey::Fields), Some(&CheckOutcome::TimedOut));
    }

    #[test]
    fn failed_records_job_keeps_its_own_outcome() {
        let report = aggregate_fields(|ctx| {
            vec![
                JobOutcome::Failed("bad".to_string()),
                JobOutcome::Failed("boom".to_string()),
                JobOutcome::Done(CheckJob::Numeric.run(ctx)),
            ]
        });
        assert_eq!(
            report.get(CheckKey::Fields),
            Some(&CheckOutcome::Failed {
                message: "bad".to_string()
            })
        );
        assert!(report.issues(CheckKey::Fields).is_empty());
    }

    #[test]
    fn every_key_is_owned_by_one_job() {
        let mut owned: Vec<CheckKey> = CheckJob::ALL
            .iter()
            .flat_map(|job| job.keys().iter().copied())
            .collect();
        owned.extend([CheckKey::DatasetInfo, CheckKey::DetectedState]);
        owned.sort();
        assert_eq!(owned, CheckKey::ALL.to_vec());
    }
}
