//! Tests for pqa-model types.

use pqa_model::{
    CheckKey, CheckOutcome, CheckResult, Dataset, DetailTable, IssueRecord, KindSummary, Metrics,
    QaReport, Reference, StateCodeTable,
};

#[test]
fn dataset_exposes_columns_and_cells() {
    let dataset = Dataset::new(
        ["precinct", "office", "votes"],
        vec![vec!["001", "US HOUSE", "10"], vec!["002", "US HOUSE", "*"]],
    )
    .expect("build dataset");
    assert_eq!(dataset.height(), 2);
    assert_eq!(dataset.width(), 3);
    assert!(dataset.has_column("office"));
    assert!(!dataset.has_column("candidate"));
    assert_eq!(dataset.column("votes"), Some(&["10".to_string(), "*".to_string()][..]));
    assert_eq!(dataset.value_or_empty("candidate", 0), "");
}

#[test]
fn report_round_trips_through_json() {
    let mut report = QaReport::default();
    report.checks.insert(
        CheckKey::FieldFormats,
        CheckOutcome::completed(CheckResult::IssueList(vec![IssueRecord {
            issue: "stage".to_string(),
            issues: vec!["INVALID_VALUE".to_string()],
            count: 1,
            issue_values: vec!["GENERAL".to_string()],
            issue_row_numbers: vec![3],
            breakdown: vec![KindSummary {
                kind: "INVALID_VALUE".to_string(),
                count: 1,
                values: vec!["GENERAL".to_string()],
            }],
        }])),
    );
    report.checks.insert(
        CheckKey::Numerical,
        CheckOutcome::completed(CheckResult::Scalar(
            Metrics::new()
                .with("rows", 3usize)
                .with("total_votes", 12.5),
        )),
    );
    report.checks.insert(
        CheckKey::Duplicates,
        CheckOutcome::completed(CheckResult::Table(DetailTable::new(["cluster", "row_number"]))),
    );
    report
        .checks
        .insert(CheckKey::FipsChecks, CheckOutcome::skipped("county_fips reference absent"));
    report.checks.insert(
        CheckKey::Distribution,
        CheckOutcome::Failed {
            message: "boom".to_string(),
        },
    );

    let json = serde_json::to_string(&report).expect("serialize report");
    let round: QaReport = serde_json::from_str(&json).expect("deserialize report");
    assert_eq!(round, report);
    assert_eq!(round.issue_count(CheckKey::FieldFormats), 1);
    assert_eq!(
        round.scalar(CheckKey::Numerical).and_then(|m| m.integer("rows")),
        Some(3)
    );
}

#[test]
fn absent_reference_carries_reason() {
    let reference: Reference<StateCodeTable> = Reference::absent("state codes not found");
    assert!(!reference.is_present());
    assert_eq!(reference.absent_reason(), Some("state codes not found"));
    assert!(reference.as_present().is_none());
}
