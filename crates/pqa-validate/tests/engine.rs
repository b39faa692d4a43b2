//! Tests for the full engine run over polars-built datasets.

use polars::prelude::*;
use pqa_model::{
    CheckKey, CheckOutcome, CountyFips, CountyFipsTable, Dataset, DetectedState, QaConfig,
    QaError, Reference, References, StateCode, StateCodeTable,
};
use pqa_validate::{CancelToken, CheckContext, run_checks, run_checks_with_cancel};

fn dataset(df: DataFrame) -> Dataset {
    Dataset::from_frame(&df).unwrap()
}

fn run(dataset: &Dataset, config: &QaConfig) -> pqa_model::QaReport {
    let references = References::default();
    run_checks(&CheckContext::new(dataset, &references, config, None)).unwrap()
}

fn references() -> References {
    References {
        state_codes: Reference::Present(StateCodeTable::new(vec![StateCode {
            state: "ALABAMA".to_string(),
            state_po: "AL".to_string(),
            state_fips: "01".to_string(),
            state_ic: "41".to_string(),
            state_cen: "63".to_string(),
        }])),
        county_fips: Reference::Present(CountyFipsTable::new([
            CountyFips {
                state: "ALABAMA".to_string(),
                county_name: "AUTAUGA".to_string(),
                county_fips: "01001".to_string(),
            },
            CountyFips {
                state: "ALABAMA".to_string(),
                county_name: "COFFEE".to_string(),
                county_fips: "01020".to_string(),
            },
        ])),
    }
}

#[test]
fn dataset_info_matches_dimensions() {
    let data = dataset(
        df! {
            "state" => &["ALABAMA", "ALABAMA", "ALABAMA"],
            "county_fips" => &["01001", "01001", "01020"],
            "jurisdiction_fips" => &["0100100000", "", "0102000000"],
            "votes" => &["1", "2", "3"],
        }
        .unwrap(),
    );
    let report = run(&data, &QaConfig::default());
    let info = report.scalar(CheckKey::DatasetInfo).unwrap();
    assert_eq!(info.integer("rows"), Some(3));
    assert_eq!(info.integer("columns"), Some(4));
    assert_eq!(info.integer("unique_counties"), Some(2));
    assert_eq!(info.integer("unique_jurisdictions"), Some(2));
}

#[test]
fn every_key_is_reported() {
    let data = dataset(df! { "votes" => &["1"] }.unwrap());
    let report = run(&data, &QaConfig::default());
    let keys: Vec<CheckKey> = report.checks.keys().copied().collect();
    assert_eq!(keys, CheckKey::ALL.to_vec());
    assert!(report.incomplete().is_empty());
}

#[test]
fn schema_reports_missing_required_column() {
    let data = dataset(
        df! {
            "state" => &["ALABAMA"],
            "county" => &["AUTAUGA"],
            "precinct" => &["001"],
        }
        .unwrap(),
    );
    let config = QaConfig {
        required_columns: ["state", "county", "precinct", "office"]
            .map(String::from)
            .to_vec(),
        ..QaConfig::default()
    };
    let report = run(&data, &config);
    insta::assert_json_snapshot!(report.get(CheckKey::Columns).unwrap(), @r#"
    {
      "status": "completed",
      "result": {
        "kind": "scalar",
        "data": {
          "column_count": 3,
          "extra_columns": [],
          "missing_columns": [
            "office"
          ]
        }
      }
    }
    "#);
    assert_eq!(report.issue_count(CheckKey::Columns), 1);
}

#[test]
fn identical_rows_are_exact_duplicates() {
    let data = dataset(
        df! {
            "precinct" => &["001", "001"],
            "office" => &["US HOUSE", "US HOUSE"],
            "candidate" => &["JANE DOE", "JANE DOE"],
            "votes" => &["10", "10"],
        }
        .unwrap(),
    );
    let report = run(&data, &QaConfig::default());
    let summary = report.scalar(CheckKey::DuplicatesSummary).unwrap();
    assert_eq!(summary.integer("exact"), Some(1));
    assert_eq!(summary.integer("conflicts"), Some(0));
}

#[test]
fn differing_votes_are_conflicts() {
    let data = dataset(
        df! {
            "precinct" => &["001", "001"],
            "office" => &["US HOUSE", "US HOUSE"],
            "candidate" => &["JANE DOE", "JANE DOE"],
            "votes" => &["10", "12"],
        }
        .unwrap(),
    );
    let report = run(&data, &QaConfig::default());
    let summary = report.scalar(CheckKey::DuplicatesSummary).unwrap();
    assert_eq!(summary.integer("exact"), Some(0));
    assert_eq!(summary.integer("conflicts"), Some(1));
    let table = report.table(CheckKey::Duplicates).unwrap();
    assert_eq!(table.column_values("row_number"), vec!["1", "2"]);
    assert_eq!(table.column_values("differing_fields"), vec!["votes", "votes"]);
}

#[test]
fn aggregate_marker_rows_are_not_duplicates() {
    let data = dataset(
        df! {
            "precinct" => &["001", "001"],
            "office" => &["US HOUSE", "US HOUSE"],
            "candidate" => &["COUNTY TOTALS", "COUNTY TOTALS"],
            "votes" => &["500", "500"],
        }
        .unwrap(),
    );
    let report = run(&data, &QaConfig::default());
    let summary = report.scalar(CheckKey::DuplicatesSummary).unwrap();
    assert_eq!(summary.integer("exact"), Some(0));
    assert_eq!(summary.integer("aggregate_rows_excluded"), Some(2));
    assert_eq!(report.issue_count(CheckKey::Duplicates), 0);
}

fn zero_vote_frame(second_vote: &str) -> Dataset {
    dataset(
        df! {
            "precinct" => &["001", "001"],
            "office" => &["US HOUSE", "US HOUSE"],
            "candidate" => &["JANE DOE", "JANE DOE"],
            "mode" => &["ELECTION DAY", "ABSENTEE"],
            "votes" => &["0", second_vote],
        }
        .unwrap(),
    )
}

#[test]
fn zero_vote_group_spans_modes() {
    let report = run(&zero_vote_frame("0"), &QaConfig::default());
    let table = report.table(CheckKey::ZeroVotePrecincts).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.column_values("row_count"), vec!["2"]);
    let record = report
        .issues(CheckKey::Fields)
        .iter()
        .find(|record| record.issue == "zero_vote_precinct_groups")
        .unwrap();
    assert_eq!(record.count, 1);
}

#[test]
fn nonzero_vote_clears_group() {
    let report = run(&zero_vote_frame("1"), &QaConfig::default());
    assert!(report.table(CheckKey::ZeroVotePrecincts).unwrap().is_empty());
    assert!(
        report
            .issues(CheckKey::Fields)
            .iter()
            .all(|record| record.issue != "zero_vote_precinct_groups")
    );
}

#[test]
fn county_prefix_must_match_state() {
    let data = dataset(
        df! {
            "state_fips" => &["01", "01"],
            "county_fips" => &["01020", "02020"],
        }
        .unwrap(),
    );
    let references = references();
    let config = QaConfig::default();
    let report = run_checks(&CheckContext::new(&data, &references, &config, None)).unwrap();
    let records = report.issues(CheckKey::FipsChecks);
    let mismatch = records
        .iter()
        .find(|record| record.issue == "county_state_mismatch")
        .unwrap();
    assert_eq!(mismatch.issue_row_numbers, vec![2]);
    assert_eq!(mismatch.issue_values, vec!["02020".to_string()]);
}

#[test]
fn fips_checks_skipped_without_county_table() {
    let data = dataset(df! { "county_fips" => &["01001"] }.unwrap());
    let report = run(&data, &QaConfig::default());
    assert!(matches!(
        report.get(CheckKey::FipsChecks),
        Some(CheckOutcome::Skipped { .. })
    ));
    assert!(matches!(
        report.get(CheckKey::StateCodes),
        Some(CheckOutcome::Skipped { .. })
    ));
}

#[test]
fn single_extreme_value_is_the_only_outlier() {
    let mut votes: Vec<String> = [480, 485, 490, 495, 500, 505, 510, 515, 520, 500]
        .iter()
        .map(ToString::to_string)
        .collect();
    votes.push("50000".to_string());
    let states = vec!["ALABAMA"; votes.len()];
    let data = dataset(
        df! {
            "state" => states,
            "votes" => votes,
        }
        .unwrap(),
    );
    let report = run(&data, &QaConfig::default());
    let table = report.table(CheckKey::Distribution).unwrap();
    assert_eq!(table.column_values("row_number"), vec!["11"]);
    assert_eq!(table.column_values("votes"), vec!["50000"]);
}

#[test]
fn identical_values_have_no_outliers() {
    let data = dataset(
        df! {
            "state" => &["ALABAMA"; 6],
            "votes" => &["100"; 6],
        }
        .unwrap(),
    );
    let report = run(&data, &QaConfig::default());
    assert!(report.table(CheckKey::Distribution).unwrap().is_empty());
}

#[test]
fn four_identical_values_have_zero_mad() {
    let data = dataset(
        df! {
            "state" => &["ALABAMA"; 4],
            "votes" => &["250"; 4],
        }
        .unwrap(),
    );
    let config = QaConfig {
        outlier_min_group_size: 2,
        ..QaConfig::default()
    };
    let report = run(&data, &config);
    assert!(report.table(CheckKey::Distribution).unwrap().is_empty());

    let mut votes = vec!["250"; 4];
    votes.push("9000");
    let data = dataset(
        df! {
            "state" => &["ALABAMA"; 5],
            "votes" => votes,
        }
        .unwrap(),
    );
    let report = run(&data, &config);
    assert!(report.table(CheckKey::Distribution).unwrap().is_empty());
}

#[test]
fn runs_are_byte_identical() {
    let data = dataset(
        df! {
            "state" => &["ALABAMA", "ALABAMA", "ALABAMA"],
            "state_po" => &["AL", "AL", "AK"],
            "state_fips" => &["01", "1", "01"],
            "county_fips" => &["01001", "01020", "02020"],
            "precinct" => &["001", "001", "002"],
            "office" => &["US HOUSE", "US HOUSE", "US SENATE"],
            "candidate" => &["JANE DOE", "JANE DOE", "john smith "],
            "votes" => &["10", "12", "*"],
        }
        .unwrap(),
    );
    let references = references();
    let detected = DetectedState::from_po("AL", "argument").resolved(
        references.state_codes.as_present().unwrap(),
    );
    let parallel = QaConfig::default();
    let sequential = QaConfig {
        parallel: false,
        ..QaConfig::default()
    };

    let render = |config: &QaConfig| {
        let ctx = CheckContext::new(&data, &references, config, Some(&detected));
        serde_json::to_string(&run_checks(&ctx).unwrap()).unwrap()
    };
    let first = render(&parallel);
    assert_eq!(first, render(&parallel));
    assert_eq!(first, render(&sequential));
}

#[test]
fn invalid_config_is_rejected() {
    let data = dataset(df! { "votes" => &["1"] }.unwrap());
    let references = References::default();
    let config = QaConfig {
        outlier_threshold: 0.0,
        ..QaConfig::default()
    };
    let result = run_checks(&CheckContext::new(&data, &references, &config, None));
    assert!(matches!(result, Err(QaError::InvalidConfig { .. })));
}

#[test]
fn cancelled_run_marks_checks_timed_out() {
    let data = dataset(df! { "votes" => &["1"] }.unwrap());
    let references = References::default();
    let config = QaConfig::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let report =
        run_checks_with_cancel(&CheckContext::new(&data, &references, &config, None), &cancel)
            .unwrap();
    assert_eq!(report.get(CheckKey::Fields), Some(&CheckOutcome::TimedOut));
    assert_eq!(report.incomplete().len(), CheckKey::ALL.len() - 2);
    assert_eq!(
        report.get(CheckKey::DatasetInfo).map(CheckOutcome::status),
        Some("completed")
    );
}
