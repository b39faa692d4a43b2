//! Tests for the `check` and `defaults` commands.

use std::fs;
use std::path::Path;

use clap::Parser;
use pqa_cli::cli::{CheckArgs, Cli, Command};
use pqa_cli::commands::{load_config, run_check};
use pqa_cli::report::{REPORT_SCHEMA, REPORT_SCHEMA_VERSION, compute_file_sha256, read_report};
use pqa_model::{CheckKey, CheckOutcome, QaConfig};

const RESULTS: &str = "\
state,state_po,state_fips,county_name,county_fips,precinct,office,candidate,votes
ALABAMA,AL,01,AUTAUGA,01001,001,US HOUSE,JANE DOE,10
ALABAMA,AL,01,AUTAUGA,01001,001,US HOUSE,JANE DOE,10
ALABAMA,AL,01,COFFEE,02020,002,US HOUSE,JOHN SMITH,7
";

fn write_references(dir: &Path) {
    fs::write(
        dir.join("merge_on_statecodes.csv"),
        "state,state_po,state_fips,state_cen,state_ic\nAlabama,AL,1,63,41\n",
    )
    .unwrap();
    fs::write(
        dir.join("county-fips-codes.csv"),
        "state,county_name,county_fips\nAlabama,AUTAUGA,1001\nAlabama,COFFEE,1031\n",
    )
    .unwrap();
}

fn args(file: &Path, reference_dir: &Path) -> CheckArgs {
    CheckArgs {
        file: file.to_path_buf(),
        config: None,
        reference_dir: Some(reference_dir.to_path_buf()),
        state_codes: None,
        county_fips: None,
        state: None,
        output: None,
        sequential: false,
    }
}

#[test]
fn check_writes_envelope_beside_input() {
    let dir = tempfile::tempdir().unwrap();
    write_references(dir.path());
    let file = dir.path().join("AL_precinct_2022.csv");
    fs::write(&file, RESULTS).unwrap();

    let run = run_check(&args(&file, dir.path())).unwrap();
    assert_eq!(run.report_path, dir.path().join("AL_precinct_2022.qa.json"));
    assert!(run.has_issues());

    let envelope = read_report(&run.report_path).unwrap();
    assert_eq!(envelope, run.envelope);
    assert_eq!(envelope.schema, REPORT_SCHEMA);
    assert_eq!(envelope.schema_version, REPORT_SCHEMA_VERSION);
    assert_eq!(envelope.input_sha256, compute_file_sha256(&file).unwrap());

    let report = &envelope.report;
    let detected = report.scalar(CheckKey::DetectedState).unwrap();
    assert_eq!(detected.text("state_po"), Some("AL"));
    assert_eq!(detected.text("state_fips"), Some("01"));
    assert_eq!(detected.text("source"), Some("filename"));

    let summary = report.scalar(CheckKey::DuplicatesSummary).unwrap();
    assert_eq!(summary.integer("exact"), Some(1));
    let invalid = report
        .issues(CheckKey::FipsChecks)
        .iter()
        .find(|record| record.issue == "invalid_county_fips")
        .unwrap();
    assert_eq!(invalid.issue_row_numbers, vec![3]);
}

#[test]
fn missing_reference_tables_skip_geo_checks() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("results.csv");
    fs::write(&file, RESULTS).unwrap();
    let output = dir.path().join("out.json");

    let mut args = args(&file, &dir.path().join("nowhere"));
    args.output = Some(output.clone());
    args.sequential = true;
    let run = run_check(&args).unwrap();

    assert_eq!(run.report_path, output);
    let report = &run.envelope.report;
    for key in [CheckKey::StateCodes, CheckKey::FipsChecks, CheckKey::DetectedState] {
        assert!(matches!(report.get(key), Some(CheckOutcome::Skipped { .. })));
    }
}

#[test]
fn explicit_state_overrides_filename() {
    let dir = tempfile::tempdir().unwrap();
    write_references(dir.path());
    let file = dir.path().join("AK_results.csv");
    fs::write(&file, RESULTS).unwrap();

    let mut args = args(&file, dir.path());
    args.state = Some("al".to_string());
    let run = run_check(&args).unwrap();
    let detected = run.envelope.report.scalar(CheckKey::DetectedState).unwrap();
    assert_eq!(detected.text("state_po"), Some("AL"));
    assert_eq!(detected.text("source"), Some("argument"));
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = run_check(&args(&dir.path().join("absent.csv"), dir.path())).unwrap_err();
    assert!(format!("{error:#}").contains("absent.csv"));
}

#[test]
fn config_file_and_sequential_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("qa.toml");
    fs::write(&config_path, "outlier_threshold = 5.0\nsample_limit = 3\n").unwrap();

    let mut args = args(Path::new("results.csv"), dir.path());
    args.config = Some(config_path);
    args.sequential = true;
    let config = load_config(&args).unwrap();
    assert_eq!(config.outlier_threshold, 5.0);
    assert_eq!(config.sample_limit, 3);
    assert!(!config.parallel);
    assert_eq!(config.required_columns, QaConfig::default().required_columns);
}

#[test]
fn parses_check_arguments() {
    let cli = Cli::try_parse_from([
        "precinct-qa",
        "--log-format",
        "json",
        "check",
        "AL.csv",
        "--state",
        "AL",
        "--sequential",
    ])
    .unwrap();
    let Command::Check(args) = cli.command else {
        panic!("expected check command");
    };
    assert_eq!(args.file, Path::new("AL.csv"));
    assert_eq!(args.state.as_deref(), Some("AL"));
    assert!(args.sequential);
}

#[test]
fn parses_defaults_command() {
    let cli = Cli::try_parse_from(["precinct-qa", "defaults"]).unwrap();
    assert!(matches!(cli.command, Command::Defaults));
}
