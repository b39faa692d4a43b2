use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use pqa_ingest::{
    ReferencePaths, detect_state_from_filename, detected_state_from_po, load_references,
    read_dataset, reference_dir,
};
use pqa_model::QaConfig;
use pqa_validate::{CheckContext, run_checks};

use crate::cli::CheckArgs;
use crate::report::{ReportEnvelope, compute_file_sha256, default_report_path, write_report};

/// A finished `check` run.
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub envelope: ReportEnvelope,
    pub report_path: PathBuf,
}

impl CheckRun {
    pub fn has_issues(&self) -> bool {
        self.envelope.report.total_issues() > 0
    }
}

pub fn load_config(args: &CheckArgs) -> Result<QaConfig> {
    let mut config = match &args.config {
        Some(path) => QaConfig::load(path)?,
        None => QaConfig::default(),
    };
    if args.sequential {
        config.parallel = false;
    }
    Ok(config)
}

fn reference_paths(args: &CheckArgs) -> ReferencePaths {
    let dir = args.reference_dir.clone().unwrap_or_else(reference_dir);
    let mut paths = ReferencePaths::in_dir(&dir);
    if let Some(path) = &args.state_codes {
        paths.state_codes = path.clone();
    }
    if let Some(path) = &args.county_fips {
        paths.county_fips = path.clone();
    }
    paths
}

pub fn run_check(args: &CheckArgs) -> Result<CheckRun> {
    let file = &args.file;
    let span = info_span!("check", file = %file.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_config(args)?;
    let references = load_references(&reference_paths(args)).context("load reference tables")?;
    let dataset = read_dataset(file).with_context(|| format!("read {}", file.display()))?;

    let state_codes = references.state_codes.as_present();
    let detected = match &args.state {
        Some(po) => Some(detected_state_from_po(po, state_codes)),
        None => state_codes.and_then(|table| detect_state_from_filename(file, table)),
    };

    let ctx = CheckContext::new(&dataset, &references, &config, detected.as_ref());
    let report = run_checks(&ctx)?;

    let digest = compute_file_sha256(file)?;
    let envelope = ReportEnvelope::new(file, digest, report);
    let report_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_report_path(file));
    write_report(&report_path, &envelope)?;

    info!(
        report = %report_path.display(),
        issues = envelope.report.total_issues(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "check complete"
    );
    Ok(CheckRun {
        envelope,
        report_path,
    })
}

pub fn run_defaults() -> Result<()> {
    let toml = QaConfig::default()
        .to_toml_string()
        .context("render default configuration")?;
    print!("{toml}");
    Ok(())
}
