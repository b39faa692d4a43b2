//! JSON report envelope written next to each checked file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use pqa_model::QaReport;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

pub const REPORT_SCHEMA: &str = "precinct-qa-report";
pub const REPORT_SCHEMA_VERSION: u32 = 1;

const BUFFER_SIZE: usize = 65536;

/// The persisted report: run metadata around the engine's composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub schema: String,
    pub schema_version: u32,
    /// RFC 3339 timestamp in UTC.
    pub generated_at: String,
    pub input: String,
    pub input_sha256: String,
    pub report: QaReport,
}

impl ReportEnvelope {
    pub fn new(input: &Path, input_sha256: String, report: QaReport) -> Self {
        Self {
            schema: REPORT_SCHEMA.to_string(),
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            input: input.display().to_string(),
            input_sha256,
            report,
        }
    }
}

/// Compute the SHA256 hash of a file as lowercase hex.
pub fn compute_file_sha256(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("open {} for hashing", path.display()))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hex_hash = hex::encode(hasher.finalize());
    debug!(path = %path.display(), sha256 = %hex_hash, "hashed input");
    Ok(hex_hash)
}

/// Default report location: the input path with a `.qa.json` extension.
pub fn default_report_path(input: &Path) -> PathBuf {
    input.with_extension("qa.json")
}

pub fn write_report(path: &Path, envelope: &ReportEnvelope) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, envelope)
        .with_context(|| format!("serialize report to {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_report(path: &Path) -> Result<ReportEnvelope> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse report {}", path.display()))
}
