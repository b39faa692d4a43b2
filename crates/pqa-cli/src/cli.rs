//! CLI argument definitions for the precinct QA checker.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "precinct-qa",
    version,
    about = "Quality checks for precinct-level election results",
    long_about = "Run quality checks over a precinct-level election results file.\n\n\
                  Validates schema, field formats, naming patterns, duplicates,\n\
                  vote totals and geographic identifiers, and writes a JSON report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a results file and write a JSON report.
    Check(CheckArgs),

    /// Print the default configuration as TOML.
    Defaults,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Results file to check (CSV or TSV).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// TOML configuration overriding the defaults.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the reference tables (default: $PQA_REFERENCE_DIR or help_files/).
    #[arg(long = "reference-dir", value_name = "DIR")]
    pub reference_dir: Option<PathBuf>,

    /// State codes table (overrides the reference directory).
    #[arg(long = "state-codes", value_name = "PATH")]
    pub state_codes: Option<PathBuf>,

    /// County FIPS table (overrides the reference directory).
    #[arg(long = "county-fips", value_name = "PATH")]
    pub county_fips: Option<PathBuf>,

    /// Postal code of the state the file covers (default: inferred from the file name).
    #[arg(long = "state", value_name = "PO")]
    pub state: Option<String>,

    /// Report path (default: <FILE> with a .qa.json extension).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Run checks one after another instead of on the thread pool.
    #[arg(long = "sequential")]
    pub sequential: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
