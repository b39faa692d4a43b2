//! Error types for loading results files and reference tables.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading inputs.
///
/// All of these are fatal for a run: no report is produced.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported encoding.
    #[error("unsupported encoding in {path}: {encoding} (only UTF-8 is supported)")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === Parsing Errors ===
    /// Failed to parse delimited text.
    #[error("failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// File has no header line.
    #[error("file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Header contains a blank column name.
    #[error("empty column name in header of {path}")]
    EmptyColumnName { path: PathBuf },

    /// Required column not found in a reference table.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Loaded frame could not be turned into a dataset.
    #[error("invalid dataset {path}: {message}")]
    InvalidDataset { path: PathBuf, message: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl IngestError {
    pub(crate) fn open(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, IngestError>;
