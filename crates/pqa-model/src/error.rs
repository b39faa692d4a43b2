use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("dataset shape mismatch: row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("duplicate column name: {column}")]
    DuplicateColumn { column: String },

    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl QaError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
