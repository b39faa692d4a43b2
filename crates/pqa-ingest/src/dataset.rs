//! Results file reading.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use pqa_model::Dataset;

use crate::error::{IngestError, Result};

/// Field separator of a results file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }
}

/// Infers the separator from the file extension, falling back to the header line.
pub fn detect_delimiter(path: &Path, header_line: &str) -> Delimiter {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("tsv" | "tab") => Delimiter::Tab,
        Some("csv") => Delimiter::Comma,
        _ if header_line.contains('\t') => Delimiter::Tab,
        _ => Delimiter::Comma,
    }
}

/// Detect encoding and validate it's supported (UTF-8 only).
///
/// Checks for UTF-16 BOM markers which are not supported.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| IngestError::open(path, e))?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        if buffer == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }

    Ok(())
}

fn read_header_line(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    // Skip BOM if present
    let cleaned = line
        .strip_prefix('\u{feff}')
        .unwrap_or(&line)
        .trim_end_matches(['\r', '\n']);
    if read == 0 || cleaned.trim().is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    Ok(cleaned.to_string())
}

fn parse_header(path: &Path, line: &str, delimiter: Delimiter) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter.as_byte())
        .from_reader(line.as_bytes());
    let record = reader
        .records()
        .next()
        .transpose()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .unwrap_or_default();
    let columns: Vec<String> = record.iter().map(|name| name.trim().to_string()).collect();
    if columns.iter().any(String::is_empty) {
        return Err(IngestError::EmptyColumnName {
            path: path.to_path_buf(),
        });
    }
    Ok(columns)
}

/// Reads a results file into a Polars DataFrame with every column as text.
///
/// Schema inference is disabled so codes such as `01` or `00012` keep their
/// zero padding.
pub fn read_dataset_frame(path: &Path) -> Result<DataFrame> {
    validate_encoding(path)?;
    let header_line = read_header_line(path)?;
    let delimiter = detect_delimiter(path, &header_line);
    let columns = parse_header(path, &header_line, delimiter)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(delimiter.as_byte()))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if df.width() != columns.len() {
        return Err(IngestError::CsvParse {
            path: path.to_path_buf(),
            message: format!(
                "header has {} columns but {} were read",
                columns.len(),
                df.width()
            ),
        });
    }

    Ok(df)
}

/// Reads a results file into an immutable [`Dataset`].
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let df = read_dataset_frame(path)?;
    let dataset = Dataset::from_frame(&df).map_err(|e| IngestError::InvalidDataset {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.height(),
        columns = dataset.width(),
        "loaded dataset"
    );
    Ok(dataset)
}
