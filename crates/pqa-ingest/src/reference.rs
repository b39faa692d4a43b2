//! Reference table loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use pqa_model::{
    CountyFips, CountyFipsTable, Reference, References, StateCode, StateCodeTable,
};

use crate::error::{IngestError, Result};

/// Default file name of the state identity table.
pub const STATE_CODES_FILE: &str = "merge_on_statecodes.csv";
/// Default file name of the county FIPS table.
pub const COUNTY_FIPS_FILE: &str = "county-fips-codes.csv";

/// Locations of the reference tables for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePaths {
    pub state_codes: PathBuf,
    pub county_fips: PathBuf,
}

impl ReferencePaths {
    /// The default file names inside a reference directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            state_codes: dir.join(STATE_CODES_FILE),
            county_fips: dir.join(COUNTY_FIPS_FILE),
        }
    }
}

type Row = BTreeMap<String, String>;

/// Reads a CSV file into row maps keyed by trimmed, lowercased header.
fn read_csv_rows(path: &Path) -> Result<Vec<Row>> {
    let parse_err = |e: csv::Error| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let file = std::fs::File::open(path).map_err(|e| IngestError::open(path, e))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_err)?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.clone(), value.trim().to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn require_columns(path: &Path, rows: &[Row], columns: &[&str]) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for column in columns {
        if !first.contains_key(*column) {
            return Err(IngestError::MissingColumn {
                column: (*column).to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn get_field(row: &Row, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

/// Left-pads an all-digit code with zeros to `width`.
fn zero_pad(value: &str, width: usize) -> String {
    if !value.is_empty() && value.len() < width && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{value:0>width$}")
    } else {
        value.to_string()
    }
}

/// Reads the state identity table.
pub fn read_state_codes(path: &Path) -> Result<StateCodeTable> {
    let rows = read_csv_rows(path)?;
    require_columns(path, &rows, &["state", "state_po", "state_fips"])?;
    let entries: Vec<StateCode> = rows
        .iter()
        .filter(|row| !get_field(row, "state_po").is_empty())
        .map(|row| StateCode {
            state: get_field(row, "state"),
            state_po: get_field(row, "state_po").to_ascii_uppercase(),
            state_fips: zero_pad(&get_field(row, "state_fips"), 2),
            state_ic: get_field(row, "state_ic"),
            state_cen: get_field(row, "state_cen"),
        })
        .collect();
    tracing::info!(path = %path.display(), entries = entries.len(), "loaded state codes");
    Ok(StateCodeTable::new(entries))
}

/// Reads the county FIPS table.
pub fn read_county_fips(path: &Path) -> Result<CountyFipsTable> {
    let rows = read_csv_rows(path)?;
    require_columns(path, &rows, &["county_fips"])?;
    let entries: Vec<CountyFips> = rows
        .iter()
        .filter(|row| !get_field(row, "county_fips").is_empty())
        .map(|row| CountyFips {
            state: get_field(row, "state"),
            county_name: get_field(row, "county_name"),
            county_fips: zero_pad(&get_field(row, "county_fips"), 5),
        })
        .collect();
    tracing::info!(path = %path.display(), entries = entries.len(), "loaded county fips");
    Ok(CountyFipsTable::new(entries))
}

fn load_optional<T>(path: &Path, read: impl Fn(&Path) -> Result<T>) -> Result<Reference<T>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "reference table not found");
        return Ok(Reference::absent(format!(
            "reference table not found: {}",
            path.display()
        )));
    }
    read(path).map(Reference::Present)
}

/// Loads both reference tables.
///
/// A missing file becomes [`Reference::Absent`]; a file that exists but
/// cannot be read or parsed is an error.
pub fn load_references(paths: &ReferencePaths) -> Result<References> {
    Ok(References {
        state_codes: load_optional(&paths.state_codes, read_state_codes)?,
        county_fips: load_optional(&paths.county_fips, read_county_fips)?,
    })
}
