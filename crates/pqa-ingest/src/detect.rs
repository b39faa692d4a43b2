//! State detection for a results file.

use std::path::Path;

use pqa_model::{DetectedState, StateCodeTable};

/// Infers the state from the two-letter prefix of the file stem.
///
/// `AL_precinct_general.csv` resolves to Alabama when the state table has an
/// `AL` entry. Returns `None` when the prefix matches nothing.
pub fn detect_state_from_filename(path: &Path, table: &StateCodeTable) -> Option<DetectedState> {
    let stem = path.file_stem()?.to_str()?;
    let prefix = stem.get(..2)?;
    if !prefix.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    table
        .by_po(prefix)
        .map(|entry| DetectedState::from_po(&entry.state_po, "filename").resolved(table))
}

/// Builds a detected state from an explicit postal code, resolving it when a
/// state table is available.
pub fn detected_state_from_po(state_po: &str, table: Option<&StateCodeTable>) -> DetectedState {
    let detected = DetectedState::from_po(state_po.trim(), "argument");
    match table {
        Some(table) => detected.resolved(table),
        None => detected,
    }
}
