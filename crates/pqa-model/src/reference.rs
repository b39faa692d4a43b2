//! Canonical reference tables the geographic checks compare against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A reference table that may or may not have been supplied for the run.
///
/// Decided by the loader before the engine starts; checks that need an
/// absent table report `skipped` with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<T> {
    Present(T),
    Absent { reason: String },
}

impl<T> Reference<T> {
    pub fn absent(reason: impl Into<String>) -> Self {
        Self::Absent {
            reason: reason.into(),
        }
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent { .. } => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn absent_reason(&self) -> Option<&str> {
        match self {
            Self::Present(_) => None,
            Self::Absent { reason } => Some(reason),
        }
    }
}

/// One canonical state identity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCode {
    pub state: String,
    pub state_po: String,
    pub state_fips: String,
    pub state_ic: String,
    pub state_cen: String,
}

impl StateCode {
    /// Value of the identity field that corresponds to a dataset column.
    pub fn field(&self, column: &str) -> Option<&str> {
        match column {
            "state" => Some(&self.state),
            "state_po" => Some(&self.state_po),
            "state_fips" => Some(&self.state_fips),
            "state_ic" => Some(&self.state_ic),
            "state_cen" => Some(&self.state_cen),
            _ => None,
        }
    }
}

/// Columns that together identify a state, in comparison order.
pub const STATE_IDENTITY_COLUMNS: [&str; 5] =
    ["state_po", "state_fips", "state", "state_ic", "state_cen"];

/// Compares one state identity field the way the reference data is curated:
/// postal codes and names ignore case, census and ICPSR codes ignore leading
/// zeros, FIPS codes compare exactly.
pub fn state_field_matches(column: &str, row_value: &str, reference: &str) -> bool {
    let row_value = row_value.trim();
    let reference = reference.trim();
    match column {
        "state_po" | "state" => row_value.eq_ignore_ascii_case(reference),
        "state_ic" | "state_cen" => strip_leading_zeros(row_value) == strip_leading_zeros(reference),
        _ => row_value == reference,
    }
}

fn strip_leading_zeros(value: &str) -> &str {
    let stripped = value.trim_start_matches('0');
    if stripped.is_empty() && !value.is_empty() {
        "0"
    } else {
        stripped
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateCodeTable {
    entries: Vec<StateCode>,
    by_po: BTreeMap<String, usize>,
}

impl StateCodeTable {
    pub fn new(entries: Vec<StateCode>) -> Self {
        let by_po = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.state_po.trim().to_ascii_uppercase(), idx))
            .collect();
        Self { entries, by_po }
    }

    pub fn entries(&self) -> &[StateCode] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a state by postal code, ignoring case.
    pub fn by_po(&self, state_po: &str) -> Option<&StateCode> {
        self.by_po
            .get(&state_po.trim().to_ascii_uppercase())
            .map(|&idx| &self.entries[idx])
    }

    /// Number of reference entries matching every supplied `(column, value)` pair.
    pub fn count_matches(&self, fields: &[(&str, &str)]) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                fields.iter().all(|(column, value)| {
                    entry
                        .field(column)
                        .is_some_and(|reference| state_field_matches(column, value, reference))
                })
            })
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyFips {
    pub state: String,
    pub county_name: String,
    pub county_fips: String,
}

impl CountyFips {
    /// The 2-digit state prefix of the county code.
    pub fn state_prefix(&self) -> &str {
        self.county_fips.get(..2).unwrap_or(&self.county_fips)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountyFipsTable {
    by_fips: BTreeMap<String, CountyFips>,
}

impl CountyFipsTable {
    pub fn new(entries: impl IntoIterator<Item = CountyFips>) -> Self {
        let by_fips = entries
            .into_iter()
            .map(|entry| (entry.county_fips.clone(), entry))
            .collect();
        Self { by_fips }
    }

    pub fn get(&self, county_fips: &str) -> Option<&CountyFips> {
        self.by_fips.get(county_fips.trim())
    }

    pub fn len(&self) -> usize {
        self.by_fips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fips.is_empty()
    }
}

/// Every reference table the engine may consult.
#[derive(Debug, Clone)]
pub struct References {
    pub state_codes: Reference<StateCodeTable>,
    pub county_fips: Reference<CountyFipsTable>,
}

impl References {
    pub fn none(reason: &str) -> Self {
        Self {
            state_codes: Reference::absent(reason),
            county_fips: Reference::absent(reason),
        }
    }
}

impl Default for References {
    fn default() -> Self {
        Self::none("reference table not supplied")
    }
}

/// The state a dataset was inferred to belong to, typically from its filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedState {
    pub state_po: String,
    pub state: Option<String>,
    pub state_fips: Option<String>,
    pub source: String,
}

impl DetectedState {
    pub fn from_po(state_po: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            state_po: state_po.into().to_ascii_uppercase(),
            state: None,
            state_fips: None,
            source: source.into(),
        }
    }

    /// Fills in name and FIPS from the state table when the postal code resolves.
    pub fn resolved(mut self, table: &StateCodeTable) -> Self {
        if let Some(entry) = table.by_po(&self.state_po) {
            self.state = Some(entry.state.clone());
            self.state_fips = Some(entry.state_fips.clone());
        }
        self
    }
}
