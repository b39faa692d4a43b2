//! Categorical and fixed-format field rules reported under `field_formats`.

use std::sync::LazyLock;

use pqa_model::{IssueRecord, QaConfig};
use regex::Regex;

use crate::collector::IssueCollector;
use crate::context::CheckContext;

pub const MISSING_VALUE: &str = "MISSING_VALUE";
pub const INVALID_VALUE: &str = "INVALID_VALUE";
pub const NOT_ZERO_PADDED: &str = "NOT_ZERO_PADDED";
pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
pub const UNPADDED_NUMERICAL_DISTRICT: &str = "UNPADDED_NUMERICAL_DISTRICT";

static STATE_PO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("Invalid state_po regex"));
static YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("Invalid year regex"));
/// Calendar date in `YYYY-MM-DD` form.
static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("Invalid date regex")
});
static SHORT_DISTRICT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}$").expect("Invalid district regex"));

#[derive(Debug, Clone, Copy)]
enum Pattern {
    StatePo,
    Year,
    Date,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        match self {
            Self::StatePo => &STATE_PO_REGEX,
            Self::Year => &YEAR_REGEX,
            Self::Date => &DATE_REGEX,
        }
    }
}

/// How one column is validated.
#[derive(Debug, Clone, Copy)]
enum FieldRule {
    /// Value must be one of a configured set.
    Enumerated(fn(&QaConfig) -> &[String]),
    /// All-digit code of a fixed width.
    Fips(usize),
    Pattern(Pattern),
    /// Numeric districts should be zero padded to three digits.
    District,
}

fn party_values(config: &QaConfig) -> &[String] {
    &config.valid_party_simplified
}

fn mode_values(config: &QaConfig) -> &[String] {
    &config.valid_modes
}

fn stage_values(config: &QaConfig) -> &[String] {
    &config.valid_stages
}

fn boolean_values(config: &QaConfig) -> &[String] {
    &config.valid_booleans
}

fn dataverse_values(config: &QaConfig) -> &[String] {
    &config.valid_dataverses
}

impl FieldRule {
    fn kinds(self) -> &'static [&'static str] {
        match self {
            Self::Enumerated(_) => &[MISSING_VALUE, INVALID_VALUE],
            Self::Fips(_) => &[NOT_ZERO_PADDED, INVALID_FORMAT],
            Self::Pattern(_) => &[INVALID_FORMAT],
            Self::District => &[UNPADDED_NUMERICAL_DISTRICT],
        }
    }
}

const RULES: &[(&str, FieldRule)] = &[
    ("party_simplified", FieldRule::Enumerated(party_values)),
    ("mode", FieldRule::Enumerated(mode_values)),
    ("stage", FieldRule::Enumerated(stage_values)),
    ("special", FieldRule::Enumerated(boolean_values)),
    ("writein", FieldRule::Enumerated(boolean_values)),
    ("dataverse", FieldRule::Enumerated(dataverse_values)),
    ("state_fips", FieldRule::Fips(2)),
    ("county_fips", FieldRule::Fips(5)),
    ("jurisdiction_fips", FieldRule::Fips(10)),
    ("state_po", FieldRule::Pattern(Pattern::StatePo)),
    ("year", FieldRule::Pattern(Pattern::Year)),
    ("date", FieldRule::Pattern(Pattern::Date)),
    ("district", FieldRule::District),
];

/// The allowed values of a column with an enumerated rule.
pub fn enumerated_values<'c>(column: &str, config: &'c QaConfig) -> Option<&'c [String]> {
    RULES.iter().find_map(|(name, rule)| match rule {
        FieldRule::Enumerated(values) if *name == column => Some(values(config)),
        _ => None,
    })
}

/// Run every field rule whose column is present.
pub fn check(ctx: &CheckContext<'_>) -> Vec<IssueRecord> {
    let mut records = Vec::new();
    for (column, rule) in RULES {
        let Some(values) = ctx.dataset.column(column) else {
            continue;
        };
        let mut collector =
            IssueCollector::with_kinds(column, rule.kinds().iter().copied(), ctx.config.sample_limit);
        for (pos, value) in values.iter().enumerate() {
            if let Some(kind) = classify(*rule, value, ctx.config) {
                collector.record(kind, pos, value);
            }
        }
        records.extend(collector.finish());
    }
    records
}

fn classify(rule: FieldRule, value: &str, config: &QaConfig) -> Option<&'static str> {
    match rule {
        FieldRule::Enumerated(values) => {
            let allowed = values(config);
            if config.is_missing(value) {
                let allows_empty = allowed.iter().any(String::is_empty);
                return match (allows_empty, value.is_empty()) {
                    (true, true) => None,
                    (true, false) => Some(INVALID_VALUE),
                    (false, _) => Some(MISSING_VALUE),
                };
            }
            (!allowed.iter().any(|v| v == value)).then_some(INVALID_VALUE)
        }
        _ if config.is_missing(value) => None,
        FieldRule::Fips(width) => {
            let all_digits = value.bytes().all(|b| b.is_ascii_digit());
            if all_digits && value.len() == width {
                None
            } else if all_digits && value.len() < width {
                Some(NOT_ZERO_PADDED)
            } else {
                Some(INVALID_FORMAT)
            }
        }
        FieldRule::Pattern(pattern) => (!pattern.regex().is_match(value)).then_some(INVALID_FORMAT),
        FieldRule::District => SHORT_DISTRICT_REGEX
            .is_match(value)
            .then_some(UNPADDED_NUMERICAL_DISTRICT),
    }
}
