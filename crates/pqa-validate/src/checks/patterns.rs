//! Pattern and text-hygiene rules reported under `field_regex_checks`.
//!
//! Each column gets one record merging its column-specific pattern kinds
//! (for `votes`, `magnitude` and `candidate`) with the generic hygiene kinds
//! applied to every configured free-text column.

use std::collections::HashSet;
use std::sync::LazyLock;

use pqa_model::{IssueRecord, QaConfig};
use regex::Regex;

use crate::collector::IssueCollector;
use crate::context::CheckContext;

pub const NON_CANONICAL_TOKEN: &str = "NON-CANONICAL OVERVOTES/UNDERVOTES/WRITE-IN";

enum Matcher {
    Regex(Regex),
    Predicate(fn(&str) -> bool),
}

struct Rule {
    kind: &'static str,
    matcher: Matcher,
}

impl Rule {
    fn regex(kind: &'static str, pattern: &str) -> Self {
        Self {
            kind,
            matcher: Matcher::Regex(Regex::new(pattern).expect("Invalid field pattern regex")),
        }
    }

    fn predicate(kind: &'static str, test: fn(&str) -> bool) -> Self {
        Self {
            kind,
            matcher: Matcher::Predicate(test),
        }
    }

    fn matches(&self, value: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(value),
            Matcher::Predicate(test) => test(value),
        }
    }
}

fn count_numeric_rules() -> Vec<Rule> {
    vec![
        Rule::regex("UNRECOGNIZED CHARACTERS", r"[^0-9\-]"),
        Rule::regex("UNRECOGNIZED NEGATIVE SIGNS", r"^.+-|-([^1-9]|$)"),
        Rule::regex("UNRECOGNIZED LEADING ZEROS", r"^0."),
        Rule::regex("(POSSIBLY) INVALID NEGATIVE VALUES", r"^-[1-9]"),
    ]
}

static VOTES_RULES: LazyLock<Vec<Rule>> = LazyLock::new(count_numeric_rules);

static MAGNITUDE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let mut rules = count_numeric_rules();
    rules.push(Rule::predicate("NOT A POSITIVE INTEGER", |value| {
        value.is_empty() || value.starts_with('0') || !value.bytes().all(|b| b.is_ascii_digit())
    }));
    rules
});

static CANDIDATE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::regex("UNRECOGNIZED CHARACTERS", r#"[^A-Z0-9"\-'/% ]"#),
        Rule::regex(
            "INVALID BEGINNING CHARACTERS",
            r#"^"($|[^"]|".+$)|^[^A-Z0-9"]"#,
        ),
        Rule::regex("INVALID ENDING CHARACTERS", r#"(^|[^"]|.+")"$|[^A-Z0-9"]$"#),
        Rule::regex(
            "EXTRANEOUS CONSECUTIVE SYMBOLS",
            r#""".+|.+""|--|''|  |//"#,
        ),
        Rule::predicate("EXTRANEOUS SPACES", has_extraneous_hyphen_space),
        Rule::predicate("EXTRANEOUS QUOTATION MARKS", |value| {
            value.matches('"').count() % 2 == 1
        }),
        Rule::predicate("(POSSIBLY) EXTRANEOUS SINGLE QUOTATION MARKS", |value| {
            value.matches('\'').count() >= 2
        }),
        Rule::regex("(POSSIBLY) SUFFIX NOT AT THE END", r"\b(SR|JR|II|III|IV) "),
        Rule::regex("(POSSIBLY) SUFFIX AFTER NICKNAME", r#"" (SR|JR|II|III|IV)\b"#),
    ]
});

static RUNNING_MATE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::regex("POSSIBLE RUNNING-MATE (AND)", r"\bAND\b"),
        Rule::regex("POSSIBLE RUNNING-MATE (&)", r"&"),
        Rule::regex("POSSIBLE RUNNING-MATE (SLASH)", r"\s/\s"),
        Rule::regex("POSSIBLE RUNNING-MATE (SPACE-HYPHEN-SPACE)", r"\s-\s"),
    ]
});

static HYGIENE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::predicate("EXTRANEOUS_LEADING_OR_TRAILING_WHITESPACE", |value| {
            value != value.trim()
        }),
        Rule::regex("EMBEDDED_NEWLINES", r"[\r\n]"),
        Rule::regex("MULTIPLE_CONSECUTIVE_SPACES", r" {2,}"),
        Rule::predicate("NON_ASCII_CHARACTERS", |value| !value.is_ascii()),
        Rule::predicate("NONSTANDARD_SYMBOLS", has_nonstandard_symbol),
        Rule::regex(
            "SQUISHED_INITIALS_NO_SPACE",
            r"(?i)\b(?:[A-Z]\.){1,3}[A-Z]{2,}",
        ),
        Rule::predicate("LOWERCASE_LETTERS", |value| {
            value.bytes().any(|b| b.is_ascii_lowercase())
        }),
        Rule::predicate("ODD_NUMBER_OF_DOUBLE_QUOTES", |value| {
            value.matches('"').count() % 2 == 1
        }),
        Rule::predicate("ODD_NUMBER_OF_SINGLE_QUOTES", |value| {
            value.matches('\'').count() % 2 == 1
        }),
        Rule::predicate("DUPLICATE_TOKENS_WITHIN_VALUE", has_duplicate_tokens),
    ]
});

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w']+\b").expect("Invalid token regex"));

/// Whether any word token repeats within the value, ignoring case.
fn has_duplicate_tokens(value: &str) -> bool {
    let mut seen = HashSet::new();
    TOKEN_REGEX
        .find_iter(value)
        .any(|token| !seen.insert(token.as_str().to_lowercase()))
}

const ALLOWED_SYMBOLS: &str = ".,;:'\"-/&()?!%$@#";

fn has_nonstandard_symbol(value: &str) -> bool {
    value.chars().any(|c| {
        c.is_ascii()
            && !c.is_ascii_alphanumeric()
            && !c.is_ascii_whitespace()
            && !ALLOWED_SYMBOLS.contains(c)
    })
}

/// A space-hyphen not followed by a space, or a hyphen-space not introducing
/// a ballot-measure choice or aggregate label (`- YES`, `- TOTAL`).
fn has_extraneous_hyphen_space(value: &str) -> bool {
    let bytes = value.as_bytes();
    for (idx, window) in bytes.windows(2).enumerate() {
        if window == b" -" && bytes.get(idx + 2) != Some(&b' ') {
            return true;
        }
        if window == b"- " {
            let rest = &value[idx + 2..];
            let allowed = matches!(rest, "YES" | "NO" | "OVERVOTES" | "UNDERVOTES")
                || rest.starts_with("BLANK")
                || rest.starts_with("TOTAL");
            if !allowed {
                return true;
            }
        }
    }
    false
}

/// Upper-cased form with spaces, hyphens and a trailing plural `S` removed.
fn token_stem(value: &str) -> String {
    let upper: String = value
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect::<String>()
        .to_uppercase();
    upper.trim_end_matches('S').to_string()
}

/// A spelling variant of a canonical token such as `OVER VOTES` or `WriteIn`.
fn is_non_canonical_token(value: &str, config: &QaConfig) -> bool {
    let trimmed = value.trim();
    if config
        .canonical_candidate_tokens
        .iter()
        .any(|token| token == trimmed)
    {
        return false;
    }
    let stem = token_stem(trimmed);
    !stem.is_empty()
        && config
            .canonical_candidate_tokens
            .iter()
            .any(|token| token_stem(token) == stem)
}

fn column_rules(column: &str) -> Vec<&'static Rule> {
    match column {
        "votes" => VOTES_RULES.iter().collect(),
        "magnitude" => MAGNITUDE_RULES.iter().collect(),
        "candidate" => CANDIDATE_RULES
            .iter()
            .chain(RUNNING_MATE_RULES.iter())
            .collect(),
        _ => Vec::new(),
    }
}

/// Columns checked, in report order.
fn checked_columns(config: &QaConfig) -> Vec<&str> {
    let mut columns = vec!["votes", "magnitude", "candidate"];
    for column in &config.free_text_columns {
        if !columns.contains(&column.as_str()) {
            columns.push(column);
        }
    }
    columns
}

pub fn check(ctx: &CheckContext<'_>) -> Vec<IssueRecord> {
    let config = ctx.config;
    let mut records = Vec::new();

    for column in checked_columns(config) {
        let Some(values) = ctx.dataset.column(column) else {
            continue;
        };
        let specific = column_rules(column);
        let hygiene = config.free_text_columns.iter().any(|c| c == column);
        if specific.is_empty() && !hygiene {
            continue;
        }

        let mut kinds: Vec<&str> = specific.iter().map(|rule| rule.kind).collect();
        if column == "candidate" {
            kinds.insert(CANDIDATE_RULES.len(), NON_CANONICAL_TOKEN);
        }
        if hygiene {
            kinds.extend(HYGIENE_RULES.iter().map(|rule| rule.kind));
        }
        let mut collector = IssueCollector::with_kinds(column, kinds, config.sample_limit);

        for (pos, raw) in values.iter().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if hygiene {
                for rule in HYGIENE_RULES.iter() {
                    if rule.matches(raw) {
                        collector.record(rule.kind, pos, raw);
                    }
                }
            }
            match column {
                "votes" if config.is_redacted(raw) => {}
                "candidate" => {
                    let upper = trimmed.to_uppercase();
                    for rule in &specific {
                        if rule.matches(&upper) {
                            collector.record(rule.kind, pos, raw);
                        }
                    }
                    if is_non_canonical_token(trimmed, config) {
                        collector.record(NON_CANONICAL_TOKEN, pos, raw);
                    }
                }
                _ => {
                    for rule in &specific {
                        if rule.matches(trimmed) {
                            collector.record(rule.kind, pos, raw);
                        }
                    }
                }
            }
        }
        records.extend(collector.finish());
    }
    records
}
