//! Classification of `votes` cells.

use pqa_model::{QaConfig, parse_f64};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoteValue {
    Numeric(f64),
    /// The configured redaction sentinel.
    Redacted,
    /// Neither numeric nor the sentinel; includes empty cells.
    Invalid,
}

impl VoteValue {
    pub fn classify(raw: &str, config: &QaConfig) -> Self {
        if config.is_redacted(raw) {
            return Self::Redacted;
        }
        match parse_f64(raw) {
            Some(value) => Self::Numeric(value),
            None => Self::Invalid,
        }
    }

    /// Numeric value, with redacted and invalid cells contributing zero.
    pub fn or_zero(self) -> f64 {
        match self {
            Self::Numeric(value) => value,
            Self::Redacted | Self::Invalid => 0.0,
        }
    }

    pub fn numeric(self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(value),
            Self::Redacted | Self::Invalid => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_votes() {
        let config = QaConfig::default();
        assert_eq!(VoteValue::classify("12", &config), VoteValue::Numeric(12.0));
        assert_eq!(VoteValue::classify("*", &config), VoteValue::Redacted);
        assert_eq!(VoteValue::classify("", &config), VoteValue::Invalid);
        assert_eq!(VoteValue::classify("12a", &config), VoteValue::Invalid);
        assert_eq!(VoteValue::classify("-3", &config), VoteValue::Numeric(-3.0));
        assert_eq!(VoteValue::Redacted.or_zero(), 0.0);
    }
}
