//! Cell value conversion helpers.
//!
//! The engine treats every cell as text; these helpers turn Polars values
//! into that text and format numbers without trailing zeros.

use polars::prelude::AnyValue;

/// Converts a Polars AnyValue to a String representation.
/// Returns empty string for Null, properly formats numeric types.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => if b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_string(),
    }
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Parses a string as a finite f64, returning None for invalid or empty strings.
///
/// `NaN` and infinities parse successfully in Rust but are never vote counts.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_numeric_strips_trailing_zeros() {
        assert_eq!(format_numeric(12.0), "12");
        assert_eq!(format_numeric(12.50), "12.5");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(-3.0), "-3");
    }

    #[test]
    fn parse_f64_rejects_non_finite() {
        assert_eq!(parse_f64(" 42 "), Some(42.0));
        assert_eq!(parse_f64("1e3"), Some(1000.0));
        assert_eq!(parse_f64("nan"), None);
        assert_eq!(parse_f64("inf"), None);
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("*"), None);
    }

    #[test]
    fn any_to_string_handles_nulls_and_numbers() {
        assert_eq!(any_to_string(AnyValue::Null), "");
        assert_eq!(any_to_string(AnyValue::Int64(7)), "7");
        assert_eq!(any_to_string(AnyValue::Float64(2.0)), "2");
        assert_eq!(any_to_string(AnyValue::String("001")), "001");
    }
}
