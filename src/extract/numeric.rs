use crate::error::FieldParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

/// A run of digits, thousands separators and dots that holds at least one digit.
static NUMERIC_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9,.]*[0-9][0-9,.]*").expect("numeric run pattern"));

/// Reads the first decimal quantity out of noisy cell text.
///
/// Returns `None` when the text holds no digits. A run that is present but
/// malformed is logged and also yields `None`; it never fails the row.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    match try_parse_decimal(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Skipping numeric field in '{}': {}", text.trim(), e);
            None
        }
    }
}

/// Like [`parse_decimal`] but surfaces malformed runs to the caller.
pub fn try_parse_decimal(text: &str) -> Result<Option<Decimal>, FieldParseError> {
    let Some(found) = NUMERIC_RUN.find(text.trim()) else {
        return Ok(None);
    };
    let run = found.as_str();
    let cleaned = clean_run(run)?;
    Decimal::from_str(&cleaned)
        .map(Some)
        .map_err(|e| FieldParseError {
            run: run.to_string(),
            reason: e.to_string(),
        })
}

/// Drops thousands separators and sentence punctuation around the run.
fn clean_run(run: &str) -> Result<String, FieldParseError> {
    let malformed = |reason: &str| FieldParseError {
        run: run.to_string(),
        reason: reason.to_string(),
    };

    // "250." or "1,234," at the end of a sentence or list
    let trimmed = run.trim_end_matches(|c| c == '.' || c == ',');
    let trimmed = trimmed.trim_start_matches(',');

    if trimmed.matches('.').count() > 1 {
        return Err(malformed("more than one decimal point"));
    }
    if trimmed.contains(",,") {
        return Err(malformed("repeated thousands separator"));
    }
    if trimmed.contains(",.") {
        return Err(malformed("thousands separator before decimal point"));
    }
    if let Some(dot) = trimmed.find('.') {
        if trimmed[dot..].contains(',') {
            return Err(malformed("thousands separator after decimal point"));
        }
    }

    // Group sizes are not checked; "1,23,456" reads as 123456.
    let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
    if digits.starts_with('.') {
        Ok(format!("0{}", digits))
    } else {
        Ok(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn reads_thousands_separated_value_out_of_prose() {
        assert_eq!(parse_decimal("1,234.50 per gram"), Some(dec("1234.50")));
        assert_eq!(parse_decimal("  RM 12,345,678.9 "), Some(dec("12345678.9")));
    }

    #[test]
    fn keeps_the_raw_scale() {
        let value = parse_decimal("250.1000").unwrap();
        assert_eq!(value.scale(), 4);
        assert_eq!(value.to_string(), "250.1000");
    }

    #[test]
    fn text_without_digits_is_absent() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("WE BUY"), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(try_parse_decimal("N/A"), Ok(None));
    }

    #[test]
    fn stray_punctuation_before_the_number_is_ignored() {
        assert_eq!(parse_decimal("per g. 250"), Some(dec("250")));
        assert_eq!(parse_decimal("Buy: 250."), Some(dec("250")));
        assert_eq!(parse_decimal(".75 oz"), Some(dec("0.75")));
    }

    #[test]
    fn comma_group_sizes_are_not_enforced() {
        assert_eq!(parse_decimal("1,23,4"), Some(dec("1234")));
        assert_eq!(parse_decimal("1,00,000.50"), Some(dec("100000.50")));
    }

    #[test]
    fn takes_the_first_run_only() {
        assert_eq!(parse_decimal("300.10 / 310.20"), Some(dec("300.10")));
    }

    #[test]
    fn malformed_runs_are_absent_not_errors() {
        assert!(try_parse_decimal("1.2.3").is_err());
        assert!(try_parse_decimal("1,,234").is_err());
        assert!(try_parse_decimal("1.234,5").is_err());
        assert!(try_parse_decimal("5,.3").is_err());
        assert_eq!(parse_decimal("RM 5,.30"), None);
        assert_eq!(parse_decimal("1.2.3"), None);
    }
}
