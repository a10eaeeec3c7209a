//! Validation utilities for caller-supplied analysis parameters

use chrono::NaiveDate;
use thiserror::Error;

/// A string did not name any variant of a closed enumeration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {field}: '{value}'")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Date Validations
// ============================================================================

pub const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD (e.g., '2025-07-26')";
pub const PAST_DATE_MESSAGE: &str = "Target date must be in the future";

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| INVALID_DATE_MESSAGE)
}

/// Parse a target date and require it to fall strictly after `today`
pub fn validate_future_date(value: &str, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    let date = parse_iso_date(value)?;
    if date <= today {
        return Err(PAST_DATE_MESSAGE);
    }
    Ok(date)
}

// ============================================================================
// Numeric Validations
// ============================================================================

/// Validate a confidence level for prediction intervals
pub fn validate_confidence_level(level: f64) -> Result<(), &'static str> {
    if !(level > 0.0 && level < 1.0) {
        return Err("Confidence level must be between 0 and 1 (exclusive)");
    }
    Ok(())
}

/// Validate that ABC thresholds are ordered shares within (0, 1]
pub fn validate_abc_thresholds(a: f64, b: f64) -> Result<(), &'static str> {
    if !(a > 0.0 && a <= b && b <= 1.0) {
        return Err("ABC thresholds must satisfy 0 < A <= B <= 1");
    }
    Ok(())
}

/// Validate that XYZ thresholds are ordered and non-negative
pub fn validate_xyz_thresholds(x: f64, y: f64) -> Result<(), &'static str> {
    if !(x >= 0.0 && x <= y) {
        return Err("XYZ thresholds must satisfy 0 <= X <= Y");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 16).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert!(parse_iso_date("2025-07-26").is_ok());
        assert_eq!(parse_iso_date("26/07/2025"), Err(INVALID_DATE_MESSAGE));
        assert_eq!(parse_iso_date(""), Err(INVALID_DATE_MESSAGE));
    }

    #[test]
    fn test_future_date_must_be_after_today() {
        assert!(validate_future_date("2025-07-17", today()).is_ok());
        assert_eq!(validate_future_date("2025-07-16", today()), Err(PAST_DATE_MESSAGE));
        assert_eq!(validate_future_date("2024-01-01", today()), Err(PAST_DATE_MESSAGE));
    }

    #[test]
    fn test_confidence_level() {
        assert!(validate_confidence_level(0.95).is_ok());
        assert!(validate_confidence_level(1.0).is_err());
        assert!(validate_confidence_level(0.0).is_err());
    }

    #[test]
    fn test_thresholds() {
        assert!(validate_abc_thresholds(0.8, 0.95).is_ok());
        assert!(validate_abc_thresholds(0.95, 0.8).is_err());
        assert!(validate_xyz_thresholds(0.5, 1.0).is_ok());
        assert!(validate_xyz_thresholds(-0.1, 1.0).is_err());
    }
}
