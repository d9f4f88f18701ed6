//! Input validation for goal commands.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::constants::AMOUNT_DECIMAL_PLACES;
use crate::errors::{Error, Result, ValidationError};

pub(crate) fn require_id(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            field.to_string(),
        )));
    }
    Ok(())
}

pub(crate) fn validate_goal_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input("goalName must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_target_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_input("targetAmount must be greater than 0"));
    }
    if amount.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        return Err(Error::invalid_input(format!(
            "targetAmount must have at most {} decimal places",
            AMOUNT_DECIMAL_PLACES
        )));
    }
    Ok(amount)
}

/// Parses a deadline given as `YYYY-MM-DD` or as an ISO-8601 datetime.
pub(crate) fn parse_deadline(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|datetime| datetime.date())
        .map_err(|_| Error::invalid_input(format!("Invalid deadline date format: '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_deadline_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert_eq!(parse_deadline("2026-06-30").unwrap(), expected);
        assert_eq!(parse_deadline("2026-06-30T10:15:00Z").unwrap(), expected);
        assert_eq!(parse_deadline("2026-06-30T10:15:00.000").unwrap(), expected);
        assert!(parse_deadline("30/06/2026").is_err());
        assert!(parse_deadline("2026-02-30").is_err());
    }

    #[test]
    fn test_target_amount_rules() {
        assert!(validate_target_amount(dec!(0.01)).is_ok());
        assert!(validate_target_amount(dec!(500.10)).is_ok());
        assert!(validate_target_amount(dec!(0)).is_err());
        assert!(validate_target_amount(dec!(-1)).is_err());
        assert!(validate_target_amount(dec!(1.005)).is_err());
    }

    #[test]
    fn test_goal_name_is_trimmed() {
        assert_eq!(validate_goal_name("  Holiday ").unwrap(), "Holiday");
        assert!(validate_goal_name("   ").is_err());
    }
}
