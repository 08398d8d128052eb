use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use health_tracker_data::models::{truncate_to_seconds, NewHealthReading};

use super::source::{Field, FieldValues};
use crate::validation::{validate_vitals, ValidationError};

/// Why a single row was not imported
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("Row has insufficient values: {0}")]
    InsufficientValues(String),

    #[error("Row contains placeholder values: {0}")]
    PlaceholderValues(String),

    #[error("Invalid numeric value for {field}: '{raw}'")]
    InvalidNumber { field: Field, raw: String },

    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A row that passed coercion and validation, not yet bound to an owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReading {
    pub timestamp: NaiveDateTime,
    pub systolic: i32,
    pub diastolic: i32,
    pub heart_rate: i32,
    pub tags: Option<String>,
}

impl CandidateReading {
    pub fn for_owner(self, owner_id: i64) -> NewHealthReading {
        NewHealthReading {
            owner_id,
            timestamp: self.timestamp,
            systolic: self.systolic,
            diastolic: self.diastolic,
            heart_rate: self.heart_rate,
            tags: self.tags,
        }
    }
}

/// Parse as a float and truncate toward zero
pub fn parse_vital(field: Field, raw: &str) -> Result<i32, RowRejection> {
    let invalid = || RowRejection::InvalidNumber {
        field,
        raw: raw.to_string(),
    };

    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    let truncated = value.trunc();
    if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return Err(invalid());
    }
    Ok(truncated as i32)
}

/// Parse a timestamp with a strftime-style pattern; a date-only pattern yields midnight
pub fn parse_timestamp(raw: &str, pattern: &str) -> Result<NaiveDateTime, RowRejection> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, pattern)
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, pattern).map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map(truncate_to_seconds)
        .map_err(|_| RowRejection::InvalidTimestamp(raw.to_string()))
}

/// Trimmed tags, absent when empty
pub fn normalize_tags(tags: Option<&str>) -> Option<String> {
    tags.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}

/// Coerce and validate one row.
///
/// Numeric fields are coerced first, then the vital signs are validated, and
/// only then is the timestamp parsed.
pub fn coerce_row(values: &FieldValues, date_pattern: &str) -> Result<CandidateReading, RowRejection> {
    let vital = |field: Field| parse_vital(field, values.get(field).unwrap_or_default());

    let systolic = vital(Field::Systolic)?;
    let diastolic = vital(Field::Diastolic)?;
    let heart_rate = vital(Field::HeartRate)?;

    validate_vitals(systolic, diastolic, heart_rate)?;

    let timestamp = parse_timestamp(values.get(Field::Timestamp).unwrap_or_default(), date_pattern)?;

    Ok(CandidateReading {
        timestamp,
        systolic,
        diastolic,
        heart_rate,
        tags: normalize_tags(values.get(Field::Tags)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = "%Y-%m-%d %H:%M:%S";

    fn row(timestamp: &str, systolic: &str, diastolic: &str, heart_rate: &str) -> FieldValues {
        FieldValues::from([
            (Field::Timestamp, timestamp),
            (Field::Systolic, systolic),
            (Field::Diastolic, diastolic),
            (Field::HeartRate, heart_rate),
        ])
    }

    #[test]
    fn test_vitals_are_truncated() {
        assert_eq!(parse_vital(Field::Systolic, "120.9"), Ok(120));
        assert_eq!(parse_vital(Field::Systolic, " 99.99 "), Ok(99));
        assert_eq!(parse_vital(Field::Systolic, "1e2"), Ok(100));
        assert_eq!(parse_vital(Field::Systolic, "-0.5"), Ok(0));
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        for raw in ["abc", "", "NaN", "inf", "1e300"] {
            let err = parse_vital(Field::HeartRate, raw).unwrap_err();
            assert_eq!(
                err,
                RowRejection::InvalidNumber {
                    field: Field::HeartRate,
                    raw: raw.to_string()
                }
            );
        }
        assert!(parse_vital(Field::HeartRate, "x")
            .unwrap_err()
            .to_string()
            .contains("Invalid numeric value"));
    }

    #[test]
    fn test_timestamp_patterns() {
        let parsed = parse_timestamp("2024-01-01 08:00:00", PATTERN).unwrap();
        assert_eq!(parsed.to_string(), "2024-01-01 08:00:00");

        let midnight = parse_timestamp("01/02/2024", "%d/%m/%Y").unwrap();
        assert_eq!(midnight.to_string(), "2024-02-01 00:00:00");

        let precise = parse_timestamp("2024-01-01 08:00:00.750", "%Y-%m-%d %H:%M:%S%.f").unwrap();
        assert_eq!(precise.to_string(), "2024-01-01 08:00:00");

        assert_eq!(
            parse_timestamp("2024/01/01", PATTERN),
            Err(RowRejection::InvalidTimestamp("2024/01/01".to_string()))
        );
    }

    #[test]
    fn test_range_reason_wins_over_bad_timestamp() {
        let err = coerce_row(&row("yesterday", "90", "80", "70"), PATTERN).unwrap_err();
        assert_eq!(err.to_string(), "Invalid systolic value: 90. Must be between 100-200.");

        let err = coerce_row(&row("yesterday", "120", "80", "70"), PATTERN).unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp format: yesterday");
    }

    #[test]
    fn test_numeric_failure_wins_over_validation() {
        let err = coerce_row(&row("2024-01-01 08:00:00", "90", "eighty", "70"), PATTERN).unwrap_err();
        assert!(matches!(err, RowRejection::InvalidNumber { field: Field::Diastolic, .. }));
    }

    #[test]
    fn test_tags_are_trimmed() {
        let mut values = row("2024-01-01 08:00:00", "120", "80", "70");
        values.insert(Field::Tags, "  after run ");
        let candidate = coerce_row(&values, PATTERN).unwrap();
        assert_eq!(candidate.tags.as_deref(), Some("after run"));
        assert_eq!(normalize_tags(Some("   ")), None);
    }
}
