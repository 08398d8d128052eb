use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Canonical textual form of a reading timestamp, used for storage and chart output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage model for a blood pressure / heart rate reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReading {
    /// Identifier assigned by the store
    pub id: i64,

    /// Person the reading belongs to
    pub owner_id: i64,

    /// When the reading was taken (local time, second precision)
    pub timestamp: NaiveDateTime,

    /// Systolic blood pressure (the higher number)
    pub systolic: i32,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: i32,

    /// Heart rate in beats per minute
    pub heart_rate: i32,

    /// Optional free-text tags
    pub tags: Option<String>,
}

/// A reading that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHealthReading {
    pub owner_id: i64,
    pub timestamp: NaiveDateTime,
    pub systolic: i32,
    pub diastolic: i32,
    pub heart_rate: i32,
    pub tags: Option<String>,
}

impl NewHealthReading {
    /// Attach a store-assigned id
    pub fn into_reading(self, id: i64) -> HealthReading {
        HealthReading {
            id,
            owner_id: self.owner_id,
            timestamp: self.timestamp,
            systolic: self.systolic,
            diastolic: self.diastolic,
            heart_rate: self.heart_rate,
            tags: self.tags,
        }
    }
}

/// Drop sub-second precision; readings are compared at whole seconds
pub fn truncate_to_seconds(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

/// Criteria for listing an owner's readings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingFilter {
    /// Inclusive lower bound
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound
    pub end: Option<NaiveDateTime>,
    /// Newest first when true
    pub sort_desc: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ReadingFilter {
    /// Every reading, oldest first
    pub fn chronological() -> Self {
        Self::default()
    }

    pub fn matches(&self, timestamp: &NaiveDateTime) -> bool {
        self.start.map_or(true, |start| *timestamp >= start)
            && self.end.map_or(true, |end| *timestamp <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_truncate_to_seconds() {
        let precise = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(8, 0, 0, 750)
            .unwrap();
        assert_eq!(truncate_to_seconds(precise), at(8, 0, 0));
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let filter = ReadingFilter {
            start: Some(at(8, 0, 0)),
            end: Some(at(9, 0, 0)),
            ..Default::default()
        };
        assert!(filter.matches(&at(8, 0, 0)));
        assert!(filter.matches(&at(9, 0, 0)));
        assert!(!filter.matches(&at(9, 0, 1)));
        assert!(ReadingFilter::chronological().matches(&at(23, 59, 59)));
    }
}
