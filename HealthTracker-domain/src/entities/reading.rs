use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::import::coercion::{normalize_tags, parse_timestamp, parse_vital, RowRejection};
use crate::import::Field;
use crate::validation::validate_vitals;

/// Pattern of the `datetime-local` values submitted by entry forms
pub const FORM_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A stored blood pressure / heart rate reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Reading {
    /// Unique identifier for the reading
    pub id: i64,

    /// Person the reading belongs to
    pub owner_id: i64,

    /// When the reading was taken (local time)
    #[cfg_attr(feature = "with-api", schema(value_type = String, example = "2024-01-01T08:00:00"))]
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

/// Typed fields of a reading being added or edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ReadingInput {
    /// When the reading was taken (local time)
    #[cfg_attr(feature = "with-api", schema(value_type = String, example = "2024-01-01T08:00:00"))]
    pub timestamp: NaiveDateTime,

    /// Systolic blood pressure, 100-200 mmHg
    pub systolic: i32,

    /// Diastolic blood pressure, 60-160 mmHg and below systolic
    pub diastolic: i32,

    /// Heart rate, 50-200 bpm
    pub heart_rate: i32,

    /// Optional free-text tags
    #[validate(length(max = 100, message = "Tags cannot exceed 100 characters"))]
    pub tags: Option<String>,
}

impl ReadingInput {
    /// Run the shared vital-sign rules and the tag length check.
    ///
    /// Tags are measured as they will be stored, after trimming.
    pub fn check(&self) -> Result<(), String> {
        validate_vitals(self.systolic, self.diastolic, self.heart_rate).map_err(|e| e.to_string())?;
        let stored = Self {
            tags: normalize_tags(self.tags.as_deref()),
            ..self.clone()
        };
        stored.validate().map_err(|errors| {
            errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .map(|err| {
                    err.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", err.code))
                })
                .collect::<Vec<_>>()
                .join("; ")
        })
    }
}

/// Reading fields exactly as submitted by a form, before coercion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RawReadingFields {
    /// Empty means "now"
    #[serde(default)]
    pub timestamp: String,
    pub systolic: String,
    pub diastolic: String,
    pub heart_rate: String,
    #[serde(default)]
    pub tags: Option<String>,
}

impl RawReadingFields {
    /// Coerce with the same rules as imported rows: numbers first, then the
    /// vital-sign rules, then the timestamp
    pub fn coerce(&self, date_pattern: &str) -> Result<ReadingInput, RowRejection> {
        let systolic = parse_vital(Field::Systolic, &self.systolic)?;
        let diastolic = parse_vital(Field::Diastolic, &self.diastolic)?;
        let heart_rate = parse_vital(Field::HeartRate, &self.heart_rate)?;
        validate_vitals(systolic, diastolic, heart_rate)?;

        let timestamp = if self.timestamp.trim().is_empty() {
            Local::now().naive_local()
        } else {
            parse_timestamp(&self.timestamp, date_pattern)?
        };

        Ok(ReadingInput {
            timestamp,
            systolic,
            diastolic,
            heart_rate,
            tags: normalize_tags(self.tags.as_deref()),
        })
    }
}

/// Filters for listing readings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingQuery {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub sort_desc: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One point of the blood pressure chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ChartPoint {
    /// Timestamp formatted as `%Y-%m-%d %H:%M:%S`
    pub x: String,
    pub systolic: i32,
    pub diastolic: i32,
    pub heart_rate: i32,
}

/// Blood pressure category based on measurements
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum BloodPressureCategory {
    /// Normal blood pressure (systolic < 120 and diastolic < 80)
    Normal,

    /// Elevated blood pressure (systolic 120-129 and diastolic < 80)
    Elevated,

    /// Stage 1 Hypertension (systolic 130-139 or diastolic 80-89)
    Hypertension1,

    /// Stage 2 Hypertension (systolic ≥ 140 or diastolic ≥ 90)
    Hypertension2,

    /// Hypertensive crisis (systolic ≥ 180 or diastolic ≥ 120)
    HypertensiveCrisis,
}

impl std::fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BloodPressureCategory::Normal => "Normal",
            BloodPressureCategory::Elevated => "Elevated",
            BloodPressureCategory::Hypertension1 => "Hypertension Stage 1",
            BloodPressureCategory::Hypertension2 => "Hypertension Stage 2",
            BloodPressureCategory::HypertensiveCrisis => "Hypertensive Crisis",
        };
        f.write_str(label)
    }
}

/// Summary statistics over an owner's readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ReadingInsights {
    /// Average systolic reading over the analysis period
    pub avg_systolic: f64,

    /// Average diastolic reading over the analysis period
    pub avg_diastolic: f64,

    /// Average heart rate over the analysis period
    pub avg_heart_rate: f64,

    pub max_systolic: i32,
    pub max_diastolic: i32,
    pub min_systolic: i32,
    pub min_diastolic: i32,

    /// Blood pressure category based on average readings
    pub category: BloodPressureCategory,

    /// Number of readings analyzed
    pub reading_count: usize,

    /// Analysis period in days; absent when every reading was used
    pub period_days: Option<u32>,

    /// Timestamp of the analysis
    pub generated_at: DateTime<Utc>,
}
