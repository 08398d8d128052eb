//! Medical-range and cross-field rules every stored reading must satisfy.
//!
//! Rules are evaluated in a fixed order and the first failure is the only one
//! reported: systolic range, diastolic range, systolic above diastolic, heart
//! rate range.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Accepted systolic pressure in mmHg
pub const SYSTOLIC_RANGE: RangeInclusive<i32> = 100..=200;

/// Accepted diastolic pressure in mmHg
pub const DIASTOLIC_RANGE: RangeInclusive<i32> = 60..=160;

/// Accepted heart rate in beats per minute
pub const HEART_RATE_RANGE: RangeInclusive<i32> = 50..=200;

/// The first rule a reading's vital signs violate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid systolic value: {0}. Must be between 100-200.")]
    SystolicOutOfRange(i32),

    #[error("Invalid diastolic value: {0}. Must be between 60-160.")]
    DiastolicOutOfRange(i32),

    #[error("Systolic ({systolic}) must be greater than diastolic ({diastolic}).")]
    SystolicNotAboveDiastolic { systolic: i32, diastolic: i32 },

    #[error("Invalid heart rate value: {0}. Must be between 50-200.")]
    HeartRateOutOfRange(i32),
}

/// Check vital signs against the reading invariants
pub fn validate_vitals(systolic: i32, diastolic: i32, heart_rate: i32) -> Result<(), ValidationError> {
    if !SYSTOLIC_RANGE.contains(&systolic) {
        return Err(ValidationError::SystolicOutOfRange(systolic));
    }
    if !DIASTOLIC_RANGE.contains(&diastolic) {
        return Err(ValidationError::DiastolicOutOfRange(diastolic));
    }
    if systolic <= diastolic {
        return Err(ValidationError::SystolicNotAboveDiastolic { systolic, diastolic });
    }
    if !HEART_RATE_RANGE.contains(&heart_rate) {
        return Err(ValidationError::HeartRateOutOfRange(heart_rate));
    }
    Ok(())
}
