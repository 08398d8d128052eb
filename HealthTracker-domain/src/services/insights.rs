use chrono::Utc;

use crate::entities::{BloodPressureCategory, ReadingInsights};
use health_tracker_data::models::HealthReading;

/// Categorize blood pressure based on measurements
pub fn categorize_blood_pressure(systolic: i32, diastolic: i32) -> BloodPressureCategory {
    if systolic >= 180 || diastolic >= 120 {
        BloodPressureCategory::HypertensiveCrisis
    } else if systolic >= 140 || diastolic >= 90 {
        BloodPressureCategory::Hypertension2
    } else if systolic >= 130 || diastolic >= 80 {
        BloodPressureCategory::Hypertension1
    } else if systolic >= 120 && diastolic < 80 {
        BloodPressureCategory::Elevated
    } else {
        BloodPressureCategory::Normal
    }
}

/// Averages and extremes over a set of readings; `None` when there is nothing to summarise
pub fn calculate_insights(readings: &[HealthReading], period_days: Option<u32>) -> Option<ReadingInsights> {
    if readings.is_empty() {
        return None;
    }

    let count = readings.len() as f64;
    let mean = |value: fn(&HealthReading) -> i32| readings.iter().map(|r| value(r) as f64).sum::<f64>() / count;

    let avg_systolic = mean(|r| r.systolic);
    let avg_diastolic = mean(|r| r.diastolic);
    let avg_heart_rate = mean(|r| r.heart_rate);

    let max_systolic = readings.iter().map(|r| r.systolic).max()?;
    let max_diastolic = readings.iter().map(|r| r.diastolic).max()?;
    let min_systolic = readings.iter().map(|r| r.systolic).min()?;
    let min_diastolic = readings.iter().map(|r| r.diastolic).min()?;

    Some(ReadingInsights {
        avg_systolic,
        avg_diastolic,
        avg_heart_rate,
        max_systolic,
        max_diastolic,
        min_systolic,
        min_diastolic,
        // Category of the average reading
        category: categorize_blood_pressure(avg_systolic as i32, avg_diastolic as i32),
        reading_count: readings.len(),
        period_days,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(systolic: i32, diastolic: i32, heart_rate: i32) -> HealthReading {
        HealthReading {
            id: 1,
            owner_id: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            systolic,
            diastolic,
            heart_rate,
            tags: None,
        }
    }

    #[test]
    fn test_bp_category_normal() {
        let category = categorize_blood_pressure(110, 75);
        assert_eq!(category, BloodPressureCategory::Normal);
    }

    #[test]
    fn test_bp_category_elevated() {
        let category = categorize_blood_pressure(125, 75);
        assert_eq!(category, BloodPressureCategory::Elevated);
    }

    #[test]
    fn test_bp_category_hypertension1() {
        assert_eq!(categorize_blood_pressure(135, 75), BloodPressureCategory::Hypertension1);
        assert_eq!(categorize_blood_pressure(120, 85), BloodPressureCategory::Hypertension1);
    }

    #[test]
    fn test_bp_category_hypertension2() {
        assert_eq!(categorize_blood_pressure(145, 75), BloodPressureCategory::Hypertension2);
        assert_eq!(categorize_blood_pressure(120, 95), BloodPressureCategory::Hypertension2);
    }

    #[test]
    fn test_bp_category_crisis() {
        assert_eq!(categorize_blood_pressure(185, 75), BloodPressureCategory::HypertensiveCrisis);
        assert_eq!(categorize_blood_pressure(150, 125), BloodPressureCategory::HypertensiveCrisis);
    }

    #[test]
    fn test_insights_over_readings() {
        let readings = vec![reading(120, 80, 60), reading(140, 90, 80), reading(130, 70, 70)];
        let insights = calculate_insights(&readings, Some(30)).unwrap();

        assert_eq!(insights.avg_systolic, 130.0);
        assert_eq!(insights.avg_diastolic, 80.0);
        assert_eq!(insights.avg_heart_rate, 70.0);
        assert_eq!((insights.min_systolic, insights.max_systolic), (120, 140));
        assert_eq!((insights.min_diastolic, insights.max_diastolic), (70, 90));
        assert_eq!(insights.category, BloodPressureCategory::Hypertension1);
        assert_eq!(insights.reading_count, 3);
        assert_eq!(insights.period_days, Some(30));
    }

    #[test]
    fn test_no_insights_without_readings() {
        assert!(calculate_insights(&[], None).is_none());
    }
}
