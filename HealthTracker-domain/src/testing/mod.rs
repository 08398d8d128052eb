// Testing utilities for crates built on the domain layer
// This module is only available when the "mock" feature is enabled

use chrono::NaiveDateTime;

use health_tracker_data::models::NewHealthReading;

// Re-export the counting mock from the data layer
pub use health_tracker_data::repository::tests::MockHealthReadingRepository;

/// A valid reading for seeding a mock repository
pub fn reading_at(owner_id: i64, timestamp: NaiveDateTime, systolic: i32) -> NewHealthReading {
    NewHealthReading {
        owner_id,
        timestamp,
        systolic,
        diastolic: 80,
        heart_rate: 70,
        tags: None,
    }
}

/// A mock repository already holding `readings` for `owner_id`
pub fn seeded_repository(owner_id: i64, readings: &[(NaiveDateTime, i32)]) -> MockHealthReadingRepository {
    MockHealthReadingRepository::with_readings(
        readings
            .iter()
            .map(|(timestamp, systolic)| reading_at(owner_id, *timestamp, *systolic))
            .collect(),
    )
}
