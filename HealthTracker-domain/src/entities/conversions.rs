//! Conversions between data-layer models and domain entities

use health_tracker_data::models::{self as data, TIMESTAMP_FORMAT};

use super::person::{Person, RegisterPersonRequest};
use super::reading::{ChartPoint, Reading, ReadingInput, ReadingQuery};

impl From<data::HealthReading> for Reading {
    fn from(reading: data::HealthReading) -> Self {
        Reading {
            id: reading.id,
            owner_id: reading.owner_id,
            timestamp: reading.timestamp,
            systolic: reading.systolic,
            diastolic: reading.diastolic,
            heart_rate: reading.heart_rate,
            tags: reading.tags,
        }
    }
}

impl From<&data::HealthReading> for ChartPoint {
    fn from(reading: &data::HealthReading) -> Self {
        ChartPoint {
            x: reading.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            systolic: reading.systolic,
            diastolic: reading.diastolic,
            heart_rate: reading.heart_rate,
        }
    }
}

impl From<data::Person> for Person {
    fn from(person: data::Person) -> Self {
        Person {
            id: person.id,
            name: person.name,
            age: person.age,
            gender: person.gender,
            description: person.description,
        }
    }
}

impl From<RegisterPersonRequest> for data::NewPerson {
    fn from(request: RegisterPersonRequest) -> Self {
        data::NewPerson {
            name: request.name.trim().to_string(),
            age: request.age,
            gender: request.gender.trim().to_string(),
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

impl From<ReadingQuery> for data::ReadingFilter {
    fn from(query: ReadingQuery) -> Self {
        data::ReadingFilter {
            start: query.start,
            end: query.end,
            sort_desc: query.sort_desc,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// Build the record to store for an owner, with the timestamp at second precision
pub fn convert_to_new_reading(input: ReadingInput, owner_id: i64) -> data::NewHealthReading {
    data::NewHealthReading {
        owner_id,
        timestamp: data::truncate_to_seconds(input.timestamp),
        systolic: input.systolic,
        diastolic: input.diastolic,
        heart_rate: input.heart_rate,
        tags: crate::import::coercion::normalize_tags(input.tags.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_new_reading_drops_subseconds_and_blank_tags() {
        let timestamp = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(8, 0, 0, 500)
            .unwrap();
        let input = ReadingInput {
            timestamp,
            systolic: 120,
            diastolic: 80,
            heart_rate: 70,
            tags: Some(" ".to_string()),
        };

        let new = convert_to_new_reading(input, 3);
        assert_eq!(new.owner_id, 3);
        assert_eq!(new.timestamp.to_string(), "2024-01-01 08:00:00");
        assert_eq!(new.tags, None);
    }

    #[test]
    fn test_chart_point_format() {
        let reading = data::HealthReading {
            id: 1,
            owner_id: 1,
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap().and_hms_opt(7, 45, 0).unwrap(),
            systolic: 127,
            diastolic: 83,
            heart_rate: 65,
            tags: None,
        };
        assert_eq!(ChartPoint::from(&reading).x, "2025-03-04 07:45:00");
    }

    #[test]
    fn test_register_request_is_trimmed() {
        let new: data::NewPerson = RegisterPersonRequest {
            name: " Ana ".to_string(),
            age: 40,
            gender: "F".to_string(),
            description: Some("   ".to_string()),
        }
        .into();
        assert_eq!(new.name, "Ana");
        assert_eq!(new.description, None);
    }
}
