use std::sync::Arc;

use chrono::{Duration, Local};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::entities::conversions::convert_to_new_reading;
use crate::entities::{ChartPoint, Reading, ReadingInput, ReadingInsights, ReadingQuery};
use crate::import::RowRejection;
use crate::services::insights::calculate_insights;
use health_tracker_data::models::{HealthReading, ReadingFilter};
use health_tracker_data::repository::{HealthReadingRepositoryTrait, RepositoryError};

pub const DUPLICATE_TIMESTAMP_MESSAGE: &str = "A record with this date and time already exists.";

/// Reading service errors
#[derive(Debug, Error)]
pub enum ReadingServiceError {
    /// The fields failed coercion or the vital-sign rules
    #[error("{0}")]
    Validation(String),

    #[error("{}", DUPLICATE_TIMESTAMP_MESSAGE)]
    Duplicate,

    /// Absent, or owned by someone else
    #[error("Entry not found")]
    NotFound,

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<RowRejection> for ReadingServiceError {
    fn from(rejection: RowRejection) -> Self {
        ReadingServiceError::Validation(rejection.to_string())
    }
}

impl From<RepositoryError> for ReadingServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => ReadingServiceError::Duplicate,
            RepositoryError::NotFound(_) => ReadingServiceError::NotFound,
            RepositoryError::Validation(msg) => ReadingServiceError::Validation(msg),
            other => {
                error!("Reading repository failure: {}", other);
                ReadingServiceError::Repository(other.to_string())
            }
        }
    }
}

/// Single-record operations on an owner's readings.
///
/// Add and edit go through the same validator as imports and refuse a
/// timestamp the owner already uses.
#[derive(Clone)]
pub struct ReadingService {
    repository: Arc<dyn HealthReadingRepositoryTrait>,
}

impl ReadingService {
    pub fn new(repository: Arc<dyn HealthReadingRepositoryTrait>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, input))]
    pub async fn add_reading(&self, input: ReadingInput, owner_id: i64) -> Result<Reading, ReadingServiceError> {
        input.check().map_err(ReadingServiceError::Validation)?;
        let new = convert_to_new_reading(input, owner_id);

        if self
            .repository
            .find_by_owner_and_timestamp(owner_id, new.timestamp)
            .await?
            .is_some()
        {
            debug!("Owner {} already has a reading at {}", owner_id, new.timestamp);
            return Err(ReadingServiceError::Duplicate);
        }

        let stored = self.repository.insert(new).await?;
        info!("Added reading {} for owner {}", stored.id, owner_id);
        Ok(stored.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_reading(
        &self,
        id: i64,
        input: ReadingInput,
        owner_id: i64,
    ) -> Result<Reading, ReadingServiceError> {
        self.owned(id, owner_id).await?;
        input.check().map_err(ReadingServiceError::Validation)?;
        let replacement = convert_to_new_reading(input, owner_id);

        if let Some(existing) = self
            .repository
            .find_by_owner_and_timestamp(owner_id, replacement.timestamp)
            .await?
        {
            if existing.id != id {
                debug!("Reading {} collides with reading {}", id, existing.id);
                return Err(ReadingServiceError::Duplicate);
            }
        }

        let updated = self.repository.update(replacement.into_reading(id)).await?;
        info!("Updated reading {} for owner {}", id, owner_id);
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_reading(&self, id: i64, owner_id: i64) -> Result<(), ReadingServiceError> {
        self.owned(id, owner_id).await?;
        self.repository.delete(id).await?;
        info!("Deleted reading {} for owner {}", id, owner_id);
        Ok(())
    }

    pub async fn get_reading(&self, id: i64, owner_id: i64) -> Result<Reading, ReadingServiceError> {
        Ok(self.owned(id, owner_id).await?.into())
    }

    /// One page of an owner's readings and the number of matches across all pages
    pub async fn list_readings(
        &self,
        owner_id: i64,
        query: ReadingQuery,
    ) -> Result<(Vec<Reading>, usize), ReadingServiceError> {
        let (readings, total) = self.repository.list_for_owner(owner_id, query.into()).await?;
        Ok((readings.into_iter().map(Reading::from).collect(), total))
    }

    /// All of an owner's readings as chart points, oldest first
    pub async fn chart_series(&self, owner_id: i64) -> Result<Vec<ChartPoint>, ReadingServiceError> {
        let (readings, _) = self
            .repository
            .list_for_owner(owner_id, ReadingFilter::chronological())
            .await?;
        Ok(readings.iter().map(ChartPoint::from).collect())
    }

    /// Statistics over the last `days` days, or over every reading when `days` is absent
    pub async fn summarize(
        &self,
        owner_id: i64,
        days: Option<u32>,
    ) -> Result<ReadingInsights, ReadingServiceError> {
        let mut filter = ReadingFilter::chronological();
        if let Some(days) = days {
            filter.start = Some(Local::now().naive_local() - Duration::days(i64::from(days)));
        }

        let (readings, _) = self.repository.list_for_owner(owner_id, filter).await?;
        calculate_insights(&readings, days).ok_or_else(|| {
            ReadingServiceError::InsufficientData("No readings available to generate insights".to_string())
        })
    }

    async fn owned(&self, id: i64, owner_id: i64) -> Result<HealthReading, ReadingServiceError> {
        match self.repository.get_by_id(id).await? {
            Some(reading) if reading.owner_id == owner_id => Ok(reading),
            _ => Err(ReadingServiceError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use health_tracker_data::models::NewHealthReading;
    use health_tracker_data::repository::tests::MockHealthReadingRepository;
    use health_tracker_data::repository::InMemoryHealthReadingRepository;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn input(timestamp: NaiveDateTime, systolic: i32) -> ReadingInput {
        ReadingInput {
            timestamp,
            systolic,
            diastolic: 80,
            heart_rate: 70,
            tags: None,
        }
    }

    fn seeded(owner_id: i64, readings: &[(NaiveDateTime, i32)]) -> MockHealthReadingRepository {
        MockHealthReadingRepository::with_readings(
            readings
                .iter()
                .map(|(timestamp, systolic)| NewHealthReading {
                    owner_id,
                    timestamp: *timestamp,
                    systolic: *systolic,
                    diastolic: 80,
                    heart_rate: 70,
                    tags: None,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_add_reading() {
        let service = ReadingService::new(Arc::new(InMemoryHealthReadingRepository::new()));
        let reading = service.add_reading(input(at(1, 8), 120), 1).await.unwrap();

        assert_eq!(reading.owner_id, 1);
        assert_eq!(service.get_reading(reading.id, 1).await.unwrap(), reading);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_vitals_before_touching_store() {
        let repository = MockHealthReadingRepository::new();
        let service = ReadingService::new(Arc::new(repository.clone()));

        let err = service.add_reading(input(at(1, 8), 90), 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid systolic value: 90. Must be between 100-200.");
        assert_eq!(repository.store_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_duplicate_timestamp_is_explicit() {
        let repository = seeded(1, &[(at(1, 8), 120)]);
        let service = ReadingService::new(Arc::new(repository.clone()));

        let err = service.add_reading(input(at(1, 8), 130), 1).await.unwrap_err();
        assert!(matches!(err, ReadingServiceError::Duplicate));
        assert_eq!(err.to_string(), DUPLICATE_TIMESTAMP_MESSAGE);

        // Another owner may use the same instant
        assert!(service.add_reading(input(at(1, 8), 130), 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_edit_onto_other_timestamp_is_rejected_and_leaves_reading_unchanged() {
        let repository = seeded(1, &[(at(1, 8), 120), (at(2, 8), 130)]);
        let service = ReadingService::new(Arc::new(repository.clone()));
        let (readings, _) = service.list_readings(1, ReadingQuery::default()).await.unwrap();
        let (x, y) = (readings[0].clone(), readings[1].clone());

        let err = service.update_reading(x.id, input(y.timestamp, 150), 1).await.unwrap_err();
        assert!(matches!(err, ReadingServiceError::Duplicate));
        assert_eq!(service.get_reading(x.id, 1).await.unwrap(), x);
    }

    #[tokio::test]
    async fn test_edit_may_keep_its_own_timestamp() {
        let repository = seeded(1, &[(at(1, 8), 120)]);
        let service = ReadingService::new(Arc::new(repository));
        let (readings, _) = service.list_readings(1, ReadingQuery::default()).await.unwrap();

        let mut edit = input(at(1, 8), 145);
        edit.tags = Some(" evening ".to_string());
        let updated = service.update_reading(readings[0].id, edit, 1).await.unwrap();

        assert_eq!(updated.systolic, 145);
        assert_eq!(updated.tags.as_deref(), Some("evening"));
        assert_eq!(updated.timestamp, at(1, 8));
    }

    #[tokio::test]
    async fn test_edit_revalidates() {
        let repository = seeded(1, &[(at(1, 8), 120)]);
        let service = ReadingService::new(Arc::new(repository));
        let (readings, _) = service.list_readings(1, ReadingQuery::default()).await.unwrap();

        let mut edit = input(at(1, 9), 120);
        edit.diastolic = 120;
        let err = service.update_reading(readings[0].id, edit, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Systolic (120) must be greater than diastolic (120).");
    }

    #[tokio::test]
    async fn test_other_owners_readings_are_not_found() {
        let repository = seeded(1, &[(at(1, 8), 120)]);
        let service = ReadingService::new(Arc::new(repository));
        let (readings, _) = service.list_readings(1, ReadingQuery::default()).await.unwrap();
        let id = readings[0].id;

        assert!(matches!(service.get_reading(id, 2).await, Err(ReadingServiceError::NotFound)));
        assert!(matches!(service.delete_reading(id, 2).await, Err(ReadingServiceError::NotFound)));
        assert!(matches!(
            service.update_reading(id, input(at(3, 8), 120), 2).await,
            Err(ReadingServiceError::NotFound)
        ));

        service.delete_reading(id, 1).await.unwrap();
        assert!(matches!(service.delete_reading(id, 1).await, Err(ReadingServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_and_chart() {
        let repository = seeded(1, &[(at(3, 8), 130), (at(1, 8), 120), (at(2, 8), 125)]);
        let service = ReadingService::new(Arc::new(repository));

        let query = ReadingQuery {
            sort_desc: true,
            limit: Some(2),
            ..ReadingQuery::default()
        };
        let (page, total) = service.list_readings(1, query).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.iter().map(|r| r.systolic).collect::<Vec<_>>(), vec![130, 125]);

        let chart = service.chart_series(1).await.unwrap();
        assert_eq!(chart.len(), 3);
        assert_eq!(chart[0].x, "2024-01-01 08:00:00");
        assert_eq!(chart[2].systolic, 130);
    }

    #[tokio::test]
    async fn test_summarize() {
        let repository = seeded(1, &[(at(1, 8), 120), (at(2, 8), 140)]);
        let service = ReadingService::new(Arc::new(repository));

        let insights = service.summarize(1, None).await.unwrap();
        assert_eq!(insights.avg_systolic, 130.0);
        assert_eq!(insights.reading_count, 2);

        // Both readings are far older than a week
        assert!(matches!(
            service.summarize(1, Some(7)).await,
            Err(ReadingServiceError::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_repository_error() {
        let repository = MockHealthReadingRepository::new().with_lookup_failure();
        let service = ReadingService::new(Arc::new(repository));

        let err = service.add_reading(input(at(1, 8), 120), 1).await.unwrap_err();
        assert!(matches!(err, ReadingServiceError::Repository(_)));
    }
}
