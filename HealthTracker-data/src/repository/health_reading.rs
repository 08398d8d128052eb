use async_trait::async_trait;
use chrono::NaiveDateTime;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, warn};

use crate::database::DatabasePool;
use crate::models::{HealthReading, NewHealthReading, ReadingFilter};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for health readings
#[async_trait]
pub trait HealthReadingRepositoryTrait: Send + Sync {
    /// Store a new reading. A reading already present at the owner's timestamp
    /// yields `RepositoryError::Conflict`.
    async fn insert(&self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError>;

    /// Look up the reading an owner recorded at exactly `timestamp`
    async fn find_by_owner_and_timestamp(
        &self,
        owner_id: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError>;

    /// Get a reading by id
    async fn get_by_id(&self, id: i64) -> Result<Option<HealthReading>, RepositoryError>;

    /// Replace a reading's fields; its id and owner identify it
    async fn update(&self, reading: HealthReading) -> Result<HealthReading, RepositoryError>;

    /// Delete a reading by id
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    /// List an owner's readings, returning the page and the total match count
    async fn list_for_owner(
        &self,
        owner_id: i64,
        filter: ReadingFilter,
    ) -> Result<(Vec<HealthReading>, usize), RepositoryError>;

    /// Open a transactional batch for bulk inserts
    async fn begin_batch(&self) -> Result<Box<dyn ReadingBatch>, RepositoryError>;
}

/// A unit of work spanning one bulk import.
///
/// Lookups see readings inserted earlier in the same batch. Nothing becomes
/// visible to other callers until `commit`; dropping an unfinished batch
/// rolls it back.
#[async_trait]
pub trait ReadingBatch: Send {
    async fn find_by_owner_and_timestamp(
        &mut self,
        owner_id: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError>;

    async fn insert(&mut self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError>;

    async fn commit(&mut self) -> Result<(), RepositoryError>;

    async fn rollback(&mut self) -> Result<(), RepositoryError>;
}

/// Readings stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteHealthReadingRepository {
    pool: DatabasePool,
}

impl SqliteHealthReadingRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthReadingRepositoryTrait for SqliteHealthReadingRepository {
    async fn insert(&self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::insert_reading(&conn, &reading)
    }

    async fn find_by_owner_and_timestamp(
        &self,
        owner_id: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::find_by_owner_and_timestamp(&conn, owner_id, &timestamp)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<HealthReading>, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::get_reading(&conn, id)
    }

    async fn update(&self, reading: HealthReading) -> Result<HealthReading, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::update_reading(&conn, &reading)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::delete_reading(&conn, id)
    }

    async fn list_for_owner(
        &self,
        owner_id: i64,
        filter: ReadingFilter,
    ) -> Result<(Vec<HealthReading>, usize), RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::list_readings(&conn, owner_id, &filter)
    }

    async fn begin_batch(&self) -> Result<Box<dyn ReadingBatch>, RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!("Opened SQLite batch transaction");
        Ok(Box::new(SqliteReadingBatch { conn, finished: false }))
    }
}

/// An open SQLite transaction on a connection checked out for the batch's lifetime
pub struct SqliteReadingBatch {
    conn: PooledConnection<SqliteConnectionManager>,
    finished: bool,
}

impl SqliteReadingBatch {
    fn ensure_open(&self) -> Result<(), RepositoryError> {
        if self.finished {
            return Err(RepositoryError::Batch("batch already finished".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingBatch for SqliteReadingBatch {
    async fn find_by_owner_and_timestamp(
        &mut self,
        owner_id: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError> {
        self.ensure_open()?;
        DatabaseStorage::find_by_owner_and_timestamp(&self.conn, owner_id, &timestamp)
    }

    async fn insert(&mut self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
        self.ensure_open()?;
        DatabaseStorage::insert_reading(&self.conn, &reading)
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteReadingBatch {
    fn drop(&mut self) {
        if !self.finished {
            warn!("SQLite batch dropped without commit, rolling back");
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!("Rollback of abandoned batch failed: {}", e);
            }
        }
    }
}

/// Readings held in process memory, used when the database cannot be opened
#[derive(Debug, Clone, Default)]
pub struct InMemoryHealthReadingRepository {
    storage: InMemoryStorage,
}

impl InMemoryHealthReadingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share storage with other in-memory repositories
    pub fn with_storage(storage: InMemoryStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl HealthReadingRepositoryTrait for InMemoryHealthReadingRepository {
    async fn insert(&self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
        self.storage.insert_reading(reading)
    }

    async fn find_by_owner_and_timestamp(
        &self,
        owner_id: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError> {
        self.storage.find_by_owner_and_timestamp(owner_id, &timestamp)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<HealthReading>, RepositoryError> {
        self.storage.get_reading(id)
    }

    async fn update(&self, reading: HealthReading) -> Result<HealthReading, RepositoryError> {
        self.storage.update_reading(reading)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        self.storage.delete_reading(id)
    }

    async fn list_for_owner(
        &self,
        owner_id: i64,
        filter: ReadingFilter,
    ) -> Result<(Vec<HealthReading>, usize), RepositoryError> {
        self.storage.list_readings(owner_id, &filter)
    }

    async fn begin_batch(&self) -> Result<Box<dyn ReadingBatch>, RepositoryError> {
        Ok(Box::new(InMemoryReadingBatch {
            storage: self.storage.clone(),
            staged: Vec::new(),
            finished: false,
        }))
    }
}

/// Stages inserts and applies them all at once on commit
pub struct InMemoryReadingBatch {
    storage: InMemoryStorage,
    staged: Vec<HealthReading>,
    finished: bool,
}

impl InMemoryReadingBatch {
    fn ensure_open(&self) -> Result<(), RepositoryError> {
        if self.finished {
            return Err(RepositoryError::Batch("batch already finished".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingBatch for InMemoryReadingBatch {
    async fn find_by_owner_and_timestamp(
        &mut self,
        owner_id: i64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError> {
        self.ensure_open()?;
        let staged = self
            .staged
            .iter()
            .find(|r| r.owner_id == owner_id && r.timestamp == timestamp)
            .cloned();
        match staged {
            Some(reading) => Ok(Some(reading)),
            None => self.storage.find_by_owner_and_timestamp(owner_id, &timestamp),
        }
    }

    async fn insert(&mut self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
        self.ensure_open()?;
        if self.find_by_owner_and_timestamp(reading.owner_id, reading.timestamp).await?.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "owner {} already has a reading at {}",
                reading.owner_id, reading.timestamp
            )));
        }
        let reading = reading.into_reading(self.storage.next_reading_id()?);
        self.staged.push(reading.clone());
        Ok(reading)
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        self.storage.insert_all(std::mem::take(&mut self.staged))?;
        self.finished = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        self.staged.clear();
        self.finished = true;
        Ok(())
    }
}

/// Mock health reading repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Default)]
    struct MockControls {
        calls: AtomicUsize,
        fail_commit: AtomicBool,
        fail_lookup: AtomicBool,
    }

    impl MockControls {
        fn record(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn lookup(&self) -> Result<(), RepositoryError> {
            self.record();
            if self.fail_lookup.load(Ordering::SeqCst) {
                return Err(RepositoryError::Lock("injected lookup failure".to_string()));
            }
            Ok(())
        }
    }

    /// In-memory repository that counts every store call and can inject failures
    #[derive(Debug, Clone, Default)]
    pub struct MockHealthReadingRepository {
        inner: InMemoryHealthReadingRepository,
        controls: Arc<MockControls>,
    }

    impl MockHealthReadingRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined readings. Seeding is not counted.
        pub fn with_readings(readings: Vec<NewHealthReading>) -> Self {
            let storage = InMemoryStorage::new();
            for reading in readings {
                if let Err(e) = storage.insert_reading(reading) {
                    panic!("invalid seed reading: {}", e);
                }
            }
            Self {
                inner: InMemoryHealthReadingRepository::with_storage(storage),
                controls: Arc::default(),
            }
        }

        /// Make every batch commit fail
        pub fn with_commit_failure(self) -> Self {
            self.controls.fail_commit.store(true, Ordering::SeqCst);
            self
        }

        /// Make every timestamp lookup fail
        pub fn with_lookup_failure(self) -> Self {
            self.controls.fail_lookup.store(true, Ordering::SeqCst);
            self
        }

        /// Number of repository and batch calls made so far
        pub fn store_calls(&self) -> usize {
            self.controls.calls.load(Ordering::SeqCst)
        }

        /// All readings of an owner, oldest first, without counting the call
        pub fn stored_for(&self, owner_id: i64) -> Vec<HealthReading> {
            self.inner
                .storage
                .list_readings(owner_id, &ReadingFilter::chronological())
                .map(|(readings, _)| readings)
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl HealthReadingRepositoryTrait for MockHealthReadingRepository {
        async fn insert(&self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
            self.controls.record();
            self.inner.insert(reading).await
        }

        async fn find_by_owner_and_timestamp(
            &self,
            owner_id: i64,
            timestamp: NaiveDateTime,
        ) -> Result<Option<HealthReading>, RepositoryError> {
            self.controls.lookup()?;
            self.inner.find_by_owner_and_timestamp(owner_id, timestamp).await
        }

        async fn get_by_id(&self, id: i64) -> Result<Option<HealthReading>, RepositoryError> {
            self.controls.record();
            self.inner.get_by_id(id).await
        }

        async fn update(&self, reading: HealthReading) -> Result<HealthReading, RepositoryError> {
            self.controls.record();
            self.inner.update(reading).await
        }

        async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
            self.controls.record();
            self.inner.delete(id).await
        }

        async fn list_for_owner(
            &self,
            owner_id: i64,
            filter: ReadingFilter,
        ) -> Result<(Vec<HealthReading>, usize), RepositoryError> {
            self.controls.record();
            self.inner.list_for_owner(owner_id, filter).await
        }

        async fn begin_batch(&self) -> Result<Box<dyn ReadingBatch>, RepositoryError> {
            self.controls.record();
            let inner = self.inner.begin_batch().await?;
            Ok(Box::new(MockReadingBatch {
                inner,
                controls: Arc::clone(&self.controls),
            }))
        }
    }

    struct MockReadingBatch {
        inner: Box<dyn ReadingBatch>,
        controls: Arc<MockControls>,
    }

    #[async_trait]
    impl ReadingBatch for MockReadingBatch {
        async fn find_by_owner_and_timestamp(
            &mut self,
            owner_id: i64,
            timestamp: NaiveDateTime,
        ) -> Result<Option<HealthReading>, RepositoryError> {
            self.controls.lookup()?;
            self.inner.find_by_owner_and_timestamp(owner_id, timestamp).await
        }

        async fn insert(&mut self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
            self.controls.record();
            self.inner.insert(reading).await
        }

        async fn commit(&mut self) -> Result<(), RepositoryError> {
            self.controls.record();
            if self.controls.fail_commit.load(Ordering::SeqCst) {
                return Err(RepositoryError::Batch("injected commit failure".to_string()));
            }
            self.inner.commit().await
        }

        async fn rollback(&mut self) -> Result<(), RepositoryError> {
            self.controls.record();
            self.inner.rollback().await
        }
    }
}
