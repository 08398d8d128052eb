use std::sync::Arc;

use tracing::info;

use health_tracker_data::database::DatabasePool;
use health_tracker_data::repository::{
    HealthReadingRepositoryTrait, InMemoryHealthReadingRepository, InMemoryPersonRepository, InMemoryStorage,
    PersonRepositoryTrait, SqliteHealthReadingRepository, SqlitePersonRepository,
};
use health_tracker_domain::config::ImportConfig;
use health_tracker_domain::import::ImportService;
use health_tracker_domain::services::{PersonService, ReadingService};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub readings: ReadingService,
    pub imports: ImportService,
    pub persons: PersonService,
    pub import_config: Arc<ImportConfig>,
    /// Absent when the server runs on in-memory storage
    pub pool: Option<DatabasePool>,
}

impl AppState {
    /// Services backed by SQLite
    pub fn sqlite(pool: DatabasePool, import_config: ImportConfig) -> Self {
        info!("Using SQLite storage at {}", pool.location());
        let readings: Arc<dyn HealthReadingRepositoryTrait> =
            Arc::new(SqliteHealthReadingRepository::new(pool.clone()));
        let persons: Arc<dyn PersonRepositoryTrait> = Arc::new(SqlitePersonRepository::new(pool.clone()));
        Self::from_repositories(readings, persons, import_config, Some(pool))
    }

    /// Services backed by one shared in-memory store; nothing is persisted
    pub fn in_memory(import_config: ImportConfig) -> Self {
        info!("Using in-memory storage");
        let storage = InMemoryStorage::new();
        let readings: Arc<dyn HealthReadingRepositoryTrait> =
            Arc::new(InMemoryHealthReadingRepository::with_storage(storage.clone()));
        let persons: Arc<dyn PersonRepositoryTrait> = Arc::new(InMemoryPersonRepository::with_storage(storage));
        Self::from_repositories(readings, persons, import_config, None)
    }

    pub fn from_repositories(
        readings: Arc<dyn HealthReadingRepositoryTrait>,
        persons: Arc<dyn PersonRepositoryTrait>,
        import_config: ImportConfig,
        pool: Option<DatabasePool>,
    ) -> Self {
        Self {
            readings: ReadingService::new(readings.clone()),
            imports: ImportService::new(readings),
            persons: PersonService::new(persons),
            import_config: Arc::new(import_config),
            pool,
        }
    }
}
