// Repository module structure
pub mod errors;
mod health_reading;
mod in_memory;
mod person;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use health_reading::{
    HealthReadingRepositoryTrait, InMemoryHealthReadingRepository, ReadingBatch,
    SqliteHealthReadingRepository,
};
pub use in_memory::InMemoryStorage;
pub use person::{InMemoryPersonRepository, PersonRepositoryTrait, SqlitePersonRepository};

// Re-export test modules for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use health_reading::tests;
