// HealthTracker Domain
// Business logic for the HealthTracker application: the import pipeline,
// the shared vital-sign validator and the reading and person services.

// Import settings read from the environment
pub mod config;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Bulk import of readings from delimited text and record lists
pub mod import;

// Services that implement business logic
pub mod services;

// Vital-sign rules shared by every entry surface
pub mod validation;

// Re-export the database module from the data crate for convenience
pub use health_tracker_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
