// Database migrations module
// Schema creation is idempotent; there is no migration history table.

mod sqlite;
pub use sqlite::run_migrations as run_sqlite_migrations;
