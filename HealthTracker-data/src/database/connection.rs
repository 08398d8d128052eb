//! Database connection module for the HealthTracker application
//!
//! Readings and persons live in a single SQLite database accessed through an
//! r2d2 connection pool. The pool is created explicitly and handed to the
//! repositories; nothing in this crate keeps a global connection.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tracing::{error, info, warn};

use super::migrations::run_sqlite_migrations;
use super::DatabaseError;

/// Default location of the SQLite database file
pub const DEFAULT_SQLITE_PATH: &str = "data/health_tracker.db";

/// Milliseconds a connection waits on a locked database before giving up
const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub sqlite_path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let defaults = Self::default();

        let sqlite_path = env::var("DB_SQLITE_PATH").unwrap_or(defaults.sqlite_path);

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| {
                DatabaseError::ConfigError(format!("DB_MAX_CONNECTIONS must be a positive integer: {}", e))
            })?,
            Err(_) => defaults.max_connections,
        };

        if max_connections == 0 {
            return Err(DatabaseError::ConfigError(
                "DB_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.timeout_seconds);

        info!(
            "Database configuration: path={}, max_connections={}, timeout={}s",
            sqlite_path, max_connections, timeout_seconds
        );

        Ok(DatabaseConfig {
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Pooled SQLite connections shared by the repositories
#[derive(Clone)]
pub struct DatabasePool {
    inner: r2d2::Pool<SqliteConnectionManager>,
    location: String,
}

impl fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("DatabasePool")
            .field("location", &self.location)
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl DatabasePool {
    /// Check out a connection from the pool
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, DatabaseError> {
        self.inner.get().map_err(DatabaseError::SqlitePoolError)
    }

    /// Where the database lives (file path or `:memory:`)
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Describe the current connection state, verifying a connection can be obtained
    pub fn connection_info(&self) -> Result<String, DatabaseError> {
        let conn = self.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

        let state = self.inner.state();
        Ok(format!(
            "SQLite database at {} (connections: active={}, idle={})",
            self.location, state.connections, state.idle_connections
        ))
    }
}

fn configure_connection(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Initialize the database connection pool and run migrations
pub fn initialize_database_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing SQLite database at: {}", config.sqlite_path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = Path::new(&config.sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create directory {:?}: {}", parent, e);
                DatabaseError::ConfigError(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(&config.sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
        .with_init(configure_connection);

    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    let pool = DatabasePool {
        inner: pool,
        location: config.sqlite_path.clone(),
    };

    run_migrations(&pool)?;
    info!("SQLite connection pool created successfully");

    Ok(pool)
}

/// Initialize an in-memory SQLite database
///
/// Every connection to `:memory:` opens a separate database, so the pool is
/// limited to a single connection.
pub fn initialize_in_memory_pool() -> Result<DatabasePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)?;

    let pool = DatabasePool {
        inner: pool,
        location: ":memory:".to_string(),
    };

    run_migrations(&pool)?;
    Ok(pool)
}

/// Run database migrations
fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    let conn = pool.get()?;

    info!("Running database migrations");
    run_sqlite_migrations(&conn).map_err(|e| {
        warn!("Migration failed: {}", e);
        DatabaseError::MigrationError(e)
    })?;

    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.sqlite_path, DEFAULT_SQLITE_PATH);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_file_pool_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tracker.db");
        let config = DatabaseConfig {
            sqlite_path: path.to_string_lossy().to_string(),
            max_connections: 2,
            timeout_seconds: 5,
        };

        let pool = initialize_database_pool(&config).unwrap();
        assert!(path.exists());
        assert!(pool.connection_info().unwrap().contains("tracker.db"));
    }

    #[test]
    fn test_in_memory_pool_has_schema() {
        let pool = initialize_in_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('person', 'health_data')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
