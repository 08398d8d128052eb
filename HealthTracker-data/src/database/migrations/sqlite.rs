use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_person_table(conn)?;
    create_health_data_table(conn)?;
    create_health_data_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the person table
fn create_person_table(conn: &Connection) -> Result<(), String> {
    info!("Creating person table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS person (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            gender TEXT NOT NULL,
            description TEXT
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the health readings table
fn create_health_data_table(conn: &Connection) -> Result<(), String> {
    info!("Creating health_data table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL REFERENCES person (id) ON DELETE CASCADE,
            timestamp TEXT NOT NULL,
            systolic INTEGER NOT NULL,
            diastolic INTEGER NOT NULL,
            heart_rate INTEGER NOT NULL,
            tags TEXT
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

/// One reading per owner and timestamp; also serves the per-owner range scans
fn create_health_data_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating indexes on health_data");

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_health_data_owner_timestamp
        ON health_data (owner_id, timestamp)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
