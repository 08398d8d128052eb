use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::models::{HealthReading, NewHealthReading, NewPerson, Person, ReadingFilter, TIMESTAMP_FORMAT};
use super::errors::RepositoryError;

const READING_COLUMNS: &str = "id, owner_id, timestamp, systolic, diastolic, heart_rate, tags";

/// SQL operations shared by the SQLite repositories and batches.
///
/// Every function takes a plain connection so the same statements run both
/// on pooled connections and inside an open transaction.
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Insert a reading and return it with its assigned id
    pub fn insert_reading(conn: &Connection, reading: &NewHealthReading) -> Result<HealthReading, RepositoryError> {
        debug!(
            "Storing reading in database: owner_id={}, timestamp={}",
            reading.owner_id, reading.timestamp
        );

        conn.execute(
            "INSERT INTO health_data (owner_id, timestamp, systolic, diastolic, heart_rate, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                reading.owner_id,
                format_timestamp(&reading.timestamp),
                reading.systolic,
                reading.diastolic,
                reading.heart_rate,
                reading.tags,
            ],
        )
        .map_err(|e| write_error(e, reading.owner_id, &reading.timestamp))?;

        Ok(reading.clone().into_reading(conn.last_insert_rowid()))
    }

    /// Find the reading an owner recorded at exactly `timestamp`
    pub fn find_by_owner_and_timestamp(
        conn: &Connection,
        owner_id: i64,
        timestamp: &NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM health_data WHERE owner_id = ?1 AND timestamp = ?2",
            READING_COLUMNS
        );
        let reading = conn
            .query_row(&sql, params![owner_id, format_timestamp(timestamp)], reading_from_row)
            .optional()?;
        Ok(reading)
    }

    /// Get a reading by id
    pub fn get_reading(conn: &Connection, id: i64) -> Result<Option<HealthReading>, RepositoryError> {
        debug!("Getting reading by ID from database: id={}", id);

        let sql = format!("SELECT {} FROM health_data WHERE id = ?1", READING_COLUMNS);
        let reading = conn.query_row(&sql, params![id], reading_from_row).optional()?;
        Ok(reading)
    }

    /// Replace every mutable field of an existing reading
    pub fn update_reading(conn: &Connection, reading: &HealthReading) -> Result<HealthReading, RepositoryError> {
        debug!("Updating reading in database: id={}", reading.id);

        let changed = conn
            .execute(
                "UPDATE health_data
                 SET timestamp = ?1, systolic = ?2, diastolic = ?3, heart_rate = ?4, tags = ?5
                 WHERE id = ?6 AND owner_id = ?7",
                params![
                    format_timestamp(&reading.timestamp),
                    reading.systolic,
                    reading.diastolic,
                    reading.heart_rate,
                    reading.tags,
                    reading.id,
                    reading.owner_id,
                ],
            )
            .map_err(|e| write_error(e, reading.owner_id, &reading.timestamp))?;

        if changed == 0 {
            return Err(RepositoryError::NotFound(format!("reading {}", reading.id)));
        }
        Ok(reading.clone())
    }

    /// Delete a reading by id
    pub fn delete_reading(conn: &Connection, id: i64) -> Result<(), RepositoryError> {
        debug!("Deleting reading from database: id={}", id);

        let changed = conn.execute("DELETE FROM health_data WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(format!("reading {}", id)));
        }
        Ok(())
    }

    /// List an owner's readings matching the filter, with the total before pagination
    pub fn list_readings(
        conn: &Connection,
        owner_id: i64,
        filter: &ReadingFilter,
    ) -> Result<(Vec<HealthReading>, usize), RepositoryError> {
        debug!("Getting filtered readings from database: owner_id={}", owner_id);

        let mut where_clauses = vec!["owner_id = ?"];
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(owner_id)];

        if let Some(start) = &filter.start {
            where_clauses.push("timestamp >= ?");
            values.push(Box::new(format_timestamp(start)));
        }
        if let Some(end) = &filter.end {
            where_clauses.push("timestamp <= ?");
            values.push(Box::new(format_timestamp(end)));
        }

        let where_sql = where_clauses.join(" AND ");
        let direction = if filter.sort_desc { "DESC" } else { "ASC" };

        // LIMIT -1 means unbounded in SQLite
        let limit = filter.limit.map_or(-1, |l| l as i64);
        let offset = filter.offset.unwrap_or(0) as i64;

        let query = format!(
            "SELECT {} FROM health_data WHERE {} ORDER BY timestamp {} LIMIT {} OFFSET {}",
            READING_COLUMNS, where_sql, direction, limit, offset
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), reading_from_row)?;

        let mut result = Vec::new();
        for reading in rows {
            result.push(reading?);
        }

        let count_query = format!("SELECT COUNT(*) FROM health_data WHERE {}", where_sql);
        let total: i64 = conn.query_row(&count_query, params_from_iter(values.iter()), |row| row.get(0))?;

        Ok((result, total as usize))
    }

    /// Insert a person and return it with its assigned id
    pub fn insert_person(conn: &Connection, person: &NewPerson) -> Result<Person, RepositoryError> {
        debug!("Storing person in database: name={}", person.name);

        conn.execute(
            "INSERT INTO person (name, age, gender, description) VALUES (?1, ?2, ?3, ?4)",
            params![person.name, person.age, person.gender, person.description],
        )?;

        Ok(person.clone().into_person(conn.last_insert_rowid()))
    }

    pub fn get_person(conn: &Connection, id: i64) -> Result<Option<Person>, RepositoryError> {
        let person = conn
            .query_row(
                "SELECT id, name, age, gender, description FROM person WHERE id = ?1",
                params![id],
                person_from_row,
            )
            .optional()?;
        Ok(person)
    }

    pub fn list_persons(conn: &Connection) -> Result<Vec<Person>, RepositoryError> {
        let mut stmt = conn.prepare("SELECT id, name, age, gender, description FROM person ORDER BY id")?;
        let rows = stmt.query_map([], person_from_row)?;

        let mut result = Vec::new();
        for person in rows {
            result.push(person?);
        }
        Ok(result)
    }
}

fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<HealthReading> {
    let raw: String = row.get(2)?;
    let timestamp = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(HealthReading {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        timestamp,
        systolic: row.get(3)?,
        diastolic: row.get(4)?,
        heart_rate: row.get(5)?,
        tags: row.get(6)?,
    })
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        description: row.get(4)?,
    })
}

/// Translate constraint violations on `health_data` into repository errors
fn write_error(error: rusqlite::Error, owner_id: i64, timestamp: &NaiveDateTime) -> RepositoryError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &error {
        if failure.code == ErrorCode::ConstraintViolation {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return RepositoryError::Conflict(format!(
                        "owner {} already has a reading at {}",
                        owner_id,
                        format_timestamp(timestamp)
                    ));
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return RepositoryError::Validation(format!("owner {} does not exist", owner_id));
                }
                _ => {}
            }
        }
    }
    RepositoryError::Sqlite(error)
}
