use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;

use crate::models::{HealthReading, NewHealthReading, NewPerson, Person, ReadingFilter};
use super::errors::RepositoryError;

#[derive(Debug, Default)]
struct MemoryState {
    readings: BTreeMap<i64, HealthReading>,
    persons: BTreeMap<i64, Person>,
    last_reading_id: i64,
    last_person_id: i64,
}

impl MemoryState {
    fn occupied(&self, owner_id: i64, timestamp: &NaiveDateTime, except: Option<i64>) -> Option<&HealthReading> {
        self.readings.values().find(|r| {
            r.owner_id == owner_id && r.timestamp == *timestamp && Some(r.id) != except
        })
    }
}

/// In-memory storage used when no database is available, and by tests.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

fn conflict(owner_id: i64, timestamp: &NaiveDateTime) -> RepositoryError {
    RepositoryError::Conflict(format!("owner {} already has a reading at {}", owner_id, timestamp))
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        Ok(self.state.lock()?)
    }

    /// Reserve the next reading id without storing anything
    pub(crate) fn next_reading_id(&self) -> Result<i64, RepositoryError> {
        let mut state = self.lock()?;
        state.last_reading_id += 1;
        Ok(state.last_reading_id)
    }

    pub fn insert_reading(&self, reading: NewHealthReading) -> Result<HealthReading, RepositoryError> {
        let reading = reading.into_reading(self.next_reading_id()?);
        self.insert_all(vec![reading.clone()])?;
        Ok(reading)
    }

    /// Store readings with pre-assigned ids; nothing is stored if any timestamp is taken
    pub(crate) fn insert_all(&self, readings: Vec<HealthReading>) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;

        for (i, reading) in readings.iter().enumerate() {
            let repeated = readings[..i]
                .iter()
                .any(|r| r.owner_id == reading.owner_id && r.timestamp == reading.timestamp);
            if repeated || state.occupied(reading.owner_id, &reading.timestamp, None).is_some() {
                return Err(conflict(reading.owner_id, &reading.timestamp));
            }
        }

        for reading in readings {
            state.readings.insert(reading.id, reading);
        }
        Ok(())
    }

    pub fn find_by_owner_and_timestamp(
        &self,
        owner_id: i64,
        timestamp: &NaiveDateTime,
    ) -> Result<Option<HealthReading>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.occupied(owner_id, timestamp, None).cloned())
    }

    pub fn get_reading(&self, id: i64) -> Result<Option<HealthReading>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.readings.get(&id).cloned())
    }

    pub fn update_reading(&self, reading: HealthReading) -> Result<HealthReading, RepositoryError> {
        let mut state = self.lock()?;

        match state.readings.get(&reading.id) {
            Some(existing) if existing.owner_id == reading.owner_id => {}
            _ => return Err(RepositoryError::NotFound(format!("reading {}", reading.id))),
        }
        if state.occupied(reading.owner_id, &reading.timestamp, Some(reading.id)).is_some() {
            return Err(conflict(reading.owner_id, &reading.timestamp));
        }

        state.readings.insert(reading.id, reading.clone());
        Ok(reading)
    }

    pub fn delete_reading(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state
            .readings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("reading {}", id)))
    }

    /// Get filtered readings for one owner
    pub fn list_readings(
        &self,
        owner_id: i64,
        filter: &ReadingFilter,
    ) -> Result<(Vec<HealthReading>, usize), RepositoryError> {
        let state = self.lock()?;

        let mut readings: Vec<HealthReading> = state
            .readings
            .values()
            .filter(|r| r.owner_id == owner_id && filter.matches(&r.timestamp))
            .cloned()
            .collect();

        readings.sort_by(|a, b| {
            let cmp = a.timestamp.cmp(&b.timestamp);
            if filter.sort_desc {
                cmp.reverse()
            } else {
                cmp
            }
        });

        // Apply pagination
        let total = readings.len();
        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(total);

        let page = readings.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    pub fn insert_person(&self, person: NewPerson) -> Result<Person, RepositoryError> {
        let mut state = self.lock()?;
        state.last_person_id += 1;
        let person = person.into_person(state.last_person_id);
        state.persons.insert(person.id, person.clone());
        Ok(person)
    }

    pub fn get_person(&self, id: i64) -> Result<Option<Person>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.persons.get(&id).cloned())
    }

    pub fn list_persons(&self) -> Result<Vec<Person>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.persons.values().cloned().collect())
    }
}
