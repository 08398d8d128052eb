use async_trait::async_trait;
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::{NewPerson, Person};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for registered persons
#[async_trait]
pub trait PersonRepositoryTrait: Send + Sync {
    /// Register a new person
    async fn create(&self, person: NewPerson) -> Result<Person, RepositoryError>;

    /// Get a person by id
    async fn get_by_id(&self, id: i64) -> Result<Option<Person>, RepositoryError>;

    /// All persons in registration order
    async fn list(&self) -> Result<Vec<Person>, RepositoryError>;
}

/// Persons stored in SQLite
#[derive(Debug, Clone)]
pub struct SqlitePersonRepository {
    pool: DatabasePool,
}

impl SqlitePersonRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonRepositoryTrait for SqlitePersonRepository {
    async fn create(&self, person: NewPerson) -> Result<Person, RepositoryError> {
        let conn = self.pool.get()?;
        let person = DatabaseStorage::insert_person(&conn, &person)?;
        debug!("Registered person id={}", person.id);
        Ok(person)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Person>, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::get_person(&conn, id)
    }

    async fn list(&self) -> Result<Vec<Person>, RepositoryError> {
        let conn = self.pool.get()?;
        DatabaseStorage::list_persons(&conn)
    }
}

/// Persons held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersonRepository {
    storage: InMemoryStorage,
}

impl InMemoryPersonRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(storage: InMemoryStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PersonRepositoryTrait for InMemoryPersonRepository {
    async fn create(&self, person: NewPerson) -> Result<Person, RepositoryError> {
        self.storage.insert_person(person)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Person>, RepositoryError> {
        self.storage.get_person(id)
    }

    async fn list(&self) -> Result<Vec<Person>, RepositoryError> {
        self.storage.list_persons()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_in_memory_pool;

    fn new_person(name: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            age: 52,
            gender: "F".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_sqlite_person_roundtrip() {
        let repo = SqlitePersonRepository::new(initialize_in_memory_pool().unwrap());

        let first = repo.create(new_person("Ana")).await.unwrap();
        let second = repo.create(new_person("Bea")).await.unwrap();
        assert_ne!(first.id, second.id);

        assert_eq!(repo.get_by_id(first.id).await.unwrap(), Some(first.clone()));
        assert!(repo.get_by_id(second.id + 1).await.unwrap().is_none());

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Ana", "Bea"]);
    }

    #[tokio::test]
    async fn test_in_memory_person_ids_increase() {
        let repo = InMemoryPersonRepository::new();
        let first = repo.create(new_person("Ana")).await.unwrap();
        let second = repo.create(new_person("Bea")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
