use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

use crate::entities::{Person, RegisterPersonRequest};
use health_tracker_data::repository::{PersonRepositoryTrait, RepositoryError};

/// Person service errors
#[derive(Debug, Error)]
pub enum PersonServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Person {0} not found")]
    NotFound(i64),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for PersonServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(msg) => PersonServiceError::Validation(msg),
            other => {
                error!("Person repository failure: {}", other);
                PersonServiceError::Repository(other.to_string())
            }
        }
    }
}

/// Registration and lookup of the people who own readings
#[derive(Clone)]
pub struct PersonService {
    repository: Arc<dyn PersonRepositoryTrait>,
}

impl PersonService {
    pub fn new(repository: Arc<dyn PersonRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub async fn register(&self, request: RegisterPersonRequest) -> Result<Person, PersonServiceError> {
        request.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .iter()
                .map(|(field, errs)| {
                    let messages: Vec<String> = errs
                        .iter()
                        .map(|err| match &err.message {
                            Some(msg) => msg.to_string(),
                            None => format!("Invalid {}", field),
                        })
                        .collect();
                    format!("{}: {}", field, messages.join(", "))
                })
                .collect::<Vec<_>>()
                .join("; ");
            PersonServiceError::Validation(message)
        })?;

        let person = self.repository.create(request.into()).await?;
        info!("Registered person {}", person.id);
        Ok(person.into())
    }

    pub async fn get(&self, id: i64) -> Result<Person, PersonServiceError> {
        self.repository
            .get_by_id(id)
            .await?
            .map(Person::from)
            .ok_or(PersonServiceError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Person>, PersonServiceError> {
        let persons = self.repository.list().await?;
        Ok(persons.into_iter().map(Person::from).collect())
    }
}
