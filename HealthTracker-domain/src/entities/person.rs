use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A registered person who owns readings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub description: Option<String>,
}

/// Request payload for registering a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RegisterPersonRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: i32,

    #[validate(length(min = 1, max = 10, message = "Gender must be between 1 and 10 characters"))]
    pub gender: String,

    #[validate(length(max = 255, message = "Description cannot exceed 255 characters"))]
    pub description: Option<String>,
}
