use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use health_tracker_domain::entities::Reading;
use health_tracker_domain::services::{PersonServiceError, ReadingServiceError};

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a not found error response
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    /// Create a validation error response
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create a bad request error response
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    /// The owner already has a reading at the submitted timestamp
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new("insufficient_data", message)
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "insufficient_data" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ReadingServiceError> for ErrorResponse {
    fn from(err: ReadingServiceError) -> Self {
        match err {
            ReadingServiceError::Validation(msg) => ErrorResponse::validation_error(msg),
            ReadingServiceError::Duplicate => ErrorResponse::conflict(err.to_string()),
            ReadingServiceError::NotFound => ErrorResponse::not_found(err.to_string()),
            ReadingServiceError::InsufficientData(msg) => ErrorResponse::insufficient_data(msg),
            ReadingServiceError::Repository(msg) => {
                error!("Reading service failure: {}", msg);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<PersonServiceError> for ErrorResponse {
    fn from(err: PersonServiceError) -> Self {
        match err {
            PersonServiceError::Validation(msg) => ErrorResponse::validation_error(msg),
            PersonServiceError::NotFound(_) => ErrorResponse::not_found(err.to_string()),
            PersonServiceError::Repository(msg) => {
                error!("Person service failure: {}", msg);
                ErrorResponse::internal_error()
            }
        }
    }
}

/// Paginated response format
#[derive(Debug, Serialize, ToSchema)]
#[aliases(ReadingPage = PaginatedResponse<Reading>)]
pub struct PaginatedResponse<T> {
    /// Total count of items matching the query
    pub total_count: usize,

    /// Current offset
    pub offset: usize,

    /// Number of items returned
    pub count: usize,

    /// Actual data items
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: usize, offset: usize) -> Self {
        Self {
            total_count,
            offset,
            count: data.len(),
            data,
        }
    }
}
