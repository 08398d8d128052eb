// Public entities for the HealthTracker API
// Request and response bodies that only exist at the HTTP boundary

// Error responses and pagination
pub mod common;

// Reading payloads, query parameters and import responses
pub mod readings;

pub use common::{ErrorResponse, PaginatedResponse, ReadingPage};
pub use readings::{ImportQueryParams, ImportResponse, InsightsQueryParams, ListQueryParams, ReadingPayload};
