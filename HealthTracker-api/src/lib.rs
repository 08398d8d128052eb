// HealthTracker-api lib.rs
//
// HTTP surface of HealthTracker: JSON endpoints for persons and readings,
// the bulk import upload and the OpenAPI documentation.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;
