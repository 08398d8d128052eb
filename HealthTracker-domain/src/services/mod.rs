// Domain services
// Business logic shared by every entry surface.

pub mod insights;
pub mod persons;
pub mod readings;

pub use insights::{calculate_insights, categorize_blood_pressure};
pub use persons::{PersonService, PersonServiceError};
pub use readings::{ReadingService, ReadingServiceError, DUPLICATE_TIMESTAMP_MESSAGE};
