// Domain entities and value objects
pub mod conversions;
pub mod person;
pub mod reading;

// Re-export common types for easier imports
pub use person::{Person, RegisterPersonRequest};
pub use reading::{
    BloodPressureCategory, ChartPoint, RawReadingFields, Reading, ReadingInput, ReadingInsights, ReadingQuery,
    FORM_TIMESTAMP_FORMAT,
};
