// Storage models shared by the repositories
pub mod health_reading;
pub mod person;

pub use health_reading::{
    truncate_to_seconds, HealthReading, NewHealthReading, ReadingFilter, TIMESTAMP_FORMAT,
};
pub use person::{NewPerson, Person};
