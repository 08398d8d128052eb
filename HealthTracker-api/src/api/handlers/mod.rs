pub mod health;
pub mod imports;
pub mod persons;
pub mod readings;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use health::health_check;
pub use imports::import_readings;
pub use persons::{get_person, list_persons, register_person};
pub use readings::{
    create_reading, delete_reading, get_reading, get_reading_chart, get_reading_insights, list_readings,
    update_reading,
};
