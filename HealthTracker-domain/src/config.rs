//! Import settings read from the environment

use std::env;

use thiserror::Error;
use tracing::info;

use crate::import::{DEFAULT_DATE_PATTERN, DEFAULT_SUMMARY_LIMIT};

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Defaults applied to imports when a request does not override them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// strftime-style pattern for timestamps (`IMPORT_DATE_FORMAT`)
    pub date_format: String,
    /// Field separator for delimited text (`IMPORT_DELIMITER`)
    pub delimiter: char,
    /// Issues listed before the remainder is summarised (`IMPORT_MAX_REPORTED_ERRORS`)
    pub max_reported_errors: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_PATTERN.to_string(),
            delimiter: ',',
            max_reported_errors: DEFAULT_SUMMARY_LIMIT,
        }
    }
}

impl ImportConfig {
    /// Create a new import configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let date_format = lookup("IMPORT_DATE_FORMAT")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.date_format);

        let delimiter = match lookup("IMPORT_DELIMITER") {
            Some(raw) => parse_delimiter(&raw)?,
            None => defaults.delimiter,
        };

        let max_reported_errors = match lookup("IMPORT_MAX_REPORTED_ERRORS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: "IMPORT_MAX_REPORTED_ERRORS",
                reason: e.to_string(),
            })?,
            None => defaults.max_reported_errors,
        };

        info!(
            "Import configuration: date_format={}, delimiter={:?}, max_reported_errors={}",
            date_format, delimiter, max_reported_errors
        );

        Ok(Self {
            date_format,
            delimiter,
            max_reported_errors,
        })
    }
}

/// A single character, or the escape `\t` for tab
pub fn parse_delimiter(raw: &str) -> Result<char, ConfigError> {
    if raw == "\\t" || raw.eq_ignore_ascii_case("tab") {
        return Ok('\t');
    }

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(ConfigError::Invalid {
            name: "IMPORT_DELIMITER",
            reason: format!("expected a single ASCII character, got {:?}", raw),
        }),
    }
}
