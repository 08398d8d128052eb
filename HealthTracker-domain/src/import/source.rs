use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A reading field a source column or record key can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Systolic,
    Diastolic,
    HeartRate,
    Tags,
}

impl Field {
    /// Fields every header must declare, also the positional column order
    pub const REQUIRED: [Field; 4] = [Field::Timestamp, Field::Systolic, Field::Diastolic, Field::HeartRate];

    /// Column order for sources without a header
    pub const POSITIONAL: [Field; 5] = [
        Field::Timestamp,
        Field::Systolic,
        Field::Diastolic,
        Field::HeartRate,
        Field::Tags,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Systolic => "systolic",
            Field::Diastolic => "diastolic",
            Field::HeartRate => "heart_rate",
            Field::Tags => "tags",
        }
    }

    /// Resolve a header cell or record key.
    ///
    /// Matching ignores case and a trailing parenthesised unit such as `(mmHg)`,
    /// and accepts the localized column names used by exported measurement files.
    pub fn from_header(cell: &str) -> Option<Field> {
        let mut name = cell.trim();
        for open in ['(', '（'] {
            if let Some(idx) = name.find(open) {
                name = name[..idx].trim_end();
            }
        }

        match name.to_lowercase().as_str() {
            "timestamp" | "测量时间" => Some(Field::Timestamp),
            "systolic" | "高压" => Some(Field::Systolic),
            "diastolic" | "低压" => Some(Field::Diastolic),
            "heart_rate" | "心率" => Some(Field::HeartRate),
            "tags" | "标签" => Some(Field::Tags),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw, untrimmed-by-meaning values of one row keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(HashMap<Field, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the first value seen for a field
    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn has_required(&self) -> bool {
        Field::REQUIRED.iter().all(|f| self.0.contains_key(f))
    }
}

impl<const N: usize> From<[(Field, &str); N]> for FieldValues {
    fn from(pairs: [(Field, &str); N]) -> Self {
        let mut values = FieldValues::new();
        for (field, value) in pairs {
            values.insert(field, value);
        }
        values
    }
}

/// What a source found on one line or record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowContent {
    /// Decoded values ready for coercion
    Fields(FieldValues),
    /// At least one cell holds the `--` placeholder; carries the raw row
    Placeholder(String),
    /// Fewer values than the layout needs; carries the raw row
    Insufficient(String),
}

/// One candidate row together with its 1-based line or record number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub content: RowContent,
}

/// Token exported by measuring devices for a missing value
pub const PLACEHOLDER: &str = "--";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Drop a leading UTF-8 byte order mark
pub(crate) fn strip_bom(source: &[u8]) -> &[u8] {
    source.strip_prefix(UTF8_BOM).unwrap_or(source)
}

/// Conditions that make a whole source unusable
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Missing required fields in header: {}. Expected: timestamp, systolic, diastolic, heart_rate", .missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },

    #[error("Source is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Malformed source: {0}")]
    Malformed(String),
}

/// An ordered, single-pass producer of candidate rows.
///
/// `Ok(None)` marks the end of the source; an `Err` aborts the whole import.
pub trait RowSource: Send {
    fn next_row(&mut self) -> Result<Option<RawRow>, ExtractionError>;
}

/// Verify a header declares every required field
pub(crate) fn check_required(found: impl Iterator<Item = Field> + Clone) -> Result<(), ExtractionError> {
    let missing: Vec<&'static str> = Field::REQUIRED
        .iter()
        .filter(|required| !found.clone().any(|f| f == **required))
        .map(Field::name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExtractionError::MissingFields { missing })
    }
}
