use std::collections::BTreeSet;

use serde_json::Value;

use super::source::{
    check_required, strip_bom, ExtractionError, Field, FieldValues, RawRow, RowContent, RowSource, PLACEHOLDER,
};

/// Row source over a JSON array of objects keyed by field name.
///
/// String and number values are accepted; `null` counts as absent. The keys
/// used across all records act as the header and must cover every required
/// field. Record numbers start at 1.
#[derive(Debug)]
pub struct RecordSource {
    records: std::iter::Enumerate<std::vec::IntoIter<Value>>,
}

impl RecordSource {
    pub fn parse(source: &[u8]) -> Result<Self, ExtractionError> {
        let text = std::str::from_utf8(strip_bom(source)).map_err(|e| ExtractionError::Encoding(e.to_string()))?;

        let records = match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(records)) => records,
            Ok(_) => return Err(ExtractionError::Malformed("expected a JSON array of records".to_string())),
            Err(e) => return Err(ExtractionError::Malformed(e.to_string())),
        };

        let declared: BTreeSet<Field> = records
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|object| object.keys())
            .filter_map(|key| Field::from_header(key))
            .collect();
        check_required(declared.iter().copied())?;

        Ok(Self::from_records(records))
    }

    /// Source over records that were already decoded
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            records: records.into_iter().enumerate(),
        }
    }
}

fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn decode(record: &Value) -> RowContent {
    let raw = record.to_string();
    let Some(object) = record.as_object() else {
        return RowContent::Insufficient(raw);
    };

    let mut values = FieldValues::new();
    let mut placeholder = false;
    for (key, value) in object {
        let (Some(field), Some(value)) = (Field::from_header(key), cell(value)) else {
            continue;
        };
        placeholder |= value == PLACEHOLDER;
        values.insert(field, value);
    }

    if !values.has_required() {
        RowContent::Insufficient(raw)
    } else if placeholder {
        RowContent::Placeholder(raw)
    } else {
        RowContent::Fields(values)
    }
}

impl RowSource for RecordSource {
    fn next_row(&mut self) -> Result<Option<RawRow>, ExtractionError> {
        Ok(self.records.next().map(|(index, record)| RawRow {
            line: index + 1,
            content: decode(&record),
        }))
    }
}
