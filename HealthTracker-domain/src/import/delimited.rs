//! Delimited text sources.
//!
//! Two layouts share one reader: an explicit header that must name every
//! required field, and the legacy export layout whose header is optional and
//! whose columns otherwise follow the fixed positional order.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::source::{
    check_required, strip_bom, ExtractionError, Field, FieldValues, RawRow, RowContent, RowSource, PLACEHOLDER,
};

/// Minimum populated cells for a row without a header
const POSITIONAL_MIN_VALUES: usize = 4;

/// How columns map to fields
#[derive(Debug, Clone)]
enum Layout {
    /// Column index -> field, as declared by the header
    Header(Vec<Option<Field>>),
    Positional,
}

/// Row source over comma (or other single-byte) separated text
pub struct DelimitedSource<'a> {
    reader: csv::Reader<&'a [u8]>,
    layout: Layout,
    lines: LineCounter<'a>,
}

/// Maps record byte offsets to 1-based line numbers.
///
/// The reader reports a record as starting where the previous one ended, which
/// is before any blank lines it skipped.
struct LineCounter<'a> {
    text: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a [u8]) -> Self {
        Self { text, offset: 0, line: 1 }
    }

    fn line_at(&mut self, byte: usize) -> usize {
        let mut start = byte.min(self.text.len());
        while start < self.text.len() && matches!(self.text[start], b'\n' | b'\r') {
            start += 1;
        }
        if start >= self.offset {
            self.line += self.text[self.offset..start].iter().filter(|&&b| b == b'\n').count();
            self.offset = start;
        }
        self.line
    }
}

impl std::fmt::Debug for DelimitedSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedSource").field("layout", &self.layout).finish()
    }
}

fn reader(source: &[u8], delimiter: u8) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(source)
}

fn malformed(error: csv::Error) -> ExtractionError {
    match error.kind() {
        csv::ErrorKind::Utf8 { .. } => ExtractionError::Encoding(error.to_string()),
        _ => ExtractionError::Malformed(error.to_string()),
    }
}

fn mentions_timestamp(cell: &str) -> bool {
    cell.to_lowercase().contains("timestamp") || cell.contains("测量时间")
}

fn header_layout(record: &StringRecord) -> Result<Layout, ExtractionError> {
    let columns: Vec<Option<Field>> = record.iter().map(Field::from_header).collect();
    check_required(columns.iter().flatten().copied())?;
    Ok(Layout::Header(columns))
}

/// Legacy headers may decorate the timestamp column, e.g. `Measurement Timestamp`
fn legacy_header_layout(record: &StringRecord) -> Result<Layout, ExtractionError> {
    let mut columns: Vec<Option<Field>> = record.iter().map(Field::from_header).collect();
    if !columns.contains(&Some(Field::Timestamp)) {
        if let Some(idx) = record.iter().position(mentions_timestamp) {
            columns[idx] = Some(Field::Timestamp);
        }
    }
    check_required(columns.iter().flatten().copied())?;
    Ok(Layout::Header(columns))
}

impl<'a> DelimitedSource<'a> {
    /// Source whose first line must be a header naming every required field
    pub fn with_header(source: &'a [u8], delimiter: u8) -> Result<Self, ExtractionError> {
        let source = strip_bom(source);
        let mut reader = reader(source, delimiter);
        let mut first = StringRecord::new();
        // An empty source has an empty header
        reader.read_record(&mut first).map_err(malformed)?;

        let layout = header_layout(&first)?;
        Ok(Self {
            reader,
            layout,
            lines: LineCounter::new(source),
        })
    }

    /// Legacy export layout: a header is used when the first line names the
    /// timestamp column, otherwise every line is data in positional order
    pub fn legacy(source: &'a [u8], delimiter: u8) -> Result<Self, ExtractionError> {
        let source = strip_bom(source);
        let mut probe = reader(source, delimiter);
        let mut first = StringRecord::new();
        let has_header = probe.read_record(&mut first).map_err(malformed)?
            && first.iter().any(mentions_timestamp);

        if has_header {
            debug!("Detected header in legacy source");
            let layout = legacy_header_layout(&first)?;
            return Ok(Self {
                reader: probe,
                layout,
                lines: LineCounter::new(source),
            });
        }

        Ok(Self {
            reader: reader(source, delimiter),
            layout: Layout::Positional,
            lines: LineCounter::new(source),
        })
    }

    fn decode(&self, record: &StringRecord) -> RowContent {
        let raw = format!("{:?}", record.iter().collect::<Vec<_>>());

        let needed = match &self.layout {
            Layout::Header(columns) => columns.len(),
            Layout::Positional => POSITIONAL_MIN_VALUES,
        };
        if record.len() < needed {
            return RowContent::Insufficient(raw);
        }
        if record.iter().any(|cell| cell == PLACEHOLDER) {
            return RowContent::Placeholder(raw);
        }

        let mut values = FieldValues::new();
        match &self.layout {
            Layout::Header(columns) => {
                for (field, cell) in columns.iter().zip(record.iter()) {
                    if let Some(field) = field {
                        values.insert(*field, cell);
                    }
                }
            }
            Layout::Positional => {
                for (field, cell) in Field::POSITIONAL.iter().zip(record.iter()) {
                    values.insert(*field, cell);
                }
            }
        }
        RowContent::Fields(values)
    }
}

impl RowSource for DelimitedSource<'_> {
    fn next_row(&mut self) -> Result<Option<RawRow>, ExtractionError> {
        let mut record = StringRecord::new();
        loop {
            if !self.reader.read_record(&mut record).map_err(malformed)? {
                return Ok(None);
            }
            // Lines holding only separators or whitespace carry no data
            if record.iter().all(str::is_empty) {
                continue;
            }

            let byte = record.position().map_or(0, |p| p.byte() as usize);
            let line = self.lines.line_at(byte);
            return Ok(Some(RawRow {
                line,
                content: self.decode(&record),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(mut source: impl RowSource) -> Vec<RawRow> {
        let mut rows = Vec::new();
        while let Some(row) = source.next_row().unwrap() {
            rows.push(row);
        }
        rows
    }

    fn fields(row: &RawRow) -> &FieldValues {
        match &row.content {
            RowContent::Fields(values) => values,
            other => panic!("expected fields, got {:?}", other),
        }
    }

    #[test]
    fn test_header_maps_columns_by_name() {
        let text = "heart_rate,tags,timestamp,diastolic,systolic\n70,morning,2024-01-01 08:00:00,80,120\n";
        let rows = rows(DelimitedSource::with_header(text.as_bytes(), b',').unwrap());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        let values = fields(&rows[0]);
        assert_eq!(values.get(Field::Systolic), Some("120"));
        assert_eq!(values.get(Field::HeartRate), Some("70"));
        assert_eq!(values.get(Field::Tags), Some("morning"));
    }

    #[test]
    fn test_header_missing_field_is_fatal() {
        let text = "timestamp,systolic,diastolic\n2024-01-01 08:00:00,120,80\n";
        let err = DelimitedSource::with_header(text.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, ExtractionError::MissingFields { ref missing } if missing == &vec!["heart_rate"]));
    }

    #[test]
    fn test_empty_source_has_no_header() {
        assert!(DelimitedSource::with_header(b"", b',').is_err());
        assert!(rows(DelimitedSource::legacy(b"", b',').unwrap()).is_empty());
    }

    #[test]
    fn test_custom_delimiter_and_blank_lines() {
        let text = "timestamp;systolic;diastolic;heart_rate\n\n2024-01-01 08:00:00;120;80;70\n;;;\n2024-01-02 08:00:00;121;81;71\n";
        let rows = rows(DelimitedSource::with_header(text.as_bytes(), b';').unwrap());
        assert_eq!(rows.iter().map(|r| r.line).collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn test_insufficient_checked_before_placeholder() {
        let text = "timestamp,systolic,diastolic,heart_rate,tags\n2024-01-01 08:00:00,--,--\n2024-01-02 08:00:00,--,--,--,x\n";
        let rows = rows(DelimitedSource::with_header(text.as_bytes(), b',').unwrap());
        assert!(matches!(rows[0].content, RowContent::Insufficient(_)));
        assert!(matches!(rows[1].content, RowContent::Placeholder(_)));
    }

    #[test]
    fn test_legacy_detects_localized_header_with_bom() {
        let text = "\u{feff}测量时间,高压(mmHg),低压(mmHg),心率(bpm)\n2025-03-04 07:45:00,127,83,65\n2025-02-22 00:00:00,--,--,--\n";
        let rows = rows(DelimitedSource::legacy(text.as_bytes(), b',').unwrap());

        assert_eq!(rows.len(), 2);
        assert_eq!(fields(&rows[0]).get(Field::Timestamp), Some("2025-03-04 07:45:00"));
        assert_eq!(fields(&rows[0]).get(Field::Diastolic), Some("83"));
        match &rows[1].content {
            RowContent::Placeholder(raw) => assert!(raw.contains("2025-02-22 00:00:00")),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_without_header_is_positional() {
        let text = "2024-01-01 08:00:00,120,80,70,evening\n2024-01-02 08:00:00,120\n";
        let rows = rows(DelimitedSource::legacy(text.as_bytes(), b',').unwrap());

        assert_eq!(rows[0].line, 1);
        assert_eq!(fields(&rows[0]).get(Field::Tags), Some("evening"));
        assert!(matches!(rows[1].content, RowContent::Insufficient(_)));
    }

    #[test]
    fn test_legacy_header_detected_by_substring() {
        let text = "Measurement Timestamp,systolic,diastolic,heart_rate\n2024-01-01 08:00:00,120,80,70\n";
        let rows = rows(DelimitedSource::legacy(text.as_bytes(), b',').unwrap());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        let values = fields(&rows[0]);
        assert_eq!(values.get(Field::Timestamp), Some("2024-01-01 08:00:00"));
        assert_eq!(values.get(Field::Systolic), Some("120"));
    }

    #[test]
    fn test_legacy_header_still_requires_fields() {
        let text = "Timestamp,Systolic\n2024-01-01 08:00:00,120\n";
        assert!(DelimitedSource::legacy(text.as_bytes(), b',').is_err());
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let mut source = b"timestamp,systolic,diastolic,heart_rate\n".to_vec();
        source.extend_from_slice(b"2024-01-01 08:00:00,\xff\xfe,80,70\n");
        let mut reader = DelimitedSource::with_header(&source, b',').unwrap();
        assert!(matches!(reader.next_row(), Err(ExtractionError::Encoding(_))));
    }
}
