//! Bulk import of readings.
//!
//! A source is decoded into rows by a [`RowSource`], each row is coerced and
//! validated on its own, and the survivors are inserted through a single
//! store batch. Per-row problems are recorded in the [`ImportReport`]; a
//! problem with the source as a whole or with the store aborts the call and
//! rolls the batch back.

pub mod coercion;
pub mod delimited;
pub mod records;
pub mod report;
pub mod source;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use health_tracker_data::repository::{HealthReadingRepositoryTrait, ReadingBatch, RepositoryError};

use crate::config::ImportConfig;
pub use coercion::{coerce_row, CandidateReading, RowRejection};
pub use delimited::DelimitedSource;
pub use records::RecordSource;
pub use report::{ImportIssue, ImportReport, DEFAULT_SUMMARY_LIMIT};
pub use source::{ExtractionError, Field, FieldValues, RawRow, RowContent, RowSource};

/// Default pattern for timestamps in imported files
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Supported source layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Delimited text whose first line must name every required field
    Delimited,
    /// Delimited text with an optional header and positional columns otherwise
    Legacy,
    /// JSON array of objects keyed by field name
    Records,
}

impl ImportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ImportFormat::Delimited => "delimited",
            ImportFormat::Legacy => "csv",
            ImportFormat::Records => "records",
        }
    }

    /// Infer the format from a file extension
    pub fn from_extension(path: &Path) -> Result<Self, String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(ImportFormat::Legacy),
            "txt" | "tsv" => Ok(ImportFormat::Delimited),
            "json" => Ok(ImportFormat::Records),
            "xls" | "xlsx" => Err("Excel workbooks are not supported; export the sheet as CSV".to_string()),
            "" => Err(format!("Cannot infer import format of {}", path.display())),
            other => Err(format!("Unsupported file type: .{}", other)),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delimited" | "text" | "txt" => Ok(ImportFormat::Delimited),
            "csv" | "legacy" => Ok(ImportFormat::Legacy),
            "records" | "json" => Ok(ImportFormat::Records),
            other => Err(format!(
                "Unsupported import format: '{}'. Expected one of: delimited, csv, records",
                other
            )),
        }
    }
}

/// Per-call import settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Field separator for delimited formats
    pub delimiter: char,
    /// strftime-style pattern for the timestamp column
    pub date_pattern: String,
    /// Person the imported readings belong to
    pub owner_id: i64,
}

impl ImportOptions {
    pub fn new(owner_id: i64) -> Self {
        Self {
            delimiter: ',',
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            owner_id,
        }
    }

    /// Options seeded from configured defaults
    pub fn from_config(config: &ImportConfig, owner_id: i64) -> Self {
        Self {
            delimiter: config.delimiter,
            date_pattern: config.date_format.clone(),
            owner_id,
        }
    }

    fn delimiter_byte(&self) -> Result<u8, String> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r')
            .ok_or_else(|| format!("Unsupported delimiter: {:?}", self.delimiter))
    }
}

/// Reasons an import stops early
#[derive(Debug)]
enum Abort {
    Source(ExtractionError),
    Store(RepositoryError),
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Abort::Source(e) => write!(f, "{}", e),
            Abort::Store(e) => write!(f, "Fatal error during import: {}", e),
        }
    }
}

/// Runs imports against a reading repository
#[derive(Clone)]
pub struct ImportService {
    repository: Arc<dyn HealthReadingRepositoryTrait>,
}

impl ImportService {
    pub fn new(repository: Arc<dyn HealthReadingRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Import `source` in the named format. Every outcome, including failure,
    /// is returned as a report.
    pub async fn import(&self, source: &[u8], format: &str, options: &ImportOptions) -> ImportReport {
        match format.parse::<ImportFormat>() {
            Ok(format) => self.import_as(source, format, options).await,
            Err(message) => {
                warn!("Rejected import: {}", message);
                ImportReport::failed(message)
            }
        }
    }

    /// Import a file, inferring its format from the extension
    pub async fn import_file(&self, path: impl AsRef<Path>, options: &ImportOptions) -> ImportReport {
        let path = path.as_ref();
        let format = match ImportFormat::from_extension(path) {
            Ok(format) => format,
            Err(message) => return ImportReport::failed(message),
        };

        match std::fs::read(path) {
            Ok(bytes) => self.import_as(&bytes, format, options).await,
            Err(e) => {
                error!("Cannot read import file {}: {}", path.display(), e);
                ImportReport::failed(format!("Cannot read {}: {}", path.display(), e))
            }
        }
    }

    pub async fn import_as(&self, source: &[u8], format: ImportFormat, options: &ImportOptions) -> ImportReport {
        let mut report = ImportReport::new();
        let import_id = report.import_id;
        info!(%import_id, %format, owner_id = options.owner_id, bytes = source.len(), "Starting import");

        let mut rows = match open_source(source, format, options) {
            Ok(rows) => rows,
            Err(message) => {
                warn!(%import_id, "Import aborted before reading rows: {}", message);
                report.abort(message);
                return report;
            }
        };

        let mut batch: Option<Box<dyn ReadingBatch>> = None;
        let outcome = self.process(rows.as_mut(), options, &mut report, &mut batch).await;

        let outcome = match (outcome, batch.as_mut()) {
            (Ok(()), Some(batch)) => batch.commit().await.map_err(Abort::Store),
            (outcome, _) => outcome,
        };

        if let Err(abort) = outcome {
            error!(%import_id, "Import failed, rolling back: {}", abort);
            if let Some(batch) = batch.as_mut() {
                if let Err(e) = batch.rollback().await {
                    warn!(%import_id, "Rollback failed: {}", e);
                }
            }
            report.abort(abort.to_string());
        }

        info!(
            %import_id,
            accepted = report.accepted,
            rejected = report.rejected,
            duplicate = report.duplicate,
            fatal = report.is_fatal(),
            "Import finished"
        );
        report
    }

    async fn process(
        &self,
        rows: &mut dyn RowSource,
        options: &ImportOptions,
        report: &mut ImportReport,
        batch: &mut Option<Box<dyn ReadingBatch>>,
    ) -> Result<(), Abort> {
        while let Some(row) = rows.next_row().map_err(Abort::Source)? {
            let candidate = match row.content {
                RowContent::Fields(values) => coerce_row(&values, &options.date_pattern),
                RowContent::Placeholder(raw) => Err(RowRejection::PlaceholderValues(raw)),
                RowContent::Insufficient(raw) => Err(RowRejection::InsufficientValues(raw)),
            };
            let candidate = match candidate {
                Ok(candidate) => candidate,
                Err(rejection) => {
                    debug!("Line {} rejected: {}", row.line, rejection);
                    report.reject(row.line, rejection);
                    continue;
                }
            };

            let batch = match batch {
                Some(batch) => batch,
                None => batch.insert(self.repository.begin_batch().await.map_err(Abort::Store)?),
            };

            let existing = batch
                .find_by_owner_and_timestamp(options.owner_id, candidate.timestamp)
                .await
                .map_err(Abort::Store)?;
            if existing.is_some() {
                debug!("Line {} duplicates reading at {}", row.line, candidate.timestamp);
                report.duplicate += 1;
                continue;
            }

            match batch.insert(candidate.for_owner(options.owner_id)).await {
                Ok(_) => report.accepted += 1,
                Err(e) if e.is_conflict() => report.duplicate += 1,
                Err(e) => return Err(Abort::Store(e)),
            }
        }
        Ok(())
    }
}

fn open_source<'a>(
    source: &'a [u8],
    format: ImportFormat,
    options: &ImportOptions,
) -> Result<Box<dyn RowSource + 'a>, String> {
    std::str::from_utf8(source).map_err(|e| ExtractionError::Encoding(e.to_string()).to_string())?;

    let rows: Box<dyn RowSource + 'a> = match format {
        ImportFormat::Delimited => Box::new(
            DelimitedSource::with_header(source, options.delimiter_byte()?).map_err(|e| e.to_string())?,
        ),
        ImportFormat::Legacy => Box::new(
            DelimitedSource::legacy(source, options.delimiter_byte()?).map_err(|e| e.to_string())?,
        ),
        ImportFormat::Records => Box::new(RecordSource::parse(source).map_err(|e| e.to_string())?),
    };
    Ok(rows)
}
