use std::fmt;

use serde::Serialize;
use uuid::Uuid;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Issues shown by `summary` when the caller has no preference
pub const DEFAULT_SUMMARY_LIMIT: usize = 5;

/// One problem found during an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportIssue {
    /// A rejected row; processing continued
    Row { line: usize, reason: String },
    /// The import was aborted and nothing was stored
    Fatal { message: String },
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportIssue::Row { line, reason } => write!(f, "Line {}: {}", line, reason),
            ImportIssue::Fatal { message } => f.write_str(message),
        }
    }
}

/// Aggregate outcome of one import call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ImportReport {
    /// Correlates this report with the import's log lines
    pub import_id: Uuid,
    /// Rows stored
    pub accepted: usize,
    /// Rows refused for parse or validation reasons
    pub rejected: usize,
    /// Rows skipped because the owner already has a reading at that time
    pub duplicate: usize,
    /// Per-row issues in source order, followed by at most one fatal issue
    pub issues: Vec<ImportIssue>,
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportReport {
    pub fn new() -> Self {
        Self {
            import_id: Uuid::new_v4(),
            accepted: 0,
            rejected: 0,
            duplicate: 0,
            issues: Vec::new(),
        }
    }

    /// A report for an import that never started
    pub fn failed(message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.abort(message);
        report
    }

    pub fn reject(&mut self, line: usize, reason: impl fmt::Display) {
        self.rejected += 1;
        self.issues.push(ImportIssue::Row {
            line,
            reason: reason.to_string(),
        });
    }

    /// Record the single fatal issue and discard accepted rows, which were rolled back
    pub fn abort(&mut self, message: impl Into<String>) {
        self.accepted = 0;
        if !self.is_fatal() {
            self.issues.push(ImportIssue::Fatal {
                message: message.into(),
            });
        }
    }

    pub fn fatal(&self) -> Option<&str> {
        self.issues.iter().find_map(|issue| match issue {
            ImportIssue::Fatal { message } => Some(message.as_str()),
            ImportIssue::Row { .. } => None,
        })
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal().is_some()
    }

    /// Rows that reached an outcome
    pub fn processed(&self) -> usize {
        self.accepted + self.rejected + self.duplicate
    }

    /// The first `limit` issue descriptions, plus a line counting the rest
    pub fn summary(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self.issues.iter().take(limit).map(ToString::to_string).collect();
        if self.issues.len() > limit {
            lines.push(format!("... and {} more", self.issues.len() - limit));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_caps_issues_but_keeps_counts() {
        let mut report = ImportReport::new();
        for line in 2..=9 {
            report.reject(line, "Row contains placeholder values");
        }

        let summary = report.summary(DEFAULT_SUMMARY_LIMIT);
        assert_eq!(summary.len(), 6);
        assert_eq!(summary[0], "Line 2: Row contains placeholder values");
        assert_eq!(summary[5], "... and 3 more");
        assert_eq!(report.rejected, 8);

        assert_eq!(report.summary(20).len(), 8);
    }

    #[test]
    fn test_abort_zeroes_accepted_once() {
        let mut report = ImportReport::new();
        report.accepted = 3;
        report.reject(4, "bad");
        report.abort("Fatal error during import: store unavailable");
        report.abort("second failure");

        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.fatal(), Some("Fatal error during import: store unavailable"));
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_issue_serialization() {
        let issue = ImportIssue::Row {
            line: 3,
            reason: "Invalid timestamp format: x".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "row");
        assert_eq!(json["line"], 3);
    }
}
