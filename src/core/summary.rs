//! Stage reports and the run summary
//!
//! Each stage returns its own report by value; [`RunSummary::from_stages`]
//! folds them together so nothing is counted through shared state.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::entities::{CaseFile, RecordFile};

/// What went wrong with a skipped item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    #[serde(rename = "ArchiveReadError")]
    ArchiveRead,
    #[serde(rename = "EntryOpenError")]
    EntryOpen,
    #[serde(rename = "IdentityParseError")]
    IdentityParse,
    #[serde(rename = "RecordWriteError")]
    RecordWrite,
    #[serde(rename = "RecordReadError")]
    RecordRead,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::ArchiveRead => "ArchiveReadError",
            FailureKind::EntryOpen => "EntryOpenError",
            FailureKind::IdentityParse => "IdentityParseError",
            FailureKind::RecordWrite => "RecordWriteError",
            FailureKind::RecordRead => "RecordReadError",
        };
        write!(f, "{}", s)
    }
}

/// One item that was skipped because of an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub item: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Archive filter counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterReport {
    /// File entries looked at (directories excluded)
    pub scanned: usize,
    /// Entries that are not documents (other file types, lock files)
    pub ignored: usize,
    /// Documents without a date keyword
    pub excluded: Vec<String>,
    pub retained: usize,
    pub failures: Vec<Failure>,
}

/// Filter stage result
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub cases: Vec<CaseFile>,
    pub report: FilterReport,
}

/// Extraction counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractReport {
    pub extracted: usize,
    /// Total notes across all clients
    pub notes: usize,
    pub failures: Vec<Failure>,
}

/// Extract stage result
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub records: Vec<RecordFile>,
    pub report: ExtractReport,
}

/// Formatting counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub scanned: usize,
    pub ignored: usize,
    pub excluded: Vec<String>,
    pub retained: usize,
    pub extracted: usize,
    pub notes: usize,
    pub workbooks: Vec<PathBuf>,
    pub failures: Vec<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl RunSummary {
    pub fn from_stages(filter: FilterReport, extract: ExtractReport, format: FormatReport) -> Self {
        let mut failures = filter.failures;
        failures.extend(extract.failures);
        failures.extend(format.failures);

        Self {
            scanned: filter.scanned,
            ignored: filter.ignored,
            excluded: filter.excluded,
            retained: filter.retained,
            extracted: extract.extracted,
            notes: extract.notes,
            workbooks: format.written,
            failures,
            output_dir: None,
        }
    }

    /// Workbooks written
    pub fn processed(&self) -> usize {
        self.workbooks.len()
    }

    /// Documents dropped by the filter
    pub fn skipped(&self) -> usize {
        self.excluded.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}
