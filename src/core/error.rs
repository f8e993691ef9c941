//! Pipeline error kinds
//!
//! A run stops on [`CaseError::ArchiveRead`], or on a [`CaseError::RecordWrite`]
//! for the output directory itself. Every other error is recorded against the
//! item that failed and the batch moves on.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::IdentityParseError;
use crate::core::summary::{Failure, FailureKind};
use crate::docx::DocxError;

#[derive(Debug, Error, Diagnostic)]
pub enum CaseError {
    #[error("cannot read archive {path:?}: {message}")]
    #[diagnostic(
        code(casenotes::archive_read),
        help("check that the path exists and is a ZIP archive")
    )]
    ArchiveRead { path: PathBuf, message: String },

    #[error("cannot open '{entry}' as a DOCX document: {source}")]
    #[diagnostic(code(casenotes::entry_open))]
    EntryOpen {
        entry: String,
        #[source]
        source: DocxError,
    },

    #[error("cannot identify client for '{entry}': {source}")]
    #[diagnostic(
        code(casenotes::identity_parse),
        help("rename the file to match the configured naming convention")
    )]
    IdentityParse {
        entry: String,
        #[source]
        source: IdentityParseError,
    },

    #[error("cannot write {path:?}: {message}")]
    #[diagnostic(code(casenotes::record_write))]
    RecordWrite { path: PathBuf, message: String },

    #[error("cannot read record set {path:?}: {message}")]
    #[diagnostic(code(casenotes::record_read))]
    RecordRead { path: PathBuf, message: String },
}

impl CaseError {
    pub fn archive_read(path: &Path, err: impl std::fmt::Display) -> Self {
        CaseError::ArchiveRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn entry_open(entry: &str, source: DocxError) -> Self {
        CaseError::EntryOpen {
            entry: entry.to_string(),
            source,
        }
    }

    pub fn record_write(path: &Path, err: impl std::fmt::Display) -> Self {
        CaseError::RecordWrite {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn record_read(path: &Path, err: impl std::fmt::Display) -> Self {
        CaseError::RecordRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CaseError::ArchiveRead { .. } => FailureKind::ArchiveRead,
            CaseError::EntryOpen { .. } => FailureKind::EntryOpen,
            CaseError::IdentityParse { .. } => FailureKind::IdentityParse,
            CaseError::RecordWrite { .. } => FailureKind::RecordWrite,
            CaseError::RecordRead { .. } => FailureKind::RecordRead,
        }
    }

    /// The entry or file the error is about
    pub fn item(&self) -> String {
        match self {
            CaseError::EntryOpen { entry, .. } | CaseError::IdentityParse { entry, .. } => {
                entry.clone()
            }
            CaseError::ArchiveRead { path, .. }
            | CaseError::RecordWrite { path, .. }
            | CaseError::RecordRead { path, .. } => path.display().to_string(),
        }
    }

    /// Record this error for the run summary
    pub fn into_failure(self) -> Failure {
        let message = match &self {
            CaseError::EntryOpen { source, .. } => source.to_string(),
            CaseError::IdentityParse { source, .. } => source.to_string(),
            CaseError::ArchiveRead { message, .. }
            | CaseError::RecordWrite { message, .. }
            | CaseError::RecordRead { message, .. } => message.clone(),
        };
        Failure {
            item: self.item(),
            kind: self.kind(),
            message,
        }
    }
}
