//! Record set - the extraction result for one client

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::case_note::CaseNote;
use super::profile::ClientProfile;
use crate::core::identity::ClientIdentity;

/// Profile plus ordered notes for one client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    pub profile: ClientProfile,
    pub notes: Vec<CaseNote>,
}

impl RecordSet {
    /// Identity recovered from the profile's name and ID fields
    pub fn identity(&self) -> Option<ClientIdentity> {
        match (self.profile.client_name(), self.profile.client_id()) {
            (Some(name), Some(id)) => Some(ClientIdentity::new(name, id)),
            _ => None,
        }
    }
}

/// A document retained by the archive filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFile {
    /// Entry name inside the source archive (sanitized relative path)
    pub entry_name: String,

    /// Where the document's bytes live on disk
    pub path: PathBuf,
}

impl CaseFile {
    /// File stem of the original entry, used for identity parsing
    pub fn stem(&self) -> String {
        std::path::Path::new(&self.entry_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// An intermediate record file produced by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFile {
    /// Name of the case file this was extracted from
    pub source: String,

    pub identity: ClientIdentity,

    /// Path to the intermediate CSV
    pub path: PathBuf,
}
