//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first: built-in defaults, the global user config
//! (`<config dir>/casenotes/config.yaml`), `./casenotes.yaml`, an explicit
//! `--config` file, then `CASENOTES_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::ConventionKind;
use crate::entities::profile::default_profile_fields;
use crate::entities::NoteOrder;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = "casenotes.yaml";

/// Default keywords that mark a document as a case file
pub const DEFAULT_KEYWORDS: &[&str] = &["Entry Date", "Exit Date"];

/// Default labels allowed in front of a note date
pub const DEFAULT_DATE_LABELS: &[&str] = &["Date", "Entry Date", "Exit Date", "Note Date"];

/// Entries larger than this are refused
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 100 * 1024 * 1024;

/// Light gray row banding
pub const DEFAULT_BAND_COLOR: &str = "EDEDED";

/// Casenotes configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub identity: IdentityConfig,
    pub notes: NotesConfig,
    pub workbook: WorkbookConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Keywords that mark a document as a case file
    pub keywords: Option<Vec<String>>,

    /// Match keywords case-sensitively (default: false)
    pub case_sensitive: Option<bool>,

    /// Refuse archive entries larger than this many bytes
    pub max_entry_bytes: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// File naming convention (auto, hash, underscore)
    pub convention: Option<ConventionKind>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Only recognize notes after the paragraph containing this text
    pub section_marker: Option<String>,

    /// Require note headers to be bold (legacy strict mode)
    pub bold_headers_only: Option<bool>,

    /// Labels allowed before a note date, e.g. "Entry Date:"
    pub date_labels: Option<Vec<String>>,

    /// Output order of notes
    pub order: Option<NoteOrder>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkbookConfig {
    /// Profile sheet rows, in order
    pub profile_fields: Option<Vec<String>>,

    /// RGB hex fill for banded rows
    pub band_color: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// Implicit files that fail to parse are skipped with a warning; an
    /// explicit `path` that can't be loaded is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl / accessors)

        // 2. Global user config
        if let Some(global_path) = Self::global_config_path() {
            config.merge_implicit(&global_path);
        }

        // 3. Local config (./casenotes.yaml)
        config.merge_implicit(Path::new(LOCAL_CONFIG_FILE));

        // 4. Explicit --config file
        if let Some(path) = explicit {
            config.merge(Self::from_file(path)?);
        }

        // 5. Environment variables
        config.apply_env();

        Ok(config)
    }

    /// Parse a single config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_yml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn merge_implicit(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match Self::from_file(path) {
            Ok(other) => self.merge(other),
            Err(e) => tracing::warn!(path = %path.display(), "ignoring config file: {}", e),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("CASENOTES_CASE_SENSITIVE") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.filter.case_sensitive = Some(true),
                "0" | "false" | "no" => self.filter.case_sensitive = Some(false),
                _ => tracing::warn!("ignoring CASENOTES_CASE_SENSITIVE={}", value),
            }
        }
        if let Ok(value) = std::env::var("CASENOTES_IDENTITY") {
            match value.parse() {
                Ok(kind) => self.identity.convention = Some(kind),
                Err(e) => tracing::warn!("ignoring CASENOTES_IDENTITY: {}", e),
            }
        }
        if let Ok(value) = std::env::var("CASENOTES_NOTE_ORDER") {
            match value.parse() {
                Ok(order) => self.notes.order = Some(order),
                Err(e) => tracing::warn!("ignoring CASENOTES_NOTE_ORDER: {}", e),
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "casenotes")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        let Config {
            filter,
            identity,
            notes,
            workbook,
        } = other;

        if filter.keywords.is_some() {
            self.filter.keywords = filter.keywords;
        }
        if filter.case_sensitive.is_some() {
            self.filter.case_sensitive = filter.case_sensitive;
        }
        if filter.max_entry_bytes.is_some() {
            self.filter.max_entry_bytes = filter.max_entry_bytes;
        }
        if identity.convention.is_some() {
            self.identity.convention = identity.convention;
        }
        if notes.section_marker.is_some() {
            self.notes.section_marker = notes.section_marker;
        }
        if notes.bold_headers_only.is_some() {
            self.notes.bold_headers_only = notes.bold_headers_only;
        }
        if notes.date_labels.is_some() {
            self.notes.date_labels = notes.date_labels;
        }
        if notes.order.is_some() {
            self.notes.order = notes.order;
        }
        if workbook.profile_fields.is_some() {
            self.workbook.profile_fields = workbook.profile_fields;
        }
        if workbook.band_color.is_some() {
            self.workbook.band_color = workbook.band_color;
        }
    }

    /// Config with every default filled in, for display
    pub fn resolved(&self) -> Config {
        Config {
            filter: FilterConfig {
                keywords: Some(self.keywords()),
                case_sensitive: Some(self.case_sensitive()),
                max_entry_bytes: Some(self.max_entry_bytes()),
            },
            identity: IdentityConfig {
                convention: Some(self.convention()),
            },
            notes: NotesConfig {
                section_marker: self.section_marker(),
                bold_headers_only: Some(self.bold_headers_only()),
                date_labels: Some(self.date_labels()),
                order: Some(self.note_order()),
            },
            workbook: WorkbookConfig {
                profile_fields: Some(self.profile_fields()),
                band_color: Some(self.band_color()),
            },
        }
    }

    pub fn keywords(&self) -> Vec<String> {
        self.filter
            .keywords
            .clone()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect())
    }

    pub fn case_sensitive(&self) -> bool {
        self.filter.case_sensitive.unwrap_or(false)
    }

    pub fn max_entry_bytes(&self) -> u64 {
        self.filter.max_entry_bytes.unwrap_or(DEFAULT_MAX_ENTRY_BYTES)
    }

    pub fn convention(&self) -> ConventionKind {
        self.identity.convention.unwrap_or_default()
    }

    pub fn section_marker(&self) -> Option<String> {
        self.notes
            .section_marker
            .clone()
            .filter(|m| !m.trim().is_empty())
    }

    pub fn bold_headers_only(&self) -> bool {
        self.notes.bold_headers_only.unwrap_or(false)
    }

    pub fn date_labels(&self) -> Vec<String> {
        self.notes
            .date_labels
            .clone()
            .unwrap_or_else(|| DEFAULT_DATE_LABELS.iter().map(|s| s.to_string()).collect())
    }

    pub fn note_order(&self) -> NoteOrder {
        self.notes.order.unwrap_or_default()
    }

    pub fn profile_fields(&self) -> Vec<String> {
        self.workbook
            .profile_fields
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(default_profile_fields)
    }

    /// Band color as 6-digit uppercase hex, falling back to the default on bad input
    pub fn band_color(&self) -> String {
        match &self.workbook.band_color {
            Some(c) => {
                let c = c.trim_start_matches('#');
                if c.len() == 6 && c.chars().all(|ch| ch.is_ascii_hexdigit()) {
                    c.to_uppercase()
                } else {
                    tracing::warn!("invalid band_color '{}', using {}", c, DEFAULT_BAND_COLOR);
                    DEFAULT_BAND_COLOR.to_string()
                }
            }
            None => DEFAULT_BAND_COLOR.to_string(),
        }
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {message}")]
    #[diagnostic(code(casenotes::config::read))]
    Read { path: PathBuf, message: String },

    #[error("invalid config file {path:?}: {message}")]
    #[diagnostic(code(casenotes::config::parse), help("check the YAML syntax and key names"))]
    Parse { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.keywords(), vec!["Entry Date", "Exit Date"]);
        assert!(!config.case_sensitive());
        assert_eq!(config.convention(), ConventionKind::Auto);
        assert_eq!(config.note_order(), NoteOrder::Source);
        assert_eq!(config.section_marker(), None);
        assert_eq!(config.band_color(), "EDEDED");
        assert_eq!(config.profile_fields()[0], "Client Name");
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config::default();
        base.filter.case_sensitive = Some(true);
        base.notes.section_marker = Some("Case Notes:".to_string());

        let mut other = Config::default();
        other.filter.case_sensitive = Some(false);
        other.notes.order = Some(NoteOrder::DateDescending);

        base.merge(other);
        assert!(!base.case_sensitive());
        assert_eq!(base.note_order(), NoteOrder::DateDescending);
        // Unset in other: kept from base
        assert_eq!(base.section_marker().as_deref(), Some("Case Notes:"));
    }

    #[test]
    fn test_from_file_parses_yaml() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("casenotes.yaml");
        std::fs::write(
            &path,
            "filter:\n  case_sensitive: true\nidentity:\n  convention: underscore\nnotes:\n  order: date-descending\nworkbook:\n  band_color: '#d9e1f2'\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.case_sensitive());
        assert_eq!(config.convention(), ConventionKind::Underscore);
        assert_eq!(config.note_order(), NoteOrder::DateDescending);
        assert_eq!(config.band_color(), "D9E1F2");
    }

    #[test]
    fn test_from_file_reports_bad_yaml() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.yaml");
        std::fs::write(&path, "filter: [unclosed").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::from_file(&tmp.path().join("missing.yaml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_bad_band_color_falls_back() {
        let mut config = Config::default();
        config.workbook.band_color = Some("grey".to_string());
        assert_eq!(config.band_color(), "EDEDED");
    }

    #[test]
    fn test_empty_keyword_list_uses_defaults() {
        let mut config = Config::default();
        config.filter.keywords = Some(vec![]);
        assert_eq!(config.keywords().len(), 2);
    }
}
