//! Client identity derived from case file names
//!
//! Case files carry no reliable identity inside the document, so the client
//! name and HMIS number are parsed from the file name. The parsing rule is an
//! [`IdentityConvention`] so offices with a different naming habit can plug in
//! their own without touching extraction.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// `Jane Roe #4411` (anything may follow the digits)
static HASH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?P<name>.+?)\s*#\s*(?P<id>\d+)").expect("valid regex"));

/// `Doe_John_12345`
static UNDERSCORE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^_]+(?:_[^_]+)*)_(?P<id>\d+)$").expect("valid regex")
});

/// Client name and ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub name: String,
    pub id: String,
}

impl ClientIdentity {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Deterministic output file stem, e.g. `Doe_John_12345`
    pub fn file_stem(&self) -> String {
        let name = sanitize_component(&self.name);
        let id = sanitize_component(&self.id);
        match (name.is_empty(), id.is_empty()) {
            (false, false) => format!("{}_{}", name, id),
            (false, true) => name,
            (true, false) => id,
            (true, true) => "client".to_string(),
        }
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.name, self.id)
    }
}

/// Keep ASCII alphanumerics, `-` and `.`; collapse everything else to `_`
fn sanitize_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out.trim_matches('.').to_string()
}

/// A rule for turning a file stem into a client identity
pub trait IdentityConvention {
    /// Short name used in config and messages
    fn name(&self) -> &'static str;

    /// Parse a file stem (no directory, no extension)
    fn parse(&self, stem: &str) -> Result<ClientIdentity, IdentityParseError>;
}

/// `<name> #<digits>` - the historical shared-drive convention
#[derive(Debug, Clone, Copy, Default)]
pub struct HashConvention;

impl IdentityConvention for HashConvention {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn parse(&self, stem: &str) -> Result<ClientIdentity, IdentityParseError> {
        let caps = HASH_NAME
            .captures(stem)
            .ok_or_else(|| IdentityParseError::no_match(stem, self.name()))?;
        let name = caps["name"].trim();
        if name.is_empty() {
            return Err(IdentityParseError::EmptyName(stem.to_string()));
        }
        Ok(ClientIdentity::new(name, &caps["id"]))
    }
}

/// `Last_First[_More]_<digits>`; name tokens are joined with spaces
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoreConvention;

impl IdentityConvention for UnderscoreConvention {
    fn name(&self) -> &'static str {
        "underscore"
    }

    fn parse(&self, stem: &str) -> Result<ClientIdentity, IdentityParseError> {
        let trimmed = stem.trim();
        let caps = UNDERSCORE_NAME
            .captures(trimmed)
            .ok_or_else(|| IdentityParseError::no_match(stem, self.name()))?;
        let name = caps["name"]
            .split('_')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            return Err(IdentityParseError::EmptyName(stem.to_string()));
        }
        Ok(ClientIdentity::new(name, &caps["id"]))
    }
}

/// Try each convention in turn; the first match wins
pub struct FirstMatch(Vec<Box<dyn IdentityConvention>>);

impl FirstMatch {
    pub fn new(conventions: Vec<Box<dyn IdentityConvention>>) -> Self {
        Self(conventions)
    }
}

impl IdentityConvention for FirstMatch {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn parse(&self, stem: &str) -> Result<ClientIdentity, IdentityParseError> {
        for convention in &self.0 {
            if let Ok(identity) = convention.parse(stem) {
                return Ok(identity);
            }
        }
        Err(IdentityParseError::no_match(stem, self.name()))
    }
}

/// Built-in conventions selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConventionKind {
    /// Try `hash`, then `underscore`
    #[default]
    Auto,
    /// `Jane Roe #4411`
    Hash,
    /// `Doe_John_12345`
    Underscore,
}

impl ConventionKind {
    pub fn build(self) -> Box<dyn IdentityConvention> {
        match self {
            ConventionKind::Auto => Box::new(FirstMatch::new(vec![
                Box::new(HashConvention),
                Box::new(UnderscoreConvention),
            ])),
            ConventionKind::Hash => Box::new(HashConvention),
            ConventionKind::Underscore => Box::new(UnderscoreConvention),
        }
    }
}

impl fmt::Display for ConventionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConventionKind::Auto => write!(f, "auto"),
            ConventionKind::Hash => write!(f, "hash"),
            ConventionKind::Underscore => write!(f, "underscore"),
        }
    }
}

impl std::str::FromStr for ConventionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ConventionKind::Auto),
            "hash" => Ok(ConventionKind::Hash),
            "underscore" => Ok(ConventionKind::Underscore),
            _ => Err(format!(
                "Invalid identity convention: {}. Use auto, hash, or underscore",
                s
            )),
        }
    }
}

/// Errors that can occur when deriving a client identity
#[derive(Debug, Error)]
pub enum IdentityParseError {
    #[error("file name '{stem}' does not match the {convention} naming convention")]
    NoMatch { stem: String, convention: String },

    #[error("file name '{0}' has an ID but no client name")]
    EmptyName(String),
}

impl IdentityParseError {
    fn no_match(stem: &str, convention: &str) -> Self {
        IdentityParseError::NoMatch {
            stem: stem.to_string(),
            convention: convention.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_convention() {
        let id = UnderscoreConvention.parse("Doe_John_12345").unwrap();
        assert_eq!(id.name, "Doe John");
        assert_eq!(id.id, "12345");
        assert_eq!(id.file_stem(), "Doe_John_12345");
    }

    #[test]
    fn test_underscore_convention_rejects_missing_id() {
        let err = UnderscoreConvention.parse("Doe_John").unwrap_err();
        assert!(matches!(err, IdentityParseError::NoMatch { .. }));
        assert!(UnderscoreConvention.parse("12345").is_err());
    }

    #[test]
    fn test_hash_convention() {
        let id = HashConvention.parse("Jane Roe #4411").unwrap();
        assert_eq!(id, ClientIdentity::new("Jane Roe", "4411"));
        assert_eq!(id.file_stem(), "Jane_Roe_4411");

        // Trailing text after the number is allowed
        let id = HashConvention.parse("Jane Roe#4411 case notes").unwrap();
        assert_eq!(id.id, "4411");
    }

    #[test]
    fn test_hash_convention_empty_name() {
        let err = HashConvention.parse("#4411").unwrap_err();
        assert!(matches!(err, IdentityParseError::NoMatch { .. } | IdentityParseError::EmptyName(_)));
    }

    #[test]
    fn test_auto_tries_each_convention() {
        let auto = ConventionKind::Auto.build();
        assert_eq!(auto.parse("Jane Roe #4411").unwrap().id, "4411");
        assert_eq!(auto.parse("Doe_John_12345").unwrap().name, "Doe John");

        let err = auto.parse("meeting minutes").unwrap_err();
        assert!(err.to_string().contains("auto"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let auto = ConventionKind::Auto.build();
        let first = auto.parse("O'Brien_Mary-Kate_0042").unwrap();
        let second = auto.parse("O'Brien_Mary-Kate_0042").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.file_stem(), "O_Brien_Mary-Kate_0042");
    }

    #[test]
    fn test_file_stem_sanitizes() {
        let id = ClientIdentity::new("  Ana  María / Ruiz ", "77");
        assert_eq!(id.file_stem(), "Ana_Mar_a_Ruiz_77");
        assert_eq!(ClientIdentity::new("", "").file_stem(), "client");
    }

    #[test]
    fn test_convention_kind_from_str() {
        assert_eq!("HASH".parse::<ConventionKind>().unwrap(), ConventionKind::Hash);
        assert!("dash".parse::<ConventionKind>().is_err());
    }
}
