//! Client profile - key/value header data for one client
//!
//! The profile is intentionally incomplete: fields the documents don't carry
//! are left blank for a case manager to fill in by hand.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::identity::ClientIdentity;

/// Profile label holding the client's display name
pub const CLIENT_NAME: &str = "Client Name";

/// Profile label holding the client/HMIS identifier
pub const CLIENT_ID: &str = "HMIS #";

/// Default profile rows, in sheet order
pub const DEFAULT_PROFILE_FIELDS: &[&str] = &[
    CLIENT_NAME,
    CLIENT_ID,
    "Entry Date",
    "Exit Date",
    "Room #",
    "Contact",
    "DOB",
    "Email",
    "Case Manager",
    "Benefits",
    "Food Stamps",
    "Income",
    "SSI",
    "SSDI",
    "Trimet Tickets",
    "Health Insurance",
];

/// Key/value profile for a single client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    fields: BTreeMap<String, String>,
}

impl ClientProfile {
    /// Profile stub seeded with the client's name and ID
    pub fn from_identity(identity: &ClientIdentity) -> Self {
        let mut profile = Self::default();
        profile.set(CLIENT_NAME, identity.name.clone());
        profile.set(CLIENT_ID, identity.id.clone());
        profile
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Set a field only if it has no non-empty value yet
    ///
    /// Returns true when the value was stored.
    pub fn fill(&mut self, field: &str, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.get(field).is_some_and(|v| !v.is_empty()) {
            return false;
        }
        self.set(field, value);
        true
    }

    pub fn client_name(&self) -> Option<&str> {
        self.get(CLIENT_NAME).filter(|v| !v.is_empty())
    }

    pub fn client_id(&self) -> Option<&str> {
        self.get(CLIENT_ID).filter(|v| !v.is_empty())
    }

    /// Rows for a fixed field list; unknown fields come back blank
    pub fn rows<'a>(&'a self, fields: &'a [String]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        fields
            .iter()
            .map(move |f| (f.as_str(), self.get(f).unwrap_or("")))
    }

    /// Fields not covered by `fields`, in key order
    pub fn extra_fields<'a>(&'a self, fields: &'a [String]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.fields
            .iter()
            .filter(move |(k, _)| !fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Default profile field list as owned strings
pub fn default_profile_fields() -> Vec<String> {
    DEFAULT_PROFILE_FIELDS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_fixed_structure() {
        let identity = ClientIdentity::new("Doe John", "12345");
        let profile = ClientProfile::from_identity(&identity);
        let fields = default_profile_fields();

        let rows: Vec<_> = profile.rows(&fields).collect();
        assert_eq!(rows.len(), DEFAULT_PROFILE_FIELDS.len());
        assert_eq!(rows[0], ("Client Name", "Doe John"));
        assert_eq!(rows[1], ("HMIS #", "12345"));
        assert_eq!(rows[2], ("Entry Date", ""));
    }

    #[test]
    fn test_fill_is_first_wins() {
        let mut profile = ClientProfile::default();
        assert!(profile.fill("Room #", " 12 "));
        assert!(!profile.fill("Room #", "14"));
        assert!(!profile.fill("Contact", "   "));
        assert_eq!(profile.get("Room #"), Some("12"));
        assert_eq!(profile.get("Contact"), None);
    }

    #[test]
    fn test_extra_fields_excludes_listed() {
        let mut profile = ClientProfile::default();
        profile.set("Room #", "12");
        profile.set("Pets", "cat");
        let fields = default_profile_fields();
        let extra: Vec<_> = profile.extra_fields(&fields).collect();
        assert_eq!(extra, vec![("Pets", "cat")]);
    }
}
