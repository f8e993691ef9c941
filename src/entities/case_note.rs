//! Case note record - one dated entry extracted from a case file

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated case note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseNote {
    /// Calendar date the note was written for
    pub date: NaiveDate,

    /// Staff member who wrote the note (empty when the document doesn't say)
    #[serde(default)]
    pub staff: String,

    /// Note body with whitespace collapsed
    pub note: String,
}

impl CaseNote {
    pub fn new(date: NaiveDate, staff: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            date,
            staff: staff.into(),
            note: note.into(),
        }
    }
}

/// Order in which extracted notes are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NoteOrder {
    /// Keep the order the notes appear in the document
    #[default]
    Source,
    /// Oldest first (stable for equal dates)
    DateAscending,
    /// Newest first (stable for equal dates)
    DateDescending,
}

impl NoteOrder {
    /// Reorder notes in place. Notes sharing a date keep their source order.
    pub fn apply(self, notes: &mut [CaseNote]) {
        match self {
            NoteOrder::Source => {}
            NoteOrder::DateAscending => notes.sort_by(|a, b| a.date.cmp(&b.date)),
            NoteOrder::DateDescending => notes.sort_by(|a, b| b.date.cmp(&a.date)),
        }
    }
}

impl std::fmt::Display for NoteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteOrder::Source => write!(f, "source"),
            NoteOrder::DateAscending => write!(f, "date-ascending"),
            NoteOrder::DateDescending => write!(f, "date-descending"),
        }
    }
}

impl std::str::FromStr for NoteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "source" => Ok(NoteOrder::Source),
            "date-ascending" | "asc" => Ok(NoteOrder::DateAscending),
            "date-descending" | "desc" => Ok(NoteOrder::DateDescending),
            _ => Err(format!(
                "Invalid note order: {}. Use source, date-ascending, or date-descending",
                s
            )),
        }
    }
}
