//! Intermediate CSV record sets
//!
//! The extractor hands each client to the formatter as a small CSV:
//!
//! ```text
//! Field,Value
//! Client Name,Doe John
//! HMIS #,12345
//! Entry Date,
//! Case Notes
//! Date,Staff,Note
//! 2024-01-05,A. Lee,Initial intake.
//! ```
//!
//! Every configured profile field gets a row even when blank, followed by any
//! extra fields the document carried.

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use thiserror::Error;

use crate::entities::{CaseNote, RecordSet};

pub const PROFILE_HEADER: [&str; 2] = ["Field", "Value"];
pub const NOTES_SECTION: &str = "Case Notes";
pub const NOTE_HEADER: [&str; 3] = ["Date", "Staff", "Note"];
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Write a record set, profile rows in `fields` order
pub fn write_record_set(
    path: &Path,
    set: &RecordSet,
    fields: &[String],
) -> Result<(), IntermediateError> {
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

    writer.write_record(PROFILE_HEADER)?;
    for (field, value) in set.profile.rows(fields) {
        writer.write_record([field, value])?;
    }
    for (field, value) in set.profile.extra_fields(fields) {
        writer.write_record([field, value])?;
    }

    writer.write_record([NOTES_SECTION])?;
    writer.write_record(NOTE_HEADER)?;
    for note in &set.notes {
        let date = note.date.format(DATE_FORMAT).to_string();
        writer.write_record([date.as_str(), note.staff.as_str(), note.note.as_str()])?;
    }

    writer.flush()?;
    Ok(())
}

#[derive(PartialEq)]
enum Section {
    Start,
    Profile,
    NoteHeader,
    Notes,
}

/// Read a record set written by [`write_record_set`]
pub fn read_record_set(path: &Path) -> Result<RecordSet, IntermediateError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut set = RecordSet::default();
    let mut section = Section::Start;

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let fields: Vec<&str> = record.iter().collect();

        match section {
            Section::Start => {
                if fields != PROFILE_HEADER {
                    return Err(IntermediateError::malformed(line, "expected 'Field,Value' header"));
                }
                section = Section::Profile;
            }
            Section::Profile => match fields.as_slice() {
                [marker] if *marker == NOTES_SECTION => section = Section::NoteHeader,
                [field, value] => {
                    if !field.is_empty() {
                        set.profile.set(*field, *value);
                    }
                }
                _ => {
                    return Err(IntermediateError::malformed(
                        line,
                        format!("profile row has {} fields, expected 2", fields.len()),
                    ))
                }
            },
            Section::NoteHeader => {
                if fields != NOTE_HEADER {
                    return Err(IntermediateError::malformed(line, "expected 'Date,Staff,Note' header"));
                }
                section = Section::Notes;
            }
            Section::Notes => {
                let [date, staff, note] = fields.as_slice() else {
                    return Err(IntermediateError::malformed(
                        line,
                        format!("note row has {} fields, expected 3", fields.len()),
                    ));
                };
                let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| {
                    IntermediateError::malformed(line, format!("bad date '{}': {}", date, e))
                })?;
                set.notes.push(CaseNote::new(date, *staff, *note));
            }
        }
    }

    match section {
        Section::Notes => Ok(set),
        Section::Start => Err(IntermediateError::malformed(0, "file is empty")),
        _ => Err(IntermediateError::malformed(0, "missing Case Notes section")),
    }
}

/// Errors that can occur reading or writing intermediate CSV files
#[derive(Debug, Error)]
pub enum IntermediateError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Malformed { line: u64, message: String },
}

impl IntermediateError {
    fn malformed(line: u64, message: impl Into<String>) -> Self {
        IntermediateError::Malformed {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::ClientIdentity;
    use crate::entities::profile::default_profile_fields;
    use crate::entities::ClientProfile;
    use tempfile::tempdir;

    fn sample() -> RecordSet {
        let mut profile = ClientProfile::from_identity(&ClientIdentity::new("Doe John", "12345"));
        profile.set("Room #", "12");
        profile.set("Pets", "cat");
        RecordSet {
            profile,
            notes: vec![
                CaseNote::new(
                    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    "A. Lee",
                    "Intake, with \"quotes\" and commas.",
                ),
                CaseNote::new(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), "", ""),
            ],
        }
    }

    #[test]
    fn test_written_layout() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("doe.csv");
        write_record_set(&path, &sample(), &default_profile_fields()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Field,Value");
        assert_eq!(lines[1], "Client Name,Doe John");
        assert_eq!(lines[2], "HMIS #,12345");
        assert_eq!(lines[3], "Entry Date,");
        assert!(lines.contains(&"Pets,cat"));
        assert!(lines.contains(&"Case Notes"));
        assert!(lines.contains(&"Date,Staff,Note"));
        assert_eq!(lines.last(), Some(&"2024-03-10,,"));
    }

    #[test]
    fn test_read_back_preserves_notes_and_order() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("doe.csv");
        let original = sample();
        write_record_set(&path, &original, &default_profile_fields()).unwrap();

        let read = read_record_set(&path).unwrap();
        assert_eq!(read.notes, original.notes);
        assert_eq!(read.profile.get("Room #"), Some("12"));
        assert_eq!(read.profile.get("Entry Date"), Some(""));
        assert_eq!(read.identity(), Some(ClientIdentity::new("Doe John", "12345")));
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(&path, "Date,Staff,Note\n2024-01-01,,x\n").unwrap();
        assert!(matches!(
            read_record_set(&path),
            Err(IntermediateError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(
            &path,
            "Field,Value\nClient Name,X\nCase Notes\nDate,Staff,Note\nyesterday,,x\n",
        )
        .unwrap();
        let err = read_record_set(&path).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_truncated_file_is_malformed() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("short.csv");
        std::fs::write(&path, "Field,Value\nClient Name,X\n").unwrap();
        let err = read_record_set(&path).unwrap_err();
        assert!(err.to_string().contains("missing Case Notes"));

        std::fs::write(&path, "").unwrap();
        assert!(read_record_set(&path).is_err());
    }
}
