//! Note extraction - document paragraphs to dated case notes
//!
//! Paragraphs are read in document order. A paragraph that begins with a
//! date marker starts a new note; anything else is appended to the note in
//! progress. Text ahead of the first marker is preamble and dropped.

pub mod header;
pub mod marker;

use chrono::NaiveDate;

use crate::core::identity::ClientIdentity;
use crate::core::Config;
use crate::docx::{Document, Paragraph};
use crate::entities::{CaseNote, ClientProfile, NoteOrder, RecordSet};

use header::HeaderScanner;
use marker::MarkerParser;

/// Header fields recognized at the start of a note paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
struct NoteHeader {
    date: NaiveDate,
    staff: String,
    body: String,
}

/// Accumulates paragraphs for the note in progress
struct NoteBuilder {
    date: NaiveDate,
    staff: String,
    body: String,
}

impl NoteBuilder {
    fn start(header: NoteHeader) -> Self {
        Self {
            date: header.date,
            staff: header.staff,
            body: header.body,
        }
    }

    fn push(&mut self, text: &str) {
        if !self.body.is_empty() {
            self.body.push(' ');
        }
        self.body.push_str(text);
    }

    fn finish(self) -> CaseNote {
        CaseNote::new(
            self.date,
            collapse_whitespace(&self.staff),
            collapse_whitespace(&self.body),
        )
    }
}

/// Extracts profile stubs and case notes from parsed documents
#[derive(Debug, Clone)]
pub struct NoteExtractor {
    markers: MarkerParser,
    headers: HeaderScanner,
    section_marker: Option<String>,
    bold_headers_only: bool,
    order: NoteOrder,
}

impl Default for NoteExtractor {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl NoteExtractor {
    pub fn from_config(config: &Config) -> Self {
        Self {
            markers: MarkerParser::new(&config.date_labels()),
            headers: HeaderScanner::new(&config.profile_fields()),
            section_marker: config.section_marker(),
            bold_headers_only: config.bold_headers_only(),
            order: config.note_order(),
        }
    }

    /// Profile stub plus notes for one client
    pub fn extract(&self, doc: &Document, identity: &ClientIdentity) -> RecordSet {
        RecordSet {
            profile: self.profile(doc, identity),
            notes: self.notes(doc),
        }
    }

    /// Profile seeded from the identity, then filled from header lines
    pub fn profile(&self, doc: &Document, identity: &ClientIdentity) -> ClientProfile {
        let mut profile = ClientProfile::from_identity(identity);
        for paragraph in doc.paragraphs() {
            for (label, value) in self.headers.scan(&paragraph.text()) {
                profile.fill(&label, &value);
            }
        }
        profile
    }

    /// Notes in configured order
    pub fn notes(&self, doc: &Document) -> Vec<CaseNote> {
        let mut notes = Vec::new();
        let mut current: Option<NoteBuilder> = None;
        let mut in_section = self.section_marker.is_none();

        for paragraph in doc.paragraphs() {
            let text = paragraph.text();
            let trimmed = text.trim();

            if !in_section {
                if let Some(marker) = &self.section_marker {
                    if trimmed.contains(marker.as_str()) {
                        in_section = true;
                    }
                }
                continue;
            }

            if trimmed.is_empty() {
                continue;
            }

            if let Some(header) = self.note_header(paragraph, trimmed) {
                if let Some(done) = current.take() {
                    notes.push(done.finish());
                }
                current = Some(NoteBuilder::start(header));
            } else if let Some(note) = current.as_mut() {
                note.push(trimmed);
            }
        }

        if let Some(done) = current {
            notes.push(done.finish());
        }

        self.order.apply(&mut notes);
        notes
    }

    /// Recognize a note header, bold layout first
    fn note_header(&self, paragraph: &Paragraph, text: &str) -> Option<NoteHeader> {
        let (bold, rest) = paragraph.split_bold_prefix();
        if let Some(marker) = self.markers.parse(&bold) {
            return Some(NoteHeader {
                date: marker.date,
                staff: marker::bold_staff(&marker.rest),
                body: marker::body_after_header(&rest),
            });
        }

        if self.bold_headers_only {
            return None;
        }

        let marker = self.markers.parse(text)?;
        let (staff, body) = marker::split_staff(&marker.rest);
        Some(NoteHeader {
            date: marker.date,
            staff,
            body,
        })
    }
}

/// Collapse runs of whitespace to single spaces and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
