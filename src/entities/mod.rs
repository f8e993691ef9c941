//! Entity type definitions
//!
//! - [`CaseNote`] - one dated note extracted from a case file
//! - [`ClientProfile`] - key/value header data for a client
//! - [`RecordSet`] - profile plus notes, the unit passed between stages
//! - [`CaseFile`] / [`RecordFile`] - on-disk artifacts handed between stages

pub mod case_note;
pub mod profile;
pub mod record_set;

pub use case_note::{CaseNote, NoteOrder};
pub use profile::ClientProfile;
pub use record_set::{CaseFile, RecordFile, RecordSet};
