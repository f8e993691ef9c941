//! casenotes: legacy case-note documents to per-client workbooks
//!
//! A ZIP archive of DOCX case files goes through three stages: the archive
//! filter keeps documents that carry dated entries, the note extractor turns
//! each one into a client profile plus dated notes, and the formatter writes
//! a two-sheet XLSX workbook per client.

pub mod cli;
pub mod core;
pub mod docx;
pub mod entities;
pub mod extract;
pub mod xlsx;
