//! Minimal SpreadsheetML writer
//!
//! Enough of the XLSX format for case workbooks: inline strings, date
//! cells, bold, wrapping, row banding, column widths and a frozen header.
//! Output is deterministic, so the same input always yields the same bytes.

pub mod case_workbook;
pub mod styles;
mod writer;

use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub use case_workbook::{build_case_workbook, CASE_NOTES_SHEET, PROFILE_SHEET};
pub use styles::CellStyle;

/// Longest sheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Date(NaiveDate),
    Blank,
}

impl CellValue {
    /// Text cell, or blank when `s` is empty
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(s)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style: CellStyle::default(),
        }
    }

    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    pub fn wrap(mut self) -> Self {
        self.style.wrap = true;
        self
    }

    /// Style table index, with the date format applied to date values
    pub fn style_index(&self) -> u32 {
        self.style
            .with_date(matches!(self.value, CellValue::Date(_)))
            .index()
    }
}

pub type Row = Vec<Cell>;

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
    /// Widths for the leading columns, in character units
    pub column_widths: Vec<f64>,
    /// Keep the first row visible while scrolling
    pub freeze_header: bool,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Result<Self, XlsxError> {
        let name = name.into();
        let invalid = name.is_empty()
            || name.chars().count() > MAX_SHEET_NAME
            || name.contains(['[', ']', ':', '*', '?', '/', '\\']);
        if invalid {
            return Err(XlsxError::InvalidSheetName(name));
        }
        Ok(Self {
            name,
            rows: Vec::new(),
            column_widths: Vec::new(),
            freeze_header: false,
        })
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Fill every even sheet row (1-based)
    pub fn band_even_rows(&mut self) {
        for (idx, row) in self.rows.iter_mut().enumerate() {
            if (idx + 1) % 2 == 0 {
                for cell in row.iter_mut() {
                    cell.style.band = true;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// RGB hex fill for banded rows
    pub band_color: String,
}

impl Workbook {
    pub fn new(band_color: impl Into<String>) -> Self {
        Self {
            sheets: Vec::new(),
            band_color: band_color.into(),
        }
    }

    pub fn push_sheet(&mut self, sheet: Sheet) -> Result<(), XlsxError> {
        if self
            .sheets
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(&sheet.name))
        {
            return Err(XlsxError::DuplicateSheet(sheet.name));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    /// Serialize the whole package
    pub fn to_bytes(&self) -> Result<Vec<u8>, XlsxError> {
        if self.sheets.is_empty() {
            return Err(XlsxError::NoSheets);
        }
        writer::package(self)
    }

    /// Write to `path` through a temporary file in the same directory
    pub fn save(&self, path: &Path) -> Result<(), XlsxError> {
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| XlsxError::Io(e.error))?;
        Ok(())
    }
}

/// Excel serial day number (1900 date system), None before 1900-01-01
///
/// Excel counts a 1900-02-29 that never existed, so serials from March 1900
/// on are one higher than a plain day count from 1899-12-31.
pub fn date_serial(date: NaiveDate) -> Option<i64> {
    let first = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    let leap_bug = NaiveDate::from_ymd_opt(1900, 3, 1)?;
    if date < first {
        return None;
    }
    let days = (date - first).num_days() + 1;
    Some(if date >= leap_bug { days + 1 } else { days })
}

/// Spreadsheet column letters for a zero-based index
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Errors that can occur when building or saving a workbook
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("invalid sheet name '{0}'")]
    InvalidSheetName(String),

    #[error("duplicate sheet name '{0}'")]
    DuplicateSheet(String),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
