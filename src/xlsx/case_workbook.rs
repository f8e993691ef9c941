//! The two-sheet client workbook

use super::{Cell, CellValue, Sheet, Workbook, XlsxError};
use crate::core::intermediate::NOTE_HEADER;
use crate::entities::RecordSet;

pub const PROFILE_SHEET: &str = "Profile";
pub const CASE_NOTES_SHEET: &str = "Case Notes";

const PROFILE_WIDTHS: [f64; 2] = [24.0, 48.0];
const NOTE_WIDTHS: [f64; 3] = [12.0, 18.0, 80.0];

/// Lay out `set` as a Profile sheet followed by a Case Notes sheet
pub fn build_case_workbook(
    set: &RecordSet,
    fields: &[String],
    band_color: &str,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new(band_color);
    workbook.push_sheet(profile_sheet(set, fields)?)?;
    workbook.push_sheet(notes_sheet(set)?)?;
    Ok(workbook)
}

fn profile_sheet(set: &RecordSet, fields: &[String]) -> Result<Sheet, XlsxError> {
    let mut sheet = Sheet::new(PROFILE_SHEET)?;
    sheet.column_widths = PROFILE_WIDTHS.to_vec();

    let rows = set
        .profile
        .rows(fields)
        .chain(set.profile.extra_fields(fields));
    for (field, value) in rows {
        sheet.push_row(vec![
            Cell::new(CellValue::text(field)).bold(),
            Cell::new(CellValue::text(value)),
        ]);
    }
    sheet.band_even_rows();
    Ok(sheet)
}

fn notes_sheet(set: &RecordSet) -> Result<Sheet, XlsxError> {
    let mut sheet = Sheet::new(CASE_NOTES_SHEET)?;
    sheet.column_widths = NOTE_WIDTHS.to_vec();
    sheet.freeze_header = true;

    sheet.push_row(
        NOTE_HEADER
            .iter()
            .map(|h| Cell::new(CellValue::text(*h)).bold())
            .collect(),
    );
    for note in &set.notes {
        sheet.push_row(vec![
            Cell::new(CellValue::Date(note.date)),
            Cell::new(CellValue::text(note.staff.as_str())),
            Cell::new(CellValue::text(note.note.as_str())).wrap(),
        ]);
    }
    sheet.band_even_rows();
    Ok(sheet)
}
