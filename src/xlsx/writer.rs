//! XLSX package assembly
//!
//! Parts are written in a fixed order with a fixed timestamp and no
//! document properties, so identical workbooks produce identical files.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::styles::styles_xml;
use super::{column_name, date_serial, CellValue, Sheet, Workbook, XlsxError};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_DOC_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Build the zipped package for `wb`
pub(super) fn package(wb: &Workbook) -> Result<Vec<u8>, XlsxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let count = wb.sheets.len();
    add_part(&mut zip, options, "[Content_Types].xml", content_types(count).as_bytes())?;
    add_part(&mut zip, options, "_rels/.rels", ROOT_RELS.as_bytes())?;
    add_part(&mut zip, options, "xl/workbook.xml", &workbook_xml(wb)?)?;
    add_part(
        &mut zip,
        options,
        "xl/_rels/workbook.xml.rels",
        workbook_rels(count).as_bytes(),
    )?;
    add_part(&mut zip, options, "xl/styles.xml", styles_xml(&wb.band_color).as_bytes())?;
    for (idx, sheet) in wb.sheets.iter().enumerate() {
        let name = format!("xl/worksheets/sheet{}.xml", idx + 1);
        add_part(&mut zip, options, &name, &sheet_xml(sheet, idx == 0)?)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn add_part(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    name: &str,
    bytes: &[u8],
) -> Result<(), XlsxError> {
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(())
}

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#
);

fn content_types(sheets: usize) -> String {
    let mut overrides = String::new();
    for n in 1..=sheets {
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            "{overrides}",
            r#"</Types>"#
        ),
        overrides = overrides
    )
}

fn workbook_rels(sheets: usize) -> String {
    let mut rels = String::new();
    for n in 1..=sheets {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{REL_WORKSHEET}" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_STYLES}" Target="styles.xml"/>"#,
        sheets + 1
    ));
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            "{rels}",
            r#"</Relationships>"#
        ),
        rels = rels
    )
}

fn workbook_xml(wb: &Workbook) -> Result<Vec<u8>, XlsxError> {
    let mut xml = XmlOut::new();
    xml.decl()?;
    xml.start(BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_DOC_REL)]))?;
    xml.start(BytesStart::new("bookViews"))?;
    xml.empty(BytesStart::new("workbookView").with_attributes([("activeTab", "0")]))?;
    xml.end("bookViews")?;
    xml.start(BytesStart::new("sheets"))?;
    for (idx, sheet) in wb.sheets.iter().enumerate() {
        let id = (idx + 1).to_string();
        let rel = format!("rId{}", id);
        let mut el = BytesStart::new("sheet");
        el.push_attribute(("name", sheet.name.as_str()));
        el.push_attribute(("sheetId", id.as_str()));
        el.push_attribute(("r:id", rel.as_str()));
        xml.empty(el)?;
    }
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml.finish())
}

fn sheet_xml(sheet: &Sheet, selected: bool) -> Result<Vec<u8>, XlsxError> {
    let mut xml = XmlOut::new();
    xml.decl()?;
    xml.start(BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_DOC_REL)]))?;

    xml.start(BytesStart::new("sheetViews"))?;
    let mut view = BytesStart::new("sheetView");
    if selected {
        view.push_attribute(("tabSelected", "1"));
    }
    view.push_attribute(("workbookViewId", "0"));
    if sheet.freeze_header && !sheet.rows.is_empty() {
        xml.start(view)?;
        xml.empty(BytesStart::new("pane").with_attributes([
            ("ySplit", "1"),
            ("topLeftCell", "A2"),
            ("activePane", "bottomLeft"),
            ("state", "frozen"),
        ]))?;
        xml.empty(BytesStart::new("selection").with_attributes([
            ("pane", "bottomLeft"),
            ("activeCell", "A2"),
            ("sqref", "A2"),
        ]))?;
        xml.end("sheetView")?;
    } else {
        xml.empty(view)?;
    }
    xml.end("sheetViews")?;

    xml.empty(BytesStart::new("sheetFormatPr").with_attributes([("defaultRowHeight", "15")]))?;

    if !sheet.column_widths.is_empty() {
        xml.start(BytesStart::new("cols"))?;
        for (idx, width) in sheet.column_widths.iter().enumerate() {
            let n = (idx + 1).to_string();
            let width = width.to_string();
            let mut col = BytesStart::new("col");
            col.push_attribute(("min", n.as_str()));
            col.push_attribute(("max", n.as_str()));
            col.push_attribute(("width", width.as_str()));
            col.push_attribute(("customWidth", "1"));
            xml.empty(col)?;
        }
        xml.end("cols")?;
    }

    xml.start(BytesStart::new("sheetData"))?;
    for (r, row) in sheet.rows.iter().enumerate() {
        let row_number = (r + 1).to_string();
        let mut row_el = BytesStart::new("row");
        row_el.push_attribute(("r", row_number.as_str()));
        xml.start(row_el)?;

        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_name(c), row_number);
            let style = cell.style_index().to_string();
            let mut el = BytesStart::new("c");
            el.push_attribute(("r", cell_ref.as_str()));
            el.push_attribute(("s", style.as_str()));

            match &cell.value {
                CellValue::Text(text) => {
                    let text = cap_cell_text(clean_text(text), &cell_ref);
                    inline_string(&mut xml, el, &text)?;
                }
                CellValue::Date(date) => match date_serial(*date) {
                    Some(serial) => {
                        xml.start(el)?;
                        xml.start(BytesStart::new("v"))?;
                        xml.text(&serial.to_string())?;
                        xml.end("v")?;
                        xml.end("c")?;
                    }
                    None => {
                        tracing::warn!(cell = %cell_ref, %date, "date before 1900 written as text");
                        inline_string(&mut xml, el, &date.format("%Y-%m-%d").to_string())?;
                    }
                },
                CellValue::Blank => xml.empty(el)?,
            }
        }

        xml.end("row")?;
    }
    xml.end("sheetData")?;
    xml.end("worksheet")?;
    Ok(xml.finish())
}

/// `<c t="inlineStr"><is><t>text</t></is></c>`
fn inline_string(xml: &mut XmlOut, mut el: BytesStart<'_>, text: &str) -> Result<(), XlsxError> {
    el.push_attribute(("t", "inlineStr"));
    xml.start(el)?;
    xml.start(BytesStart::new("is"))?;
    let mut t = BytesStart::new("t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.push_attribute(("xml:space", "preserve"));
    }
    xml.start(t)?;
    xml.text(text)?;
    xml.end("t")?;
    xml.end("is")?;
    xml.end("c")
}

/// Excel's per-cell limit, counted in UTF-16 code units
const MAX_CELL_UNITS: usize = 32_767;

/// Truncate text that Excel would refuse to load
fn cap_cell_text(text: String, cell_ref: &str) -> String {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > MAX_CELL_UNITS {
            tracing::warn!(cell = %cell_ref, limit = MAX_CELL_UNITS, "cell text truncated");
            return text[..idx].to_string();
        }
    }
    text
}

/// Drop characters XML 1.0 cannot carry
fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|&ch| {
            matches!(ch, '\t' | '\n' | '\r')
                || (ch >= '\u{20}' && ch != '\u{FFFE}' && ch != '\u{FFFF}')
        })
        .collect()
}

/// Thin wrapper over the quick-xml writer with our error type
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), XlsxError> {
        self.writer
            .write_event(event)
            .map_err(|e| XlsxError::Xml(e.to_string()))
    }

    fn decl(&mut self) -> Result<(), XlsxError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        self.writer.get_mut().push(b'\n');
        Ok(())
    }

    fn start(&mut self, el: BytesStart<'_>) -> Result<(), XlsxError> {
        self.event(Event::Start(el))
    }

    fn empty(&mut self, el: BytesStart<'_>) -> Result<(), XlsxError> {
        self.event(Event::Empty(el))
    }

    fn text(&mut self, text: &str) -> Result<(), XlsxError> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn end(&mut self, name: &str) -> Result<(), XlsxError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
