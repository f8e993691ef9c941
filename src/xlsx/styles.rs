//! Cell formats and `xl/styles.xml`
//!
//! The style table is fixed: one `cellXfs` entry per combination of the four
//! flags, so a cell's style index is just its flag bits.

/// Custom number format id for dates (ids below 164 are built in)
pub const DATE_NUM_FMT_ID: u32 = 164;
pub const DATE_FORMAT_CODE: &str = "yyyy-mm-dd";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellStyle {
    pub bold: bool,
    pub wrap: bool,
    pub date: bool,
    pub band: bool,
}

impl CellStyle {
    pub const BOLD: u32 = 1;
    pub const WRAP: u32 = 2;
    pub const DATE: u32 = 4;
    pub const BAND: u32 = 8;
    /// Number of `cellXfs` entries
    pub const COUNT: u32 = 16;

    pub fn with_date(mut self, date: bool) -> Self {
        self.date = self.date || date;
        self
    }

    pub fn index(&self) -> u32 {
        let mut idx = 0;
        if self.bold {
            idx |= Self::BOLD;
        }
        if self.wrap {
            idx |= Self::WRAP;
        }
        if self.date {
            idx |= Self::DATE;
        }
        if self.band {
            idx |= Self::BAND;
        }
        idx
    }

    pub fn from_index(idx: u32) -> Self {
        Self {
            bold: idx & Self::BOLD != 0,
            wrap: idx & Self::WRAP != 0,
            date: idx & Self::DATE != 0,
            band: idx & Self::BAND != 0,
        }
    }
}

/// Render `xl/styles.xml` with `band_color` as the banded-row fill
pub fn styles_xml(band_color: &str) -> String {
    let mut xfs = String::new();
    for idx in 0..CellStyle::COUNT {
        let style = CellStyle::from_index(idx);
        let num_fmt = if style.date { DATE_NUM_FMT_ID } else { 0 };
        let font = u32::from(style.bold);
        let fill = if style.band { 2 } else { 0 };
        xfs.push_str(&format!(
            r#"<xf numFmtId="{num_fmt}" fontId="{font}" fillId="{fill}" borderId="0" xfId="0""#
        ));
        if style.date {
            xfs.push_str(r#" applyNumberFormat="1""#);
        }
        if style.bold {
            xfs.push_str(r#" applyFont="1""#);
        }
        if style.band {
            xfs.push_str(r#" applyFill="1""#);
        }
        if style.wrap {
            xfs.push_str(r#" applyAlignment="1"><alignment vertical="top" wrapText="1"/></xf>"#);
        } else {
            xfs.push_str("/>");
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            r#"<numFmts count="1"><numFmt numFmtId="{id}" formatCode="{code}"/></numFmts>"#,
            r#"<fonts count="2">"#,
            r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
            r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
            r#"</fonts>"#,
            r#"<fills count="3">"#,
            r#"<fill><patternFill patternType="none"/></fill>"#,
            r#"<fill><patternFill patternType="gray125"/></fill>"#,
            r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{band}"/><bgColor indexed="64"/></patternFill></fill>"#,
            r#"</fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="{count}">{xfs}</cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            r#"</styleSheet>"#
        ),
        id = DATE_NUM_FMT_ID,
        code = DATE_FORMAT_CODE,
        band = band_color,
        count = CellStyle::COUNT,
        xfs = xfs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trips_flags() {
        for idx in 0..CellStyle::COUNT {
            assert_eq!(CellStyle::from_index(idx).index(), idx);
        }
        let header = CellStyle {
            bold: true,
            band: true,
            ..CellStyle::default()
        };
        assert_eq!(header.index(), CellStyle::BOLD | CellStyle::BAND);
    }

    #[test]
    fn test_styles_xml_has_every_xf() {
        let xml = styles_xml("EDEDED");
        assert_eq!(xml.matches("<xf ").count() as u32, CellStyle::COUNT + 1);
        assert!(xml.contains(r#"rgb="FFEDEDED""#));
        assert!(xml.contains(r#"formatCode="yyyy-mm-dd""#));
        assert!(xml.contains(r#"wrapText="1""#));
    }
}
