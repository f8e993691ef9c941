//! Date marker recognition for case note headers
//!
//! A note starts with a line like one of these:
//!
//! ```text
//! 1/5/2024 A. Lee: Met with client...            (bold header, legacy layout)
//! Entry Date: 2024-01-05 — Staff: A. Lee: Intake.
//! Exit Date: 2024-03-10: Case closed.
//! ```
//!
//! The line may open with one of the configured labels and a colon; the date
//! must come next. Only that leading date counts, later dates on the line are
//! note text. A date that isn't a real calendar date doesn't start a note.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Date expressions accepted in note headers
const DATE_PATTERN: &str = r"\d{1,2}/+\d{1,2}/+\d{2,4}|\d{4}-\d{1,2}-\d{1,2}";

/// A date at the very start of a string
static LEADING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?P<date>{})\b", DATE_PATTERN)).expect("valid regex")
});

/// End of the staff name after an explicit `Staff:` label
static STAFF_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":|\s+[—–-]+\s+").expect("valid regex"));

/// Earliest year a spreadsheet date cell can hold
const MIN_YEAR: i32 = 1900;

/// Characters that may sit between the date and what follows it
const SEPARATORS: &[char] = &[':', '—', '–', '-', ',', '/', '.', ';'];

/// A recognized note header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMarker {
    /// Label in front of the date, as written
    pub label: Option<String>,
    pub date: NaiveDate,
    /// Everything after the date token
    pub rest: String,
}

/// Matches note headers against a set of allowed labels
#[derive(Debug, Clone)]
pub struct MarkerParser {
    pattern: Regex,
}

impl MarkerParser {
    pub fn new(labels: &[String]) -> Self {
        let mut labels: Vec<&str> = labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        // Longest first so "Entry Date" wins over "Date"
        labels.sort_by_key(|l| std::cmp::Reverse(l.len()));

        let label_group = if labels.is_empty() {
            String::new()
        } else {
            let alternatives: Vec<String> = labels.iter().map(|l| regex::escape(l)).collect();
            format!(r"(?:(?P<label>{})\s*:\s*)?", alternatives.join("|"))
        };
        let pattern = format!(
            r"(?is)^\s*{}(?P<date>{})\b(?P<rest>.*)$",
            label_group, DATE_PATTERN
        );

        Self {
            pattern: Regex::new(&pattern).expect("escaped labels form a valid regex"),
        }
    }

    /// Recognize a note header at the start of `line`
    pub fn parse(&self, line: &str) -> Option<DateMarker> {
        let caps = self.pattern.captures(line)?;
        let date = parse_date(&caps["date"])?;
        Some(DateMarker {
            label: caps.name("label").map(|m| m.as_str().to_string()),
            date,
            rest: caps["rest"].to_string(),
        })
    }
}

/// Parse `M/D/YYYY`, `M/D/YY` (as 20YY) or `YYYY-MM-DD`
///
/// Repeated slashes (`1//5/2024`) are tolerated. Returns None for anything
/// that isn't a real calendar date, or that falls before 1900.
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    parse_calendar_date(token.trim()).filter(|d| d.year() >= MIN_YEAR)
}

fn parse_calendar_date(token: &str) -> Option<NaiveDate> {
    if token.contains('/') {
        let parts: Vec<&str> = token.split('/').filter(|p| !p.is_empty()).collect();
        let [m, d, y] = parts.as_slice() else {
            return None;
        };
        let year = match y.len() {
            2 => 2000 + y.parse::<i32>().ok()?,
            4 => y.parse::<i32>().ok()?,
            _ => return None,
        };
        NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)
    } else {
        let parts: Vec<&str> = token.split('-').collect();
        let [y, m, d] = parts.as_slice() else {
            return None;
        };
        if y.len() != 4 {
            return None;
        }
        NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
    }
}

/// Date at the start of `text`, if it parses
pub fn leading_date(text: &str) -> Option<NaiveDate> {
    LEADING_DATE
        .captures(text)
        .and_then(|caps| parse_date(&caps["date"]))
}

fn trim_separators(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
}

/// Strip a leading `Staff:` label, case-insensitively
fn strip_staff_label(s: &str) -> Option<&str> {
    let head = s.get(..5)?;
    if !head.eq_ignore_ascii_case("staff") {
        return None;
    }
    let after = s[5..].trim_start();
    after.strip_prefix(':')
}

/// Split plain-text header remainder into (staff, note body)
///
/// `— Staff: A. Lee: Initial intake.` gives `("A. Lee", "Initial intake.")`.
/// Without a `Staff:` label the staff is empty and everything is body.
pub fn split_staff(rest: &str) -> (String, String) {
    let rest = trim_separators(rest);
    let Some(after) = strip_staff_label(rest) else {
        return (String::new(), rest.trim().to_string());
    };
    let after = after.trim_start();
    match STAFF_END.find(after) {
        Some(m) => (
            after[..m.start()].trim().to_string(),
            trim_separators(&after[m.end()..]).trim().to_string(),
        ),
        None => (after.trim().to_string(), String::new()),
    }
}

/// Staff name from the bold header text following the date
///
/// Trailing colons, slashes and whitespace are dropped, as is a `Staff:` label.
pub fn bold_staff(rest: &str) -> String {
    let rest = trim_separators(rest);
    let rest = strip_staff_label(rest).unwrap_or(rest);
    rest.trim()
        .trim_end_matches(|c: char| c.is_whitespace() || c == ':' || c == '/')
        .trim()
        .to_string()
}

/// Note body that follows a bold header
pub fn body_after_header(rest: &str) -> String {
    rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':')
        .trim_end()
        .to_string()
}
