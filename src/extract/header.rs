//! Profile header discovery
//!
//! Case files usually open with a block of `Label: value` lines (`Room #: 12`,
//! `DOB: 3/4/1980`). A paragraph that starts with a known profile label
//! contributes that label's value, which runs until the next known label on
//! the same line. Values that start with a date are stored as `YYYY-MM-DD`.

use regex::Regex;

use super::marker::leading_date;

/// Finds `Label:` occurrences for a fixed set of labels
#[derive(Debug, Clone)]
pub struct HeaderScanner {
    pattern: Option<Regex>,
    labels: Vec<String>,
}

impl HeaderScanner {
    pub fn new(labels: &[String]) -> Self {
        let mut sorted: Vec<String> = labels
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        sorted.sort_by_key(|l| std::cmp::Reverse(l.len()));

        let pattern = if sorted.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = sorted.iter().map(|l| regex::escape(l)).collect();
            let re = format!(r"(?i)(?:^|\s)(?P<label>{})\s*:", alternatives.join("|"));
            Some(Regex::new(&re).expect("escaped labels form a valid regex"))
        };

        Self {
            pattern,
            labels: sorted,
        }
    }

    /// `(label, value)` pairs from one paragraph, labels in configured spelling
    pub fn scan(&self, text: &str) -> Vec<(String, String)> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let text = text.trim();

        let hits: Vec<(usize, usize, String)> = pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let label = caps.name("label")?;
                let whole = caps.get(0)?;
                Some((label.start(), whole.end(), self.canonical(label.as_str())))
            })
            .collect();

        // Only header-style lines: the first label must open the paragraph
        if hits.first().map_or(true, |(start, _, _)| *start != 0) {
            return Vec::new();
        }

        hits.iter()
            .enumerate()
            .map(|(i, (_, value_start, label))| {
                let value_end = hits.get(i + 1).map_or(text.len(), |next| next.0);
                let raw = text[*value_start..value_end].trim();
                let value = match leading_date(raw) {
                    Some(date) => date.format("%Y-%m-%d").to_string(),
                    None => raw.to_string(),
                };
                (label.clone(), value)
            })
            .collect()
    }

    fn canonical(&self, matched: &str) -> String {
        self.labels
            .iter()
            .find(|l| l.eq_ignore_ascii_case(matched))
            .cloned()
            .unwrap_or_else(|| matched.to_string())
    }
}
