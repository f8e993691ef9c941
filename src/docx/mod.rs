//! Minimal WordprocessingML reader
//!
//! Case files only need paragraph text and whether each run is bold, so this
//! walks `word/document.xml` once and keeps exactly that. Table cell
//! paragraphs are returned inline, in document order. A `w:br`/`w:cr` inside
//! a paragraph splits it, since legacy notes often use soft line breaks
//! between entries.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Subtrees that don't contribute body text: text boxes, markup-compatibility
/// fallbacks (duplicates of the preferred choice) and tracked-change history
const SKIPPED_SUBTREES: &[&[u8]] = &[
    b"w:txbxContent",
    b"mc:Fallback",
    b"w:rPrChange",
    b"w:pPrChange",
];

/// A run of text with uniform formatting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

/// One paragraph (or line, after soft breaks are split)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Paragraph built from plain runs, mostly for tests
    pub fn plain(text: &str) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                bold: false,
            }],
        }
    }

    /// Full paragraph text
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Split into the leading bold text and everything after it
    ///
    /// Whitespace-only runs don't end the bold prefix, so `**1/5/24** **A. Lee:**`
    /// is one header.
    pub fn split_bold_prefix(&self) -> (String, String) {
        let mut prefix = String::new();
        let mut idx = 0;
        while idx < self.runs.len() {
            let run = &self.runs[idx];
            if run.bold || (run.text.trim().is_empty() && !prefix.is_empty()) {
                prefix.push_str(&run.text);
                idx += 1;
            } else {
                break;
            }
        }
        let rest: String = self.runs[idx..].iter().map(|r| r.text.as_str()).collect();
        (prefix, rest)
    }

    fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

/// Parsed document body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// Open a DOCX file from disk
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a DOCX package held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let xml = {
            let mut part = archive
                .by_name(DOCUMENT_PART)
                .map_err(|_| DocxError::MissingPart(DOCUMENT_PART))?;
            let mut content = String::new();
            part.read_to_string(&mut content)?;
            content
        };
        Self::from_document_xml(&xml)
    }

    /// Parse the contents of `word/document.xml`
    pub fn from_document_xml(xml: &str) -> Result<Self, DocxError> {
        let mut state = BodyState::default();
        let mut reader = Reader::from_str(xml);
        // xml:space="preserve" runs carry meaningful spaces
        reader.trim_text(false);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => state.start(&e),
                Ok(Event::Empty(e)) => state.empty(&e),
                Ok(Event::Text(e)) => {
                    if state.in_text {
                        let text = e
                            .unescape()
                            .map_err(|err| DocxError::Xml(err.to_string()))?;
                        state.text(&text);
                    }
                }
                Ok(Event::End(e)) => state.end(e.name().as_ref()),
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(DocxError::Xml(format!(
                        "at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !state.saw_body {
            return Err(DocxError::Xml("no w:body element".to_string()));
        }
        Ok(Self {
            paragraphs: state.paragraphs,
        })
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Whether any paragraph contains one of `keywords`
    pub fn contains_any(&self, keywords: &[String], case_sensitive: bool) -> bool {
        let needles: Vec<String> = keywords
            .iter()
            .filter(|k| !k.is_empty())
            .map(|k| if case_sensitive { k.clone() } else { k.to_lowercase() })
            .collect();

        self.paragraphs.iter().any(|p| {
            let text = p.text();
            let haystack = if case_sensitive { text } else { text.to_lowercase() };
            needles.iter().any(|n| haystack.contains(n.as_str()))
        })
    }
}

/// Walker state for `word/document.xml`
#[derive(Default)]
struct BodyState {
    paragraphs: Vec<Paragraph>,
    current: Option<Paragraph>,
    run: Option<Run>,
    in_run_props: bool,
    in_text: bool,
    saw_body: bool,
    /// Nesting depth inside a skipped subtree, 0 when not skipping
    skip_depth: usize,
}

impl BodyState {
    fn start(&mut self, e: &BytesStart<'_>) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        let name = e.name();
        if SKIPPED_SUBTREES.contains(&name.as_ref()) {
            self.skip_depth = 1;
            return;
        }
        match name.as_ref() {
            b"w:body" => self.saw_body = true,
            b"w:p" => self.current = Some(Paragraph::default()),
            b"w:r" => self.run = Some(Run::default()),
            b"w:rPr" if self.run.is_some() => self.in_run_props = true,
            b"w:t" if self.run.is_some() => self.in_text = true,
            b"w:b" => self.bold(e),
            _ => {}
        }
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        if self.skip_depth > 0 {
            return;
        }
        match e.name().as_ref() {
            b"w:p" => self.paragraphs.push(Paragraph::default()),
            b"w:b" => self.bold(e),
            b"w:tab" if self.run.is_some() && !self.in_run_props => self.text("\t"),
            b"w:br" | b"w:cr" if self.run.is_some() => self.line_break(),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        match name {
            b"w:t" => self.in_text = false,
            b"w:rPr" => self.in_run_props = false,
            b"w:r" => {
                self.in_run_props = false;
                self.in_text = false;
                if let (Some(run), Some(p)) = (self.run.take(), self.current.as_mut()) {
                    if !run.text.is_empty() {
                        p.runs.push(run);
                    }
                }
            }
            b"w:p" => {
                if let Some(p) = self.current.take() {
                    self.paragraphs.push(p);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn bold(&mut self, e: &BytesStart<'_>) {
        if !self.in_run_props {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.bold = !is_val_off(e);
        }
    }

    /// Close the current line and continue the run in a fresh paragraph
    fn line_break(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let finished = Run {
            text: std::mem::take(&mut run.text),
            bold: run.bold,
        };
        if let Some(p) = self.current.as_mut() {
            if !finished.text.is_empty() {
                p.runs.push(finished);
            }
            let done = std::mem::take(p);
            if !done.is_empty() {
                self.paragraphs.push(done);
            }
        }
    }
}

/// `w:val="0"` / `"false"` / `"none"` switches a toggle property off
fn is_val_off(e: &BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|attr| {
        attr.key.as_ref() == b"w:val"
            && matches!(attr.value.as_ref(), b"0" | b"false" | b"none")
    })
}

/// Errors that can occur when reading a DOCX package
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("not a valid DOCX container: {0}")]
    Container(#[from] zip::result::ZipError),

    #[error("DOCX package is missing {0}")]
    MissingPart(&'static str),

    #[error("malformed document XML {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry is encrypted")]
    Encrypted,

    #[error("entry is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}
