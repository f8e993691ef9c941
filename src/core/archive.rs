//! Archive filter - pull dated case files out of a ZIP archive
//!
//! Every file entry is classified exactly once: ignored (not a document),
//! failed (cannot be opened), excluded (no date keyword) or retained.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

use crate::core::error::CaseError;
use crate::core::naming::UniqueNames;
use crate::core::summary::{FilterOutcome, FilterReport};
use crate::core::Config;
use crate::docx::{Document, DocxError};
use crate::entities::CaseFile;

/// What the filter keeps
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    pub max_entry_bytes: u64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl FilterOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keywords: config.keywords(),
            case_sensitive: config.case_sensitive(),
            max_entry_bytes: config.max_entry_bytes(),
        }
    }
}

/// Keep only normal components so entries can't escape the destination
fn sanitize_path(name: &str) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();
    for component in Path::new(name).components() {
        if let Component::Normal(part) = component {
            sanitized.push(part);
        }
    }
    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// A `.docx` entry that isn't an Office lock file or macOS resource fork
pub fn is_document_name(path: &Path) -> bool {
    if path
        .components()
        .any(|c| c.as_os_str() == "__MACOSX")
    {
        return false;
    }
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    if file_name.starts_with("~$") || file_name.starts_with("._") {
        return false;
    }
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// Filter `archive_path`, copying retained documents under `dest`
///
/// Only failing to open the archive itself is an error; per-entry problems
/// are recorded in the report.
pub fn filter_archive(
    archive_path: &Path,
    opts: &FilterOptions,
    dest: &Path,
) -> Result<FilterOutcome, CaseError> {
    let file = File::open(archive_path).map_err(|e| CaseError::archive_read(archive_path, e))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| CaseError::archive_read(archive_path, e))?;

    tracing::info!(archive = %archive_path.display(), entries = archive.len(), "scanning archive");

    let mut outcome = FilterOutcome::default();
    let mut staged = UniqueNames::new();

    for index in 0..archive.len() {
        let raw_name = archive
            .name_for_index(index)
            .map(str::to_string)
            .unwrap_or_else(|| format!("entry #{}", index));
        if raw_name.ends_with('/') {
            continue;
        }

        let report = &mut outcome.report;
        report.scanned += 1;

        let Some(rel) = sanitize_path(&raw_name) else {
            tracing::warn!(entry = %raw_name, "skipping entry with unusable path");
            report.ignored += 1;
            continue;
        };
        if !is_document_name(&rel) {
            tracing::debug!(entry = %raw_name, "ignored");
            report.ignored += 1;
            continue;
        }

        let entry_name = rel.to_string_lossy().replace('\\', "/");
        let bytes = match read_entry(&mut archive, index, opts.max_entry_bytes) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(entry = %entry_name, error = %e, "cannot open entry");
                report
                    .failures
                    .push(CaseError::entry_open(&entry_name, e).into_failure());
                continue;
            }
        };

        let document = match Document::from_bytes(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(entry = %entry_name, error = %e, "cannot parse document");
                report
                    .failures
                    .push(CaseError::entry_open(&entry_name, e).into_failure());
                continue;
            }
        };

        if !document.contains_any(&opts.keywords, opts.case_sensitive) {
            tracing::debug!(entry = %entry_name, "excluded: no date keyword");
            report.excluded.push(entry_name);
            continue;
        }

        let target = staging_path(&mut staged, dest, &rel);
        if let Err(e) = write_entry(&target, &bytes) {
            tracing::warn!(path = %target.display(), error = %e, "cannot stage document");
            report
                .failures
                .push(CaseError::record_write(&target, e).into_failure());
            continue;
        }

        tracing::debug!(entry = %entry_name, "retained");
        report.retained += 1;
        outcome.cases.push(CaseFile {
            entry_name,
            path: target,
        });
    }

    log_report(&outcome.report);
    Ok(outcome)
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    limit: u64,
) -> Result<Vec<u8>, DocxError> {
    {
        let raw = archive.by_index_raw(index)?;
        if raw.encrypted() {
            return Err(DocxError::Encrypted);
        }
        if raw.size() > limit {
            return Err(DocxError::TooLarge {
                size: raw.size(),
                limit,
            });
        }
    }

    let entry = archive.by_index(index)?;
    // Declared sizes can lie, so cap the read as well
    let mut bytes = Vec::new();
    entry.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(DocxError::TooLarge {
            size: bytes.len() as u64,
            limit,
        });
    }
    Ok(bytes)
}

/// `dest/rel`, suffixed when another entry already normalized to the same path
fn staging_path(staged: &mut UniqueNames, dest: &Path, rel: &Path) -> PathBuf {
    let stem = rel.with_extension("");
    let claimed = staged.claim(&stem.to_string_lossy());
    match rel.extension() {
        Some(ext) => dest.join(format!("{}.{}", claimed, ext.to_string_lossy())),
        None => dest.join(claimed),
    }
}

fn write_entry(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)
}

fn log_report(report: &FilterReport) {
    tracing::info!(
        scanned = report.scanned,
        ignored = report.ignored,
        excluded = report.excluded.len(),
        retained = report.retained,
        failed = report.failures.len(),
        "archive filtered"
    );
}
