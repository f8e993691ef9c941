//! Stage orchestration: filter → extract → format
//!
//! Stages run one after another over the whole batch. Each returns its own
//! report and a per-item failure never stops the batch.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::core::archive::{filter_archive, FilterOptions};
use crate::core::error::CaseError;
use crate::core::identity::{ClientIdentity, IdentityConvention};
use crate::core::intermediate::{read_record_set, write_record_set};
use crate::core::naming::UniqueNames;
use crate::core::summary::{ExtractOutcome, FormatReport, RunSummary};
use crate::core::Config;
use crate::docx::Document;
use crate::entities::{CaseFile, RecordFile};
use crate::extract::NoteExtractor;
use crate::xlsx::build_case_workbook;

/// Suffix of intermediate record set files
pub const RECORD_SUFFIX: &str = "_CASENOTES_extracted.csv";

/// Suffix of the run output directory
pub const OUTPUT_DIR_SUFFIX: &str = "_xlsx_output";

/// Everything the extract and format stages need from configuration
pub struct Stages {
    pub convention: Box<dyn IdentityConvention>,
    pub extractor: NoteExtractor,
    pub profile_fields: Vec<String>,
    pub band_color: String,
}

impl Stages {
    pub fn from_config(config: &Config) -> Self {
        Self {
            convention: config.convention().build(),
            extractor: NoteExtractor::from_config(config),
            profile_fields: config.profile_fields(),
            band_color: config.band_color(),
        }
    }

    /// Extract every case file into an intermediate CSV
    ///
    /// With `dest` unset each CSV is written beside its source document.
    pub fn extract_all(&self, cases: &[CaseFile], dest: Option<&Path>) -> ExtractOutcome {
        let mut outcome = ExtractOutcome::default();
        let mut names = UniqueNames::new();

        for case in cases {
            match self.extract_one(case, dest, &mut names) {
                Ok((record, notes)) => {
                    outcome.report.extracted += 1;
                    outcome.report.notes += notes;
                    outcome.records.push(record);
                }
                Err(e) => {
                    tracing::warn!(item = %e.item(), error = %e, "extraction failed");
                    outcome.report.failures.push(e.into_failure());
                }
            }
        }

        tracing::info!(
            extracted = outcome.report.extracted,
            notes = outcome.report.notes,
            failed = outcome.report.failures.len(),
            "extraction finished"
        );
        outcome
    }

    fn extract_one(
        &self,
        case: &CaseFile,
        dest: Option<&Path>,
        names: &mut UniqueNames,
    ) -> Result<(RecordFile, usize), CaseError> {
        let stem = case.stem();
        let identity = self
            .convention
            .parse(&stem)
            .map_err(|source| CaseError::IdentityParse {
                entry: case.entry_name.clone(),
                source,
            })?;

        let document =
            Document::open(&case.path).map_err(|e| CaseError::entry_open(&case.entry_name, e))?;
        let set = self.extractor.extract(&document, &identity);
        tracing::debug!(entry = %case.entry_name, client = %identity, notes = set.notes.len(), "extracted");

        let dir = target_dir(dest, &case.path);
        let path = claim_path(names, &dir, &stem, RECORD_SUFFIX);
        ensure_dir(&dir).map_err(|e| CaseError::record_write(&path, e))?;
        write_record_set(&path, &set, &self.profile_fields)
            .map_err(|e| CaseError::record_write(&path, e))?;

        let notes = set.notes.len();
        Ok((
            RecordFile {
                source: case.entry_name.clone(),
                identity,
                path,
            },
            notes,
        ))
    }

    /// Write one workbook per record set
    ///
    /// With `dest` unset each workbook lands beside its record set.
    pub fn format_all(&self, records: &[RecordFile], dest: Option<&Path>) -> FormatReport {
        let mut report = FormatReport::default();
        let mut names = UniqueNames::new();

        for record in records {
            match self.format_one(record, dest, &mut names) {
                Ok(path) => {
                    tracing::debug!(source = %record.source, path = %path.display(), "workbook written");
                    report.written.push(path);
                }
                Err(e) => {
                    tracing::warn!(item = %e.item(), error = %e, "formatting failed");
                    report.failures.push(e.into_failure());
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            failed = report.failures.len(),
            "formatting finished"
        );
        report
    }

    fn format_one(
        &self,
        record: &RecordFile,
        dest: Option<&Path>,
        names: &mut UniqueNames,
    ) -> Result<PathBuf, CaseError> {
        let set = read_record_set(&record.path).map_err(|e| CaseError::record_read(&record.path, e))?;
        let identity = set.identity().unwrap_or_else(|| record.identity.clone());

        let dir = target_dir(dest, &record.path);
        let path = claim_path(names, &dir, &identity.file_stem(), ".xlsx");

        let workbook = build_case_workbook(&set, &self.profile_fields, &self.band_color)
            .map_err(|e| CaseError::record_write(&path, e))?;
        ensure_dir(&dir).map_err(|e| CaseError::record_write(&path, e))?;
        workbook
            .save(&path)
            .map_err(|e| CaseError::record_write(&path, e))?;
        Ok(path)
    }
}

fn target_dir(dest: Option<&Path>, source: &Path) -> PathBuf {
    match dest {
        Some(dir) => dir.to_path_buf(),
        None => source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Unique `<dir>/<stem><suffix>` for this run
fn claim_path(names: &mut UniqueNames, dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    let key = dir.join(stem).to_string_lossy().to_string();
    PathBuf::from(format!("{}{}", names.claim(&key), suffix))
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

/// Options for a full run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Output directory name prefix; defaults to the archive file stem
    pub prefix: Option<String>,
    /// Parent of the output directory; defaults to the working directory
    pub output_root: Option<PathBuf>,
    /// Copy retained documents and record sets here before cleanup
    pub keep_intermediate: Option<PathBuf>,
}

/// `<root>/<prefix>_xlsx_output`
pub fn output_dir_for(archive: &Path, opts: &RunOptions) -> PathBuf {
    let prefix = opts.prefix.clone().unwrap_or_else(|| {
        archive
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "casenotes".to_string())
    });
    let root = opts.output_root.clone().unwrap_or_else(|| PathBuf::from("."));
    root.join(format!("{}{}", prefix, OUTPUT_DIR_SUFFIX))
}

/// Run all three stages over `archive`
///
/// Scratch files live in a [`TempDir`] that is removed when this returns,
/// whether the run succeeded or not.
pub fn run_pipeline(
    archive: &Path,
    config: &Config,
    opts: &RunOptions,
) -> Result<RunSummary, CaseError> {
    let scratch = TempDir::with_prefix("casenotes-")
        .map_err(|e| CaseError::record_write(&std::env::temp_dir(), e))?;
    let cases_dir = scratch.path().join("cases");
    let records_dir = scratch.path().join("records");
    tracing::debug!(scratch = %scratch.path().display(), "scratch directory created");

    let filtered = filter_archive(archive, &FilterOptions::from_config(config), &cases_dir)?;

    // Exists even when no workbook gets written
    let output_dir = output_dir_for(archive, opts);
    ensure_dir(&output_dir).map_err(|e| CaseError::record_write(&output_dir, e))?;

    let stages = Stages::from_config(config);
    let extracted = stages.extract_all(&filtered.cases, Some(&records_dir));

    let formatted = stages.format_all(&extracted.records, Some(&output_dir));

    if let Some(keep) = &opts.keep_intermediate {
        if let Err(e) = copy_tree(scratch.path(), keep) {
            tracing::warn!(path = %keep.display(), error = %e, "cannot keep intermediate files");
        }
    }

    let mut summary = RunSummary::from_stages(filtered.report, extracted.report, formatted);
    summary.output_dir = Some(output_dir);
    Ok(summary)
}

/// Copy every file under `from` into `to`, keeping relative paths
fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry.path().strip_prefix(from).map_err(std::io::Error::other)?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Expand files and directories into a sorted list of matching files
///
/// Directories are searched recursively; `extension` is matched without
/// regard to case. Explicit file arguments are taken as given.
pub fn collect_inputs(inputs: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
                })
                .filter(|p| {
                    !p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with("~$"))
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Case files for documents already on disk
pub fn cases_from_paths(paths: &[PathBuf]) -> Vec<CaseFile> {
    paths
        .iter()
        .map(|path| CaseFile {
            entry_name: path.display().to_string(),
            path: path.clone(),
        })
        .collect()
}

/// Record files for intermediate CSVs already on disk
///
/// The identity here is only a fallback; the profile inside the file wins.
pub fn records_from_paths(paths: &[PathBuf]) -> Vec<RecordFile> {
    paths
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let stem = stem.strip_suffix("_CASENOTES_extracted").unwrap_or(&stem);
            RecordFile {
                source: path.display().to_string(),
                identity: ClientIdentity::new(stem, ""),
                path: path.clone(),
            }
        })
        .collect()
}
