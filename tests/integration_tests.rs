//! Integration tests for the casenotes CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use calamine::{open_workbook, Data, Reader, Xlsx};
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Helper to get a casenotes command isolated from the caller's environment
fn casenotes(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("casenotes").unwrap();
    cmd.current_dir(dir)
        .env_remove("CASENOTES_LOG")
        .env_remove("CASENOTES_CASE_SENSITIVE")
        .env_remove("CASENOTES_IDENTITY")
        .env_remove("CASENOTES_NOTE_ORDER");
    cmd
}

/// Build a DOCX package with one plain paragraph per line
fn docx(lines: &[&str]) -> Vec<u8> {
    let body: String = lines
        .iter()
        .map(|l| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", l))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    fs::write(path, zip.finish().unwrap().into_inner()).unwrap();
}

fn doe_john() -> Vec<u8> {
    docx(&[
        "Entry Date: 2024-01-05 \u{2014} Staff: A. Lee: Initial intake.",
        "Exit Date: 2024-03-10: Case closed.",
    ])
}

/// Archive with one good client, one memo without keywords and one corrupt entry
fn setup_archive(tmp: &TempDir) -> PathBuf {
    let archive = tmp.path().join("cases.zip");
    write_archive(
        &archive,
        &[
            ("clients/Doe_John_12345.docx", doe_john()),
            (
                "clients/Roe Jane #4411.docx",
                docx(&["Entry Date: 02/01/2024", "2/3/2024 Follow-up call."]),
            ),
            ("clients/memo.docx", docx(&["Staff meeting moved to Friday."])),
            ("clients/corrupt.docx", b"PK\x03\x04 truncated".to_vec()),
            ("clients/readme.txt", b"not a document".to_vec()),
        ],
    );
    archive
}

fn rows(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

fn serial(cell: &Data) -> f64 {
    match cell {
        Data::DateTime(dt) => dt.as_f64(),
        Data::Float(f) => *f,
        other => panic!("expected a date cell, got {:?}", other),
    }
}

fn text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => panic!("expected a text cell, got {:?}", other),
    }
}

fn json_summary(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    casenotes(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("per-client workbooks"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    casenotes(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("casenotes"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    casenotes(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("casenotes"));
}

// ============================================================================
// Run Command Tests
// ============================================================================

#[test]
fn test_run_writes_client_workbook() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);

    casenotes(tmp.path())
        .arg("run")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Run Summary"))
        .stdout(predicate::str::contains("EntryOpenError"));

    let out = tmp.path().join("cases_xlsx_output");
    let workbook = out.join("Doe_John_12345.xlsx");
    assert!(workbook.exists());

    let book: Xlsx<_> = open_workbook(&workbook).unwrap();
    assert_eq!(book.sheet_names(), vec!["Profile", "Case Notes"]);

    let notes = rows(&workbook, "Case Notes");
    assert_eq!(
        notes[0].iter().map(text).collect::<Vec<_>>(),
        ["Date", "Staff", "Note"]
    );
    assert_eq!(notes.len(), 3);
    assert_eq!(serial(&notes[1][0]), 45296.0);
    assert_eq!(text(&notes[1][1]), "A. Lee");
    assert_eq!(text(&notes[1][2]), "Initial intake.");
    assert_eq!(serial(&notes[2][0]), 45361.0);
    assert_eq!(text(&notes[2][1]), "");
    assert_eq!(text(&notes[2][2]), "Case closed.");

    let profile = rows(&workbook, "Profile");
    assert_eq!(text(&profile[0][0]), "Client Name");
    assert_eq!(text(&profile[0][1]), "Doe John");
    assert_eq!(text(&profile[1][0]), "HMIS #");
    assert_eq!(text(&profile[1][1]), "12345");
}

#[test]
fn test_run_hash_convention_client() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);

    casenotes(tmp.path()).arg("run").arg(&archive).assert().success();

    let workbook = tmp.path().join("cases_xlsx_output/Roe_Jane_4411.xlsx");
    let notes = rows(&workbook, "Case Notes");
    assert_eq!(notes.len(), 3);
    assert_eq!(text(&notes[2][2]), "Follow-up call.");
}

#[test]
fn test_run_json_summary_counts() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);

    let output = casenotes(tmp.path())
        .args(["run", "--format", "json"])
        .arg(&archive)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary = json_summary(&output.stdout);
    assert_eq!(summary["scanned"], 5);
    assert_eq!(summary["ignored"], 1);
    assert_eq!(summary["excluded"], serde_json::json!(["clients/memo.docx"]));
    assert_eq!(summary["retained"], 2);
    assert_eq!(summary["workbooks"].as_array().unwrap().len(), 2);
    let failures = summary["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["kind"], "EntryOpenError");
    assert_eq!(failures[0]["item"], "clients/corrupt.docx");
}

#[test]
fn test_excluded_document_gets_no_workbook() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("memo.zip");
    write_archive(
        &archive,
        &[("Smith_Ann_77.docx", docx(&["Staff meeting moved to Friday."]))],
    );

    let output = casenotes(tmp.path())
        .args(["run", "--format", "json"])
        .arg(&archive)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary = json_summary(&output.stdout);
    assert_eq!(summary["excluded"].as_array().unwrap().len(), 1);
    assert_eq!(summary["workbooks"].as_array().unwrap().len(), 0);
    assert!(tmp.path().join("memo_xlsx_output").is_dir());
    assert!(!tmp.path().join("memo_xlsx_output/Smith_Ann_77.xlsx").exists());
}

/// Names of leftover scratch directories under `root`
fn scratch_dirs(root: &Path) -> Vec<String> {
    fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("casenotes-"))
        .collect()
}

#[cfg(unix)]
#[test]
fn test_scratch_directory_removed_after_success_and_failure() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);
    let scratch_root = tmp.path().join("tmp");
    fs::create_dir(&scratch_root).unwrap();

    casenotes(tmp.path())
        .env("TMPDIR", &scratch_root)
        .args(["run", "--prefix", "ok"])
        .arg(&archive)
        .assert()
        .success();
    assert!(tmp.path().join("ok_xlsx_output/Doe_John_12345.xlsx").exists());
    assert!(scratch_dirs(&scratch_root).is_empty());

    let garbage = tmp.path().join("garbage.zip");
    fs::write(&garbage, b"PK\x03\x04 not an archive").unwrap();
    casenotes(tmp.path())
        .env("TMPDIR", &scratch_root)
        .arg("run")
        .arg(&garbage)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read archive"));
    assert!(scratch_dirs(&scratch_root).is_empty());

    casenotes(tmp.path())
        .env("TMPDIR", &scratch_root)
        .args(["run", "missing.zip"])
        .assert()
        .failure();
    assert!(scratch_dirs(&scratch_root).is_empty());
}

#[test]
fn test_strict_fails_after_summary() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);

    casenotes(tmp.path())
        .args(["run", "--strict"])
        .arg(&archive)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Run Summary"))
        .stderr(predicate::str::contains("1 item(s) failed"));

    assert!(tmp
        .path()
        .join("cases_xlsx_output/Doe_John_12345.xlsx")
        .exists());
}

#[test]
fn test_run_is_byte_identical_across_runs() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);

    casenotes(tmp.path())
        .args(["run", "--prefix", "first"])
        .arg(&archive)
        .assert()
        .success();
    casenotes(tmp.path())
        .args(["run", "--prefix", "second"])
        .arg(&archive)
        .assert()
        .success();

    let first = fs::read(tmp.path().join("first_xlsx_output/Doe_John_12345.xlsx")).unwrap();
    let second = fs::read(tmp.path().join("second_xlsx_output/Doe_John_12345.xlsx")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_run_output_dir_and_keep_intermediate() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);
    let out = tmp.path().join("reports");
    let keep = tmp.path().join("scratch");

    casenotes(tmp.path())
        .arg("run")
        .arg(&archive)
        .arg("--output-dir")
        .arg(&out)
        .arg("--keep-intermediate")
        .arg(&keep)
        .assert()
        .success();

    assert!(out.join("cases_xlsx_output/Doe_John_12345.xlsx").exists());
    assert!(keep
        .join("records/Doe_John_12345_CASENOTES_extracted.csv")
        .exists());
    assert!(keep.join("cases/clients/Doe_John_12345.docx").exists());
}

#[test]
fn test_missing_archive_fails() {
    let tmp = TempDir::new().unwrap();
    casenotes(tmp.path())
        .args(["run", "nope.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read archive"));
}

// ============================================================================
// Stage Command Tests
// ============================================================================

#[test]
fn test_stages_match_full_run() {
    let tmp = TempDir::new().unwrap();
    let archive = setup_archive(&tmp);
    let cases = tmp.path().join("cases");
    let records = tmp.path().join("records");
    let books = tmp.path().join("books");

    casenotes(tmp.path())
        .arg("filter")
        .arg(&archive)
        .arg(&cases)
        .assert()
        .success()
        .stdout(predicate::str::contains("Filter Summary"));
    assert!(cases.join("clients/Doe_John_12345.docx").exists());
    assert!(!cases.join("clients/memo.docx").exists());

    casenotes(tmp.path())
        .arg("extract")
        .arg(&cases)
        .arg("--output-dir")
        .arg(&records)
        .assert()
        .success();
    let csv = fs::read_to_string(records.join("Doe_John_12345_CASENOTES_extracted.csv")).unwrap();
    assert!(csv.starts_with("Field,Value\n"));
    assert!(csv.contains("2024-03-10,,Case closed."));

    casenotes(tmp.path())
        .arg("format")
        .arg(&records)
        .arg("--output-dir")
        .arg(&books)
        .assert()
        .success();

    casenotes(tmp.path()).arg("run").arg(&archive).assert().success();

    let staged = fs::read(books.join("Doe_John_12345.xlsx")).unwrap();
    let direct = fs::read(tmp.path().join("cases_xlsx_output/Doe_John_12345.xlsx")).unwrap();
    assert_eq!(staged, direct);
}

#[test]
fn test_extract_reports_identity_failure() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("Unnamed.docx");
    fs::write(&doc, docx(&["Entry Date: 1/1/2024"])).unwrap();

    let output = casenotes(tmp.path())
        .args(["extract", "--format", "json"])
        .arg(&doc)
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary = json_summary(&output.stdout);
    assert_eq!(summary["failures"][0]["kind"], "IdentityParseError");
}

#[test]
fn test_format_reports_malformed_record() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Bad_1_CASENOTES_extracted.csv"), "not,a,record\n").unwrap();

    casenotes(tmp.path())
        .args(["format", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("RecordReadError"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let tmp = TempDir::new().unwrap();
    casenotes(tmp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entry Date"))
        .stdout(predicate::str::contains("EDEDED"));
}

#[test]
fn test_local_config_changes_keywords() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("casenotes.yaml"),
        "filter:\n  keywords: [\"Intake\"]\n",
    )
    .unwrap();
    let archive = tmp.path().join("intake.zip");
    write_archive(
        &archive,
        &[("Doe_John_12345.docx", docx(&["Intake 1/5/2024 first visit"]))],
    );

    let output = casenotes(tmp.path())
        .args(["run", "--format", "json"])
        .arg(&archive)
        .output()
        .unwrap();
    let summary = json_summary(&output.stdout);
    assert_eq!(summary["retained"], 1);
    assert_eq!(summary["workbooks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_explicit_config_must_parse() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.yaml"), "filter: [unclosed").unwrap();
    casenotes(tmp.path())
        .args(["--config", "bad.yaml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

#[test]
fn test_env_overrides_case_sensitivity() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("upper.zip");
    write_archive(
        &archive,
        &[("Doe_John_12345.docx", docx(&["ENTRY DATE: 1/5/2024"]))],
    );

    let output = casenotes(tmp.path())
        .env("CASENOTES_CASE_SENSITIVE", "true")
        .args(["run", "--format", "json"])
        .arg(&archive)
        .output()
        .unwrap();
    let summary = json_summary(&output.stdout);
    assert_eq!(summary["retained"], 0);
    assert_eq!(summary["excluded"].as_array().unwrap().len(), 1);
}
