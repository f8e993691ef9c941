//! Summary rendering shared by the stage commands

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::summary::{Failure, RunSummary};

/// Which stages a summary covers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryKind {
    Run,
    Filter,
    Extract,
    Format,
}

impl SummaryKind {
    fn title(self) -> &'static str {
        match self {
            SummaryKind::Run => "Run Summary",
            SummaryKind::Filter => "Filter Summary",
            SummaryKind::Extract => "Extract Summary",
            SummaryKind::Format => "Format Summary",
        }
    }

    fn filters(self) -> bool {
        matches!(self, SummaryKind::Run | SummaryKind::Filter)
    }

    fn extracts(self) -> bool {
        matches!(self, SummaryKind::Run | SummaryKind::Extract)
    }

    fn formats(self) -> bool {
        matches!(self, SummaryKind::Run | SummaryKind::Format)
    }
}

/// Print a summary as text or JSON, per `--format`
pub fn print_summary(kind: SummaryKind, summary: &RunSummary, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Text if global.quiet => {
            for failure in &summary.failures {
                eprintln!(
                    "{} {} {}: {}",
                    style("✗").red(),
                    style(failure.kind).red(),
                    failure.item,
                    failure.message
                );
            }
        }
        OutputFormat::Text => print_text(kind, summary, global.verbose > 0),
    }
    Ok(())
}

fn print_text(kind: SummaryKind, summary: &RunSummary, verbose: bool) {
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style(kind.title()).bold());
    println!("{}", style("─".repeat(50)).dim());

    if kind.filters() {
        println!("  Entries scanned:   {}", style(summary.scanned).cyan());
        if summary.ignored > 0 {
            println!("  Not documents:     {}", style(summary.ignored).dim());
        }
        println!("  Skipped:           {}", style(summary.skipped()).dim());
        println!("  Case files:        {}", style(summary.retained).cyan());
    }
    if kind.extracts() {
        println!("  Clients extracted: {}", style(summary.extracted).cyan());
        println!("  Notes:             {}", style(summary.notes).cyan());
    }
    if kind.formats() {
        println!("  Workbooks written: {}", style(summary.processed()).green());
    }
    if summary.failed() > 0 {
        println!("  Failed:            {}", style(summary.failed()).red());
    }
    if let Some(dir) = &summary.output_dir {
        println!("  Output:            {}", style(dir.display()).yellow());
    }

    if verbose && !summary.excluded.is_empty() {
        println!();
        println!("{}", style("Skipped (no date keyword):").dim());
        for name in &summary.excluded {
            println!("  {} {}", style("○").dim(), name);
        }
    }

    if !summary.failures.is_empty() {
        println!();
        println!("{}", failure_table(&summary.failures));
    }
}

/// Failures as a table of item, kind and message
pub fn failure_table(failures: &[Failure]) -> String {
    let mut table = Builder::default();
    table.push_record(["Item", "Kind", "Message"]);
    for failure in failures {
        table.push_record([
            failure.item.clone(),
            failure.kind.to_string(),
            failure.message.clone(),
        ]);
    }
    table.build().with(Style::rounded()).to_string()
}

/// Turn per-item failures into an error exit under `--strict`
pub fn check_strict(summary: &RunSummary, strict: bool) -> Result<()> {
    if strict && summary.failed() > 0 {
        return Err(miette::miette!(
            code = "casenotes::strict",
            help = "rerun without --strict to accept partial output",
            "{} item(s) failed",
            summary.failed()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::summary::FailureKind;

    fn summary_with_failure() -> RunSummary {
        RunSummary {
            failures: vec![Failure {
                item: "broken.docx".to_string(),
                kind: FailureKind::EntryOpen,
                message: "not a valid DOCX container".to_string(),
            }],
            ..RunSummary::default()
        }
    }

    #[test]
    fn test_failure_table_lists_items() {
        let table = failure_table(&summary_with_failure().failures);
        assert!(table.contains("broken.docx"));
        assert!(table.contains("EntryOpenError"));
        assert!(table.contains("Message"));
    }

    #[test]
    fn test_check_strict() {
        let summary = summary_with_failure();
        assert!(check_strict(&summary, false).is_ok());
        assert!(check_strict(&summary, true).is_err());
        assert!(check_strict(&RunSummary::default(), true).is_ok());
    }
}
