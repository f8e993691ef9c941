//! `casenotes extract` command - note extraction stage only

use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{check_strict, print_summary, SummaryKind};
use crate::cli::GlobalOpts;
use crate::core::pipeline::{cases_from_paths, collect_inputs, Stages};
use crate::core::summary::{FilterReport, FormatReport, RunSummary};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// DOCX files, or directories to search for them
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write record sets here instead of beside each document
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Exit with an error if any document failed
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: ExtractArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let files = collect_inputs(&args.inputs, "docx");
    if files.is_empty() {
        tracing::warn!("no DOCX files found in the given inputs");
    }

    let stages = Stages::from_config(&config);
    let outcome = stages.extract_all(&cases_from_paths(&files), args.output_dir.as_deref());

    let mut summary = RunSummary::from_stages(
        FilterReport::default(),
        outcome.report,
        FormatReport::default(),
    );
    summary.output_dir = args.output_dir;
    print_summary(SummaryKind::Extract, &summary, global)?;
    check_strict(&summary, args.strict)
}
