//! `casenotes format` command - workbook formatting stage only

use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{check_strict, print_summary, SummaryKind};
use crate::cli::GlobalOpts;
use crate::core::pipeline::{collect_inputs, records_from_paths, Stages};
use crate::core::summary::{ExtractReport, FilterReport, RunSummary};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct FormatArgs {
    /// CSV record sets, or directories to search for them
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write workbooks here instead of beside each record set
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Exit with an error if any record set failed
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: FormatArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let files = collect_inputs(&args.inputs, "csv");
    if files.is_empty() {
        tracing::warn!("no CSV record sets found in the given inputs");
    }

    let stages = Stages::from_config(&config);
    let report = stages.format_all(&records_from_paths(&files), args.output_dir.as_deref());

    let mut summary = RunSummary::from_stages(
        FilterReport::default(),
        ExtractReport::default(),
        report,
    );
    summary.output_dir = args.output_dir;
    print_summary(SummaryKind::Format, &summary, global)?;
    check_strict(&summary, args.strict)
}
