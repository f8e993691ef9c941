//! `casenotes filter` command - archive filter stage only

use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{check_strict, print_summary, SummaryKind};
use crate::cli::GlobalOpts;
use crate::core::archive::{filter_archive, FilterOptions};
use crate::core::summary::{ExtractReport, FormatReport, RunSummary};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct FilterArgs {
    /// ZIP archive of DOCX case files
    pub archive: PathBuf,

    /// Directory to copy retained documents into
    pub output_dir: PathBuf,

    /// Exit with an error if any entry failed
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: FilterArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let outcome = filter_archive(
        &args.archive,
        &FilterOptions::from_config(&config),
        &args.output_dir,
    )?;

    let mut summary = RunSummary::from_stages(
        outcome.report,
        ExtractReport::default(),
        FormatReport::default(),
    );
    summary.output_dir = Some(args.output_dir);
    print_summary(SummaryKind::Filter, &summary, global)?;
    check_strict(&summary, args.strict)
}
