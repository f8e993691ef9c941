//! `casenotes run` command - full pipeline over one archive

use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{check_strict, print_summary, SummaryKind};
use crate::cli::GlobalOpts;
use crate::core::pipeline::{run_pipeline, RunOptions};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// ZIP archive of DOCX case files
    pub archive: PathBuf,

    /// Output directory prefix (default: archive file stem)
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,

    /// Where to create `<prefix>_xlsx_output/` (default: current directory)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep retained documents and CSV record sets in this directory
    #[arg(long, value_name = "DIR")]
    pub keep_intermediate: Option<PathBuf>,

    /// Exit with an error if any item failed
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let opts = RunOptions {
        prefix: args.prefix,
        output_root: args.output_dir,
        keep_intermediate: args.keep_intermediate,
    };

    let summary = run_pipeline(&args.archive, &config, &opts)?;
    print_summary(SummaryKind::Run, &summary, global)?;
    check_strict(&summary, args.strict)
}
