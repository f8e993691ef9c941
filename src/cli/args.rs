//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, extract::ExtractArgs,
    filter::FilterArgs, format::FormatArgs, run::RunArgs,
};

#[derive(Parser)]
#[command(name = "casenotes")]
#[command(author, version, about = "Convert legacy case-note documents into per-client workbooks")]
#[command(long_about = "Scans a ZIP archive of DOCX case files, keeps the ones with dated entries, \
extracts each client's profile and case notes, and writes one two-sheet XLSX workbook per client.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Summary output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Only print errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file, applied over the global and local ones
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline over an archive
    Run(RunArgs),

    /// Copy the dated case files out of an archive
    Filter(FilterArgs),

    /// Extract profiles and notes from DOCX files into CSV record sets
    Extract(ExtractArgs),

    /// Turn CSV record sets into workbooks
    Format(FormatArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Styled text for terminals
    #[default]
    Text,
    /// JSON (for programming)
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::parse_from(["casenotes", "-vv", "config", "path"]);
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.format, OutputFormat::Text);
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::parse_from([
            "casenotes",
            "run",
            "cases.zip",
            "--prefix",
            "march",
            "--strict",
            "--format",
            "json",
        ]);
        assert_eq!(cli.global.format, OutputFormat::Json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.archive, PathBuf::from("cases.zip"));
                assert_eq!(args.prefix.as_deref(), Some("march"));
                assert!(args.strict);
            }
            _ => panic!("expected run"),
        }
    }
}
