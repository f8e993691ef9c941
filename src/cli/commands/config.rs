//! `casenotes config` command - inspect configuration

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::LOCAL_CONFIG_FILE;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration with defaults filled in
    Show,

    /// Show paths to configuration files
    Path,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show => run_show(global),
        ConfigCommands::Path => run_path(global),
    }
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let config = Config::load(global.config.as_deref())?.resolved();
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config).into_diagnostic()?);
        }
        OutputFormat::Text => {
            print!("{}", serde_yml::to_string(&config).into_diagnostic()?);
        }
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let global_path = Config::global_config_path();
    let local_path = Path::new(LOCAL_CONFIG_FILE);

    if global.format == OutputFormat::Json {
        let paths = serde_json::json!({
            "global": global_path,
            "local": local_path,
            "explicit": global.config,
        });
        println!("{}", serde_json::to_string_pretty(&paths).into_diagnostic()?);
        return Ok(());
    }

    println!("{}", style("Configuration file paths (lowest priority first):").bold());
    println!();
    match &global_path {
        Some(path) => print_path("Global:", path),
        None => println!("  {} {}", style("Global:").cyan(), style("(no home directory)").dim()),
    }
    print_path("Local:", local_path);
    if let Some(path) = &global.config {
        print_path("Explicit:", path);
    }
    println!();
    println!(
        "{}",
        style("Environment: CASENOTES_CASE_SENSITIVE, CASENOTES_IDENTITY, CASENOTES_NOTE_ORDER").dim()
    );
    Ok(())
}

fn print_path(label: &str, path: &Path) {
    let state = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("  {} {} {}", style(format!("{:<9}", label)).cyan(), path.display(), state);
}
