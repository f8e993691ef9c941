use casenotes::cli::{Cli, Commands, GlobalOpts};
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Run(args) => casenotes::cli::commands::run::run(args, &global),
        Commands::Filter(args) => casenotes::cli::commands::filter::run(args, &global),
        Commands::Extract(args) => casenotes::cli::commands::extract::run(args, &global),
        Commands::Format(args) => casenotes::cli::commands::format::run(args, &global),
        Commands::Config(cmd) => casenotes::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => casenotes::cli::commands::completions::run(args),
    }
}

/// Log to stderr; `CASENOTES_LOG` overrides the level picked by -q/-v
fn init_logging(global: &GlobalOpts) {
    let level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_env("CASENOTES_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,casenotes={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
