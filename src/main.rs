use anyhow::Result;
use clap::Parser;
use patchup::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // PATCHUP_LOG=debug pup ... for diagnostics on stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PATCHUP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Fmt(args) => patchup::core::format::run(args, &ctx),
        Commands::Daemon(args) => patchup::backend::supervisor::run(args, &ctx),
        Commands::Init(args) => patchup::infra::config::init(args, &ctx),
        Commands::Completions(args) => patchup::completion::run(args),
    }
}
