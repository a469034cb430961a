use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "pup")]
#[command(
    about = "A fast CLI that runs external code formatters and applies their output as minimal line edits"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reformat files via the configured backend, patching minimal edits
    Fmt(FmtArgs),

    /// Manage the background formatting daemon
    Daemon(DaemonArgs),

    /// Initialize a patchup.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser)]
pub struct FmtArgs {
    /// Files or directories to format; '-' reads stdin and writes stdout
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Formatter backend to use
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Formatter executable, overriding the configured one
    #[arg(long)]
    pub command: Option<String>,

    /// Extra argument passed to the formatter (repeatable)
    #[arg(long = "arg", value_name = "ARG")]
    pub args: Vec<String>,

    /// Fixed output line width
    #[arg(long)]
    pub line_length: Option<u32>,

    /// Prefer speed over the formatter's safety checks
    #[arg(long, conflicts_with = "safe")]
    pub fast: bool,

    /// Prefer the formatter's safety checks over speed
    #[arg(long)]
    pub safe: bool,

    /// Daemon request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Report files needing changes without writing; exit 1 if any
    #[arg(long)]
    pub check: bool,

    /// Print the ed-style edit script instead of writing files
    #[arg(long)]
    pub diff: bool,

    /// Additional glob patterns to ignore when walking directories
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Invoke the formatter as a subprocess with a temp file
    Subprocess,
    /// Send content to the persistent HTTP formatting daemon
    Daemon,
}

#[derive(Parser)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonSubcommand,
}

#[derive(Subcommand)]
pub enum DaemonSubcommand {
    /// Start the daemon if it is not already running
    Start,

    /// Stop the running daemon
    Stop,

    /// Report whether the daemon is running
    Status,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
