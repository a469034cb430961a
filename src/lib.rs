//! **patchup** - Minimal-edit driver for external code formatters
//!
//! Runs a configured formatter (subprocess or HTTP daemon) against source
//! text, diffs the result, and patches buffers/files with only the lines
//! that actually changed, keeping the caller's cursor in place.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - buffers, diff computation, patch replay, orchestration
pub mod core {
    /// Line-addressable buffer seam and the in-memory implementation
    pub mod buffer;
    pub use self::buffer::{Cursor, LineBuffer, TextBuffer};

    /// Ed-style diff model: compute, parse, render
    pub mod ed_diff;
    pub use self::ed_diff::{EdOp, EdScript};

    /// Minimal-edit replay with running line-offset bookkeeping
    pub mod patch;
    pub use self::patch::{PatchError, apply, apply_text};

    /// Orchestrator and the `fmt` command driver
    pub mod format;
    pub use self::format::{Outcome, format_buffer, run as fmt_run};
}

/// Formatting backends - strategies and daemon lifecycle
pub mod backend {
    /// Normalized outcome model shared by all strategies
    pub mod outcome;
    pub use self::outcome::{Backend, Diagnostics, FormatOutcome};

    /// Temp-file + subprocess strategy
    pub mod subprocess;
    pub use self::subprocess::SubprocessBackend;

    /// Blocking HTTP daemon strategy
    pub mod daemon;
    pub use self::daemon::{DaemonClient, FormatMode};

    /// Daemon lifecycle supervision and the `daemon` command driver
    pub mod supervisor;
    pub use self::supervisor::{DaemonSupervisor, EnsureOutcome, run as daemon_run};
}

/// Infrastructure - configuration, I/O, and file collection
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use self::config::{Config, init as config_init, load_config};

    /// Memory-mapped reads for large files and atomic write-back
    pub mod io;
    pub use self::io::{FileContent, read_file_smart, write_atomic};

    /// Gitignore-aware source file collection
    pub mod walk;
    pub use self::walk::SourceWalker;
}

// Strategic re-exports for clean consumer interfaces
pub use crate::backend::{Backend, Diagnostics, FormatOutcome};
pub use crate::cli::{AppContext, Cli, Commands};
pub use crate::core::{EdOp, EdScript, LineBuffer, Outcome, TextBuffer, format_buffer};
pub use crate::infra::{Config, load_config};
