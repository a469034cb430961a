//! Formatting orchestrator: backend → diff → patch
//!
//! `format_buffer` sequences one formatting attempt for one buffer and is
//! the single place deciding whether the patch replay happens at all. The
//! `run` driver below maps the pipeline over files for `pup fmt`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use serde_json::json;
use tracing::debug;

use crate::backend::daemon::{DaemonClient, FormatMode};
use crate::backend::outcome::{Backend, Diagnostics, FormatOutcome};
use crate::backend::subprocess::SubprocessBackend;
use crate::backend::supervisor::{DaemonConfig, DaemonSupervisor, EnsureOutcome};
use crate::cli::{AppContext, Backend as BackendFlag, FmtArgs};
use crate::core::buffer::{LineBuffer, TextBuffer};
use crate::core::ed_diff::{self, EdScript};
use crate::core::patch;
use crate::infra::config::{BackendChoice, Config, ModeChoice, load_config};
use crate::infra::io::{read_file_smart, write_atomic};
use crate::infra::walk::SourceWalker;

/// Classified result of one format-and-patch pass over one buffer.
#[derive(Debug)]
pub enum Outcome {
    /// Already formatted; the buffer was not mutated.
    NoChange,
    /// The buffer now matches the formatter's output; `script` is the
    /// minimal edit sequence that was replayed onto it.
    Reformatted { script: EdScript },
    /// Backend or patch failure; on a backend failure the buffer is
    /// untouched.
    Failed(Diagnostics),
}

/// Run one formatting attempt and apply the result as minimal edits.
///
/// Failures never escape as errors; they are classified into the outcome
/// so callers have a single reporting path.
pub fn format_buffer(buffer: &mut dyn LineBuffer, backend: &dyn Backend) -> Outcome {
    let original = buffer.text();

    match backend.format(original.as_bytes()) {
        FormatOutcome::NoChange => Outcome::NoChange,
        FormatOutcome::Failed(diagnostics) => Outcome::Failed(diagnostics),
        FormatOutcome::Formatted(formatted) => {
            let script = ed_diff::compute(&original, &formatted);
            if script.is_empty() {
                return Outcome::NoChange;
            }
            debug!(ops = script.ops.len(), "replaying ed script");
            match patch::apply(buffer, &script) {
                Ok(()) => Outcome::Reformatted { script },
                Err(err) => Outcome::Failed(Diagnostics {
                    tool: backend.name().to_string(),
                    output: format!("patch application failed: {err}"),
                }),
            }
        }
    }
}

/// Effective per-run settings after layering CLI flags over config.
struct Settings {
    backend: BackendChoice,
    mode: FormatMode,
    line_length: Option<u32>,
    check: bool,
    diff: bool,
    json: bool,
}

impl Settings {
    fn resolve(config: &Config, args: &FmtArgs) -> Self {
        let backend = match args.backend {
            Some(BackendFlag::Subprocess) => BackendChoice::Subprocess,
            Some(BackendFlag::Daemon) => BackendChoice::Daemon,
            None => config.backend,
        };
        let mode = if args.fast {
            FormatMode::Fast
        } else if args.safe {
            FormatMode::Safe
        } else {
            match config.mode {
                ModeChoice::Fast => FormatMode::Fast,
                ModeChoice::Safe => FormatMode::Safe,
            }
        };
        Self {
            backend,
            mode,
            line_length: args.line_length.or(config.line_length),
            check: args.check,
            diff: args.diff,
            json: args.json,
        }
    }
}

/// Per-file result for reporting.
enum FileReport {
    Unchanged(PathBuf),
    Reformatted(PathBuf),
    WouldReformat {
        path: PathBuf,
        script: Option<String>,
    },
    Failed {
        path: PathBuf,
        tool: String,
        output: String,
    },
}

/// `pup fmt` driver.
pub fn run(args: FmtArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;
    let settings = Settings::resolve(&config, &args);

    if args.paths.iter().any(|p| p.as_os_str() == "-") {
        if args.paths.len() > 1 {
            anyhow::bail!("'-' (stdin) cannot be combined with other paths");
        }
        return run_stdin(&config, &args, &settings);
    }

    let files = collect_targets(&args.paths, &config, &args.ignore)?;
    if files.is_empty() {
        if !ctx.quiet {
            println!("no files to format");
        }
        return Ok(());
    }

    let backend = build_backend(&config, &args, &settings)?;

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| format_file(path, backend.as_ref(), &settings, ctx))
        .collect();

    report(&reports, &settings, ctx)
}

fn run_stdin(config: &Config, args: &FmtArgs, settings: &Settings) -> Result<()> {
    let mut original = String::new();
    std::io::stdin()
        .read_to_string(&mut original)
        .context("failed to read stdin")?;

    let backend = build_backend(config, args, settings)?;
    let mut buffer = TextBuffer::from_text(&original);

    match format_buffer(&mut buffer, backend.as_ref()) {
        Outcome::NoChange => {
            if !settings.check && !settings.diff {
                print!("{original}");
            }
            Ok(())
        }
        Outcome::Reformatted { script } => {
            if settings.diff {
                print!("{}", ed_diff::render(&script));
                std::process::exit(1);
            }
            if settings.check {
                std::process::exit(1);
            }
            print!("{}", buffer.text());
            Ok(())
        }
        Outcome::Failed(diagnostics) => {
            eprintln!("{}: {}", diagnostics.tool, diagnostics.output);
            std::process::exit(2);
        }
    }
}

/// Expand files and directories into the list of files to format.
///
/// Explicit file paths are always taken; directories are walked through
/// the include/ignore globs.
fn collect_targets(
    paths: &[PathBuf],
    config: &Config,
    extra_ignores: &[String],
) -> Result<Vec<PathBuf>> {
    let mut ignores = config.ignore_patterns.clone();
    ignores.extend(extra_ignores.iter().cloned());
    let walker = SourceWalker::new(&config.include, &ignores)?;

    let mut files = Vec::new();
    for path in paths {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("cannot access {}", path.display()))?;
        if meta.is_dir() {
            files.extend(walker.walk(path));
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn build_backend(config: &Config, args: &FmtArgs, settings: &Settings) -> Result<Box<dyn Backend>> {
    match settings.backend {
        BackendChoice::Subprocess => {
            let command = args
                .command
                .clone()
                .unwrap_or_else(|| config.subprocess.command.clone());
            let mut tool_args = config.subprocess.args.clone();
            tool_args.extend(args.args.iter().cloned());
            Ok(Box::new(SubprocessBackend::new(command, tool_args)))
        }
        BackendChoice::Daemon => {
            let mut daemon = config.daemon.clone();
            if let Some(command) = &args.command {
                daemon.command = command.clone();
            }
            let timeout =
                Duration::from_millis(args.timeout_ms.unwrap_or(daemon.request_timeout_ms));

            let mut supervisor = DaemonSupervisor::new(DaemonConfig::from_settings(&daemon));
            if supervisor.ensure_running().context("formatter daemon unavailable")?
                == EnsureOutcome::JustStarted
            {
                supervisor.await_ready();
            }

            let client = DaemonClient::new(
                supervisor.endpoint(),
                timeout,
                settings.mode,
                settings.line_length,
            )?;
            Ok(Box::new(client))
        }
    }
}

fn format_file(
    path: &Path,
    backend: &dyn Backend,
    settings: &Settings,
    ctx: &AppContext,
) -> FileReport {
    match try_format_file(path, backend, settings, ctx) {
        Ok(report) => report,
        Err(err) => FileReport::Failed {
            path: path.to_path_buf(),
            tool: backend.name().to_string(),
            output: format!("{err:#}"),
        },
    }
}

fn try_format_file(
    path: &Path,
    backend: &dyn Backend,
    settings: &Settings,
    ctx: &AppContext,
) -> Result<FileReport> {
    let content = read_file_smart(path)?;
    let mut buffer = TextBuffer::from_text(content.as_ref());

    match format_buffer(&mut buffer, backend) {
        Outcome::NoChange => Ok(FileReport::Unchanged(path.to_path_buf())),
        Outcome::Failed(diagnostics) => Ok(FileReport::Failed {
            path: path.to_path_buf(),
            tool: diagnostics.tool,
            output: diagnostics.output,
        }),
        Outcome::Reformatted { script } => {
            if settings.diff {
                return Ok(FileReport::WouldReformat {
                    path: path.to_path_buf(),
                    script: Some(ed_diff::render(&script)),
                });
            }
            if settings.check || ctx.dry_run {
                return Ok(FileReport::WouldReformat {
                    path: path.to_path_buf(),
                    script: None,
                });
            }
            write_atomic(path, &buffer.text())?;
            Ok(FileReport::Reformatted(path.to_path_buf()))
        }
    }
}

/// Exit code for a finished run: failures trump everything, then pending
/// changes under `--check`/`--diff`.
fn exit_code(failed: usize, pending: usize, check_like: bool) -> i32 {
    if failed > 0 {
        2
    } else if check_like && pending > 0 {
        1
    } else {
        0
    }
}

fn report(reports: &[FileReport], settings: &Settings, ctx: &AppContext) -> Result<()> {
    let mut reformatted = Vec::new();
    let mut would = Vec::new();
    let mut unchanged = 0usize;
    let mut failures = Vec::new();

    for entry in reports {
        match entry {
            FileReport::Unchanged(_) => unchanged += 1,
            FileReport::Reformatted(path) => reformatted.push(path),
            FileReport::WouldReformat { path, script } => {
                would.push(path);
                if let Some(script) = script {
                    println!("--- {}", path.display());
                    print!("{script}");
                }
            }
            FileReport::Failed { path, tool, output } => failures.push((path, tool, output)),
        }
    }

    if settings.json {
        let value = json!({
            "reformatted": reformatted.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "would_reformat": would.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "unchanged": unchanged,
            "failed": failures
                .iter()
                .map(|(path, tool, output)| json!({
                    "path": path.display().to_string(),
                    "tool": tool,
                    "diagnostics": output,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{value}");
    } else {
        if !ctx.quiet {
            for path in &reformatted {
                if ctx.no_color {
                    println!("reformatted {}", path.display());
                } else {
                    println!("{} {}", "reformatted".green(), path.display());
                }
            }
            for path in &would {
                if ctx.no_color {
                    println!("would reformat {}", path.display());
                } else {
                    println!("{} {}", "would reformat".yellow(), path.display());
                }
            }
        }
        for (path, tool, output) in &failures {
            if ctx.no_color {
                eprintln!("error: {} ({}): {}", path.display(), tool, output.trim_end());
            } else {
                eprintln!(
                    "{} {} ({}): {}",
                    "error:".red(),
                    path.display(),
                    tool,
                    output.trim_end()
                );
            }
        }
        if !ctx.quiet {
            println!(
                "{} reformatted, {} would reformat, {} unchanged, {} failed",
                reformatted.len(),
                would.len(),
                unchanged,
                failures.len()
            );
        }
    }

    let code = exit_code(
        failures.len(),
        would.len(),
        settings.check || settings.diff,
    );
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
