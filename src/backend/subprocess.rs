//! Subprocess formatting strategy
//!
//! Persists the content to a private temp file, invokes the configured
//! tool with its in-place arguments, and reads the rewritten file back.
//! The temp file lives exactly as long as one call.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

use crate::backend::outcome::{Backend, FormatOutcome};

/// External tool invoked as `<command> <args...> <tempfile>`.
///
/// The in-place rewrite flag, if the tool needs one, belongs in `args`.
#[derive(Debug, Clone)]
pub struct SubprocessBackend {
    command: String,
    args: Vec<String>,
}

impl SubprocessBackend {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    fn run(&self, content: &[u8]) -> Result<FormatOutcome> {
        // NamedTempFile deletes on drop, which covers every exit path
        // through this function.
        let mut tmp = tempfile::Builder::new()
            .prefix("pup-")
            .tempfile()
            .context("failed to create temp file for formatter input")?;
        tmp.write_all(content)
            .context("failed to write formatter input")?;
        tmp.flush().context("failed to flush formatter input")?;

        let command = shellexpand::full(&self.command)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| self.command.clone());

        debug!(command = %command, path = %tmp.path().display(), "invoking formatter");

        let output = Command::new(&command)
            .args(&self.args)
            .arg(tmp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to spawn formatter {command}"))?;

        if !output.status.success() {
            let mut diag = String::from_utf8_lossy(&output.stdout).into_owned();
            diag.push_str(&String::from_utf8_lossy(&output.stderr));
            return Ok(FormatOutcome::failed(&self.command, diag));
        }

        let formatted = fs::read_to_string(tmp.path())
            .context("failed to read back formatter output")?;
        Ok(FormatOutcome::Formatted(formatted))
    }
}

impl Backend for SubprocessBackend {
    fn name(&self) -> &str {
        &self.command
    }

    fn format(&self, content: &[u8]) -> FormatOutcome {
        match self.run(content) {
            Ok(outcome) => outcome,
            // Spawn and temp-file failures become diagnostics, not errors.
            Err(err) => FormatOutcome::failed(&self.command, format!("{err:#}")),
        }
    }
}
