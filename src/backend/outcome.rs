//! Backend outcome model
//!
//! Every formatting strategy normalizes its result into `FormatOutcome`;
//! nothing below the orchestrator throws past this boundary.

/// What the error-presentation layer gets to see about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    /// Tool name (command or daemon endpoint) for the report header.
    pub tool: String,
    /// Captured diagnostic text, verbatim.
    pub output: String,
}

/// Result of one formatting attempt against a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// The backend reported the input is already formatted.
    NoChange,
    /// Full formatted text, to be diffed against the original.
    Formatted(String),
    /// The backend failed; the buffer must not be touched.
    Failed(Diagnostics),
}

impl FormatOutcome {
    pub fn failed(tool: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Failed(Diagnostics {
            tool: tool.into(),
            output: output.into(),
        })
    }
}

/// A concrete formatting strategy.
///
/// Implementations block until the external tool finishes (or times out)
/// and must convert every failure into `FormatOutcome::Failed`.
pub trait Backend: Sync {
    /// Tool name used in reports.
    fn name(&self) -> &str;

    /// Format `content`, returning the normalized outcome.
    fn format(&self, content: &[u8]) -> FormatOutcome;
}
