//! Minimal-edit patch engine
//!
//! Replays an ed-style script against a live buffer as whole-line inserts
//! and deletes. One signed `line_offset` tracks the drift between
//! original-file and buffer line numbers across the whole replay; ops are
//! applied strictly in script order, so a single forward pass suffices.

use crate::core::buffer::{BufferError, Cursor, LineBuffer};
use crate::core::ed_diff::{self, EdOp, EdScript, ParseError};

/// Patch application errors.
///
/// After an `Err`, the buffer may hold a partially applied intermediate
/// state; callers must re-read content before retrying.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatchError {
    #[error("malformed ed diff: {0}")]
    Parse(#[from] ParseError),

    #[error("ed diff op does not fit the buffer: {0}")]
    Range(#[from] BufferError),

    #[error("ed diff op anchored before the first line (op {op_index})")]
    NegativeAnchor { op_index: usize },
}

/// Replay `script` against `buffer`, preserving the cursor column.
pub fn apply(buffer: &mut dyn LineBuffer, script: &EdScript) -> Result<(), PatchError> {
    let column = buffer.cursor().column;
    let mut line_offset: i64 = 0;

    for (op_index, op) in script.ops.iter().enumerate() {
        match op {
            EdOp::Append { line, lines } => {
                let count = lines.len() as i64;
                // Grow before anchoring: subsequent original-space
                // references shift further down in buffer space.
                line_offset -= count;
                let after = *line as i64 - count - line_offset;
                let after = usize::try_from(after)
                    .map_err(|_| PatchError::NegativeAnchor { op_index })?;
                buffer.insert_after(after, lines)?;
            }
            EdOp::Delete { line, count } => {
                let start = *line as i64 - line_offset;
                let start = usize::try_from(start)
                    .map_err(|_| PatchError::NegativeAnchor { op_index })?;
                buffer.delete_lines(start, *count)?;
                line_offset += *count as i64;
            }
        }
    }

    // The buffer's own reflow tracked the cursor line; only the column
    // needs restoring (clamped to the line it landed on).
    let line = buffer.cursor().line;
    buffer.set_cursor(Cursor { line, column });

    Ok(())
}

/// Textual entry point: strict parse, then replay.
///
/// Parsing happens before any mutation, so a malformed script always
/// leaves the buffer untouched.
pub fn apply_text(buffer: &mut dyn LineBuffer, diff_text: &str) -> Result<(), PatchError> {
    let script = ed_diff::parse(diff_text)?;
    apply(buffer, &script)
}
