//! Ed-style line diff model, computation, and wire format
//!
//! The script subset is what `diff -n` emits for whole-file comparisons:
//! append and delete blocks anchored to original-file line numbers. A
//! change is a delete immediately followed by an append; there is no
//! standalone change op.

use std::sync::LazyLock;

use regex::Regex;
use similar::{DiffTag, TextDiff};

/// One instruction of an ed-style script.
///
/// Literal lines keep their terminators; only the final line of the final
/// append block may lack one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdOp {
    /// `a<N> <C>`: append the following lines after original line `line`
    /// (0 appends before the first line).
    Append { line: usize, lines: Vec<String> },

    /// `d<N> <C>`: delete `count` lines starting at original line `line`.
    Delete { line: usize, count: usize },
}

/// An ordered ed-style script, exactly as the diff engine emitted it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdScript {
    pub ops: Vec<EdOp>,
}

impl EdScript {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Total lines inserted and deleted, for reporting.
    pub fn edit_counts(&self) -> (usize, usize) {
        let mut inserted = 0;
        let mut deleted = 0;
        for op in &self.ops {
            match op {
                EdOp::Append { lines, .. } => inserted += lines.len(),
                EdOp::Delete { count, .. } => deleted += count,
            }
        }
        (inserted, deleted)
    }
}

/// Script parse errors; any of these means the diff text is unusable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("malformed diff header at script line {line}: {content:?}")]
    MalformedHeader { line: usize, content: String },

    #[error("delete op at script line {line} anchored at line 0")]
    DeleteAtZero { line: usize },

    #[error("truncated append block at script line {line}: expected {expected} lines, found {found}")]
    TruncatedAppend {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Compute the ed-style script that transforms `original` into `formatted`.
///
/// Byte-equal inputs short-circuit to an empty script so the cheap no-op
/// path never runs the diff engine.
pub fn compute(original: &str, formatted: &str) -> EdScript {
    if original == formatted {
        return EdScript::default();
    }

    let new_lines: Vec<&str> = formatted.split_inclusive('\n').collect();
    let diff = TextDiff::from_lines(original, formatted);

    let mut ops = Vec::new();
    for op in diff.ops() {
        let old = op.old_range();
        let new = op.new_range();
        match op.tag() {
            DiffTag::Equal => {}
            DiffTag::Delete => ops.push(EdOp::Delete {
                line: old.start + 1,
                count: old.len(),
            }),
            DiffTag::Insert => ops.push(EdOp::Append {
                line: old.start,
                lines: new_lines[new].iter().map(|s| s.to_string()).collect(),
            }),
            DiffTag::Replace => {
                ops.push(EdOp::Delete {
                    line: old.start + 1,
                    count: old.len(),
                });
                ops.push(EdOp::Append {
                    line: old.end,
                    lines: new_lines[new].iter().map(|s| s.to_string()).collect(),
                });
            }
        }
    }

    EdScript { ops }
}

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ad])([0-9]+) ([0-9]+)$").expect("static header pattern"));

/// Parse an ed-style script from its textual form.
///
/// The grammar is strict: every header must be exactly `a<N> <C>` or
/// `d<N> <C>`, and every `a` header must be followed by exactly `C` literal
/// lines. Anything else is fatal.
pub fn parse(text: &str) -> Result<EdScript, ParseError> {
    let mut ops = Vec::new();
    let mut raw_lines = text.split_inclusive('\n');
    let mut line_no = 0usize;

    while let Some(raw) = raw_lines.next() {
        line_no += 1;
        let header = raw.trim_end_matches('\n').trim_end_matches('\r');

        let caps = HEADER_RE
            .captures(header)
            .ok_or_else(|| ParseError::MalformedHeader {
                line: line_no,
                content: header.to_string(),
            })?;
        let anchor: usize = caps[2].parse().map_err(|_| ParseError::MalformedHeader {
            line: line_no,
            content: header.to_string(),
        })?;
        let count: usize = caps[3].parse().map_err(|_| ParseError::MalformedHeader {
            line: line_no,
            content: header.to_string(),
        })?;

        match &caps[1] {
            "a" => {
                let header_line = line_no;
                let mut lines = Vec::with_capacity(count);
                for _ in 0..count {
                    match raw_lines.next() {
                        Some(literal) => {
                            line_no += 1;
                            lines.push(literal.to_string());
                        }
                        None => {
                            return Err(ParseError::TruncatedAppend {
                                line: header_line,
                                expected: count,
                                found: lines.len(),
                            });
                        }
                    }
                }
                ops.push(EdOp::Append {
                    line: anchor,
                    lines,
                });
            }
            _ => {
                if anchor == 0 {
                    return Err(ParseError::DeleteAtZero { line: line_no });
                }
                ops.push(EdOp::Delete {
                    line: anchor,
                    count,
                });
            }
        }
    }

    Ok(EdScript { ops })
}

/// Serialize a script to the wire format consumed by [`parse`].
pub fn render(script: &EdScript) -> String {
    let mut out = String::new();
    for op in &script.ops {
        match op {
            EdOp::Append { line, lines } => {
                out.push_str(&format!("a{} {}\n", line, lines.len()));
                for l in lines {
                    out.push_str(l);
                }
            }
            EdOp::Delete { line, count } => {
                out.push_str(&format!("d{} {}\n", line, count));
            }
        }
    }
    out
}
