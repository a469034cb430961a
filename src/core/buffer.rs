//! Line-addressable buffer abstraction for the patch engine
//!
//! Any host text container (editor buffer, rope, plain string) can receive
//! minimal-edit replays by implementing `LineBuffer`. `TextBuffer` is the
//! in-memory implementation the CLI uses for file contents.

use std::fmt;

/// Cursor position inside a buffer: 1-based line, byte column within the
/// line's content (terminator excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { line: 1, column: 0 }
    }
}

/// Buffer mutation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BufferError {
    #[error("insert anchor {after} past end of buffer ({len} lines)")]
    InsertOutOfRange { after: usize, len: usize },

    #[error("delete span {start}..{end} past end of buffer ({len} lines)", end = .start + .count)]
    DeleteOutOfRange {
        start: usize,
        count: usize,
        len: usize,
    },
}

/// Mutable, line-addressable text with a cursor.
///
/// Lines are stored and exchanged with their terminators intact; only the
/// final line of a buffer may lack one. Line numbers are 1-based to match
/// the diff formats this crate consumes.
pub trait LineBuffer {
    /// Number of lines currently in the buffer.
    fn line_count(&self) -> usize;

    /// Full content snapshot.
    fn text(&self) -> String;

    /// Insert `lines` after line `after` (0 inserts at the very top).
    fn insert_after(&mut self, after: usize, lines: &[String]) -> Result<(), BufferError>;

    /// Delete `count` whole lines starting at 1-based line `start`. The
    /// removed text is discarded, not retained in any history.
    fn delete_lines(&mut self, start: usize, count: usize) -> Result<(), BufferError>;

    fn cursor(&self) -> Cursor;

    /// Move the cursor, clamping to valid line/column bounds.
    fn set_cursor(&mut self, cursor: Cursor);
}

/// In-memory `LineBuffer` backed by a vector of terminator-inclusive lines.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor: Cursor,
}

impl TextBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(String::from).collect(),
            cursor: Cursor::default(),
        }
    }

    /// Width of a line's content, excluding its terminator.
    fn content_width(&self, line: usize) -> usize {
        self.lines
            .get(line.wrapping_sub(1))
            .map(|l| l.trim_end_matches(['\n', '\r']).len())
            .unwrap_or(0)
    }
}

impl LineBuffer for TextBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn text(&self) -> String {
        self.lines.concat()
    }

    fn insert_after(&mut self, after: usize, lines: &[String]) -> Result<(), BufferError> {
        if after > self.lines.len() {
            return Err(BufferError::InsertOutOfRange {
                after,
                len: self.lines.len(),
            });
        }

        self.lines.splice(after..after, lines.iter().cloned());

        // Text inserted above the cursor pushes it down; the column sticks
        // to the same line of content.
        if self.cursor.line > after {
            self.cursor.line += lines.len();
        }

        Ok(())
    }

    fn delete_lines(&mut self, start: usize, count: usize) -> Result<(), BufferError> {
        if start == 0 || start + count > self.lines.len() + 1 {
            return Err(BufferError::DeleteOutOfRange {
                start,
                count,
                len: self.lines.len(),
            });
        }

        self.lines.drain(start - 1..start - 1 + count);

        if self.cursor.line >= start + count {
            self.cursor.line -= count;
        } else if self.cursor.line >= start {
            // Cursor was inside the deleted span; land on the first
            // surviving line at or below it.
            self.cursor.line = start;
            self.cursor.column = 0;
        }
        self.cursor.line = self.cursor.line.clamp(1, self.lines.len().max(1));

        Ok(())
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        let line = cursor.line.clamp(1, self.lines.len().max(1));
        let column = cursor.column.min(self.content_width(line));
        self.cursor = Cursor { line, column };
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn text_round_trip_preserves_missing_final_newline() {
        for text in ["", "a\n", "a\nb\n", "a\nb", "\n", "\r\n", "a\r\nb"] {
            assert_eq!(TextBuffer::from_text(text).text(), text);
        }
    }

    #[test]
    fn insert_after_top_middle_end() {
        let mut buf = TextBuffer::from_text("a\nc\n");
        buf.insert_after(1, &lines(&["b\n"])).unwrap();
        assert_eq!(buf.text(), "a\nb\nc\n");

        buf.insert_after(0, &lines(&["top\n"])).unwrap();
        assert_eq!(buf.text(), "top\na\nb\nc\n");

        buf.insert_after(4, &lines(&["end\n"])).unwrap();
        assert_eq!(buf.text(), "top\na\nb\nc\nend\n");
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut buf = TextBuffer::from_text("a\n");
        let err = buf.insert_after(2, &lines(&["x\n"])).unwrap_err();
        assert!(matches!(err, BufferError::InsertOutOfRange { after: 2, .. }));
        assert_eq!(buf.text(), "a\n");
    }

    #[test]
    fn delete_whole_lines() {
        let mut buf = TextBuffer::from_text("a\nb\nc\nd\n");
        buf.delete_lines(2, 2).unwrap();
        assert_eq!(buf.text(), "a\nd\n");

        let err = buf.delete_lines(2, 2).unwrap_err();
        assert!(matches!(err, BufferError::DeleteOutOfRange { .. }));
    }

    #[test]
    fn cursor_follows_edits() {
        let mut buf = TextBuffer::from_text("a\nbb\ncc\nd\n");
        buf.set_cursor(Cursor { line: 3, column: 1 });

        // Insert above: cursor drifts down with its line.
        buf.insert_after(0, &lines(&["top\n"])).unwrap();
        assert_eq!(buf.cursor(), Cursor { line: 4, column: 1 });

        // Delete above: cursor drifts back up.
        buf.delete_lines(1, 1).unwrap();
        assert_eq!(buf.cursor(), Cursor { line: 3, column: 1 });

        // Delete the cursor's own line: cursor lands on the successor.
        buf.delete_lines(3, 1).unwrap();
        assert_eq!(buf.cursor(), Cursor { line: 3, column: 0 });
    }

    #[test]
    fn set_cursor_clamps_to_content() {
        let mut buf = TextBuffer::from_text("ab\n");
        buf.set_cursor(Cursor { line: 9, column: 9 });
        assert_eq!(buf.cursor(), Cursor { line: 1, column: 2 });
    }
}
