//! Buffer collaborator interface and an in-memory implementation
//!
//! The engine never owns the document it tracks; it reads text through
//! [`TextBuffer`] and is told about changes through [`Edit`]
//! notifications, one per atomic edit. Host adapters implement the trait
//! over their own document type; [`StringBuffer`] is the in-repo
//! implementation used by tests, benches, and hosts without one.

use crate::errors::{EditorError, Result};
use hilite_core::{EditSpan, Span};

/// One contiguous replaced span of a buffer: old range plus new text
///
/// Edits are opaque to the tracking engine — it re-reads affected text
/// from the buffer rather than diffing text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edit {
    /// Replaced span, in pre-edit coordinates
    pub old_range: Span,
    /// Replacement text
    pub new_text: String,
}

impl Edit {
    /// Replace `old_range` with `new_text`
    pub fn replace<S: Into<String>>(old_range: Span, new_text: S) -> Self {
        Self {
            old_range,
            new_text: new_text.into(),
        }
    }

    /// Insert `text` at `offset`
    pub fn insert<S: Into<String>>(offset: usize, text: S) -> Self {
        Self::replace(Span::empty(offset), text)
    }

    /// Delete `old_range`
    pub fn delete(old_range: Span) -> Self {
        Self::replace(old_range, "")
    }

    /// Byte length of the replacement text
    #[must_use]
    pub fn new_len(&self) -> usize {
        self.new_text.len()
    }

    /// The core-level shape of this edit
    #[must_use]
    pub fn to_edit_span(&self) -> EditSpan {
        EditSpan::new(self.old_range, self.new_text.len())
    }
}

/// Read access to one tracked document
///
/// Lines are 0-based; columns are byte offsets within their line. The
/// buffer's `id` doubles as its filesystem path — rule filename filters
/// are evaluated against it.
pub trait TextBuffer {
    /// Buffer identity: its filesystem path
    fn id(&self) -> &str;

    /// Full current text
    fn text(&self) -> &str;

    /// Total length in bytes
    fn len(&self) -> usize {
        self.text().len()
    }

    /// Check if the buffer holds no text
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Substring for a span, clamped to the buffer
    fn text_of(&self, span: Span) -> &str {
        let text = self.text();
        let start = span.start.min(text.len());
        let end = span.end.min(text.len());
        text.get(start..end).unwrap_or("")
    }

    /// Number of lines (at least one, even when empty)
    fn line_count(&self) -> usize;

    /// Line text (without its newline) and the line's start offset
    fn line_at(&self, line: usize) -> Option<(&str, usize)>;

    /// Absolute offset of a (line, column) position
    fn offset_at(&self, line: usize, column: usize) -> Option<usize>;

    /// Inverse of `offset_at`; `offset == len()` is the end position
    fn position_at(&self, offset: usize) -> Option<(usize, usize)>;

    /// Apply an edit notification to the buffer
    ///
    /// Adapters over host-owned documents, where the host has already
    /// applied the change by the time the notification arrives, may
    /// implement this as validation only.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when the edit does not fit
    /// the buffer or cuts a UTF-8 character.
    fn apply_edit(&mut self, edit: &Edit) -> Result<()>;
}

/// In-memory text buffer with a line-start index
///
/// The index is rebuilt on every edit; this buffer exists for tests and
/// small hosts, not for large-document performance.
#[derive(Debug, Clone)]
pub struct StringBuffer {
    id: String,
    text: String,
    line_starts: Vec<usize>,
}

impl StringBuffer {
    /// Create a buffer with the given id (path) and content
    pub fn new<I: Into<String>, T: Into<String>>(id: I, text: T) -> Self {
        let mut buffer = Self {
            id: id.into(),
            text: text.into(),
            line_starts: Vec::new(),
        };
        buffer.rebuild_lines();
        buffer
    }

    fn rebuild_lines(&mut self) {
        self.line_starts.clear();
        self.line_starts.push(0);
        for (i, byte) in self.text.bytes().enumerate() {
            if byte == b'\n' {
                self.line_starts.push(i + 1);
            }
        }
    }

    fn line_end(&self, line: usize) -> usize {
        if line + 1 < self.line_starts.len() {
            self.line_starts[line + 1] - 1
        } else {
            self.text.len()
        }
    }
}

impl TextBuffer for StringBuffer {
    fn id(&self) -> &str {
        &self.id
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_at(&self, line: usize) -> Option<(&str, usize)> {
        let start = *self.line_starts.get(line)?;
        Some((&self.text[start..self.line_end(line)], start))
    }

    fn offset_at(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line)?;
        let offset = start + column;
        (offset <= self.line_end(line)).then_some(offset)
    }

    fn position_at(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.text.len() {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Some((line, offset - self.line_starts[line]))
    }

    fn apply_edit(&mut self, edit: &Edit) -> Result<()> {
        let Span { start, end } = edit.old_range;
        if end > self.text.len()
            || !self.text.is_char_boundary(start)
            || !self.text.is_char_boundary(end)
        {
            return Err(EditorError::InvalidRange {
                start,
                end,
                length: self.text.len(),
            });
        }
        self.text.replace_range(start..end, &edit.new_text);
        self.rebuild_lines();
        Ok(())
    }
}
