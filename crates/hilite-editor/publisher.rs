//! Occurrence publishing: serialized match ranges for outward consumers
//!
//! Downstream collaborators (rendering surfaces, side panels, persistence)
//! receive match ranges as [`OccurrenceRecord`] values: line numbers, a
//! snapshot of the first spanned line, and intra-line offsets. The
//! encoding is a value type consumers may persist or transmit; it carries
//! no compatibility contract of its own.

use crate::buffer::TextBuffer;
use hilite_core::{IntervalStore, RuleId, Span};

/// One match range, serialized for outward consumption
///
/// Lines are 0-based. `start_col` and `end_col` are byte offsets relative
/// to the start of the *first* spanned line, so `end_col` can exceed that
/// line's length when the match spans lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccurrenceRecord {
    /// Owning rule
    pub rule_id: RuleId,
    /// Index within the rule's ordered occurrence sequence
    pub ordinal: usize,
    /// First line the match touches
    pub start_line: usize,
    /// Last line the match touches
    pub end_line: usize,
    /// Text snapshot of the first spanned line (without its newline)
    pub line_text: String,
    /// Match start relative to the first spanned line's start
    pub start_col: usize,
    /// Match end (exclusive) relative to the first spanned line's start
    pub end_col: usize,
    /// The match span in absolute buffer offsets
    pub span: Span,
}

/// Serialize a store's matches against the current buffer text
///
/// Ordinals are assigned by position, so a "jump to occurrence N" request
/// resolves against the same numbering consumers see here.
pub fn capture<B: TextBuffer>(
    buffer: &B,
    rule_id: &RuleId,
    store: &IntervalStore,
) -> Vec<OccurrenceRecord> {
    store
        .iter()
        .enumerate()
        .map(|(ordinal, span)| {
            let (start_line, start_col) =
                buffer.position_at(span.start).unwrap_or((0, span.start));
            let last_offset = if span.is_empty() {
                span.start
            } else {
                span.end - 1
            };
            let (end_line, _) = buffer.position_at(last_offset).unwrap_or((start_line, 0));
            let line_text = buffer
                .line_at(start_line)
                .map(|(text, _)| text.to_string())
                .unwrap_or_default();
            OccurrenceRecord {
                rule_id: rule_id.clone(),
                ordinal,
                start_line,
                end_line,
                line_text,
                start_col,
                end_col: start_col + span.len(),
                span: *span,
            }
        })
        .collect()
}
