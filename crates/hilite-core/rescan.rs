//! Incremental rescan engine
//!
//! Given one contiguous edit, recomputes only the affected part of an
//! interval store instead of re-matching the whole buffer: invalidate the
//! run of stored matches around the edit, carry the rest into post-edit
//! coordinates, re-match exactly the (line-aligned, possibly widened)
//! window around the edit, and splice the results back in. The store is
//! consistent on every exit path.

use crate::pattern::CompiledRule;
use crate::span::Span;
use crate::store::IntervalStore;

/// One contiguous replaced span of a buffer, in pre-edit coordinates
///
/// The engine never looks at the replacement text itself; it re-reads the
/// affected region from the post-edit buffer text, so only the replaced
/// length matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSpan {
    /// Replaced span in pre-edit coordinates
    pub old_range: Span,
    /// Byte length of the replacement text
    pub new_len: usize,
}

impl EditSpan {
    /// Create an edit span
    #[must_use]
    pub const fn new(old_range: Span, new_len: usize) -> Self {
        Self {
            old_range,
            new_len,
        }
    }

    /// Signed byte delta the edit applies to trailing offsets
    #[must_use]
    pub const fn delta(&self) -> isize {
        self.new_len as isize - self.old_range.len() as isize
    }
}

/// What one incremental update did to a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Match count after the update
    pub total: usize,
    /// Stored matches removed as invalidated
    pub removed: usize,
    /// Matches found in the rescan window
    pub inserted: usize,
    /// The line-aligned window that was re-matched, post-edit coordinates
    pub window: Span,
    /// The store fell below a previously-reached cap
    ///
    /// Matches past the cap were absent from the store, so the engine
    /// cannot know whether any exist beyond the window; a full rebuild is
    /// the only way to recover them.
    pub left_capped: bool,
    /// Sorted/non-overlap invariant violation detected after the splice
    ///
    /// Reported, not raised: the caller logs a data-integrity fault and
    /// keeps the store, so editing flow is never interrupted.
    pub integrity_fault: Option<String>,
}

/// Apply one edit to a store incrementally
///
/// `text` is the post-edit buffer text; `edit.old_range` is in pre-edit
/// coordinates, matching the store's current contents. Steps:
///
/// 1. Pad `old_range` by one byte per side and remove the run of stored
///    matches overlapping it — matches merely adjacent to the edit may
///    change when text is inserted there, so they are invalidated too.
/// 2. Shift the surviving matches at/after the edit into post-edit
///    coordinates.
/// 3. Form the window from the padded replacement span united with the
///    post-edit image of every removed match, snap it outward to
///    full-line boundaries, and absorb any further stored matches the
///    snapped window overlaps, repeating until stable. Snapping against
///    the post-edit text means a deletion that removes a line break
///    re-matches the merged line whole.
/// 4. Re-match the window, bounded so the global count cannot pass `cap`.
/// 5. Splice, truncate to `cap`, and report.
pub fn update(
    store: &mut IntervalStore,
    edit: &EditSpan,
    text: &str,
    compiled: &CompiledRule,
    cap: usize,
) -> ScanOutcome {
    let pre_len = store.len();
    let old = edit.old_range;
    let delta = edit.delta();
    let old_text_len = (text.len() + old.len()).saturating_sub(edit.new_len);

    // Replacement span in post-edit coordinates
    let replaced = Span::new(
        old.start.min(text.len()),
        old.start.saturating_add(edit.new_len).min(text.len()),
    );

    // Invalidate around the edit while store and edit still share
    // pre-edit coordinates, accumulating the removed matches' post-edit
    // images into the window seed
    let padded_old = old.pad(1, old_text_len);
    let (lo, hi) = store.intersecting_run(padded_old, old_text_len);
    let mut window = replaced.pad(1, text.len());
    for span in &store.as_slice()[lo..hi] {
        window = window.union(&post_edit_image(span, &old, delta, &replaced));
    }
    let mut removed = hi - lo;
    store.splice(lo, hi, Vec::new());
    store.shift_from(old.end, delta);

    // Stabilize: the line snap can widen the window over stored matches
    // the edit never touched (same-line neighbors); those must be removed
    // and re-found or the splice would duplicate them
    let (run_lo, run_hi) = loop {
        window = snap_to_lines(text, window);
        let (l, h) = store.intersecting_run(window, text.len());
        let mut widened = window;
        for span in &store.as_slice()[l..h] {
            widened = widened.union(span);
        }
        if widened == window {
            break (l, h);
        }
        window = widened;
    };
    removed += run_hi - run_lo;

    // Matches before the window keep their place; the window only
    // competes for the budget left after that prefix. The suffix is
    // reconciled by the truncation below, which keeps the leftmost `cap`
    // matches just like a full scan would.
    let budget = cap.saturating_sub(run_lo);
    let mut found = Vec::new();
    compiled.scan_into(
        &text[window.start..window.end],
        window.start,
        budget,
        &mut found,
    );
    // An empty match at the window's trailing line-start belongs to the
    // next line's context and stays owned by the un-rescanned suffix
    if window.end < text.len() {
        if let Some(last) = found.last() {
            if last.is_empty() && last.start == window.end {
                found.pop();
            }
        }
    }

    let inserted = found.len();
    store.splice(run_lo, run_hi, found);
    store.truncate_to(cap);

    let total = store.len();
    let integrity_fault = store.check_invariants().err().map(|e| e.to_string());

    ScanOutcome {
        total,
        removed,
        inserted,
        window,
        left_capped: pre_len == cap && total < cap,
        integrity_fault,
    }
}

/// Map an invalidated pre-edit span to its post-edit image
///
/// Text before the edit keeps its offsets, text after it shifts by the
/// edit delta, and anything inside the replaced region collapses onto the
/// replacement span. Only used to seed the rescan window, so collapsing
/// inward is safe: the window grows, never shrinks.
fn post_edit_image(span: &Span, old: &Span, delta: isize, replaced: &Span) -> Span {
    let start = if span.start < old.start {
        span.start
    } else {
        replaced.start
    };
    let end = if span.end > old.end {
        span.end.saturating_add_signed(delta)
    } else {
        replaced.end
    };
    Span::new(start, end)
}

/// Snap a span outward to full-line boundaries of `text`
///
/// The result runs from the start of the first covered line to the start
/// of the line after the last covered one, so re-matching never cuts a
/// line mid-way. Works byte-wise (`\n` is ASCII), so arbitrary input
/// offsets are fine even when they fall inside a multi-byte character.
fn snap_to_lines(text: &str, span: Span) -> Span {
    let bytes = text.as_bytes();
    let mut start = span.start.min(bytes.len());
    while start > 0 && bytes[start - 1] != b'\n' {
        start -= 1;
    }
    let mut end = span.end.min(bytes.len());
    if end == 0 || bytes[end - 1] != b'\n' {
        while end < bytes.len() && bytes[end] != b'\n' {
            end += 1;
        }
        if end < bytes.len() {
            end += 1;
        }
    }
    Span::new(start, end)
}
