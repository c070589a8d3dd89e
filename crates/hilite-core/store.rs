//! Ordered, non-overlapping interval store for one (rule, buffer) pair
//!
//! Invariant: spans are sorted by start offset and pairwise non-overlapping
//! (`spans[i].end <= spans[i + 1].start`; gaps allowed, abutment allowed).
//! The sequence always equals the rule's pattern applied to the buffer's
//! current text left to right, up to the occurrence cap. Only the rescan
//! engine and `rebuild` mutate a store, and both leave it consistent on
//! every exit path.

use crate::errors::{CoreError, Result};
use crate::pattern::CompiledRule;
use crate::span::Span;
use core::cmp::Ordering;

/// Sorted, non-overlapping sequence of match spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalStore {
    spans: Vec<Span>,
}

impl IntervalStore {
    /// Create an empty store
    #[must_use]
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Build a store from spans that are already sorted and non-overlapping
    ///
    /// # Errors
    /// Returns [`CoreError::StoreDesync`] if the input violates the store
    /// invariant.
    pub fn from_sorted(spans: Vec<Span>) -> Result<Self> {
        let store = Self { spans };
        store.check_invariants()?;
        Ok(store)
    }

    /// Number of stored matches
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Check if the store holds no matches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Match span at the given ordinal, if any
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<Span> {
        self.spans.get(ordinal).copied()
    }

    /// View the stored spans in order
    #[must_use]
    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// Iterate over the stored spans in order
    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    /// Drop every stored match
    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Find the maximal contiguous run of stored spans inside `window`
    ///
    /// The caller passes an already-padded (and usually line-snapped)
    /// window; overlap is strict half-open, except that a zero-width span
    /// counts as a point in `[window.start, window.end)` — widened to a
    /// closed end when the window reaches `buffer_len`, since the position
    /// at the very end of the buffer belongs to no later window.
    ///
    /// Two-phase lookup: binary search locates *one* overlapping span
    /// (valid because the store is sorted and non-overlapping, so
    /// entirely-before, overlapping, and entirely-after spans form three
    /// contiguous segments), then a linear walk extends to the maximal
    /// run. Overlapping runs are expected to be short because edits are
    /// local, so the walk stays cheap. Returns `(lo, hi)` with `lo == hi`
    /// as the insertion point when nothing overlaps.
    #[must_use]
    pub fn intersecting_run(&self, window: Span, buffer_len: usize) -> (usize, usize) {
        let probe = self
            .spans
            .binary_search_by(|span| classify(span, &window, buffer_len));

        match probe {
            Err(insert_at) => (insert_at, insert_at),
            Ok(hit) => {
                let mut lo = hit;
                while lo > 0 && classify(&self.spans[lo - 1], &window, buffer_len).is_eq() {
                    lo -= 1;
                }
                let mut hi = hit + 1;
                while hi < self.spans.len()
                    && classify(&self.spans[hi], &window, buffer_len).is_eq()
                {
                    hi += 1;
                }
                (lo, hi)
            }
        }
    }

    /// Remove spans at `[lo, hi)` and insert `new_spans` in their place
    ///
    /// Caller guarantees `new_spans` is sorted and does not overlap its
    /// new neighbors; the rescan engine guarantees this by construction,
    /// because the rescan window fully contains every removed neighbor.
    pub fn splice(&mut self, lo: usize, hi: usize, new_spans: Vec<Span>) {
        debug_assert!(lo <= hi && hi <= self.spans.len());
        self.spans.splice(lo..hi, new_spans);
    }

    /// Shift every span starting at or after `offset` by `delta` bytes
    ///
    /// Used to carry stored matches across an edit into post-edit
    /// coordinates, after the invalidated run around the edit has been
    /// removed.
    pub fn shift_from(&mut self, offset: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        let first = self.spans.partition_point(|span| span.start < offset);
        for span in &mut self.spans[first..] {
            *span = span.shift(delta);
        }
    }

    /// Replace the whole sequence with a fresh left-to-right scan
    ///
    /// Scanning stops once `cap` matches are found; matches past the cap
    /// are simply absent. Returns the new match count.
    pub fn rebuild(&mut self, text: &str, compiled: &CompiledRule, cap: usize) -> usize {
        self.spans.clear();
        compiled.scan_into(text, 0, cap, &mut self.spans)
    }

    /// Drop matches past the occurrence cap
    pub fn truncate_to(&mut self, cap: usize) {
        self.spans.truncate(cap);
    }

    /// Verify the sorted/non-overlap invariant
    ///
    /// # Errors
    /// Returns [`CoreError::StoreDesync`] naming the first offending pair.
    /// Callers report this as a data-integrity fault and keep using the
    /// store; user editing flow is never interrupted over bookkeeping.
    pub fn check_invariants(&self) -> Result<()> {
        for (i, pair) in self.spans.windows(2).enumerate() {
            if pair[0].end > pair[1].start {
                return Err(CoreError::desync(format!(
                    "span {} {} overlaps span {} {}",
                    i,
                    pair[0],
                    i + 1,
                    pair[1],
                )));
            }
        }
        Ok(())
    }
}

/// Three-way partition of a stored span against a lookup window
fn classify(span: &Span, window: &Span, buffer_len: usize) -> Ordering {
    if span.end < window.start || (span.end == window.start && !span.is_empty()) {
        Ordering::Less
    } else if span.start > window.end
        || (span.start == window.end && !(span.is_empty() && window.end == buffer_len))
    {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl<'a> IntoIterator for &'a IntervalStore {
    type Item = &'a Span;
    type IntoIter = core::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn store(spans: &[(usize, usize)]) -> IntervalStore {
        IntervalStore::from_sorted(spans.iter().map(|&s| s.into()).collect()).unwrap()
    }

    #[test]
    fn from_sorted_rejects_overlap() {
        let err = IntervalStore::from_sorted(vec![Span::new(0, 4), Span::new(3, 6)]).unwrap_err();
        assert!(matches!(err, CoreError::StoreDesync(_)));
    }

    #[test]
    fn run_lookup_finds_contiguous_overlaps() {
        let s = store(&[(0, 3), (5, 8), (10, 13), (20, 23)]);
        // Window overlapping the middle two
        assert_eq!(s.intersecting_run(Span::new(7, 11), 30), (1, 3));
        // Abutment is not overlap; the window's own padding handles
        // edit adjacency before the lookup
        assert_eq!(s.intersecting_run(Span::new(3, 5), 30), (1, 1));
        // Gap between stored spans: insertion point, no removals
        assert_eq!(s.intersecting_run(Span::new(15, 18), 30), (3, 3));
        // Past everything
        assert_eq!(s.intersecting_run(Span::new(24, 30), 30), (4, 4));
        // Window swallowed by one span
        assert_eq!(s.intersecting_run(Span::new(6, 7), 30), (1, 2));
    }

    #[test]
    fn run_lookup_sees_zero_width_spans_as_points() {
        let s = store(&[(2, 2), (4, 7)]);
        assert_eq!(s.intersecting_run(Span::new(1, 3), 10), (0, 1));
        assert_eq!(s.intersecting_run(Span::new(2, 5), 10), (0, 2));
        // A point at the window end belongs to the next window...
        let s = store(&[(4, 4)]);
        assert_eq!(s.intersecting_run(Span::new(0, 4), 10), (0, 0));
        // ...unless the window ends the buffer
        assert_eq!(s.intersecting_run(Span::new(0, 4), 4), (0, 1));
    }

    #[test]
    fn splice_replaces_run_in_place() {
        let mut s = store(&[(0, 3), (5, 8), (10, 13)]);
        s.splice(1, 2, vec![Span::new(5, 6), Span::new(7, 9)]);
        assert_eq!(
            s.as_slice(),
            &[
                Span::new(0, 3),
                Span::new(5, 6),
                Span::new(7, 9),
                Span::new(10, 13),
            ]
        );
        s.check_invariants().unwrap();
    }

    #[test]
    fn shift_from_moves_only_trailing_spans() {
        let mut s = store(&[(0, 3), (5, 8), (10, 13)]);
        s.shift_from(5, 4);
        assert_eq!(
            s.as_slice(),
            &[Span::new(0, 3), Span::new(9, 12), Span::new(14, 17)]
        );
        s.shift_from(9, -4);
        assert_eq!(
            s.as_slice(),
            &[Span::new(0, 3), Span::new(5, 8), Span::new(10, 13)]
        );
    }

    #[test]
    fn rebuild_honors_cap() {
        let compiled = CompiledRule::compile(&Rule::new("t", "a")).unwrap();
        let mut s = IntervalStore::new();
        assert_eq!(s.rebuild("aaa", &compiled, 1), 1);
        assert_eq!(s.as_slice(), &[Span::new(0, 1)]);
        assert_eq!(s.rebuild("aaa", &compiled, 10), 3);
    }

    #[test]
    fn ordinal_lookup_is_optional() {
        let s = store(&[(0, 3)]);
        assert_eq!(s.get(0), Some(Span::new(0, 3)));
        assert_eq!(s.get(1), None);
    }
}
