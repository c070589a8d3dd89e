//! Exhaustive convergence tests for the incremental rescan engine
//!
//! Sweeps every edit position over a matrix of texts, patterns, and edit
//! payloads, checking that the incrementally-updated store always equals a
//! full rescan of the resulting text. Patterns are single-line (plus
//! zero-width and multi-line-anchored ones); matches that would span
//! beyond the rescan window's lines are outside the engine's line-aligned
//! contract.

use hilite_core::{rescan, CompiledRule, EditSpan, IntervalStore, Rule, Span};

const PATTERNS: &[&str] = &["foo", "a+", "[0-9]+", "(?m)^ba", "x*", "o b"];

const TEXTS: &[&str] = &[
    "",
    "foo",
    "foo bar foo",
    "foo\nbar\nbaz foo\nfoo1 23",
    "aa a\naaa\n",
    "ba\nba\nba",
    "\n\nfoo\n\n",
];

const INSERTIONS: &[&str] = &["x", "foo", "\n", "o\nf", "ba"];

fn full_rescan(text: &str, compiled: &CompiledRule, cap: usize) -> IntervalStore {
    let mut store = IntervalStore::new();
    store.rebuild(text, compiled, cap);
    store
}

fn assert_converges(before: &str, after: &str, edit: EditSpan, pattern: &str, cap: usize) {
    let compiled = CompiledRule::compile(&Rule::new("sweep", pattern)).unwrap();
    let mut store = full_rescan(before, &compiled, cap);
    let outcome = rescan::update(&mut store, &edit, after, &compiled, cap);
    assert!(
        outcome.integrity_fault.is_none(),
        "integrity fault for pattern {pattern:?}: {before:?} -> {after:?}"
    );
    if outcome.left_capped {
        store.rebuild(after, &compiled, cap);
    }
    assert_eq!(
        store,
        full_rescan(after, &compiled, cap),
        "diverged for pattern {pattern:?}, cap {cap}: {before:?} -> {after:?} via {edit:?}"
    );
    store.check_invariants().unwrap();
}

#[test]
fn every_insertion_converges() {
    for pattern in PATTERNS {
        for text in TEXTS {
            for insertion in INSERTIONS {
                for pos in 0..=text.len() {
                    let after = format!("{}{}{}", &text[..pos], insertion, &text[pos..]);
                    let edit = EditSpan::new(Span::empty(pos), insertion.len());
                    assert_converges(text, &after, edit, pattern, 1000);
                }
            }
        }
    }
}

#[test]
fn every_deletion_converges() {
    for pattern in PATTERNS {
        for text in TEXTS {
            for start in 0..text.len() {
                let longest = (text.len() - start).min(4);
                for len in 1..=longest {
                    let after = format!("{}{}", &text[..start], &text[start + len..]);
                    let edit = EditSpan::new(Span::new(start, start + len), 0);
                    assert_converges(text, &after, edit, pattern, 1000);
                }
            }
        }
    }
}

#[test]
fn every_replacement_converges() {
    for pattern in PATTERNS {
        for text in TEXTS {
            for start in 0..text.len() {
                let longest = (text.len() - start).min(3);
                for len in 1..=longest {
                    for replacement in INSERTIONS {
                        let after = format!(
                            "{}{}{}",
                            &text[..start],
                            replacement,
                            &text[start + len..]
                        );
                        let edit = EditSpan::new(Span::new(start, start + len), replacement.len());
                        assert_converges(text, &after, edit, pattern, 1000);
                    }
                }
            }
        }
    }
}

#[test]
fn small_caps_converge_with_rebuild_fallback() {
    for pattern in PATTERNS {
        for text in TEXTS {
            for cap in 1..=3 {
                for pos in 0..=text.len() {
                    let after = format!("{}a{}", &text[..pos], &text[pos..]);
                    let edit = EditSpan::new(Span::empty(pos), 1);
                    assert_converges(text, &after, edit, pattern, cap);
                }
                for start in 0..text.len() {
                    let after = format!("{}{}", &text[..start], &text[start + 1..]);
                    let edit = EditSpan::new(Span::new(start, start + 1), 0);
                    assert_converges(text, &after, edit, pattern, cap);
                }
            }
        }
    }
}
