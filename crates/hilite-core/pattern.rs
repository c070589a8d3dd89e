//! Compiled form of a rule's pattern and filename filters
//!
//! Compilation happens once per rule revision; evaluation has no side
//! effects beyond producing matches and may be invoked freely. A compile
//! failure is recoverable per rule: the owning layer treats the rule as
//! currently matching nothing.

use crate::errors::{CoreError, Result};
use crate::rule::Rule;
use crate::span::Span;
use regex::Regex;

/// A rule's pattern and filters, compiled and ready to evaluate
#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl CompiledRule {
    /// Compile a rule's pattern and filename filters
    ///
    /// Match flags are lowered to an inline `(?imsx)` group so the pattern
    /// string itself stays untouched and host flag semantics are preserved.
    ///
    /// # Errors
    /// Returns [`CoreError::Pattern`] when the pattern fails to compile and
    /// [`CoreError::Filter`] when a filename filter does.
    pub fn compile(rule: &Rule) -> Result<Self> {
        let source = format!("{}{}", rule.flags.inline_group(), rule.pattern);
        let regex = Regex::new(&source).map_err(|e| CoreError::pattern(&rule.pattern, e))?;
        let include = compile_filter(rule.filter_include.as_deref())?;
        let exclude = compile_filter(rule.filter_exclude.as_deref())?;
        Ok(Self {
            regex,
            include,
            exclude,
        })
    }

    /// Apply the include/exclude filters to a buffer's filesystem path
    ///
    /// A missing include filter admits every path; a missing exclude
    /// filter rejects none.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        true
    }

    /// Scan `text` left to right, appending up to `budget` match spans
    ///
    /// Local match offsets are translated to buffer-global offsets via
    /// `base`. Zero-width matches are reported like any other; the regex
    /// engine guarantees the produced spans are ordered and
    /// non-overlapping. Returns the number of spans appended.
    pub fn scan_into(&self, text: &str, base: usize, budget: usize, out: &mut Vec<Span>) -> usize {
        let before = out.len();
        for m in self.regex.find_iter(text).take(budget) {
            out.push(Span::new(base + m.start(), base + m.end()));
        }
        out.len() - before
    }

    /// The compiled regex, for callers that need direct access
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

fn compile_filter(filter: Option<&str>) -> Result<Option<Regex>> {
    filter
        .map(|f| Regex::new(f).map_err(|e| CoreError::filter(f, e)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(pattern: &str) -> CompiledRule {
        CompiledRule::compile(&Rule::new("t", pattern)).unwrap()
    }

    #[test]
    fn scan_translates_to_global_offsets() {
        let mut out = Vec::new();
        let found = compiled("foo").scan_into("foo bar foo", 100, usize::MAX, &mut out);
        assert_eq!(found, 2);
        assert_eq!(out, vec![Span::new(100, 103), Span::new(108, 111)]);
    }

    #[test]
    fn scan_respects_budget() {
        let mut out = Vec::new();
        let found = compiled("a").scan_into("aaa", 0, 1, &mut out);
        assert_eq!(found, 1);
        assert_eq!(out, vec![Span::new(0, 1)]);
    }

    #[test]
    fn zero_width_matches_are_counted() {
        let mut out = Vec::new();
        compiled("x*").scan_into("axa", 0, usize::MAX, &mut out);
        assert_eq!(
            out,
            vec![
                Span::empty(0),
                Span::new(1, 2),
                Span::empty(2),
                Span::empty(3),
            ]
        );
    }

    #[test]
    fn flags_are_lowered_inline() {
        let rule = Rule::builder("t")
            .pattern("foo")
            .flags("i")
            .unwrap()
            .build()
            .unwrap();
        let compiled = CompiledRule::compile(&rule).unwrap();
        let mut out = Vec::new();
        compiled.scan_into("FOO foo", 0, usize::MAX, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn bad_pattern_is_a_pattern_error() {
        let err = CompiledRule::compile(&Rule::new("t", "fo(o")).unwrap_err();
        assert!(matches!(err, CoreError::Pattern { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn path_filters_gate_both_ways() {
        let rule = Rule::builder("t")
            .pattern("foo")
            .filter_include(r"\.rs$")
            .filter_exclude(r"tests/")
            .build()
            .unwrap();
        let compiled = CompiledRule::compile(&rule).unwrap();
        assert!(compiled.matches_path("src/lib.rs"));
        assert!(!compiled.matches_path("src/lib.ts"));
        assert!(!compiled.matches_path("tests/lib.rs"));
    }

    #[test]
    fn bad_filter_is_a_filter_error() {
        let rule = Rule::builder("t")
            .pattern("foo")
            .filter_include("[")
            .build()
            .unwrap();
        let err = CompiledRule::compile(&rule).unwrap_err();
        assert!(matches!(err, CoreError::Filter { .. }));
    }
}
