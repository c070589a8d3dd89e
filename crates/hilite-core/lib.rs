//! # hilite-core
//!
//! Incremental occurrence tracking engine for pattern highlight rules.
//! Given a named rule (regex pattern, flags, filename filters, occurrence
//! cap) and a text buffer, it maintains an ordered, non-overlapping
//! sequence of match spans and keeps that sequence correct across edits
//! without re-matching the whole buffer: a localized edit invalidates only
//! the run of matches around it, and exactly that (line-aligned, possibly
//! widened) window is re-matched and spliced back in.
//!
//! ## Quick Start
//!
//! ```rust
//! use hilite_core::{rescan, CompiledRule, EditSpan, IntervalStore, Rule, Span};
//!
//! let rule = Rule::builder("word").pattern("foo").build()?;
//! let compiled = CompiledRule::compile(&rule)?;
//!
//! let mut store = IntervalStore::new();
//! store.rebuild("foo bar foo", &compiled, rule.max_matches);
//! assert_eq!(store.as_slice(), &[Span::new(0, 3), Span::new(8, 11)]);
//!
//! // Replace "bar" with "barbaz"; only the affected line is re-matched
//! let edit = EditSpan::new(Span::new(4, 7), 6);
//! let outcome = rescan::update(
//!     &mut store,
//!     &edit,
//!     "foo barbaz foo",
//!     &compiled,
//!     rule.max_matches,
//! );
//! assert_eq!(outcome.total, 2);
//! assert_eq!(store.as_slice(), &[Span::new(0, 3), Span::new(11, 14)]);
//! # Ok::<(), hilite_core::CoreError>(())
//! ```
//!
//! The higher-level `hilite-editor` crate layers rule lifecycle
//! coordination, filename filtering, and occurrence publishing on top of
//! this engine.

#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod errors;
pub mod pattern;
pub mod rescan;
pub mod rule;
pub mod span;
pub mod store;

pub use errors::{CoreError, Result};
pub use pattern::CompiledRule;
pub use rescan::{EditSpan, ScanOutcome};
pub use rule::{ChangeKind, MatchFlags, Rule, RuleBuilder, RuleId, Style, DEFAULT_MAX_MATCHES};
pub use span::Span;
pub use store::IntervalStore;

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
