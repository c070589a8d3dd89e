//! # hilite-editor
//!
//! Rule lifecycle coordination and occurrence publishing on top of the
//! `hilite-core` incremental occurrence tracking engine.
//!
//! This crate is the boundary layer: it consumes a buffer collaborator
//! ([`TextBuffer`]) and a rule persistence collaborator ([`RuleStore`]),
//! owns one interval store per enabled rule for the active buffer, routes
//! edit notifications through the incremental rescan engine, and reports
//! occurrence changes outward through an [`EventChannel`].
//!
//! # Example
//!
//! ```
//! use hilite_core::Rule;
//! use hilite_editor::{Edit, RuleSetCoordinator, StringBuffer};
//!
//! let mut coordinator = RuleSetCoordinator::new(Default::default());
//!
//! let todo = Rule::builder("todo").pattern("TODO").build().unwrap();
//! coordinator.notify_rule_set_changed(vec![todo]).unwrap();
//! coordinator.set_active_buffer(StringBuffer::new(
//!     "src/main.rs",
//!     "// TODO: wire up\nfn main() {}\n",
//! ));
//! assert_eq!(coordinator.count(&"todo".into()), 1);
//!
//! // One keystroke-sized edit; only the affected lines are re-matched
//! let edit = Edit::insert(0, "// TODO first\n");
//! coordinator.notify_edit("src/main.rs", &edit).unwrap();
//! assert_eq!(coordinator.count(&"todo".into()), 2);
//! ```

#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod publisher;
pub mod rules;

// Re-export the core engine types as first-class citizens
pub use hilite_core::{
    ChangeKind, CompiledRule, CoreError, EditSpan, IntervalStore, MatchFlags, Rule, RuleBuilder,
    RuleId, ScanOutcome, Span, Style, DEFAULT_MAX_MATCHES,
};

pub use buffer::{Edit, StringBuffer, TextBuffer};
pub use coordinator::{CoordinatorConfig, CoordinatorStats, RuleSetCoordinator};
pub use errors::{EditorError, Result};
pub use events::{
    EventChannel, EventChannelConfig, EventFilter, EventHandler, EventStats, HighlightEvent,
};
pub use publisher::OccurrenceRecord;
pub use rules::{MemoryRuleStore, RuleStore};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
