//! Event channel for occurrence and rule lifecycle notifications
//!
//! Distributes [`HighlightEvent`]s to registered handlers through an
//! explicit observer list, and keeps a last-known-value cell for the
//! enabled-rule set so late subscribers can synchronously read current
//! state instead of relying on replay semantics.
//!
//! Visual style handles live on the consumer side of this channel: a
//! rendering collaborator creates one handle per rule, recreates it on
//! `RuleStyleChanged`, and disposes it when the rule leaves
//! `RuleSetChanged` or its buffer deactivates. The core never owns them.

use crate::errors::{EditorError, Result};
use crate::publisher::OccurrenceRecord;
use hilite_core::RuleId;

/// Notifications emitted by the rule set coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightEvent {
    /// A rule's occurrence set changed
    ///
    /// Emitted after every rescan, rebuild, and clear — including the
    /// zero-occurrence case, which consumers need to drop stale
    /// decorations.
    OccurrencesChanged {
        /// Owning rule
        rule_id: RuleId,
        /// Serialized occurrence list, in ordinal order
        occurrences: Vec<OccurrenceRecord>,
        /// Occurrence count (`occurrences.len()`, precomputed for
        /// consumers that ignore the list)
        count: usize,
    },

    /// Only a rule's display attributes changed
    ///
    /// Stores are untouched; rendering must recreate the rule's visual
    /// style handle and repaint existing ranges.
    RuleStyleChanged {
        /// The rule whose style changed
        rule_id: RuleId,
    },

    /// The enabled-rule set changed (members or order)
    RuleSetChanged {
        /// Enabled rule ids in rendering order
        enabled: Vec<RuleId>,
    },

    /// Internal bookkeeping fault detected and survived
    ///
    /// The engine keeps serving the data it has; this event is the log
    /// channel for desynchronization faults.
    IntegrityFault {
        /// The rule whose store misbehaved
        rule_id: RuleId,
        /// Fault description
        message: String,
    },
}

impl HighlightEvent {
    /// Event kind name, used by filters
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OccurrencesChanged { .. } => "OccurrencesChanged",
            Self::RuleStyleChanged { .. } => "RuleStyleChanged",
            Self::RuleSetChanged { .. } => "RuleSetChanged",
            Self::IntegrityFault { .. } => "IntegrityFault",
        }
    }

    /// The rule this event concerns, if it concerns exactly one
    #[must_use]
    pub const fn rule_id(&self) -> Option<&RuleId> {
        match self {
            Self::OccurrencesChanged { rule_id, .. }
            | Self::RuleStyleChanged { rule_id }
            | Self::IntegrityFault { rule_id, .. } => Some(rule_id),
            Self::RuleSetChanged { .. } => None,
        }
    }
}

/// Event filter for selective handling
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Event kinds to include (empty means all kinds)
    include_kinds: Vec<&'static str>,
    /// Only events for this rule (plus rule-set-wide events)
    rule: Option<RuleId>,
}

impl EventFilter {
    /// Create a filter that accepts every event
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include the given event kinds
    #[must_use]
    pub fn include_kinds(mut self, kinds: Vec<&'static str>) -> Self {
        self.include_kinds = kinds;
        self
    }

    /// Only include events for one rule (rule-set-wide events still pass)
    #[must_use]
    pub fn for_rule(mut self, rule_id: RuleId) -> Self {
        self.rule = Some(rule_id);
        self
    }

    /// Check if an event passes this filter
    #[must_use]
    pub fn matches(&self, event: &HighlightEvent) -> bool {
        if !self.include_kinds.is_empty() && !self.include_kinds.contains(&event.kind()) {
            return false;
        }
        if let (Some(wanted), Some(actual)) = (&self.rule, event.rule_id()) {
            if wanted != actual {
                return false;
            }
        }
        true
    }
}

/// Handler trait for responding to highlight events
pub trait EventHandler {
    /// Handle one event
    ///
    /// # Errors
    /// A handler error is counted in the channel stats and never
    /// propagated: one consumer's failure must not block the others.
    fn handle_event(&mut self, event: &HighlightEvent) -> Result<()>;

    /// Filter applied before this handler sees events
    fn filter(&self) -> EventFilter {
        EventFilter::new()
    }

    /// Handler priority (higher runs earlier)
    fn priority(&self) -> i32 {
        0
    }
}

/// Statistics about event distribution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStats {
    /// Events emitted through the channel
    pub events_emitted: usize,
    /// Handler invocations suppressed by filters
    pub events_filtered: usize,
    /// Handler invocations that returned an error
    pub handler_errors: usize,
}

/// Event channel configuration
#[derive(Debug, Clone)]
pub struct EventChannelConfig {
    /// Maximum number of registered handlers
    pub max_handlers: usize,
}

impl Default for EventChannelConfig {
    fn default() -> Self {
        Self { max_handlers: 64 }
    }
}

struct HandlerEntry {
    id: usize,
    handler: Box<dyn EventHandler>,
    filter: EventFilter,
    priority: i32,
}

impl core::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("priority", &self.priority)
            .field("handler", &"<EventHandler>")
            .finish()
    }
}

/// Distributes highlight events to registered handlers
#[derive(Debug, Default)]
pub struct EventChannel {
    config: EventChannelConfig,
    handlers: Vec<HandlerEntry>,
    last_enabled: Vec<RuleId>,
    stats: EventStats,
    next_handler_id: usize,
}

impl EventChannel {
    /// Create a channel with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EventChannelConfig::default())
    }

    /// Create a channel with custom configuration
    #[must_use]
    pub fn with_config(config: EventChannelConfig) -> Self {
        Self {
            config,
            handlers: Vec::new(),
            last_enabled: Vec::new(),
            stats: EventStats::default(),
            next_handler_id: 0,
        }
    }

    /// Register a handler, returning its id for later removal
    ///
    /// # Errors
    /// Returns [`EditorError::EventChannel`] when the handler limit is
    /// reached.
    pub fn register_handler(&mut self, handler: Box<dyn EventHandler>) -> Result<usize> {
        if self.handlers.len() >= self.config.max_handlers {
            return Err(EditorError::event_channel(format!(
                "handler limit reached: {}",
                self.config.max_handlers
            )));
        }
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        let filter = handler.filter();
        let priority = handler.priority();
        self.handlers.push(HandlerEntry {
            id,
            handler,
            filter,
            priority,
        });
        self.handlers
            .sort_by_key(|entry| core::cmp::Reverse(entry.priority));
        Ok(id)
    }

    /// Remove a handler by id; returns whether it was present
    pub fn unregister_handler(&mut self, id: usize) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|entry| entry.id != id);
        self.handlers.len() != before
    }

    /// Emit an event to every handler whose filter accepts it
    ///
    /// `RuleSetChanged` also refreshes the last-known enabled-rule cell.
    pub fn emit(&mut self, event: &HighlightEvent) {
        if let HighlightEvent::RuleSetChanged { enabled } = event {
            self.last_enabled = enabled.clone();
        }
        self.stats.events_emitted += 1;
        for entry in &mut self.handlers {
            if !entry.filter.matches(event) {
                self.stats.events_filtered += 1;
                continue;
            }
            if entry.handler.handle_event(event).is_err() {
                self.stats.handler_errors += 1;
            }
        }
    }

    /// Last known enabled-rule set, readable by late subscribers
    #[must_use]
    pub fn last_enabled(&self) -> &[RuleId] {
        &self.last_enabled
    }

    /// Number of registered handlers
    #[must_use]
    pub fn handlers_count(&self) -> usize {
        self.handlers.len()
    }

    /// Distribution statistics
    #[must_use]
    pub fn stats(&self) -> &EventStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Collector {
        seen: Rc<RefCell<Vec<String>>>,
        filter: EventFilter,
        priority: i32,
    }

    impl EventHandler for Collector {
        fn handle_event(&mut self, event: &HighlightEvent) -> Result<()> {
            self.seen.borrow_mut().push(event.kind().to_string());
            Ok(())
        }

        fn filter(&self) -> EventFilter {
            self.filter.clone()
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    fn style_event(id: &str) -> HighlightEvent {
        HighlightEvent::RuleStyleChanged {
            rule_id: RuleId::new(id),
        }
    }

    #[test]
    fn emit_reaches_registered_handlers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::new();
        channel
            .register_handler(Box::new(Collector {
                seen: Rc::clone(&seen),
                filter: EventFilter::new(),
                priority: 0,
            }))
            .unwrap();

        channel.emit(&style_event("a"));
        assert_eq!(seen.borrow().as_slice(), ["RuleStyleChanged"]);
        assert_eq!(channel.stats().events_emitted, 1);
    }

    #[test]
    fn filters_suppress_unwanted_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::new();
        channel
            .register_handler(Box::new(Collector {
                seen: Rc::clone(&seen),
                filter: EventFilter::new().include_kinds(vec!["RuleSetChanged"]),
                priority: 0,
            }))
            .unwrap();

        channel.emit(&style_event("a"));
        channel.emit(&HighlightEvent::RuleSetChanged {
            enabled: vec![RuleId::new("a")],
        });
        assert_eq!(seen.borrow().as_slice(), ["RuleSetChanged"]);
        assert_eq!(channel.stats().events_filtered, 1);
    }

    #[test]
    fn per_rule_filter_passes_rule_set_events() {
        let filter = EventFilter::new().for_rule(RuleId::new("a"));
        assert!(filter.matches(&style_event("a")));
        assert!(!filter.matches(&style_event("b")));
        assert!(filter.matches(&HighlightEvent::RuleSetChanged {
            enabled: vec![],
        }));
    }

    #[test]
    fn last_enabled_cell_tracks_rule_set() {
        let mut channel = EventChannel::new();
        assert!(channel.last_enabled().is_empty());
        channel.emit(&HighlightEvent::RuleSetChanged {
            enabled: vec![RuleId::new("a"), RuleId::new("b")],
        });
        // A late subscriber reads current state synchronously
        assert_eq!(
            channel.last_enabled(),
            &[RuleId::new("a"), RuleId::new("b")]
        );
    }

    #[test]
    fn unregister_stops_delivery() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::new();
        let id = channel
            .register_handler(Box::new(Collector {
                seen: Rc::clone(&seen),
                filter: EventFilter::new(),
                priority: 0,
            }))
            .unwrap();
        assert!(channel.unregister_handler(id));
        assert!(!channel.unregister_handler(id));
        channel.emit(&style_event("a"));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn handler_limit_is_enforced() {
        let mut channel = EventChannel::with_config(EventChannelConfig { max_handlers: 1 });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let make = || {
            Box::new(Collector {
                seen: Rc::clone(&seen),
                filter: EventFilter::new(),
                priority: 0,
            })
        };
        channel.register_handler(make()).unwrap();
        assert!(channel.register_handler(make()).is_err());
    }
}
