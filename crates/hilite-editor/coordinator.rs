//! Rule set coordination: one interval store per enabled rule per buffer
//!
//! The coordinator owns the active buffer and a tracked entry per enabled
//! rule, routes edit notifications to the incremental rescan engine,
//! classifies rule-set changes (no-op / cosmetic-only / content-affecting),
//! applies filename filters before any pattern work, and publishes
//! occurrence updates through the event channel.
//!
//! Per (rule, buffer) state machine: *Absent* (rule disabled or no active
//! buffer) → *Tracked* (store exists and is current) → on edit →
//! *Tracked* (updated in place) or, on a content-affecting rule change,
//! *Tracked* (rebuilt from scratch) → *Absent* (rule disabled/removed or
//! buffer deactivated; store discarded).
//!
//! Concurrency model: one coordinator is single-threaded; edit
//! notifications for its buffer are serialized by the caller, and
//! distinct coordinators share no mutable state. The `locked` flag is
//! cooperative advisory coordination for in-flight persistence writes,
//! not a mutex: while locked, rescans and rebuilds are silently skipped
//! (coalesced), and the next event after unlock re-requests the work.

use crate::buffer::{Edit, TextBuffer};
use crate::errors::{EditorError, Result};
use crate::events::{EventChannel, HighlightEvent};
use crate::publisher::{self, OccurrenceRecord};
use crate::rules::RuleStore;
use ahash::AHashMap;
use hilite_core::{rescan, ChangeKind, CompiledRule, IntervalStore, Rule, RuleId, Span};

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum number of enabled rules accepted from a rule-set change
    pub max_rules: usize,
    /// Global ceiling clamped onto every rule's occurrence cap
    ///
    /// Bounds worst-case scan cost per rescan even when a rule asks for
    /// an enormous cap of its own.
    pub max_matches_ceiling: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_rules: 128,
            max_matches_ceiling: 10_000,
        }
    }
}

/// Counters describing coordinator activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Edit notifications processed for the active buffer
    pub edits_seen: usize,
    /// Incremental store updates performed
    pub incremental_updates: usize,
    /// Full store rebuilds performed
    pub full_rebuilds: usize,
    /// Events skipped because the coordinator was locked
    pub skipped_while_locked: usize,
    /// Rule/buffer pairs rejected by filename filters
    pub filtered_buffers: usize,
    /// Rules degraded to zero occurrences by compile failures
    pub pattern_errors: usize,
}

#[derive(Debug)]
struct TrackedRule {
    rule: Rule,
    compiled: Option<CompiledRule>,
    store: IntervalStore,
    filtered_out: bool,
    /// Set when a locked coordinator skipped this store's rescan; the
    /// store no longer matches the buffer text, so the next processed
    /// event must rebuild instead of updating incrementally
    stale: bool,
}

/// Owns and coordinates the per-rule interval stores for one buffer
#[derive(Debug)]
pub struct RuleSetCoordinator<B: TextBuffer> {
    config: CoordinatorConfig,
    buffer: Option<B>,
    order: Vec<RuleId>,
    tracked: AHashMap<RuleId, TrackedRule>,
    channel: EventChannel,
    locked: bool,
    stats: CoordinatorStats,
}

impl<B: TextBuffer> RuleSetCoordinator<B> {
    /// Create a coordinator with the given configuration
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            buffer: None,
            order: Vec::new(),
            tracked: AHashMap::new(),
            channel: EventChannel::new(),
            locked: false,
            stats: CoordinatorStats::default(),
        }
    }

    /// Activate a buffer, rebuilding every tracked rule's store against it
    pub fn set_active_buffer(&mut self, buffer: B) {
        self.buffer = Some(buffer);
        for id in self.order.clone() {
            if let Some(entry) = self.tracked.get_mut(&id) {
                refresh(
                    &self.config,
                    &mut self.channel,
                    self.buffer.as_ref(),
                    entry,
                    &mut self.stats,
                );
            }
        }
    }

    /// Deactivate the buffer; every store is discarded and reported empty
    pub fn deactivate(&mut self) {
        self.buffer = None;
        for id in self.order.clone() {
            if let Some(entry) = self.tracked.get_mut(&id) {
                entry.store.clear();
                entry.filtered_out = false;
                publish(&mut self.channel, self.buffer.as_ref(), &id, &entry.store);
            }
        }
    }

    /// Process a new enabled-rule list from the lifecycle collaborator
    ///
    /// Per rule: unchanged rules are left alone, cosmetic-only changes
    /// keep the store and emit [`HighlightEvent::RuleStyleChanged`], and
    /// content-affecting changes (pattern, flags, filters, cap, enabled
    /// membership) trigger a full rebuild. A pure reordering of the same
    /// members is content-affecting too: downstream rendering order
    /// depends on list order, not stored state. Disabled and absent rules
    /// drop to *Absent* with a zero-occurrence report.
    ///
    /// Skipped (coalesced) while the coordinator is locked.
    ///
    /// # Errors
    /// Returns [`EditorError::RuleLimitExceeded`] when the enabled list
    /// is larger than the configured maximum; the previous rule set stays
    /// in effect.
    pub fn notify_rule_set_changed(&mut self, new_rules: Vec<Rule>) -> Result<()> {
        if self.locked {
            self.stats.skipped_while_locked += 1;
            return Ok(());
        }

        let enabled: Vec<Rule> = new_rules.into_iter().filter(|rule| rule.enabled).collect();
        if enabled.len() > self.config.max_rules {
            return Err(EditorError::RuleLimitExceeded {
                current: enabled.len(),
                limit: self.config.max_rules,
            });
        }
        let new_order: Vec<RuleId> = enabled.iter().map(|rule| rule.id.clone()).collect();
        let order_changed = new_order != self.order;

        let removed: Vec<RuleId> = self
            .order
            .iter()
            .filter(|id| !new_order.contains(id))
            .cloned()
            .collect();
        for id in removed {
            if self.tracked.remove(&id).is_some() {
                self.channel.emit(&HighlightEvent::OccurrencesChanged {
                    rule_id: id,
                    occurrences: Vec::new(),
                    count: 0,
                });
            }
        }

        for rule in enabled {
            match self.tracked.get_mut(&rule.id) {
                None => {
                    let compiled = compile_rule(&rule, &mut self.stats);
                    let mut entry = TrackedRule {
                        rule,
                        compiled,
                        store: IntervalStore::new(),
                        filtered_out: false,
                        stale: false,
                    };
                    refresh(
                        &self.config,
                        &mut self.channel,
                        self.buffer.as_ref(),
                        &mut entry,
                        &mut self.stats,
                    );
                    self.tracked.insert(entry.rule.id.clone(), entry);
                }
                Some(entry) => match Rule::classify_change(&entry.rule, &rule) {
                    ChangeKind::Unchanged => {
                        if order_changed {
                            refresh(
                                &self.config,
                                &mut self.channel,
                                self.buffer.as_ref(),
                                entry,
                                &mut self.stats,
                            );
                        }
                    }
                    ChangeKind::CosmeticOnly => {
                        entry.rule = rule;
                        self.channel.emit(&HighlightEvent::RuleStyleChanged {
                            rule_id: entry.rule.id.clone(),
                        });
                        if order_changed {
                            refresh(
                                &self.config,
                                &mut self.channel,
                                self.buffer.as_ref(),
                                entry,
                                &mut self.stats,
                            );
                        }
                    }
                    ChangeKind::ContentAffecting => {
                        entry.rule = rule;
                        entry.compiled = compile_rule(&entry.rule, &mut self.stats);
                        refresh(
                            &self.config,
                            &mut self.channel,
                            self.buffer.as_ref(),
                            entry,
                            &mut self.stats,
                        );
                    }
                },
            }
        }

        self.order = new_order.clone();
        self.channel
            .emit(&HighlightEvent::RuleSetChanged { enabled: new_order });
        Ok(())
    }

    /// Process one edit notification for the named buffer
    ///
    /// Ignored unless `buffer_id` names the active buffer; edits for
    /// other buffers belong to other coordinators. Applies the edit to
    /// the owned buffer, routes it through the incremental rescan engine
    /// for every tracked rule, and publishes updated occurrences. A store
    /// that falls below a previously-reached cap is rebuilt in full to
    /// recover matches the cap had suppressed.
    ///
    /// Skipped (coalesced) while the coordinator is locked.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] when the edit does not fit
    /// the active buffer; stores are untouched in that case.
    pub fn notify_edit(&mut self, buffer_id: &str, edit: &Edit) -> Result<()> {
        if self.buffer.as_ref().map(TextBuffer::id) != Some(buffer_id) {
            return Ok(());
        }
        // The notification describes an edit the host already performed;
        // the owned buffer must track it even when the rescan is skipped
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.apply_edit(edit)?;
        }
        if self.locked {
            self.stats.skipped_while_locked += 1;
            for entry in self.tracked.values_mut() {
                entry.stale = true;
            }
            return Ok(());
        }
        self.stats.edits_seen += 1;

        let edit_span = edit.to_edit_span();
        let Some(buffer) = self.buffer.as_ref() else {
            return Ok(());
        };
        for id in self.order.clone() {
            let Some(entry) = self.tracked.get_mut(&id) else {
                continue;
            };
            if entry.stale {
                refresh(
                    &self.config,
                    &mut self.channel,
                    self.buffer.as_ref(),
                    entry,
                    &mut self.stats,
                );
                continue;
            }
            if entry.filtered_out {
                continue;
            }
            let cap = rule_cap(&self.config, &entry.rule);
            let TrackedRule {
                compiled, store, ..
            } = entry;
            let Some(compiled) = compiled.as_ref() else {
                continue;
            };

            let outcome = rescan::update(store, &edit_span, buffer.text(), compiled, cap);
            if let Some(message) = outcome.integrity_fault {
                self.channel.emit(&HighlightEvent::IntegrityFault {
                    rule_id: id.clone(),
                    message,
                });
            }
            if outcome.left_capped {
                store.rebuild(buffer.text(), compiled, cap);
                self.stats.full_rebuilds += 1;
            } else {
                self.stats.incremental_updates += 1;
            }
            publish(&mut self.channel, Some(buffer), &id, store);
        }
        Ok(())
    }

    /// Resolve a "jump to occurrence N" request
    ///
    /// Out-of-bounds ordinals (the rule may have been rescanned and
    /// shrunk) and unknown rules return `None`, never an error.
    #[must_use]
    pub fn jump(&self, rule_id: &RuleId, ordinal: usize) -> Option<Span> {
        self.tracked.get(rule_id)?.store.get(ordinal)
    }

    /// Current match spans for a rule, if tracked
    #[must_use]
    pub fn occurrences(&self, rule_id: &RuleId) -> Option<&[Span]> {
        self.tracked.get(rule_id).map(|entry| entry.store.as_slice())
    }

    /// Serialized occurrence records for a rule against the active buffer
    #[must_use]
    pub fn occurrence_records(&self, rule_id: &RuleId) -> Vec<OccurrenceRecord> {
        match (self.buffer.as_ref(), self.tracked.get(rule_id)) {
            (Some(buffer), Some(entry)) => publisher::capture(buffer, rule_id, &entry.store),
            _ => Vec::new(),
        }
    }

    /// Current match count for a rule; untracked rules count zero
    #[must_use]
    pub fn count(&self, rule_id: &RuleId) -> usize {
        self.tracked
            .get(rule_id)
            .map_or(0, |entry| entry.store.len())
    }

    /// Current definition of a tracked rule
    #[must_use]
    pub fn rule(&self, rule_id: &RuleId) -> Option<&Rule> {
        self.tracked.get(rule_id).map(|entry| &entry.rule)
    }

    /// Enabled rule ids in rendering order
    #[must_use]
    pub fn enabled_rules(&self) -> &[RuleId] {
        &self.order
    }

    /// Number of tracked rules
    #[must_use]
    pub fn tracked_rules(&self) -> usize {
        self.tracked.len()
    }

    /// The active buffer, if any
    #[must_use]
    pub fn buffer(&self) -> Option<&B> {
        self.buffer.as_ref()
    }

    /// Set the advisory locked flag
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Clear the advisory locked flag
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Check the advisory locked flag
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Write the tracked rules to a persistence collaborator
    ///
    /// The coordinator is locked for the duration of the write, so a
    /// rescan cannot race the in-flight persistence; events arriving
    /// meanwhile are coalesced into whatever triggers next.
    ///
    /// # Errors
    /// Propagates the store's write error; the coordinator is unlocked
    /// either way.
    pub fn persist_rules(&mut self, store: &mut dyn RuleStore) -> Result<()> {
        self.locked = true;
        let rules: Vec<Rule> = self
            .order
            .iter()
            .filter_map(|id| self.tracked.get(id).map(|entry| entry.rule.clone()))
            .collect();
        let result = store.put_rules(&rules);
        self.locked = false;
        result
    }

    /// The event channel, for registering handlers
    pub fn channel_mut(&mut self) -> &mut EventChannel {
        &mut self.channel
    }

    /// Read access to the event channel and its last-known state
    #[must_use]
    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    /// Coordinator activity counters
    #[must_use]
    pub fn stats(&self) -> &CoordinatorStats {
        &self.stats
    }
}

impl<B: TextBuffer> Default for RuleSetCoordinator<B> {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

fn rule_cap(config: &CoordinatorConfig, rule: &Rule) -> usize {
    rule.max_matches.min(config.max_matches_ceiling)
}

fn compile_rule(rule: &Rule, stats: &mut CoordinatorStats) -> Option<CompiledRule> {
    match CompiledRule::compile(rule) {
        Ok(compiled) => Some(compiled),
        Err(_) => {
            stats.pattern_errors += 1;
            None
        }
    }
}

/// Emit an occurrence update for one rule's current store
fn publish<B: TextBuffer>(
    channel: &mut EventChannel,
    buffer: Option<&B>,
    rule_id: &RuleId,
    store: &IntervalStore,
) {
    let occurrences = match buffer {
        Some(buffer) => publisher::capture(buffer, rule_id, store),
        None => Vec::new(),
    };
    let count = occurrences.len();
    channel.emit(&HighlightEvent::OccurrencesChanged {
        rule_id: rule_id.clone(),
        occurrences,
        count,
    });
}

/// Bring one tracked rule to a freshly-built state against the buffer
///
/// Filename filters run before any pattern evaluation: a filtered-out
/// buffer clears the store and reports zero occurrences without the
/// pattern ever executing. An uncompilable rule reports zero occurrences
/// the same way.
fn refresh<B: TextBuffer>(
    config: &CoordinatorConfig,
    channel: &mut EventChannel,
    buffer: Option<&B>,
    entry: &mut TrackedRule,
    stats: &mut CoordinatorStats,
) {
    entry.filtered_out = false;
    entry.stale = false;
    match (buffer, entry.compiled.as_ref()) {
        (Some(buffer), Some(compiled)) => {
            if compiled.matches_path(buffer.id()) {
                entry
                    .store
                    .rebuild(buffer.text(), compiled, rule_cap(config, &entry.rule));
                stats.full_rebuilds += 1;
            } else {
                entry.store.clear();
                entry.filtered_out = true;
                stats.filtered_buffers += 1;
            }
        }
        _ => entry.store.clear(),
    }
    publish(channel, buffer, &entry.rule.id, &entry.store);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::StringBuffer;

    fn coordinator_with(
        rules: Vec<Rule>,
        path: &str,
        text: &str,
    ) -> RuleSetCoordinator<StringBuffer> {
        let mut coordinator = RuleSetCoordinator::new(CoordinatorConfig::default());
        coordinator.notify_rule_set_changed(rules).unwrap();
        coordinator.set_active_buffer(StringBuffer::new(path, text));
        coordinator
    }

    #[test]
    fn tracks_and_counts_matches() {
        let coordinator = coordinator_with(
            vec![Rule::new("word", "foo")],
            "src/main.rs",
            "foo bar foo",
        );
        let id = RuleId::new("word");
        assert_eq!(coordinator.count(&id), 2);
        assert_eq!(
            coordinator.occurrences(&id).unwrap(),
            &[Span::new(0, 3), Span::new(8, 11)]
        );
    }

    #[test]
    fn edit_updates_store_incrementally() {
        let mut coordinator = coordinator_with(
            vec![Rule::new("word", "foo")],
            "src/main.rs",
            "foo bar foo",
        );
        coordinator
            .notify_edit("src/main.rs", &Edit::replace(Span::new(4, 7), "barbaz"))
            .unwrap();
        let id = RuleId::new("word");
        assert_eq!(
            coordinator.occurrences(&id).unwrap(),
            &[Span::new(0, 3), Span::new(11, 14)]
        );
        assert_eq!(coordinator.stats().incremental_updates, 1);
    }

    #[test]
    fn edits_for_other_buffers_are_ignored() {
        let mut coordinator =
            coordinator_with(vec![Rule::new("word", "foo")], "src/main.rs", "foo");
        coordinator
            .notify_edit("other.rs", &Edit::insert(0, "foo "))
            .unwrap();
        assert_eq!(coordinator.count(&RuleId::new("word")), 1);
        assert_eq!(coordinator.stats().edits_seen, 0);
    }

    #[test]
    fn bad_pattern_degrades_to_zero_occurrences() {
        let coordinator = coordinator_with(
            vec![Rule::new("bad", "fo(o"), Rule::new("good", "bar")],
            "src/main.rs",
            "foo bar",
        );
        assert_eq!(coordinator.count(&RuleId::new("bad")), 0);
        assert_eq!(coordinator.count(&RuleId::new("good")), 1);
        assert_eq!(coordinator.stats().pattern_errors, 1);
    }

    #[test]
    fn filename_filter_blocks_without_evaluation() {
        let rule = Rule::builder("rusty")
            .pattern("foo")
            .filter_include(r"\.rs$")
            .build()
            .unwrap();
        let coordinator = coordinator_with(vec![rule], "notes.txt", "foo foo");
        assert_eq!(coordinator.count(&RuleId::new("rusty")), 0);
        assert_eq!(coordinator.stats().filtered_buffers, 1);
        // The rebuild counter proves the pattern never ran
        assert_eq!(coordinator.stats().full_rebuilds, 0);
    }

    #[test]
    fn locked_coordinator_coalesces_events() {
        let mut coordinator =
            coordinator_with(vec![Rule::new("word", "foo")], "src/main.rs", "foo");
        coordinator.lock();
        coordinator
            .notify_edit("src/main.rs", &Edit::insert(0, "foo "))
            .unwrap();
        // The buffer tracks reality, but the rescan was coalesced away
        assert_eq!(coordinator.buffer().unwrap().text(), "foo foo");
        assert_eq!(coordinator.count(&RuleId::new("word")), 1);
        assert_eq!(coordinator.stats().skipped_while_locked, 1);
        coordinator.unlock();
        // The next event re-requests the work and sees current text
        coordinator
            .notify_edit("src/main.rs", &Edit::insert(0, "foo "))
            .unwrap();
        assert_eq!(coordinator.count(&RuleId::new("word")), 3);
    }

    #[test]
    fn locked_rule_set_change_is_skipped_entirely() {
        let mut coordinator =
            coordinator_with(vec![Rule::new("word", "foo")], "src/main.rs", "foo");
        coordinator.lock();
        coordinator
            .notify_rule_set_changed(vec![Rule::new("other", "bar")])
            .unwrap();
        assert_eq!(coordinator.enabled_rules(), &[RuleId::new("word")]);
        coordinator.unlock();
        coordinator
            .notify_rule_set_changed(vec![Rule::new("other", "bar")])
            .unwrap();
        assert_eq!(coordinator.enabled_rules(), &[RuleId::new("other")]);
    }

    #[test]
    fn jump_returns_none_out_of_bounds() {
        let coordinator =
            coordinator_with(vec![Rule::new("word", "foo")], "src/main.rs", "foo bar");
        let id = RuleId::new("word");
        assert_eq!(coordinator.jump(&id, 0), Some(Span::new(0, 3)));
        assert_eq!(coordinator.jump(&id, 1), None);
        assert_eq!(coordinator.jump(&RuleId::new("ghost"), 0), None);
    }

    #[test]
    fn rule_limit_is_enforced() {
        let mut coordinator: RuleSetCoordinator<StringBuffer> =
            RuleSetCoordinator::new(CoordinatorConfig {
                max_rules: 1,
                ..CoordinatorConfig::default()
            });
        let err = coordinator
            .notify_rule_set_changed(vec![Rule::new("a", "x"), Rule::new("b", "y")])
            .unwrap_err();
        assert!(matches!(err, EditorError::RuleLimitExceeded { .. }));
        assert_eq!(coordinator.tracked_rules(), 0);
    }

    #[test]
    fn persist_rules_locks_for_the_write() {
        use crate::rules::MemoryRuleStore;

        let mut coordinator =
            coordinator_with(vec![Rule::new("word", "foo")], "src/main.rs", "foo");
        let mut store = MemoryRuleStore::new();
        coordinator.persist_rules(&mut store).unwrap();
        assert!(!coordinator.is_locked());
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get_rules().unwrap().len(), 1);
    }

    #[test]
    fn deactivation_discards_stores() {
        let mut coordinator =
            coordinator_with(vec![Rule::new("word", "foo")], "src/main.rs", "foo foo");
        assert_eq!(coordinator.count(&RuleId::new("word")), 2);
        coordinator.deactivate();
        assert_eq!(coordinator.count(&RuleId::new("word")), 0);
        assert!(coordinator.buffer().is_none());
    }
}
