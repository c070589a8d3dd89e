//! Rule persistence collaborator interface and an in-memory store
//!
//! Rule definitions are owned by an external collaborator; the tracking
//! layer only reads them and writes them back on request. `put_rules` is
//! fire-and-forget: callers never block on durability, and the
//! coordinator's locked flag covers the write window instead.

use crate::errors::Result;
use hilite_core::Rule;

/// Persistence collaborator for rule definitions
pub trait RuleStore {
    /// Read the full ordered rule list
    ///
    /// # Errors
    /// Implementation-defined; a failed read leaves the caller's current
    /// rule set untouched.
    fn get_rules(&self) -> Result<Vec<Rule>>;

    /// Write the full ordered rule list, fire-and-forget
    ///
    /// # Errors
    /// Implementation-defined; the caller reports but does not retry.
    fn put_rules(&mut self, rules: &[Rule]) -> Result<()>;
}

/// In-memory rule store for tests and single-process hosts
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rules: Vec<Rule>,
    writes: usize,
}

impl MemoryRuleStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with rules
    #[must_use]
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules, writes: 0 }
    }

    /// Number of completed writes
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl RuleStore for MemoryRuleStore {
    fn get_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.rules.clone())
    }

    fn put_rules(&mut self, rules: &[Rule]) -> Result<()> {
        self.rules = rules.to_vec();
        self.writes += 1;
        Ok(())
    }
}
