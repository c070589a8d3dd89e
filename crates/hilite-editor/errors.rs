//! Error types for the hilite-editor crate
//!
//! Wraps `CoreError` from hilite-core and adds layer-specific cases for
//! buffer handling, rule lifecycle, and event distribution. Same
//! philosophy as core: thiserror, detailed context, and nothing fatal —
//! the worst outcome of any fault here is stale or empty highlighting for
//! one rule.

use core::fmt;
use hilite_core::CoreError;
use thiserror::Error;

/// Main error type for hilite-editor operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// Errors from hilite-core
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No buffer is active for the coordinator
    #[error("No active buffer (expected `{expected}`)")]
    BufferNotActive { expected: String },

    /// Rule not currently tracked
    #[error("Unknown rule: {id}")]
    UnknownRule { id: String },

    /// Enabled rule count exceeds the coordinator's configured limit
    #[error("Rule limit exceeded: {current}/{limit} rules")]
    RuleLimitExceeded { current: usize, limit: usize },

    /// Invalid text range for the buffer it was applied to
    #[error("Invalid range: start {start}, end {end} (buffer length: {length})")]
    InvalidRange {
        start: usize,
        end: usize,
        length: usize,
    },

    /// Rule store read or write failed
    #[error("Rule store error: {message}")]
    RuleStore { message: String },

    /// Event channel operation failed
    #[error("Event channel error: {message}")]
    EventChannel { message: String },
}

impl EditorError {
    /// Create a rule store error
    pub fn rule_store<T: fmt::Display>(message: T) -> Self {
        Self::RuleStore {
            message: message.to_string(),
        }
    }

    /// Create an event channel error
    pub fn event_channel<T: fmt::Display>(message: T) -> Self {
        Self::EventChannel {
            message: message.to_string(),
        }
    }

    /// Get the underlying core error if this wraps one
    #[must_use]
    pub const fn as_core_error(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core_err) => Some(core_err),
            _ => None,
        }
    }
}

/// Result type alias for editor operations
pub type Result<T> = core::result::Result<T, EditorError>;
