//! Error types for hilite-core operations
//!
//! # Error Philosophy
//!
//! - Use `thiserror` for structured error handling (no `anyhow` bloat)
//! - Provide detailed context for debugging and user feedback
//! - No error in this crate is fatal: a bad pattern or filter degrades a
//!   single rule to zero occurrences, never the whole tracker

use core::fmt;
use thiserror::Error;

/// Main error type for hilite-core operations
///
/// Every variant carries enough context to tell the user which rule input
/// was at fault. Callers recover per rule; see `is_recoverable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Pattern failed to compile or its flag string is malformed
    #[error("Invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    /// Filename filter failed to compile
    #[error("Invalid filename filter `{filter}`: {message}")]
    Filter { filter: String, message: String },

    /// Rule definition rejected before compilation
    #[error("Invalid rule: {0}")]
    Rule(String),

    /// Span does not fit the buffer it was applied to
    #[error("Invalid span: start {start}, end {end} (buffer length: {length})")]
    InvalidSpan {
        start: usize,
        end: usize,
        length: usize,
    },

    /// Interval store invariant violation (sorted order or overlap)
    #[error("Interval store desynchronized: {0}")]
    StoreDesync(String),

    /// Internal consistency error (indicates a bug)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Create a pattern error from the offending pattern and a message
    pub fn pattern<T: fmt::Display>(pattern: &str, message: T) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a filter error from the offending filter and a message
    pub fn filter<T: fmt::Display>(filter: &str, message: T) -> Self {
        Self::Filter {
            filter: filter.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a rule definition error
    pub fn rule<T: fmt::Display>(message: T) -> Self {
        Self::Rule(message.to_string())
    }

    /// Create a store desynchronization error
    pub fn desync<T: fmt::Display>(message: T) -> Self {
        Self::StoreDesync(message.to_string())
    }

    /// Create an internal error (indicates a bug)
    pub fn internal<T: fmt::Display>(message: T) -> Self {
        Self::Internal(message.to_string())
    }

    /// Check if error is recoverable
    ///
    /// Recoverable errors degrade one rule to zero occurrences; the engine
    /// keeps serving other rules. `StoreDesync` is recoverable by design:
    /// the engine continues with the data it has rather than interrupting
    /// the user's editing flow.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Pattern { .. }
            | Self::Filter { .. }
            | Self::Rule(_)
            | Self::InvalidSpan { .. }
            | Self::StoreDesync(_) => true,
            Self::Internal(_) => false,
        }
    }

    /// Check if this error indicates a bug in the library
    #[must_use]
    pub const fn is_internal_bug(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Result type alias for core operations
pub type Result<T> = core::result::Result<T, CoreError>;
