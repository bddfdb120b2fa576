//! Conversation-scoped duplicate suppression.
//!
//! A [`SessionGuard`] remembers the comparison key of every candidate it has
//! forwarded during one conversation. It never forgets a key: a task that was
//! completed and then cleared from the board is still blocked from being
//! re-captured for the rest of the conversation. Start a new conversation by
//! creating a new guard (or calling [`SessionGuard::reset`]).
//!
//! The guard is independent of the board's own duplicate check, which looks
//! at the tasks currently stored.
//!
//! # Example
//!
//! ```
//! use yunie_tasks::session::SessionGuard;
//!
//! let mut guard = SessionGuard::new();
//! assert!(guard.emit_if_new("Buy Milk"));
//! assert!(!guard.emit_if_new("buy milk"));
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::utils::normalize::comparison_key;

/// Set of candidate signatures already emitted in the current conversation.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    seen: HashSet<String>,
}

impl SessionGuard {
    /// Creates a guard for a fresh conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `candidate` and returns `true` if it has not been emitted
    /// before in this conversation; returns `false` otherwise.
    pub fn emit_if_new(&mut self, candidate: &str) -> bool {
        let key = comparison_key(candidate);
        if self.seen.insert(key) {
            true
        } else {
            debug!(candidate = %candidate, "Suppressed candidate already seen this session");
            false
        }
    }

    /// Returns `true` if a candidate with the same signature was emitted.
    #[must_use]
    pub fn has_seen(&self, candidate: &str) -> bool {
        self.seen.contains(&comparison_key(candidate))
    }

    /// Number of distinct signatures recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forgets every signature, starting a new conversation.
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}
