//! Typing tracker
//!
//! Ephemeral per-conversation typing flags with a deadline. The contract is
//! cooperative: the originating client emits `typing.stop` after its
//! inactivity window, and the tracker trusts start/stop signals. The sweep is
//! the server-side hardening layer for clients that vanish mid-keystroke.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use haggle_core::Snowflake;

/// Self-expiring typing-state registry
pub struct TypingTracker {
    ttl: Duration,
    /// (conversation, user) -> deadline
    entries: RwLock<HashMap<(Snowflake, Snowflake), Instant>>,
}

impl TypingTracker {
    /// Create a tracker whose entries expire `ttl` after the last refresh
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or refresh a typing flag
    pub fn start(&self, conversation_id: Snowflake, user_id: Snowflake) {
        self.entries
            .write()
            .insert((conversation_id, user_id), Instant::now() + self.ttl);
    }

    /// Remove a typing flag immediately; returns whether one was present
    pub fn stop(&self, conversation_id: Snowflake, user_id: Snowflake) -> bool {
        self.entries
            .write()
            .remove(&(conversation_id, user_id))
            .is_some()
    }

    /// Users currently typing in a conversation (expired entries excluded)
    pub fn active_typers(&self, conversation_id: Snowflake) -> Vec<Snowflake> {
        let now = Instant::now();
        self.entries
            .read()
            .iter()
            .filter(|((conv, _), deadline)| *conv == conversation_id && **deadline > now)
            .map(|((_, user), _)| *user)
            .collect()
    }

    /// Remove expired entries, returning them so the caller can broadcast
    /// `typing.update(false)` for each
    pub fn sweep(&self) -> Vec<(Snowflake, Snowflake)> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let expired: Vec<(Snowflake, Snowflake)> = entries
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();

        for key in &expired {
            entries.remove(key);
        }

        if !expired.is_empty() {
            tracing::trace!(count = expired.len(), "Swept expired typing entries");
        }
        expired
    }

    /// Total live entries (expired-but-unswept included)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the tracker holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for TypingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingTracker")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.read().len())
            .finish()
    }
}
