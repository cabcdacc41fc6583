//! Presence registry
//!
//! Tracks which user identities currently hold an open connection. A user is
//! online iff their connection count is positive; the count is a set of
//! distinct connection ids, so registering the same connection twice cannot
//! inflate it. Not persisted - state is rebuilt purely from live connections.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use haggle_core::Snowflake;

use super::rooms::SessionId;

/// Reference-counted presence registry
#[derive(Default)]
pub struct PresenceRegistry {
    inner: RwLock<HashMap<Snowflake, HashSet<SessionId>>>,
}

impl PresenceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user
    ///
    /// Returns `true` when this was the user's 0 -> 1 transition, which is
    /// the caller's cue to broadcast a presence delta.
    pub fn mark_online(&self, user_id: Snowflake, session_id: &str) -> bool {
        let mut inner = self.inner.write();
        let sessions = inner.entry(user_id).or_default();
        let was_offline = sessions.is_empty();
        sessions.insert(session_id.to_string());

        if was_offline {
            tracing::debug!(user_id = %user_id, "User came online");
        }
        was_offline
    }

    /// Drop a connection for a user
    ///
    /// Returns `true` when this was the user's 1 -> 0 transition. Removing
    /// an unknown connection is a no-op.
    pub fn mark_offline(&self, user_id: Snowflake, session_id: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(sessions) = inner.get_mut(&user_id) else {
            return false;
        };

        if !sessions.remove(session_id) {
            return false;
        }

        if sessions.is_empty() {
            inner.remove(&user_id);
            tracing::debug!(user_id = %user_id, "User went offline");
            true
        } else {
            false
        }
    }

    /// Check whether a user has at least one open connection
    pub fn is_online(&self, user_id: Snowflake) -> bool {
        self.inner
            .read()
            .get(&user_id)
            .is_some_and(|s| !s.is_empty())
    }

    /// Current connection count for a user
    pub fn connection_count(&self, user_id: Snowflake) -> usize {
        self.inner.read().get(&user_id).map_or(0, HashSet::len)
    }

    /// All currently online user ids
    pub fn snapshot(&self) -> Vec<Snowflake> {
        self.inner.read().keys().copied().collect()
    }
}

impl std::fmt::Debug for PresenceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceRegistry")
            .field("online_users", &self.inner.read().len())
            .finish()
    }
}
