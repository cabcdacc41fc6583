//! Service context - dependency container for the real-time core
//!
//! Holds the store adapter and the shared in-memory registries. One instance
//! lives behind an `Arc` for the lifetime of the process; every connection
//! session borrows it.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use haggle_core::{ConversationStore, Snowflake};

use super::presence::PresenceRegistry;
use super::rooms::RoomBroadcaster;
use super::typing::TypingTracker;

/// Shared dependencies for all services
pub struct ServiceContext {
    store: Arc<dyn ConversationStore>,
    presence: PresenceRegistry,
    rooms: RoomBroadcaster,
    typing: TypingTracker,
    /// Per-conversation sequencing locks held across persist + broadcast,
    /// so socket delivery order always matches persisted order
    order_locks: DashMap<Snowflake, Arc<Mutex<()>>>,
}

impl ServiceContext {
    /// Create a context around a store adapter
    pub fn new(store: Arc<dyn ConversationStore>, typing_ttl: Duration) -> Self {
        Self {
            store,
            presence: PresenceRegistry::new(),
            rooms: RoomBroadcaster::new(),
            typing: TypingTracker::new(typing_ttl),
            order_locks: DashMap::new(),
        }
    }

    /// Create a shared context
    pub fn new_shared(store: Arc<dyn ConversationStore>, typing_ttl: Duration) -> Arc<Self> {
        Arc::new(Self::new(store, typing_ttl))
    }

    /// The conversation store adapter
    pub fn store(&self) -> &dyn ConversationStore {
        self.store.as_ref()
    }

    /// The presence registry
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// The room broadcaster
    pub fn rooms(&self) -> &RoomBroadcaster {
        &self.rooms
    }

    /// The typing tracker
    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// The sequencing lock for one conversation
    pub(crate) fn order_lock(&self, conversation_id: Snowflake) -> Arc<Mutex<()>> {
        self.order_locks
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("presence", &self.presence)
            .field("rooms", &self.rooms)
            .field("typing", &self.typing)
            .finish()
    }
}
