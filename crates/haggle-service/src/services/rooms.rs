//! Room broadcaster
//!
//! Maps conversation id -> set of subscribed sessions and fans events out to
//! exactly those sessions. Uses `DashMap` so two rooms never contend on one
//! lock. Delivery into a connection's outbound channel is non-blocking; a
//! slow or closed receiver never stalls the room.

use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc;

use haggle_core::{DomainError, ServerEvent, Snowflake};

/// Opaque per-connection session identifier
pub type SessionId = String;

/// Room membership registry and event fan-out
pub struct RoomBroadcaster {
    /// Outbound channel per registered session
    peers: DashMap<SessionId, mpsc::Sender<ServerEvent>>,
    /// Conversation id -> subscribed sessions
    rooms: DashMap<Snowflake, HashSet<SessionId>>,
}

impl RoomBroadcaster {
    /// Create an empty broadcaster
    #[must_use]
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register a session's outbound channel
    pub fn register(&self, session_id: &str, sender: mpsc::Sender<ServerEvent>) {
        self.peers.insert(session_id.to_string(), sender);
        tracing::debug!(session_id = %session_id, "Session registered");
    }

    /// Remove a session entirely: its channel and all room memberships
    pub fn unregister(&self, session_id: &str) {
        self.peers.remove(session_id);
        self.rooms.alter_all(|_, mut sessions| {
            sessions.remove(session_id);
            sessions
        });
        self.rooms.retain(|_, sessions| !sessions.is_empty());
        tracing::debug!(session_id = %session_id, "Session unregistered");
    }

    /// Subscribe a session to a conversation room
    ///
    /// Re-joining an already-joined room is a no-op; returns `false` in that
    /// case. Unregistered sessions cannot join.
    pub fn join(&self, conversation_id: Snowflake, session_id: &str) -> bool {
        if !self.peers.contains_key(session_id) {
            return false;
        }
        let inserted = self
            .rooms
            .entry(conversation_id)
            .or_default()
            .insert(session_id.to_string());

        if inserted {
            tracing::trace!(
                session_id = %session_id,
                conversation_id = %conversation_id,
                "Session joined room"
            );
        }
        inserted
    }

    /// Unsubscribe a session from a room; leaving a non-joined room is a no-op
    pub fn leave(&self, conversation_id: Snowflake, session_id: &str) -> bool {
        let removed = self
            .rooms
            .get_mut(&conversation_id)
            .is_some_and(|mut sessions| sessions.remove(session_id));

        self.rooms.retain(|_, sessions| !sessions.is_empty());
        removed
    }

    /// Check membership
    pub fn is_member(&self, conversation_id: Snowflake, session_id: &str) -> bool {
        self.rooms
            .get(&conversation_id)
            .is_some_and(|sessions| sessions.contains(session_id))
    }

    /// Deliver an event to every session joined to the room
    ///
    /// Returns the number of sessions the event was handed to.
    pub fn broadcast(&self, conversation_id: Snowflake, event: &ServerEvent) -> usize {
        let Some(sessions) = self.rooms.get(&conversation_id) else {
            return 0;
        };

        let mut sent = 0;
        for session_id in sessions.iter() {
            if self.try_deliver(session_id, event) {
                sent += 1;
            }
        }

        tracing::trace!(
            conversation_id = %conversation_id,
            event = event.name(),
            sent = sent,
            "Event broadcast to room"
        );
        sent
    }

    /// Deliver an event to every registered session (presence deltas)
    pub fn broadcast_all(&self, event: &ServerEvent) -> usize {
        let mut sent = 0;
        for entry in self.peers.iter() {
            if entry.value().try_send(event.clone()).is_ok() {
                sent += 1;
            }
        }

        tracing::trace!(event = event.name(), sent = sent, "Event broadcast to all");
        sent
    }

    /// Deliver an event to a single session (error replies, snapshots)
    pub fn send_to(&self, session_id: &str, event: &ServerEvent) -> Result<(), DomainError> {
        if self.try_deliver(session_id, event) {
            Ok(())
        } else {
            Err(DomainError::TransportClosed)
        }
    }

    fn try_deliver(&self, session_id: &str, event: &ServerEvent) -> bool {
        self.peers
            .get(session_id)
            .is_some_and(|sender| sender.try_send(event.clone()).is_ok())
    }

    /// Number of registered sessions
    pub fn session_count(&self) -> usize {
        self.peers.len()
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drop sessions whose outbound channel has closed; returns their ids
    pub fn sweep_closed(&self) -> Vec<SessionId> {
        let closed: Vec<SessionId> = self
            .peers
            .iter()
            .filter(|entry| entry.value().is_closed())
            .map(|entry| entry.key().clone())
            .collect();

        for session_id in &closed {
            self.unregister(session_id);
        }

        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "Swept closed sessions");
        }
        closed
    }
}

impl Default for RoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomBroadcaster")
            .field("sessions", &self.peers.len())
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
