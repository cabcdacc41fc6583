//! Test helpers for integration tests
//!
//! An in-process harness standing in for the gateway: it owns the shared
//! service context and hands out per-session event channels the way a live
//! connection session would.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use haggle_core::{ServerEvent, Snowflake};
use haggle_service::{ServiceContext, SessionId};
use haggle_store::MemoryStore;

/// Outbound channel capacity for harness sessions
const SESSION_BUFFER: usize = 256;

/// Counter for unique session ids
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// In-process stand-in for the gateway
pub struct TestHarness {
    ctx: Arc<ServiceContext>,
}

impl TestHarness {
    /// Build a harness around a fresh in-memory store
    pub fn new() -> Self {
        Self::with_typing_ttl(Duration::from_secs(3))
    }

    /// Build a harness with a custom typing TTL
    pub fn with_typing_ttl(ttl: Duration) -> Self {
        let store = MemoryStore::new_shared(0);
        Self {
            ctx: ServiceContext::new_shared(store, ttl),
        }
    }

    /// The shared service context
    pub fn ctx(&self) -> &Arc<ServiceContext> {
        &self.ctx
    }

    /// Open a "connection" for a user: registers an outbound channel and
    /// marks the user online, exactly like the session setup path
    pub fn connect(&self, user_id: Snowflake) -> TestConnection {
        let session_id = format!("session-{}", SESSION_COUNTER.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);

        if self.ctx.presence().mark_online(user_id, &session_id) {
            self.ctx.rooms().broadcast_all(&ServerEvent::PresenceDelta {
                user_id,
                online: true,
            });
        }
        self.ctx.rooms().register(&session_id, tx);

        TestConnection {
            session_id,
            user_id,
            rx,
        }
    }

    /// Close a connection, running the same cleanup as a real session
    pub fn disconnect(&self, conn: &TestConnection) {
        self.ctx.rooms().unregister(&conn.session_id);
        if self.ctx.presence().mark_offline(conn.user_id, &conn.session_id) {
            self.ctx.rooms().broadcast_all(&ServerEvent::PresenceDelta {
                user_id: conn.user_id,
                online: false,
            });
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// One simulated connection with its outbound event stream
pub struct TestConnection {
    pub session_id: SessionId,
    pub user_id: Snowflake,
    pub rx: mpsc::Receiver<ServerEvent>,
}

impl TestConnection {
    /// Drain every event currently queued
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Ids of all `message.new` events currently queued, in delivery order
    pub fn drain_message_ids(&mut self) -> Vec<Snowflake> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                ServerEvent::MessageNew { message, .. } => Some(message.id),
                _ => None,
            })
            .collect()
    }
}
