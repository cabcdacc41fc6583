//! Test fixtures and data generators
//!
//! Reusable identities and conversation setups for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use haggle_core::store::NewConversation;
use haggle_core::{ConversationStore, Conversation, ItemRef, Snowflake};

/// Counter for unique fixture ids
static COUNTER: AtomicI64 = AtomicI64::new(1000);

/// Get a unique id for test data
pub fn unique_id() -> Snowflake {
    Snowflake::new(COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// A buyer/artist pair negotiating over one catalog item
#[derive(Debug, Clone, Copy)]
pub struct Negotiation {
    pub buyer: Snowflake,
    pub artist: Snowflake,
    pub item: Snowflake,
}

impl Negotiation {
    pub fn unique() -> Self {
        Self {
            buyer: unique_id(),
            artist: unique_id(),
            item: unique_id(),
        }
    }

    /// Conversation parameters for this pair, linked to the artist's item
    pub fn conversation(&self) -> NewConversation {
        NewConversation {
            participants: [self.buyer, self.artist],
            seller_id: Some(self.artist),
            linked_item: Some(ItemRef {
                id: self.item,
                owner_id: self.artist,
                title: format!("commission-{}", self.item),
            }),
        }
    }

    /// Create the conversation in the store
    pub async fn create(&self, store: &dyn ConversationStore) -> anyhow::Result<Conversation> {
        Ok(store.create_conversation(self.conversation()).await?)
    }
}
