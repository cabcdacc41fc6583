//! In-memory conversation store
//!
//! Uses `DashMap` for concurrent access plus one mutex per conversation
//! around append, so ids handed out within a conversation are strictly
//! increasing even when two senders race. That id is the ordering token the
//! rest of the system treats as authoritative.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use haggle_core::store::{
    ConversationStore, MessageQuery, NewConversation, NewMessage, StoreResult,
};
use haggle_core::{
    Conversation, DomainError, Message, OfferStatus, ReadReceipt, Snowflake, SnowflakeGenerator,
};

/// Default page size for history queries
const DEFAULT_PAGE_SIZE: usize = 50;

/// In-memory conversation store
pub struct MemoryStore {
    generator: SnowflakeGenerator,
    conversations: DashMap<Snowflake, Conversation>,
    messages: DashMap<Snowflake, Message>,
    /// Message ids per conversation, in append order
    timeline: DashMap<Snowflake, Vec<Snowflake>>,
    /// One lock per conversation; held across id assignment + insert
    append_locks: DashMap<Snowflake, Arc<Mutex<Snowflake>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new(worker_id: u16) -> Self {
        Self {
            generator: SnowflakeGenerator::new(worker_id),
            conversations: DashMap::new(),
            messages: DashMap::new(),
            timeline: DashMap::new(),
            append_locks: DashMap::new(),
        }
    }

    /// Create an empty store wrapped in Arc
    #[must_use]
    pub fn new_shared(worker_id: u16) -> Arc<Self> {
        Arc::new(Self::new(worker_id))
    }

    fn append_lock(&self, conversation_id: Snowflake) -> Arc<Mutex<Snowflake>> {
        self.append_locks
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(Snowflake::default())))
            .clone()
    }

    /// Total number of stored messages (all conversations)
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("conversations", &self.conversations.len())
            .field("messages", &self.messages.len())
            .finish()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_conversation(&self, new: NewConversation) -> StoreResult<Conversation> {
        if let Some(item) = &new.linked_item {
            // Seller side must be assigned explicitly and own the item
            let seller = new.seller_id.ok_or(DomainError::InvalidSellerAssignment)?;
            if !new.participants.contains(&seller) || item.owner_id != seller {
                return Err(DomainError::InvalidSellerAssignment);
            }
        } else if let Some(seller) = new.seller_id {
            if !new.participants.contains(&seller) {
                return Err(DomainError::InvalidSellerAssignment);
            }
        }

        let conversation = Conversation {
            id: self.generator.generate(),
            participants: new.participants,
            seller_id: new.seller_id,
            linked_item: new.linked_item,
            last_message: None,
            unread: std::collections::HashMap::new(),
            created_at: Utc::now(),
        };

        self.conversations
            .insert(conversation.id, conversation.clone());
        self.timeline.insert(conversation.id, Vec::new());

        tracing::debug!(conversation_id = %conversation.id, "Conversation created");

        Ok(conversation)
    }

    async fn conversation(&self, id: Snowflake) -> StoreResult<Option<Conversation>> {
        Ok(self.conversations.get(&id).map(|c| c.clone()))
    }

    async fn append(&self, conversation_id: Snowflake, new: NewMessage) -> StoreResult<Message> {
        if !self.conversations.contains_key(&conversation_id) {
            return Err(DomainError::ConversationNotFound(conversation_id));
        }

        let lock = self.append_lock(conversation_id);
        let mut last_id = lock.lock();

        let mut id = self.generator.generate();
        // Floor check: the ordering token must move forward even if the
        // clock does not
        if id <= *last_id {
            id = Snowflake::new(last_id.into_inner() + 1);
        }
        *last_id = id;

        let created_at = Utc::now();
        let message = Message {
            id,
            conversation_id,
            sender_id: new.sender_id,
            kind: new.kind,
            content: new.content,
            offer: new.offer,
            // The sender has implicitly read their own message
            read_by: vec![ReadReceipt {
                user_id: new.sender_id,
                read_at: created_at,
            }],
            created_at,
        };

        self.messages.insert(id, message.clone());
        self.timeline
            .entry(conversation_id)
            .or_default()
            .push(id);

        if let Some(mut conv) = self.conversations.get_mut(&conversation_id) {
            conv.record_message(message.sender_id, &message.content, created_at);
        }

        tracing::trace!(
            conversation_id = %conversation_id,
            message_id = %id,
            "Message appended"
        );

        Ok(message)
    }

    async fn mark_read(
        &self,
        conversation_id: Snowflake,
        user_id: Snowflake,
    ) -> StoreResult<DateTime<Utc>> {
        let read_at = Utc::now();

        {
            let mut conv = self
                .conversations
                .get_mut(&conversation_id)
                .ok_or(DomainError::ConversationNotFound(conversation_id))?;
            conv.mark_read(user_id);
        }

        if let Some(ids) = self.timeline.get(&conversation_id) {
            for id in ids.iter() {
                if let Some(mut msg) = self.messages.get_mut(id) {
                    msg.add_read(user_id, read_at);
                }
            }
        }

        Ok(read_at)
    }

    async fn messages(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> StoreResult<Vec<Message>> {
        let ids = self
            .timeline
            .get(&conversation_id)
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;

        let limit = if query.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            query.limit
        };

        let selected: Vec<Snowflake> = ids
            .iter()
            .copied()
            .filter(|id| query.before.is_none_or(|b| *id < b))
            .collect();

        let start = selected.len().saturating_sub(limit);
        Ok(selected[start..]
            .iter()
            .filter_map(|id| self.messages.get(id).map(|m| m.clone()))
            .collect())
    }

    async fn find_message(&self, message_id: Snowflake) -> StoreResult<Option<Message>> {
        Ok(self.messages.get(&message_id).map(|m| m.clone()))
    }

    async fn resolve_offer(
        &self,
        message_id: Snowflake,
        status: OfferStatus,
    ) -> StoreResult<Message> {
        // The DashMap entry lock makes this a compare-and-set: concurrent
        // calls serialize here and only the first sees Pending
        let mut entry = self
            .messages
            .get_mut(&message_id)
            .ok_or(DomainError::MessageNotFound(message_id))?;

        let offer = entry
            .offer
            .as_mut()
            .ok_or(DomainError::MessageNotFound(message_id))?;

        if offer.status.is_terminal() {
            return Err(DomainError::AlreadyResolved {
                status: offer.status,
            });
        }

        offer.status = status;
        Ok(entry.clone())
    }
}
