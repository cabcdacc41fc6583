//! Conversation store trait (port) - the persistence collaborator
//!
//! The messaging core does not choose a storage technology; it consumes this
//! interface. The one hard contract implementations must honor: ids assigned
//! by [`ConversationStore::append`] are strictly increasing within a
//! conversation. That ordering token is authoritative for everything the
//! rest of the system guarantees about delivery order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Conversation, ItemRef, Message, MessageKind, Offer, OfferStatus};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for store operations
pub type StoreResult<T> = Result<T, DomainError>;

/// Pagination options for message history queries
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    /// Return only messages with ids strictly below this one
    pub before: Option<Snowflake>,
    /// Maximum number of messages to return (0 means implementation default)
    pub limit: usize,
}

impl MessageQuery {
    /// Query the most recent `limit` messages
    pub fn latest(limit: usize) -> Self {
        Self {
            before: None,
            limit,
        }
    }
}

/// A message as submitted by the pipeline, before the store assigns identity
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Snowflake,
    pub kind: MessageKind,
    pub content: String,
    pub offer: Option<Offer>,
}

/// Parameters for conversation creation
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub participants: [Snowflake; 2],
    /// Required whenever `linked_item` is present; must be a participant
    pub seller_id: Option<Snowflake>,
    pub linked_item: Option<ItemRef>,
}

/// The conversation store adapter
///
/// Append is the only operation allowed to block the message pipeline; all
/// mutations are atomic; a failure leaves no partial snapshot or counter
/// update behind.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation between two participants
    async fn create_conversation(&self, new: NewConversation) -> StoreResult<Conversation>;

    /// Fetch a conversation by id
    async fn conversation(&self, id: Snowflake) -> StoreResult<Option<Conversation>>;

    /// Persist a message, assigning a server timestamp and an
    /// order-establishing id, and atomically updating the conversation's
    /// last-message snapshot and unread counters
    async fn append(&self, conversation_id: Snowflake, new: NewMessage) -> StoreResult<Message>;

    /// Zero the reader's unread counter and stamp read receipts on messages
    /// the reader had not yet seen; returns the receipt timestamp
    async fn mark_read(
        &self,
        conversation_id: Snowflake,
        user_id: Snowflake,
    ) -> StoreResult<DateTime<Utc>>;

    /// Page through conversation history, newest last
    async fn messages(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> StoreResult<Vec<Message>>;

    /// Fetch a single message by id
    async fn find_message(&self, message_id: Snowflake) -> StoreResult<Option<Message>>;

    /// Transition an offer `Pending -> terminal` atomically
    ///
    /// Fails with [`DomainError::AlreadyResolved`] when the offer is no
    /// longer pending, with [`DomainError::MessageNotFound`] when the
    /// message is missing or not an offer. Exactly one of any number of
    /// concurrent calls succeeds.
    async fn resolve_offer(
        &self,
        message_id: Snowflake,
        status: OfferStatus,
    ) -> StoreResult<Message>;
}
