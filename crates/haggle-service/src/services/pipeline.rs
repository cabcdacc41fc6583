//! Message pipeline
//!
//! Validates, persists, and fans out inbound messages. Validation happens
//! before any write, so a rejected frame has no partial effects. The
//! per-conversation sequencing lock is held across persist + broadcast; that
//! is what makes every room member observe messages in persisted order.

use tracing::instrument;

use haggle_core::store::NewMessage;
use haggle_core::{
    Amount, Conversation, DomainError, Message, MessageKind, Offer, OfferStatus, ServerEvent,
    Snowflake,
};

use super::context::ServiceContext;

/// An offer as submitted by a client, before validation
#[derive(Debug, Clone)]
pub struct DraftOffer {
    /// Proposed amount in minor currency units
    pub amount_minor: i64,
    /// Catalog item the offer targets
    pub item_id: Snowflake,
}

/// Message pipeline service
pub struct MessagePipeline<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessagePipeline<'a> {
    /// Create a pipeline over the shared context
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Validate, persist, and broadcast one inbound message
    ///
    /// Exactly one persisted message and one room broadcast per successful
    /// call; validation failures mutate nothing.
    #[instrument(skip(self, content, draft), fields(conversation_id = %conversation_id, sender_id = %sender_id))]
    pub async fn submit(
        &self,
        conversation_id: Snowflake,
        sender_id: Snowflake,
        kind: MessageKind,
        content: String,
        draft: Option<DraftOffer>,
    ) -> Result<Message, DomainError> {
        let conversation = self.load(conversation_id).await?;

        if !conversation.is_participant(sender_id) {
            return Err(DomainError::NotParticipant {
                user_id: sender_id,
                conversation_id,
            });
        }

        let offer = match kind {
            MessageKind::Offer => Some(Self::validate_offer(&conversation, sender_id, draft)?),
            // System messages are inserted at the store level by the server
            // itself; a client cannot submit one.
            MessageKind::System => return Err(DomainError::ReservedKind),
            MessageKind::Text => {
                if content.trim().is_empty() {
                    return Err(DomainError::EmptyContent);
                }
                None
            }
        };

        // Hold the sequencing lock across persist + broadcast
        let lock = self.ctx.order_lock(conversation_id);
        let _guard = lock.lock().await;

        let message = self
            .ctx
            .store()
            .append(
                conversation_id,
                NewMessage {
                    sender_id,
                    kind,
                    content,
                    offer,
                },
            )
            .await?;

        self.ctx.rooms().broadcast(
            conversation_id,
            &ServerEvent::MessageNew {
                conversation_id,
                message: message.clone(),
            },
        );

        tracing::debug!(message_id = %message.id, "Message persisted and broadcast");
        Ok(message)
    }

    /// Record that a participant has read the conversation up to now and
    /// broadcast the receipt to the room
    #[instrument(skip(self), fields(conversation_id = %conversation_id, user_id = %user_id))]
    pub async fn mark_read(
        &self,
        conversation_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<(), DomainError> {
        let conversation = self.load(conversation_id).await?;
        if !conversation.is_participant(user_id) {
            return Err(DomainError::NotParticipant {
                user_id,
                conversation_id,
            });
        }

        let read_at = self.ctx.store().mark_read(conversation_id, user_id).await?;

        self.ctx.rooms().broadcast(
            conversation_id,
            &ServerEvent::MessageRead {
                conversation_id,
                user_id,
                read_at,
            },
        );
        Ok(())
    }

    async fn load(&self, conversation_id: Snowflake) -> Result<Conversation, DomainError> {
        self.ctx
            .store()
            .conversation(conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound(conversation_id))
    }

    /// Offer eligibility: sender side first, then target item, then amount
    fn validate_offer(
        conversation: &Conversation,
        sender_id: Snowflake,
        draft: Option<DraftOffer>,
    ) -> Result<Offer, DomainError> {
        if conversation.is_seller(sender_id) {
            return Err(DomainError::IneligibleOfferSender);
        }

        let draft = draft.ok_or(DomainError::InvalidAmount)?;

        let item_ok = conversation.linked_item.as_ref().is_some_and(|item| {
            item.id == draft.item_id && conversation.seller_id == Some(item.owner_id)
        });
        if !item_ok {
            return Err(DomainError::InvalidOfferTarget {
                item_id: draft.item_id,
            });
        }

        let amount =
            Amount::from_minor(draft.amount_minor).map_err(|_| DomainError::InvalidAmount)?;

        Ok(Offer {
            amount,
            item_id: draft.item_id,
            status: OfferStatus::Pending,
        })
    }
}
