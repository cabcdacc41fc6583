//! Offer state machine
//!
//! `pending -> accepted | rejected`, both terminal. The store performs the
//! actual transition as a compare-and-set, so two concurrent responses yield
//! exactly one state change regardless of interleaving.

use tracing::instrument;

use haggle_core::{DomainError, Message, OfferStatus, ServerEvent, Snowflake};

use super::context::ServiceContext;

/// A responder's decision on a pending offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferDecision {
    Accept,
    Reject,
}

impl OfferDecision {
    /// The terminal status this decision resolves to
    #[must_use]
    pub const fn status(self) -> OfferStatus {
        match self {
            Self::Accept => OfferStatus::Accepted,
            Self::Reject => OfferStatus::Rejected,
        }
    }
}

/// Offer lifecycle service
pub struct OfferService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> OfferService<'a> {
    /// Create an offer service over the shared context
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Resolve a pending offer
    ///
    /// On success the room receives an `offer.resolved` patch event carrying
    /// only `{message_id, status}` - never a re-send of the message.
    #[instrument(skip(self), fields(message_id = %message_id, responder_id = %responder_id))]
    pub async fn respond(
        &self,
        message_id: Snowflake,
        responder_id: Snowflake,
        decision: OfferDecision,
    ) -> Result<Message, DomainError> {
        let message = self
            .ctx
            .store()
            .find_message(message_id)
            .await?
            .filter(Message::is_offer)
            .ok_or(DomainError::MessageNotFound(message_id))?;

        let offer = message
            .offer
            .as_ref()
            .ok_or(DomainError::MessageNotFound(message_id))?;
        if offer.status.is_terminal() {
            return Err(DomainError::AlreadyResolved {
                status: offer.status,
            });
        }

        if responder_id == message.sender_id {
            return Err(DomainError::SelfResponse);
        }

        let conversation = self
            .ctx
            .store()
            .conversation(message.conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound(message.conversation_id))?;
        if !conversation.is_participant(responder_id) {
            return Err(DomainError::NotParticipant {
                user_id: responder_id,
                conversation_id: conversation.id,
            });
        }

        // The CAS in the store settles any race that slipped past the
        // pre-check above
        let status = decision.status();
        let resolved = self.ctx.store().resolve_offer(message_id, status).await?;

        self.ctx.rooms().broadcast(
            resolved.conversation_id,
            &ServerEvent::OfferResolved {
                conversation_id: resolved.conversation_id,
                message_id,
                status,
            },
        );

        tracing::info!(status = %status, "Offer resolved");
        Ok(resolved)
    }
}
