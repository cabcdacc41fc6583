//! Domain errors - typed failures surfaced on the originating frame
//!
//! Every error here is recoverable: it is echoed back to the requesting
//! connection only, with no state mutation and no broadcast.

use thiserror::Error;

use crate::entities::OfferStatus;
use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found
    // =========================================================================
    #[error("Conversation not found: {0}")]
    ConversationNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    // =========================================================================
    // Membership / Authorization
    // =========================================================================
    #[error("User {user_id} is not a participant of conversation {conversation_id}")]
    NotParticipant {
        user_id: Snowflake,
        conversation_id: Snowflake,
    },

    #[error("The seller side of a conversation cannot initiate an offer")]
    IneligibleOfferSender,

    #[error("Offer targets item {item_id}, which does not belong to the seller participant")]
    InvalidOfferTarget { item_id: Snowflake },

    #[error("A sender cannot respond to their own offer")]
    SelfResponse,

    #[error("Seller assignment is invalid: the seller side must be a participant owning the linked item")]
    InvalidSellerAssignment,

    // =========================================================================
    // Validation
    // =========================================================================
    #[error("Offer amount must be positive")]
    InvalidAmount,

    #[error("Message content must not be empty")]
    EmptyContent,

    #[error("Message kind is reserved for server-originated messages")]
    ReservedKind,

    // =========================================================================
    // Offer lifecycle
    // =========================================================================
    #[error("Offer already resolved as {status}")]
    AlreadyResolved { status: OfferStatus },

    // =========================================================================
    // Infrastructure (wrapped)
    // =========================================================================
    #[error("Connection transport is closed")]
    TransportClosed,

    #[error("Store error: {0}")]
    Store(String),
}

impl DomainError {
    /// Get a stable error code string for protocol error frames
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConversationNotFound(_) => "UNKNOWN_CONVERSATION",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::NotParticipant { .. } => "NOT_PARTICIPANT",
            Self::IneligibleOfferSender => "INELIGIBLE_OFFER_SENDER",
            Self::InvalidOfferTarget { .. } => "INVALID_OFFER_TARGET",
            Self::SelfResponse => "SELF_RESPONSE",
            Self::InvalidSellerAssignment => "INVALID_SELLER_ASSIGNMENT",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ReservedKind => "RESERVED_KIND",
            Self::AlreadyResolved { .. } => "OFFER_ALREADY_RESOLVED",
            Self::TransportClosed => "TRANSPORT_CLOSED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConversationNotFound(_) | Self::MessageNotFound(_)
        )
    }

    /// Check if this is a validation error (rejected before any write)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotParticipant { .. }
                | Self::IneligibleOfferSender
                | Self::InvalidOfferTarget { .. }
                | Self::SelfResponse
                | Self::InvalidSellerAssignment
                | Self::InvalidAmount
                | Self::EmptyContent
                | Self::ReservedKind
                | Self::AlreadyResolved { .. }
        )
    }
}
