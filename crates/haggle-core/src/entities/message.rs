//! Message entity - an immutable conversation entry, possibly carrying an offer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Amount, Snowflake};

/// Message kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Offer,
    System,
}

/// Offer lifecycle status
///
/// `Accepted` and `Rejected` are terminal; there is no transition out of
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OfferStatus {
    /// Check whether this status is terminal
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A structured price proposal embedded in a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub amount: Amount,
    /// Catalog item the offer targets; must be the conversation's linked item
    pub item_id: Snowflake,
    pub status: OfferStatus,
}

/// A read receipt: who has seen the message and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user_id: Snowflake,
    pub read_at: DateTime<Utc>,
}

/// Message entity
///
/// Immutable once persisted, except `offer.status` (via the offer state
/// machine) and monotonic `read_by` growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub kind: MessageKind,
    /// Required for text/system; optional label for offers
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<Offer>,
    pub read_by: Vec<ReadReceipt>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Check whether this message carries an offer
    #[inline]
    pub fn is_offer(&self) -> bool {
        matches!(self.kind, MessageKind::Offer)
    }

    /// Check whether a user already appears in the read set
    pub fn is_read_by(&self, user_id: Snowflake) -> bool {
        self.read_by.iter().any(|r| r.user_id == user_id)
    }

    /// Add a read receipt; growth is monotonic and idempotent per user
    pub fn add_read(&mut self, user_id: Snowflake, read_at: DateTime<Utc>) {
        if !self.is_read_by(user_id) {
            self.read_by.push(ReadReceipt { user_id, read_at });
        }
    }

    /// Pending offer status, if this is an unresolved offer message
    pub fn pending_offer(&self) -> Option<&Offer> {
        self.offer.as_ref().filter(|o| o.status == OfferStatus::Pending)
    }
}
