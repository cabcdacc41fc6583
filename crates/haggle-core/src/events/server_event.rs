//! Server events - everything the core pushes to connected clients
//!
//! The gateway serializes these verbatim as wire frames; the `t` field
//! carries the event name, all other fields are the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Message, OfferStatus};
use crate::value_objects::Snowflake;

/// A server-to-client event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ServerEvent {
    /// Full presence state, sent once per connection before any deltas apply
    #[serde(rename = "presence.snapshot")]
    PresenceSnapshot { online_user_ids: Vec<Snowflake> },

    /// A user crossed the 0/1 connection boundary (global broadcast)
    #[serde(rename = "presence.delta")]
    PresenceDelta { user_id: Snowflake, online: bool },

    /// A message was persisted and is being fanned out to the room
    #[serde(rename = "message.new")]
    MessageNew {
        conversation_id: Snowflake,
        message: Message,
    },

    /// A participant read the conversation up to now
    #[serde(rename = "message.read")]
    MessageRead {
        conversation_id: Snowflake,
        user_id: Snowflake,
        read_at: DateTime<Utc>,
    },

    /// Single-user typing flag; receivers maintain their own set
    #[serde(rename = "typing.update")]
    TypingUpdate {
        conversation_id: Snowflake,
        user_id: Snowflake,
        is_typing: bool,
    },

    /// An offer reached a terminal status; clients patch the message in place
    #[serde(rename = "offer.resolved")]
    OfferResolved {
        conversation_id: Snowflake,
        message_id: Snowflake,
        status: OfferStatus,
    },

    /// Typed error reply, sent only to the connection that caused it
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerEvent {
    /// Build an error event from a domain error
    pub fn from_error(err: &crate::error::DomainError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    /// The wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresenceSnapshot { .. } => "presence.snapshot",
            Self::PresenceDelta { .. } => "presence.delta",
            Self::MessageNew { .. } => "message.new",
            Self::MessageRead { .. } => "message.read",
            Self::TypingUpdate { .. } => "typing.update",
            Self::OfferResolved { .. } => "offer.resolved",
            Self::Error { .. } => "error",
        }
    }
}
