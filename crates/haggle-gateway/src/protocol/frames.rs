//! Client-to-server protocol frames

use serde::{Deserialize, Serialize};

use haggle_core::{MessageKind, ServerEvent, Snowflake};
use haggle_service::OfferDecision;

/// An offer as it appears on the wire, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferPayload {
    /// Proposed amount in minor currency units
    pub amount_minor: i64,
    /// Catalog item the offer targets
    pub item_id: Snowflake,
}

/// A frame sent by a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ClientFrame {
    /// Subscribe to a conversation's broadcasts
    #[serde(rename = "room.join")]
    RoomJoin { conversation_id: Snowflake },

    /// Unsubscribe from a conversation's broadcasts
    #[serde(rename = "room.leave")]
    RoomLeave { conversation_id: Snowflake },

    /// Submit a message for validation, persistence, and fan-out
    #[serde(rename = "message.send")]
    MessageSend {
        conversation_id: Snowflake,
        kind: MessageKind,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offer: Option<OfferPayload>,
    },

    /// Raise the sender's typing flag
    #[serde(rename = "typing.start")]
    TypingStart { conversation_id: Snowflake },

    /// Clear the sender's typing flag
    #[serde(rename = "typing.stop")]
    TypingStop { conversation_id: Snowflake },

    /// Accept or reject a pending offer
    #[serde(rename = "offer.respond")]
    OfferRespond {
        conversation_id: Snowflake,
        message_id: Snowflake,
        decision: OfferDecision,
    },

    /// Mark the conversation read up to now
    #[serde(rename = "message.read")]
    MessageRead { conversation_id: Snowflake },
}

impl ClientFrame {
    /// Parse a frame from its wire text
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The wire name of this frame
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomJoin { .. } => "room.join",
            Self::RoomLeave { .. } => "room.leave",
            Self::MessageSend { .. } => "message.send",
            Self::TypingStart { .. } => "typing.start",
            Self::TypingStop { .. } => "typing.stop",
            Self::OfferRespond { .. } => "offer.respond",
            Self::MessageRead { .. } => "message.read",
        }
    }
}

/// Serialize a server event to its wire text
pub fn encode_event(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
