//! Conversation entity - a two-party negotiation thread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::Snowflake;

/// Reference to a catalog item owned by the seller side
///
/// Immutable after conversation creation; the catalog itself is external.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: Snowflake,
    pub owner_id: Snowflake,
    pub title: String,
}

/// Denormalized snapshot of the most recent message, for list rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub content: String,
    pub sender_id: Snowflake,
    pub created_at: DateTime<Utc>,
}

/// Conversation entity
///
/// Exactly two participants (the self-note degenerate case may repeat one
/// id). When a catalog item is linked, `seller_id` names which participant
/// owns it; this is assigned at creation rather than inferred per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Snowflake,
    pub participants: [Snowflake; 2],
    /// The participant on the seller/artist side, when an item is linked
    pub seller_id: Option<Snowflake>,
    pub linked_item: Option<ItemRef>,
    pub last_message: Option<LastMessage>,
    /// Per-participant unread counters, keyed by user id
    pub unread: HashMap<Snowflake, u32>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Check whether a user is one of the two participants
    #[inline]
    pub fn is_participant(&self, user_id: Snowflake) -> bool {
        self.participants.contains(&user_id)
    }

    /// The participant other than `user_id`, if `user_id` participates
    pub fn counterpart(&self, user_id: Snowflake) -> Option<Snowflake> {
        if !self.is_participant(user_id) {
            return None;
        }
        self.participants
            .iter()
            .copied()
            .find(|&p| p != user_id)
            .or(Some(user_id)) // self-note: the counterpart is yourself
    }

    /// Check whether a user is on the seller side of this conversation
    #[inline]
    pub fn is_seller(&self, user_id: Snowflake) -> bool {
        self.seller_id == Some(user_id)
    }

    /// Unread counter for a participant (zero if never incremented)
    pub fn unread_for(&self, user_id: Snowflake) -> u32 {
        self.unread.get(&user_id).copied().unwrap_or(0)
    }

    /// Record a new message: refresh the snapshot and bump every
    /// participant's counter except the sender's
    pub fn record_message(&mut self, sender_id: Snowflake, content: &str, at: DateTime<Utc>) {
        self.last_message = Some(LastMessage {
            content: content.to_string(),
            sender_id,
            created_at: at,
        });
        for participant in self.participants {
            if participant != sender_id {
                *self.unread.entry(participant).or_insert(0) += 1;
            }
        }
    }

    /// Zero the reader's unread counter
    pub fn mark_read(&mut self, user_id: Snowflake) {
        self.unread.insert(user_id, 0);
    }
}
