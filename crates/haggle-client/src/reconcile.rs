//! Reconciliation of optimistic sends with server truth

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haggle_core::{Message, MessageKind, OfferStatus, Snowflake};

/// A message as the client sees it
///
/// `Pending` is a local-only optimistic render keyed by a client-generated
/// temporary id; `Confirmed` is the canonical server message keyed by its
/// server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LocalMessage {
    Pending {
        temp_id: String,
        sender_id: Snowflake,
        kind: MessageKind,
        content: String,
        sent_at: DateTime<Utc>,
    },
    Confirmed(Message),
}

impl LocalMessage {
    /// Check whether this entry is still awaiting server confirmation
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The message body
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Pending { content, .. } => content,
            Self::Confirmed(message) => &message.content,
        }
    }

    /// Server id, once confirmed
    #[must_use]
    pub fn server_id(&self) -> Option<Snowflake> {
        match self {
            Self::Pending { .. } => None,
            Self::Confirmed(message) => Some(message.id),
        }
    }
}

/// The client's ordered view of one conversation
///
/// Confirmed entries are kept sorted by server id; pending entries trail at
/// the end in send order until the matching broadcast replaces them.
#[derive(Debug, Clone)]
pub struct ConversationView {
    self_id: Snowflake,
    entries: Vec<LocalMessage>,
}

impl ConversationView {
    /// Create an empty view for the local user
    #[must_use]
    pub fn new(self_id: Snowflake) -> Self {
        Self {
            self_id,
            entries: Vec::new(),
        }
    }

    /// Seed the view from a history page, oldest first
    #[must_use]
    pub fn with_history(self_id: Snowflake, history: Vec<Message>) -> Self {
        let mut view = Self::new(self_id);
        for message in history {
            view.apply_broadcast(message);
        }
        view
    }

    /// Render an optimistic send immediately, before the server confirms it
    pub fn push_pending(&mut self, temp_id: impl Into<String>, kind: MessageKind, content: String) {
        self.entries.push(LocalMessage::Pending {
            temp_id: temp_id.into(),
            sender_id: self.self_id,
            kind,
            content,
            sent_at: Utc::now(),
        });
    }

    /// Merge a broadcast message into the view
    ///
    /// An own broadcast matching an outstanding pending entry by
    /// `(sender, kind, content)` replaces that entry. Anything else is
    /// appended in id order, and only if its id is not already present, so
    /// at-least-once delivery never duplicates an entry.
    pub fn apply_broadcast(&mut self, message: Message) {
        if self.contains(message.id) {
            return;
        }

        if message.sender_id == self.self_id {
            let slot = self.entries.iter().position(|entry| match entry {
                LocalMessage::Pending {
                    sender_id,
                    kind,
                    content,
                    ..
                } => *sender_id == message.sender_id
                    && *kind == message.kind
                    && *content == message.content,
                LocalMessage::Confirmed(_) => false,
            });
            if let Some(index) = slot {
                self.entries[index] = LocalMessage::Confirmed(message);
                return;
            }
        }

        let insert_at = self
            .entries
            .iter()
            .position(|entry| entry.server_id().is_none_or(|id| id > message.id))
            .unwrap_or(self.entries.len());
        self.entries.insert(insert_at, LocalMessage::Confirmed(message));
    }

    /// Patch a resolved offer's status in place
    ///
    /// Resolution events are never new messages; an unknown id is ignored
    /// rather than appended.
    pub fn apply_offer_resolved(&mut self, message_id: Snowflake, status: OfferStatus) -> bool {
        for entry in &mut self.entries {
            if let LocalMessage::Confirmed(message) = entry {
                if message.id == message_id {
                    if let Some(offer) = message.offer.as_mut() {
                        offer.status = status;
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Record that a user has read the conversation up to now
    pub fn apply_read(&mut self, user_id: Snowflake, read_at: DateTime<Utc>) {
        for entry in &mut self.entries {
            if let LocalMessage::Confirmed(message) = entry {
                message.add_read(user_id, read_at);
            }
        }
    }

    /// Check whether a confirmed entry with this server id exists
    #[must_use]
    pub fn contains(&self, message_id: Snowflake) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.server_id() == Some(message_id))
    }

    /// The entries in display order
    #[must_use]
    pub fn entries(&self) -> &[LocalMessage] {
        &self.entries
    }

    /// Count of entries still awaiting confirmation
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::{Amount, Offer};

    const SELF: Snowflake = Snowflake::new(10);
    const OTHER: Snowflake = Snowflake::new(20);

    fn confirmed(id: i64, sender: Snowflake, content: &str) -> Message {
        Message {
            id: Snowflake::new(id),
            conversation_id: Snowflake::new(1),
            sender_id: sender,
            kind: MessageKind::Text,
            content: content.to_string(),
            offer: None,
            read_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn offer_message(id: i64, sender: Snowflake) -> Message {
        Message {
            kind: MessageKind::Offer,
            content: String::new(),
            offer: Some(Offer {
                amount: Amount::from_minor(5000).unwrap(),
                item_id: Snowflake::new(2),
                status: OfferStatus::Pending,
            }),
            ..confirmed(id, sender, "")
        }
    }

    #[test]
    fn test_own_broadcast_replaces_pending() {
        let mut view = ConversationView::new(SELF);
        view.push_pending("tmp-1", MessageKind::Text, "Hello".to_string());
        assert_eq!(view.pending_count(), 1);

        view.apply_broadcast(confirmed(100, SELF, "Hello"));

        assert_eq!(view.len(), 1);
        assert_eq!(view.pending_count(), 0);
        assert_eq!(view.entries()[0].content(), "Hello");
        assert_eq!(view.entries()[0].server_id(), Some(Snowflake::new(100)));
    }

    #[test]
    fn test_duplicate_delivery_is_dropped() {
        let mut view = ConversationView::new(SELF);
        view.apply_broadcast(confirmed(100, OTHER, "hi"));
        view.apply_broadcast(confirmed(100, OTHER, "hi"));

        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_foreign_broadcast_appends_in_id_order() {
        let mut view = ConversationView::new(SELF);
        view.apply_broadcast(confirmed(103, OTHER, "third"));
        view.apply_broadcast(confirmed(101, OTHER, "first"));
        view.apply_broadcast(confirmed(102, OTHER, "second"));

        let contents: Vec<_> = view.entries().iter().map(LocalMessage::content).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_confirmed_insert_keeps_pending_at_tail() {
        let mut view = ConversationView::new(SELF);
        view.push_pending("tmp-1", MessageKind::Text, "draft".to_string());
        view.apply_broadcast(confirmed(100, OTHER, "hi"));

        assert!(!view.entries()[0].is_pending());
        assert!(view.entries()[1].is_pending());
    }

    #[test]
    fn test_own_broadcast_without_pending_appends_once() {
        // Another device of the same user sent this one.
        let mut view = ConversationView::new(SELF);
        view.apply_broadcast(confirmed(100, SELF, "from my phone"));
        view.apply_broadcast(confirmed(100, SELF, "from my phone"));

        assert_eq!(view.len(), 1);
        assert_eq!(view.pending_count(), 0);
    }

    #[test]
    fn test_matching_consumes_one_pending_per_broadcast() {
        let mut view = ConversationView::new(SELF);
        view.push_pending("tmp-1", MessageKind::Text, "ping".to_string());
        view.push_pending("tmp-2", MessageKind::Text, "ping".to_string());

        view.apply_broadcast(confirmed(100, SELF, "ping"));
        assert_eq!(view.pending_count(), 1);

        view.apply_broadcast(confirmed(101, SELF, "ping"));
        assert_eq!(view.pending_count(), 0);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_offer_resolution_patches_in_place() {
        let mut view = ConversationView::new(SELF);
        view.apply_broadcast(offer_message(100, OTHER));

        assert!(view.apply_offer_resolved(Snowflake::new(100), OfferStatus::Accepted));

        assert_eq!(view.len(), 1);
        match &view.entries()[0] {
            LocalMessage::Confirmed(message) => {
                assert_eq!(message.offer.as_ref().unwrap().status, OfferStatus::Accepted);
            }
            LocalMessage::Pending { .. } => panic!("expected confirmed entry"),
        }
    }

    #[test]
    fn test_unknown_offer_resolution_is_ignored() {
        let mut view = ConversationView::new(SELF);
        assert!(!view.apply_offer_resolved(Snowflake::new(999), OfferStatus::Rejected));
        assert!(view.is_empty());
    }

    #[test]
    fn test_read_receipt_stamps_confirmed_entries() {
        let mut view = ConversationView::new(SELF);
        view.apply_broadcast(confirmed(100, SELF, "hi"));
        view.push_pending("tmp-1", MessageKind::Text, "draft".to_string());

        view.apply_read(OTHER, Utc::now());

        match &view.entries()[0] {
            LocalMessage::Confirmed(message) => assert!(message.is_read_by(OTHER)),
            LocalMessage::Pending { .. } => panic!("expected confirmed entry"),
        }
    }

    #[test]
    fn test_history_seed_orders_by_id() {
        let history = vec![
            confirmed(102, OTHER, "b"),
            confirmed(101, SELF, "a"),
        ];
        let view = ConversationView::with_history(SELF, history);

        let contents: Vec<_> = view.entries().iter().map(LocalMessage::content).collect();
        assert_eq!(contents, vec!["a", "b"]);
    }
}
