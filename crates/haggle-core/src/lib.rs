//! # haggle-core
//!
//! Domain layer for the real-time messaging and negotiation core: entities,
//! value objects, server events, and the conversation store trait. This crate
//! has zero dependencies on infrastructure (transport, storage, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod store;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Conversation, ItemRef, LastMessage, Message, MessageKind, Offer, OfferStatus, ReadReceipt,
};
pub use error::DomainError;
pub use events::ServerEvent;
pub use store::{ConversationStore, MessageQuery, NewConversation, NewMessage, StoreResult};
pub use value_objects::{Amount, Snowflake, SnowflakeGenerator, SnowflakeParseError};
