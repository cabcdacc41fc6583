//! Domain entities - core business objects

mod conversation;
mod message;

pub use conversation::{Conversation, ItemRef, LastMessage};
pub use message::{Message, MessageKind, Offer, OfferStatus, ReadReceipt};
