//! # haggle-service
//!
//! Application layer for the real-time core: the presence registry, room
//! broadcaster, typing tracker, message pipeline, and offer state machine,
//! wired together through a shared [`ServiceContext`].

pub mod services;

pub use services::{
    DraftOffer, MessagePipeline, OfferDecision, OfferService, PresenceRegistry, RoomBroadcaster,
    ServiceContext, SessionId, TypingTracker,
};
