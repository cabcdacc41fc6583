//! Application services

mod context;
mod offer;
mod pipeline;
mod presence;
mod rooms;
mod typing;

pub use context::ServiceContext;
pub use offer::{OfferDecision, OfferService};
pub use pipeline::{DraftOffer, MessagePipeline};
pub use presence::PresenceRegistry;
pub use rooms::{RoomBroadcaster, SessionId};
pub use typing::TypingTracker;
