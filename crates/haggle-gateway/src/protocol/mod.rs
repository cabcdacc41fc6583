//! Wire protocol
//!
//! Client frames and server events are JSON objects tagged with a `t` field.
//! Server events are defined in `haggle-core` and serialized verbatim; this
//! module owns the client-to-server side.

mod frames;

pub use frames::{encode_event, ClientFrame, OfferPayload};
