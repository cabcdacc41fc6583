//! Client-side message list reconciliation
//!
//! A client renders its own sends optimistically, before the server confirms
//! them. This crate holds the merge rules that keep such a local view
//! consistent with the server's broadcast stream: pending entries are replaced
//! by their canonical counterparts, duplicate deliveries are dropped, and
//! offer resolutions patch in place instead of appending.

pub mod reconcile;

pub use reconcile::{ConversationView, LocalMessage};
