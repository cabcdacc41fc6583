//! Integration test utilities for the real-time negotiation core
//!
//! This crate provides an in-process harness wiring the in-memory store,
//! the service layer, and per-session event channels together, so tests can
//! exercise the same paths a live gateway would without opening sockets.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
