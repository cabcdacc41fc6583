//! # haggle-gateway
//!
//! WebSocket gateway for the real-time messaging and negotiation core.
//! Authenticates connections, pumps protocol frames through the service
//! layer, and fans server events back out to subscribed sessions.

pub mod protocol;
pub mod server;

pub use server::{create_app, create_gateway_state, run, GatewayState};
