//! # haggle-common
//!
//! Shared utilities: configuration, process-level errors, the authentication
//! hook, and telemetry setup.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{AuthError, Authenticator, Claims, JwtAuthenticator};
pub use config::{AppConfig, ConfigError, GatewayConfig, RealtimeConfig};
pub use error::{AppError, AppResult};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
