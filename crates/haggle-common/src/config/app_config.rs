//! Application configuration structs
//!
//! Loads configuration from environment variables (with `.env` support).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub realtime: RealtimeConfig,
    pub jwt_secret: String,
    #[serde(default)]
    pub worker_id: u16,
}

/// Gateway server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tunables for the real-time core
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// How long a typing flag survives without a refresh
    #[serde(default = "default_typing_ttl_secs")]
    pub typing_ttl_secs: u64,
    /// Interval between typing-expiry and dead-connection sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Outbound per-connection channel capacity
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl RealtimeConfig {
    #[must_use]
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_secs(self.typing_ttl_secs)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            typing_ttl_secs: default_typing_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_typing_ttl_secs() -> u64 {
    3
}

fn default_sweep_interval_secs() -> u64 {
    5
}

fn default_outbound_buffer() -> usize {
    128
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            gateway: GatewayConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("GATEWAY_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            realtime: RealtimeConfig {
                typing_ttl_secs: env::var("TYPING_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_typing_ttl_secs),
                sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_sweep_interval_secs),
                outbound_buffer: env::var("OUTBOUND_BUFFER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_outbound_buffer),
            },
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
            worker_id: env::var("WORKER_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
