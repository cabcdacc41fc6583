//! Gateway state
//!
//! Shared dependencies for every connection session.

use std::sync::Arc;

use haggle_common::{AppConfig, Authenticator};
use haggle_service::ServiceContext;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Service layer: presence, rooms, typing, pipeline, offers
    services: Arc<ServiceContext>,
    /// Token verification hook for the external identity service
    auth: Arc<dyn Authenticator>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        services: Arc<ServiceContext>,
        auth: Arc<dyn Authenticator>,
        config: AppConfig,
    ) -> Self {
        Self {
            services,
            auth,
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn services(&self) -> &ServiceContext {
        &self.services
    }

    /// Get the authenticator
    pub fn auth(&self) -> &dyn Authenticator {
        self.auth.as_ref()
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("services", &self.services)
            .field("config", &self.config)
            .finish()
    }
}
