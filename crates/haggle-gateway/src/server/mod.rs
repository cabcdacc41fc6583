//! Gateway server setup
//!
//! Router, shared state construction, background sweeps, and the listener
//! loop.

mod handler;
pub(crate) mod session;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use haggle_common::{AppConfig, AppError, JwtAuthenticator};
use haggle_core::ServerEvent;
use haggle_service::ServiceContext;
use haggle_store::MemoryStore;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
///
/// The in-memory store backs the dev binary; embedders wire their own
/// adapter by building the state themselves.
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let store = MemoryStore::new_shared(config.worker_id);
    let services = ServiceContext::new_shared(store, config.realtime.typing_ttl());
    let auth = Arc::new(JwtAuthenticator::new(&config.jwt_secret));

    GatewayState::new(services, auth, config)
}

/// Spawn the periodic maintenance sweeps
///
/// Typing flags whose TTL lapsed are cleared with a `typing.update(false)`
/// broadcast; sessions whose outbound channel closed without a clean
/// shutdown are pruned from the room registry.
pub fn spawn_sweeps(state: GatewayState) {
    let interval = state.config().realtime.sweep_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            for (conversation_id, user_id) in state.services().typing().sweep() {
                state.services().rooms().broadcast(
                    conversation_id,
                    &ServerEvent::TypingUpdate {
                        conversation_id,
                        user_id,
                        is_typing: false,
                    },
                );
            }

            state.services().rooms().sweep_closed();
        }
    });
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Bind(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Bind(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Bind(format!("Invalid listen address: {e}")))?;

    let state = create_gateway_state(config);
    spawn_sweeps(state.clone());

    let app = create_app(state);
    run_server(app, addr).await
}
