//! WebSocket upgrade handler
//!
//! Authenticates the connection before the upgrade completes; a bad token is
//! rejected with 401 and never reaches the session loop.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::server::{session, GatewayState};

/// Query parameters for the upgrade request
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Bearer token issued by the external identity service
    token: String,
}

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let user_id = match state.auth().authenticate(&params.token).await {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected WebSocket upgrade");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| session::run_session(state, socket, user_id))
}
