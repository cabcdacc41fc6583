//! Connection session lifecycle
//!
//! One task pair per connection: a receive loop pumping client frames into
//! the service layer and a send loop draining the outbound channel into the
//! socket. Whichever side ends first, a single cleanup path runs afterwards,
//! so abnormal termination releases the same state as a clean close.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use haggle_core::{DomainError, ServerEvent, Snowflake};
use haggle_service::{DraftOffer, MessagePipeline, OfferService};
use tokio::sync::mpsc;

use crate::protocol::{encode_event, ClientFrame};
use crate::server::GatewayState;

/// Generate a fresh session id
fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Serve one authenticated WebSocket connection until it closes
pub async fn run_session(state: GatewayState, socket: WebSocket, user_id: Snowflake) {
    let session_id = new_session_id();
    let buffer = state.config().realtime.outbound_buffer;
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(buffer);

    tracing::info!(session_id = %session_id, user_id = %user_id, "WebSocket connection established");

    if !attach_session(&state, &session_id, user_id, tx) {
        tracing::warn!(session_id = %session_id, "Failed to queue presence snapshot");
        cleanup_session(&state, &session_id, user_id);
        return;
    }

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbound pump: channel -> socket
    let session_id_send = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match encode_event(&event) {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::debug!(
                            session_id = %session_id_send,
                            "Socket closed while sending"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id_send,
                        error = %e,
                        "Failed to encode outbound event"
                    );
                }
            }
        }
        let _ = ws_sink.close().await;
    });

    // Inbound pump: socket -> service layer
    let state_recv = state.clone();
    let session_id_recv = session_id.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if handle_text(&state_recv, &session_id_recv, user_id, &text)
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        session_id = %session_id_recv,
                        "Binary frames not supported; closing"
                    );
                    return;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Pong replies are handled by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_recv, "Client closed connection");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id_recv,
                        error = %e,
                        "WebSocket error"
                    );
                    return;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {
            tracing::debug!(session_id = %session_id, "Send task ended");
        }
        _ = recv_task => {
            tracing::debug!(session_id = %session_id, "Receive task ended");
        }
    }

    cleanup_session(&state, &session_id, user_id);
}

/// Announce the presence transition, register the outbound channel, then
/// capture and send the snapshot.
///
/// The channel is registered before the snapshot is captured. A transition
/// on another connection therefore either lands in the snapshot or arrives
/// as a delta queued behind it; no window exists where both are missed. The
/// session's own 0 -> 1 delta goes out first, while its channel is still
/// unregistered, so the session never sees it ahead of the snapshot.
fn attach_session(
    state: &GatewayState,
    session_id: &str,
    user_id: Snowflake,
    tx: mpsc::Sender<ServerEvent>,
) -> bool {
    let services = state.services();

    if services.presence().mark_online(user_id, session_id) {
        services.rooms().broadcast_all(&ServerEvent::PresenceDelta {
            user_id,
            online: true,
        });
    }

    services.rooms().register(session_id, tx);
    let snapshot = ServerEvent::PresenceSnapshot {
        online_user_ids: services.presence().snapshot(),
    };
    services.rooms().send_to(session_id, &snapshot).is_ok()
}

/// Decode error on the wire; the frame cannot be attributed, so the
/// connection is closed rather than answered.
struct DecodeError;

async fn handle_text(
    state: &GatewayState,
    session_id: &str,
    user_id: Snowflake,
    text: &str,
) -> Result<(), DecodeError> {
    let frame = match ClientFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(
                session_id = %session_id,
                error = %e,
                "Failed to parse frame; closing connection"
            );
            return Err(DecodeError);
        }
    };

    tracing::trace!(session_id = %session_id, frame = frame.name(), "Frame received");

    if let Err(e) = handle_frame(state, session_id, user_id, frame).await {
        // Typed validation errors answer only the offending connection
        tracing::debug!(session_id = %session_id, code = e.code(), "Frame rejected");
        let _ = state
            .services()
            .rooms()
            .send_to(session_id, &ServerEvent::from_error(&e));
    }
    Ok(())
}

async fn handle_frame(
    state: &GatewayState,
    session_id: &str,
    user_id: Snowflake,
    frame: ClientFrame,
) -> Result<(), DomainError> {
    let services = state.services();

    match frame {
        ClientFrame::RoomJoin { conversation_id } => {
            let conversation = services
                .store()
                .conversation(conversation_id)
                .await?
                .ok_or(DomainError::ConversationNotFound(conversation_id))?;
            if !conversation.is_participant(user_id) {
                return Err(DomainError::NotParticipant {
                    user_id,
                    conversation_id,
                });
            }
            services.rooms().join(conversation_id, session_id);
            Ok(())
        }

        ClientFrame::RoomLeave { conversation_id } => {
            services.rooms().leave(conversation_id, session_id);
            Ok(())
        }

        ClientFrame::MessageSend {
            conversation_id,
            kind,
            content,
            offer,
        } => {
            let draft = offer.map(|o| DraftOffer {
                amount_minor: o.amount_minor,
                item_id: o.item_id,
            });
            MessagePipeline::new(services)
                .submit(conversation_id, user_id, kind, content, draft)
                .await?;
            Ok(())
        }

        ClientFrame::TypingStart { conversation_id } => {
            require_member(state, conversation_id, session_id, user_id)?;
            services.typing().start(conversation_id, user_id);
            services.rooms().broadcast(
                conversation_id,
                &ServerEvent::TypingUpdate {
                    conversation_id,
                    user_id,
                    is_typing: true,
                },
            );
            Ok(())
        }

        ClientFrame::TypingStop { conversation_id } => {
            if services.typing().stop(conversation_id, user_id) {
                services.rooms().broadcast(
                    conversation_id,
                    &ServerEvent::TypingUpdate {
                        conversation_id,
                        user_id,
                        is_typing: false,
                    },
                );
            }
            Ok(())
        }

        ClientFrame::OfferRespond {
            message_id,
            decision,
            ..
        } => {
            OfferService::new(services)
                .respond(message_id, user_id, decision)
                .await?;
            Ok(())
        }

        ClientFrame::MessageRead { conversation_id } => {
            MessagePipeline::new(services)
                .mark_read(conversation_id, user_id)
                .await
        }
    }
}

/// Typing frames are only honored from sessions joined to the room
fn require_member(
    state: &GatewayState,
    conversation_id: Snowflake,
    session_id: &str,
    user_id: Snowflake,
) -> Result<(), DomainError> {
    if state.services().rooms().is_member(conversation_id, session_id) {
        Ok(())
    } else {
        Err(DomainError::NotParticipant {
            user_id,
            conversation_id,
        })
    }
}

/// Release everything a session holds; runs exactly once per connection
fn cleanup_session(state: &GatewayState, session_id: &str, user_id: Snowflake) {
    tracing::info!(session_id = %session_id, user_id = %user_id, "Cleaning up connection");

    let services = state.services();
    services.rooms().unregister(session_id);

    if services.presence().mark_offline(user_id, session_id) {
        services.rooms().broadcast_all(&ServerEvent::PresenceDelta {
            user_id,
            online: false,
        });
    }
}
