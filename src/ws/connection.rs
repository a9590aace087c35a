//! WebSocket connection task.
//!
//! One task per connection, multiplexing three event sources in a single
//! select loop: inbound frames from the peer, typed [`Push`]es queued by
//! the router/broadcaster, and the probe timer. The task owns the socket
//! exclusively; everything else reaches it through its outbox channel.

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket, close_code};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::liveness::{ProbeEvent, ProbeTimer};
use super::messages::{ClientFrame, ServerFrame};
use crate::app_state::AppState;
use crate::domain::{ConnectionHandle, ConnectionId, Identity, MessageDraft, Push};
use crate::error::GatewayError;

/// Runs the lifecycle of one authenticated WebSocket connection.
///
/// Registers with the chat service (which broadcasts presence), pumps the
/// select loop until the peer disconnects or the probe timer evicts it,
/// then unregisters (which broadcasts presence again).
pub async fn run_connection(socket: WebSocket, identity: Identity, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbox, mut pushes) = mpsc::unbounded_channel::<Push>();
    let connection_id = ConnectionId::new();

    state
        .chat
        .join(ConnectionHandle::new(connection_id, identity.clone(), outbox))
        .await;

    let mut probe = ProbeTimer::new(state.ws.ping_interval, state.ws.pong_timeout);
    let mut timed_out = false;

    loop {
        tokio::select! {
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_inbound(&state, &identity, text.as_str()).await;
                    }
                    Some(Ok(WsMessage::Pong(_))) => probe.observe_reply(),
                    Some(Ok(WsMessage::Ping(payload))) => {
                        if ws_tx.send(WsMessage::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(WsMessage::Binary(_))) => {
                        tracing::debug!(user = %identity.id, "binary frame ignored");
                    }
                    Some(Err(e)) => {
                        tracing::warn!(user = %identity.id, error = %e, "ws receive error");
                        break;
                    }
                }
            }
            push = pushes.recv() => {
                match push {
                    Some(push) => {
                        let frame = ServerFrame::from(push);
                        let Ok(json) = serde_json::to_string(&frame) else {
                            tracing::error!(user = %identity.id, "push serialization failed");
                            continue;
                        };
                        if ws_tx.send(WsMessage::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            event = probe.next_event() => {
                match event {
                    ProbeEvent::SendProbe => {
                        if ws_tx.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
                            break;
                        }
                    }
                    ProbeEvent::TimedOut => {
                        timed_out = true;
                        break;
                    }
                }
            }
        }
    }

    if timed_out {
        tracing::warn!(
            user = %identity,
            connection = %connection_id,
            "liveness timeout, terminating connection"
        );
        let _ = ws_tx
            .send(WsMessage::Close(Some(CloseFrame {
                code: close_code::AWAY,
                reason: "liveness timeout".into(),
            })))
            .await;
    }

    // Eviction and clean close share one path: unregister, then the
    // service broadcasts presence only if this removal changed anything.
    state.chat.leave(connection_id).await;
    tracing::debug!(user = %identity.id, connection = %connection_id, "ws connection closed");
}

/// Handles one inbound text frame: parse, validate, store the attachment,
/// and hand the draft to the router.
///
/// Invalid events (unparseable, no recipient, empty body) are dropped
/// silently per the wire contract: no persistence, no delivery, nothing
/// sent back.
async fn handle_inbound(state: &AppState, sender: &Identity, raw: &str) {
    let Ok(frame) = serde_json::from_str::<ClientFrame>(raw) else {
        tracing::debug!(user = %sender.id, "malformed frame dropped");
        return;
    };
    let Some(recipient) = frame.recepient else {
        tracing::debug!(user = %sender.id, "frame without recipient dropped");
        return;
    };

    let file = match frame.file {
        Some(attachment) => {
            match state
                .uploads
                .save_data_url(&attachment.name, &attachment.data)
                .await
            {
                Ok(filename) => Some(filename),
                Err(e) => {
                    tracing::warn!(user = %sender.id, error = %e, "attachment not stored");
                    return;
                }
            }
        }
        None => None,
    };

    let draft = MessageDraft::new(recipient, frame.text, file);
    match state.chat.route(sender, draft).await {
        Ok(_) => {}
        Err(GatewayError::InvalidMessage) => {
            tracing::debug!(user = %sender.id, "empty message dropped");
        }
        Err(e) => {
            tracing::warn!(user = %sender.id, error = %e, "message not persisted");
        }
    }
}
