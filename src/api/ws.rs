//! src/api/ws.rs
//!
//! Handles WebSocket connection logic for the console.

use crate::{
    api::{protocol::ConsoleMessage, ApiState},
    domain::Action,
    error::Result,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::stream::StreamExt;
use tokio::sync::broadcast::error::RecvError;

/// The handler for WebSocket upgrade requests.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send(socket: &mut WebSocket, msg: &ConsoleMessage) -> Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}

/// Manages a single console connection: an initial snapshot, a fresh snapshot
/// on every view change, every notice, and actions from the client.
async fn handle_socket(mut socket: WebSocket, state: ApiState) {
    tracing::info!("New console client connected.");
    let mut view_rx = state.view_rx.clone();
    let mut notice_rx = state.notice_tx.subscribe();

    let initial = ConsoleMessage::Snapshot(view_rx.borrow_and_update().clone());
    if let Err(e) = send(&mut socket, &initial).await {
        tracing::warn!(error = %e, "Failed to send initial snapshot to console client. Closing.");
        return;
    }

    loop {
        tokio::select! {
            result = view_rx.changed() => {
                if result.is_err() {
                    tracing::info!("View channel closed. Disconnecting client.");
                    break;
                }
                let snapshot = ConsoleMessage::Snapshot(view_rx.borrow_and_update().clone());
                if let Err(e) = send(&mut socket, &snapshot).await {
                    tracing::info!(error = %e, "Console client disconnected during view update.");
                    return;
                }
            },

            result = notice_rx.recv() => {
                match result {
                    Ok(notice) => {
                        if let Err(e) = send(&mut socket, &ConsoleMessage::Notice(notice)).await {
                            tracing::info!(error = %e, "Console client disconnected during notice.");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notice channel lagged. Client missed notices.");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Notice channel closed. Disconnecting client.");
                        break;
                    }
                }
            },

            Some(Ok(msg)) = socket.next() => {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<Action>(&text) {
                        Ok(action) => {
                            if state.action_tx.send(action).await.is_err() {
                                tracing::info!("Engine is gone. Disconnecting client.");
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Ignoring unparseable console action"),
                    },
                    Message::Close(_) => {
                        tracing::info!("Console client sent close message.");
                        break;
                    }
                    _ => {}
                }
            },

            else => {
                tracing::info!("Console connection closed or a channel dropped.");
                break;
            }
        }
    }
}
