//! WebSocket upgrade handler for live room connections.
//!
//! Manages the connection lifecycle:
//! 1. Upgrade to WebSocket and register with the hub
//! 2. Send the `connected` greeting with the server-assigned id
//! 3. Drain the outbound queue and dispatch inbound commands until either
//!    side stops
//! 4. Run disconnect cleanup exactly once

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;

use crate::application::{ClientCommand, CommandDispatcher};
use crate::domain::foundation::{ConnectionId, ErrorCode};
use crate::domain::realtime::LiveEvent;
use crate::ports::BroadcastBus;

use super::hub::ConnectionHub;
use super::messages::ClientMessage;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<ConnectionHub>,
    pub dispatcher: CommandDispatcher,
}

impl WebSocketState {
    pub fn new(hub: Arc<ConnectionHub>, dispatcher: CommandDispatcher) -> Self {
        Self { hub, dispatcher }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let (connection_id, mut outbound) = state.hub.register().await;

    tracing::info!(connection_id = %connection_id, "Client connected");

    if let Err(e) = send_event(&mut sender, &LiveEvent::Connected { connection_id }).await {
        tracing::debug!(connection_id = %connection_id, "Failed to send greeting: {}", e);
        disconnect(&state, connection_id).await;
        return;
    }

    // Forward queued events to the client
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            if let Err(e) = send_event(&mut sender, &event).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Dispatch incoming commands
    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    handle_text(&recv_state, connection_id, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Received unsupported binary message"
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level, answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    until_either_finishes(send_task, recv_task).await;
    disconnect(&state, connection_id).await;
}

/// Waits for one task to finish, then aborts the other and waits for it
/// to stop, so nothing from this connection runs after cleanup starts.
async fn until_either_finishes(mut first: JoinHandle<()>, mut second: JoinHandle<()>) {
    let first_finished = tokio::select! {
        _ = &mut first => true,
        _ = &mut second => false,
    };

    let other = if first_finished { second } else { first };
    other.abort();
    // Cancelled or panicked, either way it is done
    let _ = other.await;
}

/// Decode one text frame and dispatch it, replying to the sender only.
async fn handle_text(state: &WebSocketState, connection_id: ConnectionId, text: &str) {
    let command = match ClientMessage::parse(text) {
        Ok(message) => message
            .into_command()
            .map_err(|e| LiveEvent::error(ErrorCode::ValidationFailed, e.to_string())),
        Err(e) => Err(LiveEvent::error(
            ErrorCode::ValidationFailed,
            format!("Unrecognized message: {}", e),
        )),
    };

    let reply = match command {
        Ok(command) => state.dispatcher.dispatch(connection_id, command).await,
        Err(error) => Some(error),
    };

    if let Some(reply) = reply {
        if let Err(e) = state.hub.send_to(&connection_id, reply).await {
            tracing::debug!(connection_id = %connection_id, "Reply dropped: {}", e);
        }
    }
}

async fn disconnect(state: &WebSocketState, connection_id: ConnectionId) {
    state
        .dispatcher
        .dispatch(connection_id, ClientCommand::Disconnect)
        .await;
    state.hub.unregister(&connection_id).await;
    tracing::info!(connection_id = %connection_id, "Client disconnected");
}

/// Send a JSON event over the WebSocket.
async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &LiveEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
