//! HTTP adapters - REST API implementations.
//!
//! Each area has its own router; `live_router` merges them with the
//! WebSocket endpoint into the full surface.

pub mod chat;
pub mod error;
pub mod session;

use std::sync::Arc;

use axum::Router;

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::application::{ChatFanout, SessionRegistry};

pub use chat::{chat_routes, ChatHandlers};
pub use error::ErrorResponse;
pub use session::{session_routes, SessionHandlers};

/// The complete HTTP and WebSocket surface, without middleware.
pub fn live_router(
    registry: Arc<SessionRegistry>,
    chat: Arc<ChatFanout>,
    websocket: WebSocketState,
) -> Router {
    Router::new()
        .merge(session_routes(SessionHandlers::new(registry)))
        .merge(chat_routes(ChatHandlers::new(chat)))
        .merge(websocket_router().with_state(websocket))
}
