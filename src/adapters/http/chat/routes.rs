//! HTTP routes for chat endpoints.

use axum::{
    routing::{get, patch},
    Router,
};

use super::handlers::{delete_message, edit_message, list_messages, post_message, ChatHandlers};

/// Creates the chat router, rooted at `/sessions/:room_id/messages`.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route(
            "/sessions/:room_id/messages",
            get(list_messages).post(post_message),
        )
        .route(
            "/sessions/:room_id/messages/:message_id",
            patch(edit_message).delete(delete_message),
        )
        .with_state(handlers)
}
