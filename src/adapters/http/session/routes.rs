//! HTTP routes for session endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    create_session, delete_session, list_active, list_sessions, live, stop_session,
    update_session, SessionHandlers,
};

/// Creates the session router with all endpoints.
pub fn session_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/live", get(list_sessions).post(live))
        .route("/live/active", get(list_active))
        .route("/sessions", post(create_session))
        .route("/sessions/:room_id", patch(update_session).delete(delete_session))
        .route("/sessions/:room_id/stop", post(stop_session))
        .with_state(handlers)
}
