//! HTTP handlers for session endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{bad_request, handle_session_error};
use crate::application::SessionRegistry;
use crate::domain::foundation::{RoomId, Timestamp};

use super::dto::{
    CreateSessionRequest, LiveAction, LiveRequest, StopSessionRequest, UpdateSessionRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionHandlers {
    registry: Arc<SessionRegistry>,
}

impl SessionHandlers {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /live - Every stored session
pub async fn list_sessions(State(handlers): State<SessionHandlers>) -> Response {
    match handlers.registry.list_sessions().await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// POST /live - Start or stop, selected by `status`
pub async fn live(
    State(handlers): State<SessionHandlers>,
    Json(req): Json<LiveRequest>,
) -> Response {
    let action = match req.into_action() {
        Ok(action) => action,
        Err(e) => return bad_request(e.to_string()),
    };

    match action {
        LiveAction::Start(cmd) => match handlers.registry.create_session(cmd).await {
            Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
            Err(e) => handle_session_error(e),
        },
        LiveAction::Stop { room_id, end_time } => {
            match handlers.registry.stop_session(&room_id, end_time).await {
                Ok(session) => (StatusCode::OK, Json(session)).into_response(),
                Err(e) => handle_session_error(e),
            }
        }
    }
}

/// GET /live/active - Sessions currently live
pub async fn list_active(State(handlers): State<SessionHandlers>) -> Response {
    match handlers.registry.list_active().await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// POST /sessions - Start a session
pub async fn create_session(
    State(handlers): State<SessionHandlers>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let cmd = match req.into_command() {
        Ok(cmd) => cmd,
        Err(e) => return bad_request(e.to_string()),
    };

    match handlers.registry.create_session(cmd).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// POST /sessions/:room_id/stop - Stop a session
pub async fn stop_session(
    State(handlers): State<SessionHandlers>,
    Path(room_id): Path<String>,
    body: Option<Json<StopSessionRequest>>,
) -> Response {
    let room_id = match RoomId::new(room_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid room ID"),
    };
    let end_time = body
        .and_then(|Json(req)| req.end_time)
        .map(Timestamp::from_datetime);

    match handlers.registry.stop_session(&room_id, end_time).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// PATCH /sessions/:room_id - Administrative update
pub async fn update_session(
    State(handlers): State<SessionHandlers>,
    Path(room_id): Path<String>,
    Json(req): Json<UpdateSessionRequest>,
) -> Response {
    let room_id = match RoomId::new(room_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid room ID"),
    };
    let patch = match req.into_patch() {
        Ok(patch) => patch,
        Err(e) => return bad_request(e.to_string()),
    };

    match handlers.registry.update_session(&room_id, patch).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// DELETE /sessions/:room_id - Delete a session and its chat
pub async fn delete_session(
    State(handlers): State<SessionHandlers>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match RoomId::new(room_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid room ID"),
    };

    match handlers.registry.delete_session(&room_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_session_error(e),
    }
}
