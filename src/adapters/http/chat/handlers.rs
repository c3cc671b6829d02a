//! HTTP handlers for chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::adapters::http::error::{bad_request, handle_chat_error};
use crate::application::ChatFanout;
use crate::domain::foundation::{MessageId, RoomId};

/// Body of `POST /sessions/:room_id/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub author: String,
    pub text: String,
}

/// Body of `PATCH /sessions/:room_id/messages/:message_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct EditMessageRequest {
    pub text: String,
}

#[derive(Clone)]
pub struct ChatHandlers {
    chat: Arc<ChatFanout>,
}

impl ChatHandlers {
    pub fn new(chat: Arc<ChatFanout>) -> Self {
        Self { chat }
    }
}

fn parse_ids(room_id: String, message_id: &str) -> Result<(RoomId, MessageId), Response> {
    let room_id = RoomId::new(room_id).map_err(|_| bad_request("Invalid room ID"))?;
    let message_id = message_id
        .parse::<MessageId>()
        .map_err(|_| bad_request("Invalid message ID"))?;
    Ok((room_id, message_id))
}

/// GET /sessions/:room_id/messages
pub async fn list_messages(
    State(handlers): State<ChatHandlers>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match RoomId::new(room_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid room ID"),
    };

    match handlers.chat.list_messages(&room_id).await {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

/// POST /sessions/:room_id/messages
pub async fn post_message(
    State(handlers): State<ChatHandlers>,
    Path(room_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Response {
    let room_id = match RoomId::new(room_id) {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid room ID"),
    };

    match handlers
        .chat
        .post_message(&room_id, &req.author, &req.text)
        .await
    {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

/// PATCH /sessions/:room_id/messages/:message_id
pub async fn edit_message(
    State(handlers): State<ChatHandlers>,
    Path((room_id, message_id)): Path<(String, String)>,
    Json(req): Json<EditMessageRequest>,
) -> Response {
    let (room_id, message_id) = match parse_ids(room_id, &message_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers
        .chat
        .edit_message(&room_id, &message_id, &req.text)
        .await
    {
        Ok(message) => (StatusCode::OK, Json(message)).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

/// DELETE /sessions/:room_id/messages/:message_id
pub async fn delete_message(
    State(handlers): State<ChatHandlers>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Response {
    let (room_id, message_id) = match parse_ids(room_id, &message_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match handlers.chat.delete_message(&room_id, &message_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_chat_error(e),
    }
}
