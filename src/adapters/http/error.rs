//! Error responses shared by the REST endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::chat::ChatError;
use crate::domain::foundation::ErrorCode;
use crate::domain::session::SessionError;

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Maps an error code to its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::SessionNotFound | ErrorCode::MessageNotFound => StatusCode::NOT_FOUND,
        ErrorCode::DuplicateRoom
        | ErrorCode::InvalidStateTransition
        | ErrorCode::SessionClosed => StatusCode::CONFLICT,
        ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Response for a rejected request body or path parameter.
pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(message)),
    )
        .into_response()
}

pub fn handle_session_error(error: SessionError) -> Response {
    let code = error.code();
    let body = match &error {
        SessionError::ValidationFailed { field, .. } => {
            ErrorResponse::new(code, error.to_string()).with_details(serde_json::json!({ "field": field }))
        }
        SessionError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "Session store failure");
            ErrorResponse::new(code, "Session store unavailable")
        }
        _ => ErrorResponse::new(code, error.to_string()),
    };
    (status_for(code), Json(body)).into_response()
}

pub fn handle_chat_error(error: ChatError) -> Response {
    let code = error.code();
    let body = match &error {
        ChatError::ValidationFailed { field, .. } => {
            ErrorResponse::new(code, error.to_string()).with_details(serde_json::json!({ "field": field }))
        }
        ChatError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "Chat store failure");
            ErrorResponse::new(code, "Session store unavailable")
        }
        _ => ErrorResponse::new(code, error.to_string()),
    };
    (status_for(code), Json(body)).into_response()
}
