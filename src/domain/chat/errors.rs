//! Chat-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, MessageId, RoomId, ValidationError};

/// Errors surfaced by chat operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The room does not reference an existing session.
    #[error("Session not found: {0}")]
    RoomNotFound(RoomId),

    /// The message id does not exist in the room.
    #[error("Message {message_id} not found in room {room_id}")]
    MessageNotFound {
        room_id: RoomId,
        message_id: MessageId,
    },

    /// Chat is closed because the session has stopped.
    #[error("Session {0} has stopped; chat is closed")]
    RoomClosed(RoomId),

    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// The durable store could not complete the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ChatError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::RoomNotFound(_) => ErrorCode::SessionNotFound,
            ChatError::MessageNotFound { .. } => ErrorCode::MessageNotFound,
            ChatError::RoomClosed(_) => ErrorCode::SessionClosed,
            ChatError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            ChatError::StoreUnavailable(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<ValidationError> for ChatError {
    fn from(err: ValidationError) -> Self {
        ChatError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ChatError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => ChatError::ValidationFailed {
                field: err.field().unwrap_or("unknown").to_string(),
                message: err.message,
            },
            _ => ChatError::StoreUnavailable(err.to_string()),
        }
    }
}
