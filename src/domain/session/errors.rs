//! Session-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, RoomId, ValidationError};

/// Session-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session exists for the room.
    #[error("Session not found: {0}")]
    NotFound(RoomId),

    /// A session already exists for the room.
    #[error("Session already exists for room {0}")]
    Conflict(RoomId),

    /// Invalid state for operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Validation failed.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// The durable store could not complete the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SessionError {
    pub fn not_found(room_id: RoomId) -> Self {
        SessionError::NotFound(room_id)
    }
    pub fn conflict(room_id: RoomId) -> Self {
        SessionError::Conflict(room_id)
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        SessionError::StoreUnavailable(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::Conflict(_) => ErrorCode::DuplicateRoom,
            SessionError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            SessionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SessionError::StoreUnavailable(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::validation(err.field().to_string(), err.to_string())
    }
}

/// Store errors that name a room (`DuplicateRoom`) carry it in the
/// `room_id` detail.
impl From<DomainError> for SessionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::DuplicateRoom => match err.details.get("room_id").map(RoomId::new) {
                Some(Ok(room_id)) => SessionError::Conflict(room_id),
                _ => SessionError::InvalidState(err.message),
            },
            ErrorCode::InvalidStateTransition | ErrorCode::SessionClosed => {
                SessionError::InvalidState(err.message)
            }
            ErrorCode::ValidationFailed => SessionError::ValidationFailed {
                field: err.field().unwrap_or("unknown").to_string(),
                message: err.message,
            },
            _ => SessionError::StoreUnavailable(err.to_string()),
        }
    }
}
