//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the live rooms domain.

mod errors;
mod ids;
mod session_status;
mod timestamp;

pub use errors::{require_text, DomainError, ErrorCode, ValidationError};
pub use ids::{ConnectionId, MessageId, RoomId, MAX_ROOM_ID_LENGTH};
pub use session_status::SessionStatus;
pub use timestamp::Timestamp;
