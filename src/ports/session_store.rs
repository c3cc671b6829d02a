//! Session store port.
//!
//! Durable CRUD for session records and the chat messages each session
//! owns. The store is the single source of truth for which sessions exist
//! and what state they are in; nothing else keeps a copy.
//!
//! # Design
//!
//! - **Record-or-absent**: lookups and targeted updates return `None`
//!   when the room (or message) does not exist, never an error
//! - **Errors are I/O**: `Err` means the store could not answer
//!   (`DatabaseError`), or a uniqueness violation (`DuplicateRoom`)

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::{DomainError, MessageId, RoomId, Timestamp};
use crate::domain::session::{Session, SessionPatch};

/// Store adapter port for sessions and their chat.
///
/// Implementations must ensure:
/// - `room_id` uniqueness across all saved sessions
/// - chat messages are returned in append order
/// - deleting a session deletes its chat
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All stored sessions, oldest start first.
    async fn find_all_sessions(&self) -> Result<Vec<Session>, DomainError>;

    /// Stored sessions with status Started, oldest start first.
    async fn find_active_sessions(&self) -> Result<Vec<Session>, DomainError>;

    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DuplicateRoom` (with a `room_id` detail) if the room id is taken
    /// - `DatabaseError` on persistence failure
    async fn save_session(&self, session: &Session) -> Result<(), DomainError>;

    /// Find a session, including its chat.
    async fn find_session_by_room_id(&self, room_id: &RoomId)
        -> Result<Option<Session>, DomainError>;

    /// Apply field changes, returning the updated session.
    async fn update_session_by_room_id(
        &self,
        room_id: &RoomId,
        patch: &SessionPatch,
    ) -> Result<Option<Session>, DomainError>;

    /// Delete a session and its chat, returning the removed session.
    async fn delete_session_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Session>, DomainError>;

    /// Append a message to a session's chat.
    ///
    /// Returns `None` if the session does not exist.
    async fn append_chat_message(
        &self,
        room_id: &RoomId,
        message: &ChatMessage,
    ) -> Result<Option<ChatMessage>, DomainError>;

    /// Replace a message's text, returning the updated message.
    ///
    /// Returns `None` if the session or the message does not exist.
    async fn update_chat_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
        text: &str,
        edited_at: Timestamp,
    ) -> Result<Option<ChatMessage>, DomainError>;

    /// Remove a message, returning it.
    ///
    /// Returns `None` if the session or the message does not exist.
    async fn remove_chat_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> Result<Option<ChatMessage>, DomainError>;
}
