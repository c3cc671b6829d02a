//! Session aggregate entity.
//!
//! A session is one live broadcast, identified by its room id. It owns the
//! ordered chat sequence of that room.
//!
//! # Lifecycle
//!
//! ```text
//! start ──► Started ──► Stopped (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::chat::{ChatCursor, ChatMessage};
use crate::domain::foundation::{
    require_text, DomainError, ErrorCode, MessageId, RoomId, SessionStatus, Timestamp,
    ValidationError,
};

/// Maximum length for session title.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum length for owner email or username.
pub const MAX_OWNER_FIELD_LENGTH: usize = 254;

/// Identity of the session owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
}

impl Owner {
    /// Creates an owner; at least one of email or username must be present.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let email = email.into().trim().to_string();
        let username = username.into().trim().to_string();

        if email.is_empty() && username.is_empty() {
            return Err(ValidationError::empty_field("owner"));
        }
        if !email.is_empty() {
            require_text("email", &email, MAX_OWNER_FIELD_LENGTH)?;
            if !email.contains('@') {
                return Err(ValidationError::invalid_format("email", "missing @ symbol"));
            }
        }
        if !username.is_empty() {
            require_text("username", &username, MAX_OWNER_FIELD_LENGTH)?;
        }
        Ok(Self { email, username })
    }

    /// Reconstitute from persistence (no validation).
    pub fn reconstitute(email: String, username: String) -> Self {
        Self { email, username }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Field changes written through `UpdateSessionByRoomId`.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub status: Option<SessionStatus>,
    pub end_time: Option<Timestamp>,
}

impl SessionPatch {
    /// Patch that moves a session to Stopped at `end_time`.
    pub fn stop(end_time: Timestamp) -> Self {
        Self {
            title: None,
            status: Some(SessionStatus::Stopped),
            end_time: Some(end_time),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.end_time.is_none()
    }
}

/// Session aggregate.
///
/// # Invariants
///
/// - `room_id` is unique across all sessions ever created
/// - `end_time` is present iff `status` is `Stopped`
/// - `status` only moves Started -> Stopped
/// - `chat` is in append order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    room_id: RoomId,
    #[serde(flatten)]
    owner: Owner,
    title: String,
    status: SessionStatus,
    start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<Timestamp>,
    #[serde(default)]
    chat: Vec<ChatMessage>,
    #[serde(skip)]
    chat_cursor: ChatCursor,
}

impl Session {
    /// Start a new live session.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if title is empty or too long
    pub fn start(
        room_id: RoomId,
        owner: Owner,
        title: String,
        start_time: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::validate_title(&title)?;

        Ok(Self {
            room_id,
            owner,
            title: title.trim().to_string(),
            status: SessionStatus::Started,
            start_time,
            end_time: None,
            chat: Vec::new(),
            chat_cursor: ChatCursor::default(),
        })
    }

    /// Reconstitute a session from persistence (no validation).
    ///
    /// The cursor is moved past any stored message it lags behind.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        room_id: RoomId,
        owner: Owner,
        title: String,
        status: SessionStatus,
        start_time: Timestamp,
        end_time: Option<Timestamp>,
        chat: Vec<ChatMessage>,
        mut chat_cursor: ChatCursor,
    ) -> Self {
        for message in &chat {
            chat_cursor.advance(message);
        }
        Self {
            room_id,
            owner,
            title,
            status,
            start_time,
            end_time,
            chat,
            chat_cursor,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    pub fn start_time(&self) -> &Timestamp {
        &self.start_time
    }

    pub fn end_time(&self) -> Option<&Timestamp> {
        self.end_time.as_ref()
    }

    /// Chat messages in append order.
    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    /// Position of the next message; survives deletes.
    pub fn chat_cursor(&self) -> &ChatCursor {
        &self.chat_cursor
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle planning
    // ─────────────────────────────────────────────────────────────────────────

    /// Plans the write that stops this session.
    ///
    /// Returns `None` when the session is already stopped: the stored end
    /// time is kept and nothing needs writing.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `end_time` precedes the start time
    pub fn plan_stop(&self, end_time: Timestamp) -> Result<Option<SessionPatch>, DomainError> {
        if !self.status.is_live() {
            return Ok(None);
        }
        self.check_end_time(&end_time)?;
        Ok(Some(SessionPatch::stop(end_time)))
    }

    /// Validates and normalizes an administrative patch against this session.
    ///
    /// A patch that stops the session without an end time gets `now`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for an empty patch or a bad title
    /// - `InvalidStateTransition` for reopening, re-stopping with a new end
    ///   time, or an end time on a live session
    pub fn plan_patch(&self, patch: SessionPatch, now: Timestamp) -> Result<SessionPatch, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::validation("patch", "Nothing to update"));
        }
        if let Some(title) = &patch.title {
            Self::validate_title(title)?;
        }

        let mut planned = SessionPatch {
            title: patch.title.map(|t| t.trim().to_string()),
            status: None,
            end_time: None,
        };

        let target = patch.status.unwrap_or(self.status);
        match (self.status, target) {
            (SessionStatus::Started, SessionStatus::Started) => {
                if patch.end_time.is_some() {
                    return Err(DomainError::new(
                        ErrorCode::InvalidStateTransition,
                        "End time can only be set when the session stops",
                    ));
                }
            }
            (SessionStatus::Started, SessionStatus::Stopped) => {
                let end_time = patch.end_time.unwrap_or(now);
                self.check_end_time(&end_time)?;
                planned.status = Some(SessionStatus::Stopped);
                planned.end_time = Some(end_time);
            }
            (SessionStatus::Stopped, SessionStatus::Started) => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    "A stopped session cannot be reopened",
                ));
            }
            (SessionStatus::Stopped, SessionStatus::Stopped) => {
                if patch.end_time.is_some() && patch.end_time.as_ref() != self.end_time.as_ref() {
                    return Err(DomainError::new(
                        ErrorCode::InvalidStateTransition,
                        "End time is already recorded",
                    ));
                }
            }
        }

        if planned.is_empty() {
            return Err(DomainError::validation("patch", "Nothing to update"));
        }
        Ok(planned)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Store-side mutations (used by in-process store adapters)
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies a planned patch.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = Some(end_time);
        }
    }

    /// Appends a message to the chat sequence and advances the cursor.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat_cursor.advance(&message);
        self.chat.push(message);
    }

    /// Replaces a message body, returning the updated message.
    pub fn edit_message(
        &mut self,
        message_id: &MessageId,
        text: String,
        at: Timestamp,
    ) -> Option<ChatMessage> {
        let slot = self.chat.iter_mut().find(|m| m.id() == message_id)?;
        *slot = slot.clone().edited(text, at);
        Some(slot.clone())
    }

    /// Removes a message, returning it.
    pub fn remove_message(&mut self, message_id: &MessageId) -> Option<ChatMessage> {
        let pos = self.chat.iter().position(|m| m.id() == message_id)?;
        Some(self.chat.remove(pos))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn check_end_time(&self, end_time: &Timestamp) -> Result<(), DomainError> {
        if end_time.is_before(&self.start_time) {
            return Err(DomainError::validation(
                "end_time",
                "End time cannot precede the start time",
            ));
        }
        Ok(())
    }

    fn validate_title(title: &str) -> Result<(), DomainError> {
        require_text("title", title, MAX_TITLE_LENGTH)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::DEFAULT_MAX_MESSAGE_LENGTH;

    fn owner() -> Owner {
        Owner::new("a@example.com", "a").unwrap()
    }

    fn started() -> Session {
        Session::start(
            RoomId::new("R1").unwrap(),
            owner(),
            "demo".to_string(),
            Timestamp::now(),
        )
        .unwrap()
    }

    fn stopped() -> Session {
        let mut session = started();
        let end = session.start_time().plus_secs(10);
        session.apply(&SessionPatch::stop(end));
        session
    }

    // Construction

    #[test]
    fn new_session_is_started_without_end_time() {
        let session = started();
        assert_eq!(session.status(), SessionStatus::Started);
        assert!(session.end_time().is_none());
        assert!(session.chat().is_empty());
    }

    #[test]
    fn start_rejects_blank_title() {
        let result = Session::start(RoomId::generate(), owner(), "  ".into(), Timestamp::now());
        assert!(result.is_err());
    }

    #[test]
    fn owner_requires_email_or_username() {
        assert!(Owner::new("", "").is_err());
        assert!(Owner::new("", "streamer").is_ok());
        assert!(Owner::new("a@b.c", "").is_ok());
        assert!(Owner::new("not-an-email", "").is_err());
    }

    // Stop planning

    #[test]
    fn plan_stop_sets_status_and_end_time() {
        let session = started();
        let end = session.start_time().plus_secs(5);
        let patch = session.plan_stop(end).unwrap().unwrap();
        assert_eq!(patch.status, Some(SessionStatus::Stopped));
        assert_eq!(patch.end_time, Some(end));
    }

    #[test]
    fn plan_stop_on_stopped_session_writes_nothing() {
        let session = stopped();
        let plan = session.plan_stop(Timestamp::now().plus_secs(100)).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn plan_stop_rejects_end_before_start() {
        let session = started();
        let result = session.plan_stop(session.start_time().plus_secs(-1));
        assert!(result.is_err());
    }

    // Patch planning

    #[test]
    fn patch_stop_without_end_time_uses_now() {
        let session = started();
        let now = session.start_time().plus_secs(3);
        let patch = SessionPatch {
            status: Some(SessionStatus::Stopped),
            ..Default::default()
        };
        let planned = session.plan_patch(patch, now).unwrap();
        assert_eq!(planned.end_time, Some(now));
    }

    #[test]
    fn patch_cannot_reopen_stopped_session() {
        let session = stopped();
        let patch = SessionPatch {
            status: Some(SessionStatus::Started),
            ..Default::default()
        };
        let err = session.plan_patch(patch, Timestamp::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn patch_cannot_replace_recorded_end_time() {
        let session = stopped();
        let patch = SessionPatch {
            end_time: Some(Timestamp::now().plus_secs(500)),
            ..Default::default()
        };
        let err = session.plan_patch(patch, Timestamp::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn patch_rejects_end_time_on_live_session() {
        let session = started();
        let patch = SessionPatch {
            end_time: Some(Timestamp::now()),
            ..Default::default()
        };
        assert!(session.plan_patch(patch, Timestamp::now()).is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let session = started();
        let err = session
            .plan_patch(SessionPatch::default(), Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn title_patch_is_trimmed() {
        let session = stopped();
        let patch = SessionPatch {
            title: Some("  renamed ".into()),
            ..Default::default()
        };
        let planned = session.plan_patch(patch, Timestamp::now()).unwrap();
        assert_eq!(planned.title.as_deref(), Some("renamed"));
        assert!(planned.status.is_none());
    }

    // Chat mutations

    #[test]
    fn edit_and_remove_target_message_by_id() {
        let mut session = started();
        let msg = compose(&session, "hi");
        let id = *msg.id();
        session.push_message(msg);

        let edited = session
            .edit_message(&id, "bye".into(), Timestamp::now())
            .unwrap();
        assert_eq!(edited.text(), "bye");
        assert_eq!(session.chat()[0].text(), "bye");

        assert!(session.remove_message(&id).is_some());
        assert!(session.remove_message(&id).is_none());
        assert!(session.edit_message(&id, "x".into(), Timestamp::now()).is_none());
    }

    fn compose(session: &Session, text: &str) -> ChatMessage {
        ChatMessage::compose(
            "a",
            text,
            session.chat_cursor(),
            Timestamp::now(),
            DEFAULT_MAX_MESSAGE_LENGTH,
        )
        .unwrap()
    }

    #[test]
    fn removing_newest_message_keeps_cursor() {
        let mut session = started();
        let first = compose(&session, "zero");
        session.push_message(first);
        let second = compose(&session, "one");
        let second_id = *second.id();
        let second_at = *second.timestamp();
        session.push_message(second);

        session.remove_message(&second_id);

        assert_eq!(session.chat_cursor().next_sequence(), 2);
        assert_eq!(session.chat_cursor().last_timestamp(), Some(&second_at));
        assert_eq!(compose(&session, "two").sequence(), 2);
    }

    #[test]
    fn reconstitute_heals_lagging_cursor() {
        let session = started();
        let msg = compose(&session, "hi");
        let restored = Session::reconstitute(
            session.room_id().clone(),
            session.owner().clone(),
            session.title().to_string(),
            session.status(),
            *session.start_time(),
            None,
            vec![msg],
            ChatCursor::default(),
        );
        assert_eq!(restored.chat_cursor().next_sequence(), 1);
    }

    #[test]
    fn serializes_owner_fields_flat() {
        let json = serde_json::to_value(started()).unwrap();
        assert_eq!(json["roomId"], "R1");
        assert_eq!(json["email"], "a@example.com");
        assert_eq!(json["status"], "started");
        assert!(json.get("endTime").is_none());
        assert!(json.get("chatCursor").is_none());
    }
}
