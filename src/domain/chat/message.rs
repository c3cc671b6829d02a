//! Chat message entity, owned by a live session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{require_text, MessageId, Timestamp, ValidationError};

use super::cursor::ChatCursor;

/// Maximum length for a message author's display name.
pub const MAX_AUTHOR_LENGTH: usize = 100;

/// Default maximum length for a message body.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 2000;

/// One chat message in a room.
///
/// # Invariants
///
/// - `id` is unique
/// - `sequence` is strictly increasing in append order within a room
/// - `timestamp` is non-decreasing in append order within a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    id: MessageId,
    sequence: u64,
    author: String,
    text: String,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edited_at: Option<Timestamp>,
}

impl ChatMessage {
    /// Compose the next message at `cursor` in its room.
    ///
    /// The sequence comes from the cursor and the timestamp is clamped so
    /// it never goes backwards relative to the last accepted message. Author
    /// and text are stored trimmed.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if author or text is blank or too long
    pub fn compose(
        author: impl Into<String>,
        text: impl Into<String>,
        cursor: &ChatCursor,
        now: Timestamp,
        max_text_length: usize,
    ) -> Result<Self, ValidationError> {
        let author = author.into();
        let text = text.into();
        require_text("author", &author, MAX_AUTHOR_LENGTH)?;
        Self::validate_text(&text, max_text_length)?;

        let timestamp = match cursor.last_timestamp() {
            Some(last) => now.not_before(*last),
            None => now,
        };

        Ok(Self {
            id: MessageId::new(),
            sequence: cursor.next_sequence(),
            author: author.trim().to_string(),
            text: text.trim().to_string(),
            timestamp,
            edited_at: None,
        })
    }

    /// Reconstitute a message from persistence (no validation).
    pub fn reconstitute(
        id: MessageId,
        sequence: u64,
        author: String,
        text: String,
        timestamp: Timestamp,
        edited_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            sequence,
            author,
            text,
            timestamp,
            edited_at,
        }
    }

    /// Validates a message body.
    pub fn validate_text(text: &str, max_length: usize) -> Result<(), ValidationError> {
        require_text("text", text, max_length)
    }

    /// Returns this message with a replaced body.
    pub fn edited(mut self, text: String, at: Timestamp) -> Self {
        self.text = text;
        self.edited_at = Some(at);
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn edited_at(&self) -> Option<&Timestamp> {
        self.edited_at.as_ref()
    }
}
