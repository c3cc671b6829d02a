//! Per-room chat position that deletes never rewind.

use crate::domain::foundation::Timestamp;

use super::message::ChatMessage;

/// Where the next message in a room goes.
///
/// Tracks every message ever accepted, so removing the newest message
/// does not hand its sequence number or timestamp floor to the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatCursor {
    next_sequence: u64,
    last_timestamp: Option<Timestamp>,
}

impl ChatCursor {
    pub fn new(next_sequence: u64, last_timestamp: Option<Timestamp>) -> Self {
        Self {
            next_sequence,
            last_timestamp,
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn last_timestamp(&self) -> Option<&Timestamp> {
        self.last_timestamp.as_ref()
    }

    /// Moves past `message`. Never moves backwards.
    pub fn advance(&mut self, message: &ChatMessage) {
        self.next_sequence = self.next_sequence.max(message.sequence() + 1);
        self.last_timestamp = Some(match self.last_timestamp {
            Some(last) => (*message.timestamp()).not_before(last),
            None => *message.timestamp(),
        });
    }
}
