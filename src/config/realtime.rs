//! Real-time room configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::websocket::DEFAULT_CONNECTION_BUFFER;
use crate::application::ChatPolicy;
use crate::domain::chat::DEFAULT_MAX_MESSAGE_LENGTH;

/// Upper bound accepted for `max_message_length`.
const MESSAGE_LENGTH_CEILING: usize = 64 * 1024;

/// Chat and socket delivery settings
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Whether chat stays open once a session is stopped
    #[serde(default = "default_chat_after_stop")]
    pub chat_after_stop: bool,

    /// Maximum chat message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Outbound events queued per connection before deliveries are dropped
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
}

impl RealtimeConfig {
    /// Chat policy derived from these settings
    pub fn chat_policy(&self) -> ChatPolicy {
        ChatPolicy {
            chat_after_stop: self.chat_after_stop,
            max_message_length: self.max_message_length,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_message_length == 0 || self.max_message_length > MESSAGE_LENGTH_CEILING {
            return Err(ValidationError::InvalidMessageLength(MESSAGE_LENGTH_CEILING));
        }
        if self.connection_buffer == 0 {
            return Err(ValidationError::InvalidConnectionBuffer);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            chat_after_stop: default_chat_after_stop(),
            max_message_length: default_max_message_length(),
            connection_buffer: default_connection_buffer(),
        }
    }
}

fn default_chat_after_stop() -> bool {
    true
}

fn default_max_message_length() -> usize {
    DEFAULT_MAX_MESSAGE_LENGTH
}

fn default_connection_buffer() -> usize {
    DEFAULT_CONNECTION_BUFFER
}
