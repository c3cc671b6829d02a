//! Real-time events delivered to connected clients.
//!
//! Every event serializes as `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::{ConnectionId, MessageId, RoomId};
use crate::domain::session::Session;

use super::participant::Participant;

/// Server to client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum LiveEvent {
    // Session lifecycle (global)
    SessionStarted(Session),
    #[serde(rename_all = "camelCase")]
    SessionStopped { room_id: RoomId },
    SessionUpdated(Session),
    #[serde(rename_all = "camelCase")]
    SessionDeleted { room_id: RoomId },

    // Chat (room-scoped)
    NewMessage(ChatMessage),
    MessageUpdated(ChatMessage),
    #[serde(rename_all = "camelCase")]
    MessageDeleted { message_id: MessageId },

    // Signaling and presence
    ReceiveSignal {
        from: ConnectionId,
        signal: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: RoomId,
        peers: Vec<Participant>,
    },
    #[serde(rename_all = "camelCase")]
    ParticipantJoined {
        room_id: RoomId,
        participant: Participant,
    },
    #[serde(rename_all = "camelCase")]
    ParticipantLeft {
        room_id: RoomId,
        connection_id: ConnectionId,
    },

    // Connection-local
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: ConnectionId },
    Error { code: String, message: String },
}

impl LiveEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::SessionStarted(_) => "session-started",
            LiveEvent::SessionStopped { .. } => "session-stopped",
            LiveEvent::SessionUpdated(_) => "session-updated",
            LiveEvent::SessionDeleted { .. } => "session-deleted",
            LiveEvent::NewMessage(_) => "new-message",
            LiveEvent::MessageUpdated(_) => "message-updated",
            LiveEvent::MessageDeleted { .. } => "message-deleted",
            LiveEvent::ReceiveSignal { .. } => "receive-signal",
            LiveEvent::RoomJoined { .. } => "room-joined",
            LiveEvent::ParticipantJoined { .. } => "participant-joined",
            LiveEvent::ParticipantLeft { .. } => "participant-left",
            LiveEvent::Connected { .. } => "connected",
            LiveEvent::Error { .. } => "error",
        }
    }

    pub fn error(code: impl ToString, message: impl Into<String>) -> Self {
        LiveEvent::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
