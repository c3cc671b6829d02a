//! WebSocket message types for the live rooms protocol.
//!
//! Server → client frames are [`LiveEvent`](crate::domain::realtime::LiveEvent)
//! serialized directly. Client → server frames are decoded here and turned
//! into application commands.

use serde::Deserialize;

use crate::application::ClientCommand;
use crate::domain::foundation::{ConnectionId, MessageId, RoomId, ValidationError};
use crate::domain::realtime::ParticipantInfo;

// ============================================
// Client → Server Messages
// ============================================

/// All message types a client can send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom(JoinRoomMessage),
    RelaySignal(RelaySignalMessage),
    PostMessage(PostMessageMessage),
    EditMessage(EditMessageMessage),
    DeleteMessage(DeleteMessageMessage),
}

/// `join-room`. The connection id always comes from the socket itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomMessage {
    pub room_id: String,
    #[serde(default)]
    pub participant: ParticipantInfo,
}

/// `relay-signal`. `payload` is forwarded untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySignalMessage {
    pub to: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageMessage {
    pub room_id: String,
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageMessage {
    pub room_id: String,
    pub message_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageMessage {
    pub room_id: String,
    pub message_id: String,
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Validate identifiers and produce the command to dispatch.
    pub fn into_command(self) -> Result<ClientCommand, ValidationError> {
        Ok(match self {
            ClientMessage::JoinRoom(msg) => ClientCommand::JoinRoom {
                room_id: RoomId::new(msg.room_id)?,
                info: msg.participant,
            },
            ClientMessage::RelaySignal(msg) => ClientCommand::RelaySignal {
                to: msg
                    .to
                    .parse::<ConnectionId>()
                    .map_err(|_| ValidationError::invalid_format("to", "not a connection id"))?,
                signal: msg.payload,
            },
            ClientMessage::PostMessage(msg) => ClientCommand::PostMessage {
                room_id: RoomId::new(msg.room_id)?,
                author: msg.author,
                text: msg.text,
            },
            ClientMessage::EditMessage(msg) => ClientCommand::EditMessage {
                room_id: RoomId::new(msg.room_id)?,
                message_id: parse_message_id(&msg.message_id)?,
                text: msg.text,
            },
            ClientMessage::DeleteMessage(msg) => ClientCommand::DeleteMessage {
                room_id: RoomId::new(msg.room_id)?,
                message_id: parse_message_id(&msg.message_id)?,
            },
        })
    }
}

fn parse_message_id(raw: &str) -> Result<MessageId, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::invalid_format("messageId", "not a message id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_room_decodes_participant() {
        let frame = json!({
            "event": "join-room",
            "data": {"roomId": "R1", "participant": {"displayName": "viewer"}}
        })
        .to_string();

        let command = ClientMessage::parse(&frame).unwrap().into_command().unwrap();

        match command {
            ClientCommand::JoinRoom { room_id, info } => {
                assert_eq!(room_id.as_str(), "R1");
                assert_eq!(info.display_name.as_deref(), Some("viewer"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn join_room_ignores_client_supplied_connection_id() {
        let frame = json!({
            "event": "join-room",
            "data": {"roomId": "R1", "connectionId": "spoofed"}
        })
        .to_string();
        assert!(ClientMessage::parse(&frame).unwrap().into_command().is_ok());
    }

    #[test]
    fn relay_signal_keeps_payload_opaque() {
        let to = ConnectionId::new();
        let frame = json!({
            "event": "relay-signal",
            "data": {"to": to.to_string(), "payload": {"candidate": "a=1"}}
        })
        .to_string();

        let command = ClientMessage::parse(&frame).unwrap().into_command().unwrap();

        assert_eq!(
            command,
            ClientCommand::RelaySignal {
                to,
                signal: json!({"candidate": "a=1"}),
            }
        );
    }

    #[test]
    fn relay_signal_rejects_bad_target() {
        let frame = json!({
            "event": "relay-signal",
            "data": {"to": "nobody", "payload": {}}
        })
        .to_string();
        let err = ClientMessage::parse(&frame).unwrap().into_command().unwrap_err();
        assert_eq!(err.field(), "to");
    }

    #[test]
    fn edit_message_requires_uuid() {
        let frame = json!({
            "event": "edit-message",
            "data": {"roomId": "R1", "messageId": "7", "text": "x"}
        })
        .to_string();
        assert!(ClientMessage::parse(&frame).unwrap().into_command().is_err());
    }

    #[test]
    fn unknown_event_fails_to_parse() {
        let frame = json!({"event": "start-stream", "data": {}}).to_string();
        assert!(ClientMessage::parse(&frame).is_err());
    }
}
