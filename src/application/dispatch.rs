//! CommandDispatcher - Routes decoded client commands to their owners.
//!
//! Transports decode wire frames into [`ClientCommand`] and hand them
//! here together with the connection they arrived on. The reply, if any,
//! goes back to that connection only.

use std::sync::Arc;

use tracing::debug;

use crate::domain::foundation::{ConnectionId, MessageId, RoomId};
use crate::domain::realtime::{LiveEvent, ParticipantInfo};

use super::chat_fanout::ChatFanout;
use super::signaling_relay::SignalingRelay;

/// A request from a connected client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    JoinRoom {
        room_id: RoomId,
        info: ParticipantInfo,
    },
    RelaySignal {
        to: ConnectionId,
        signal: serde_json::Value,
    },
    PostMessage {
        room_id: RoomId,
        author: String,
        text: String,
    },
    EditMessage {
        room_id: RoomId,
        message_id: MessageId,
        text: String,
    },
    DeleteMessage {
        room_id: RoomId,
        message_id: MessageId,
    },
    /// Transport closed.
    Disconnect,
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::JoinRoom { .. } => "join-room",
            ClientCommand::RelaySignal { .. } => "relay-signal",
            ClientCommand::PostMessage { .. } => "post-message",
            ClientCommand::EditMessage { .. } => "edit-message",
            ClientCommand::DeleteMessage { .. } => "delete-message",
            ClientCommand::Disconnect => "disconnect",
        }
    }
}

/// Capability table from command variant to component method.
#[derive(Clone)]
pub struct CommandDispatcher {
    chat: Arc<ChatFanout>,
    relay: Arc<SignalingRelay>,
}

impl CommandDispatcher {
    pub fn new(chat: Arc<ChatFanout>, relay: Arc<SignalingRelay>) -> Self {
        Self { chat, relay }
    }

    /// Execute one command on behalf of `connection_id`.
    ///
    /// Returns the reply for the sender: `room-joined` for a join, an
    /// `error` event for a rejected chat command, nothing otherwise.
    /// Successful chat commands reach the sender through the room broadcast
    /// when it is a member.
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        command: ClientCommand,
    ) -> Option<LiveEvent> {
        debug!(connection_id = %connection_id, command = command.name(), "Dispatching client command");

        match command {
            ClientCommand::JoinRoom { room_id, info } => {
                let peers = self
                    .relay
                    .join_room(connection_id, room_id.clone(), info)
                    .await;
                Some(LiveEvent::RoomJoined { room_id, peers })
            }
            ClientCommand::RelaySignal { to, signal } => {
                self.relay.relay_signal(connection_id, to, signal).await;
                None
            }
            ClientCommand::PostMessage {
                room_id,
                author,
                text,
            } => self
                .chat
                .post_message(&room_id, &author, &text)
                .await
                .err()
                .map(|err| LiveEvent::error(err.code(), err.to_string())),
            ClientCommand::EditMessage {
                room_id,
                message_id,
                text,
            } => self
                .chat
                .edit_message(&room_id, &message_id, &text)
                .await
                .err()
                .map(|err| LiveEvent::error(err.code(), err.to_string())),
            ClientCommand::DeleteMessage {
                room_id,
                message_id,
            } => self
                .chat
                .delete_message(&room_id, &message_id)
                .await
                .err()
                .map(|err| LiveEvent::error(err.code(), err.to_string())),
            ClientCommand::Disconnect => {
                self.relay.handle_disconnect(&connection_id).await;
                None
            }
        }
    }
}
