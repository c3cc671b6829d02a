//! ChatFanout - Durable chat with room-scoped delivery.
//!
//! Each operation holds the room's sequencer slot across the store write
//! and the publish, so subscribers observe a room's events in the order
//! they were written.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::chat::{ChatError, ChatMessage, DEFAULT_MAX_MESSAGE_LENGTH};
use crate::domain::foundation::{MessageId, RoomId, Timestamp};
use crate::domain::realtime::LiveEvent;
use crate::domain::session::Session;
use crate::ports::{BroadcastBus, SessionStore};

use super::sequencer::RoomSequencer;

/// Chat rules that vary per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatPolicy {
    /// Whether posting and editing stay open after the session stops.
    pub chat_after_stop: bool,
    pub max_message_length: usize,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            chat_after_stop: true,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

/// Appends, edits, and removes chat messages and fans them out to a room.
pub struct ChatFanout {
    store: Arc<dyn SessionStore>,
    bus: Arc<dyn BroadcastBus>,
    sequencer: Arc<RoomSequencer>,
    policy: ChatPolicy,
}

impl ChatFanout {
    pub fn new(
        store: Arc<dyn SessionStore>,
        bus: Arc<dyn BroadcastBus>,
        sequencer: Arc<RoomSequencer>,
        policy: ChatPolicy,
    ) -> Self {
        Self {
            store,
            bus,
            sequencer,
            policy,
        }
    }

    /// Append a message and broadcast `new-message` to the room.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound` if the room has no session; nothing is published
    /// - `RoomClosed` if the session stopped and chat closes with it
    /// - `ValidationFailed` for a blank or oversized author or text
    /// - `StoreUnavailable` if the store fails
    pub async fn post_message(
        &self,
        room_id: &RoomId,
        author: &str,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        let _slot = self.sequencer.acquire(room_id).await;

        let session = self.open_session(room_id).await?;
        let message = ChatMessage::compose(
            author,
            text,
            session.chat_cursor(),
            Timestamp::now(),
            self.policy.max_message_length,
        )?;

        let stored = self
            .store
            .append_chat_message(room_id, &message)
            .await?
            .ok_or_else(|| ChatError::RoomNotFound(room_id.clone()))?;

        debug!(room_id = %room_id, message_id = %stored.id(), sequence = stored.sequence(), "Message appended");
        self.fan_out(room_id, LiveEvent::NewMessage(stored.clone()))
            .await;

        Ok(stored)
    }

    /// Replace a message's text and broadcast `message-updated`.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound` / `MessageNotFound` if either is absent
    /// - `RoomClosed` if the session stopped and chat closes with it
    /// - `ValidationFailed` for a blank or oversized text
    pub async fn edit_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        ChatMessage::validate_text(text, self.policy.max_message_length)?;
        let text = text.trim();
        let _slot = self.sequencer.acquire(room_id).await;

        self.open_session(room_id).await?;
        let updated = self
            .store
            .update_chat_message(room_id, message_id, text, Timestamp::now())
            .await?
            .ok_or_else(|| ChatError::MessageNotFound {
                room_id: room_id.clone(),
                message_id: *message_id,
            })?;

        self.fan_out(room_id, LiveEvent::MessageUpdated(updated.clone()))
            .await;

        Ok(updated)
    }

    /// Remove a message and broadcast `message-deleted`.
    ///
    /// Deletion is allowed regardless of the chat-after-stop policy.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound` / `MessageNotFound` if either is absent
    pub async fn delete_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> Result<ChatMessage, ChatError> {
        let _slot = self.sequencer.acquire(room_id).await;

        self.require(room_id).await?;
        let removed = self
            .store
            .remove_chat_message(room_id, message_id)
            .await?
            .ok_or_else(|| ChatError::MessageNotFound {
                room_id: room_id.clone(),
                message_id: *message_id,
            })?;

        info!(room_id = %room_id, message_id = %message_id, "Message deleted");
        self.fan_out(
            room_id,
            LiveEvent::MessageDeleted {
                message_id: *message_id,
            },
        )
        .await;

        Ok(removed)
    }

    /// The room's chat in append order.
    pub async fn list_messages(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.require(room_id).await?.chat().to_vec())
    }

    async fn require(&self, room_id: &RoomId) -> Result<Session, ChatError> {
        self.store
            .find_session_by_room_id(room_id)
            .await?
            .ok_or_else(|| ChatError::RoomNotFound(room_id.clone()))
    }

    async fn open_session(&self, room_id: &RoomId) -> Result<Session, ChatError> {
        let session = self.require(room_id).await?;
        if !self.policy.chat_after_stop && !session.is_live() {
            return Err(ChatError::RoomClosed(room_id.clone()));
        }
        Ok(session)
    }

    async fn fan_out(&self, room_id: &RoomId, event: LiveEvent) {
        let name = event.name();
        match self.bus.publish_to_room(room_id, event).await {
            Ok(delivered) => debug!(room_id = %room_id, event = name, delivered, "Chat event published"),
            Err(err) => warn!(room_id = %room_id, event = name, error = %err, "Chat event not published"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::RecordingBroadcastBus;
    use crate::adapters::memory::InMemorySessionStore;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::session::{Owner, SessionPatch};

    struct Fixture {
        fanout: ChatFanout,
        store: Arc<InMemorySessionStore>,
        bus: Arc<RecordingBroadcastBus>,
        room: RoomId,
    }

    async fn fixture(policy: ChatPolicy) -> Fixture {
        fixture_with_bus(policy, RecordingBroadcastBus::new()).await
    }

    async fn fixture_with_bus(policy: ChatPolicy, bus: RecordingBroadcastBus) -> Fixture {
        let store = Arc::new(InMemorySessionStore::new());
        let bus = Arc::new(bus);
        let room = RoomId::new("R1").unwrap();
        let session = Session::start(
            room.clone(),
            Owner::new("", "a").unwrap(),
            "demo".into(),
            Timestamp::now(),
        )
        .unwrap();
        store.save_session(&session).await.unwrap();

        let fanout = ChatFanout::new(
            store.clone(),
            bus.clone(),
            Arc::new(RoomSequencer::new()),
            policy,
        );
        Fixture {
            fanout,
            store,
            bus,
            room,
        }
    }

    async fn stop(fx: &Fixture) {
        fx.store
            .update_session_by_room_id(&fx.room, &SessionPatch::stop(Timestamp::now()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn post_appends_then_broadcasts_to_room() {
        let fx = fixture(ChatPolicy::default()).await;

        let message = fx.fanout.post_message(&fx.room, "a", "hi").await.unwrap();

        assert_eq!(message.sequence(), 0);
        let stored = fx.fanout.list_messages(&fx.room).await.unwrap();
        assert_eq!(stored, vec![message.clone()]);
        assert_eq!(
            fx.bus.events_for_room(&fx.room),
            vec![LiveEvent::NewMessage(message)]
        );
    }

    #[tokio::test]
    async fn sequence_follows_append_order() {
        let fx = fixture(ChatPolicy::default()).await;
        for text in ["one", "two", "three"] {
            fx.fanout.post_message(&fx.room, "a", text).await.unwrap();
        }

        let sequences: Vec<u64> = fx
            .fanout
            .list_messages(&fx.room)
            .await
            .unwrap()
            .iter()
            .map(|m| m.sequence())
            .collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn deleting_newest_message_does_not_reuse_its_sequence() {
        let fx = fixture(ChatPolicy::default()).await;
        fx.fanout.post_message(&fx.room, "a", "zero").await.unwrap();
        let newest = fx.fanout.post_message(&fx.room, "a", "one").await.unwrap();

        fx.fanout.delete_message(&fx.room, newest.id()).await.unwrap();
        let next = fx.fanout.post_message(&fx.room, "a", "two").await.unwrap();

        assert_eq!(next.sequence(), 2);
        assert!(next.timestamp() >= newest.timestamp());
    }

    #[tokio::test]
    async fn emptied_chat_does_not_restart_at_zero() {
        let fx = fixture(ChatPolicy::default()).await;
        let mut posted = Vec::new();
        for text in ["one", "two", "three"] {
            posted.push(fx.fanout.post_message(&fx.room, "a", text).await.unwrap());
        }
        for message in &posted {
            fx.fanout.delete_message(&fx.room, message.id()).await.unwrap();
        }

        let next = fx.fanout.post_message(&fx.room, "a", "again").await.unwrap();

        assert_eq!(next.sequence(), 3);
        let sequences: Vec<u64> = fx
            .fanout
            .list_messages(&fx.room)
            .await
            .unwrap()
            .iter()
            .map(|m| m.sequence())
            .collect();
        assert_eq!(sequences, vec![3]);
    }

    #[tokio::test]
    async fn padded_post_is_stored_trimmed_within_limit() {
        let fx = fixture(ChatPolicy {
            max_message_length: 10,
            ..ChatPolicy::default()
        })
        .await;
        let padded = format!("x{}", " ".repeat(100_000));

        let message = fx.fanout.post_message(&fx.room, "a", &padded).await.unwrap();

        assert_eq!(message.text(), "x");
        let stored = fx.fanout.list_messages(&fx.room).await.unwrap();
        assert!(stored.iter().all(|m| m.text().chars().count() <= 10));
    }

    #[tokio::test]
    async fn padded_edit_is_stored_trimmed_within_limit() {
        let fx = fixture(ChatPolicy {
            max_message_length: 10,
            ..ChatPolicy::default()
        })
        .await;
        let posted = fx.fanout.post_message(&fx.room, "a", "hi").await.unwrap();
        let padded = format!("  bye{}", " ".repeat(100_000));

        let edited = fx
            .fanout
            .edit_message(&fx.room, posted.id(), &padded)
            .await
            .unwrap();

        assert_eq!(edited.text(), "bye");
        let stored = fx.fanout.list_messages(&fx.room).await.unwrap();
        assert_eq!(stored[0].text(), "bye");
    }

    #[tokio::test]
    async fn publish_failure_still_stores_message() {
        let fx = fixture_with_bus(ChatPolicy::default(), RecordingBroadcastBus::failing()).await;

        let message = fx.fanout.post_message(&fx.room, "a", "hi").await.unwrap();

        assert_eq!(fx.fanout.list_messages(&fx.room).await.unwrap(), vec![message]);
        assert_eq!(fx.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn post_to_unknown_room_is_not_found_without_broadcast() {
        let fx = fixture(ChatPolicy::default()).await;
        let ghost = RoomId::new("ghost").unwrap();

        let err = fx.fanout.post_message(&ghost, "a", "hi").await.unwrap_err();

        assert_eq!(err, ChatError::RoomNotFound(ghost));
        assert_eq!(fx.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn post_rejects_blank_text() {
        let fx = fixture(ChatPolicy::default()).await;
        let err = fx.fanout.post_message(&fx.room, "a", "   ").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn chat_stays_open_after_stop_by_default() {
        let fx = fixture(ChatPolicy::default()).await;
        stop(&fx).await;
        assert!(fx.fanout.post_message(&fx.room, "a", "gg").await.is_ok());
    }

    #[tokio::test]
    async fn closed_policy_rejects_post_after_stop() {
        let fx = fixture(ChatPolicy {
            chat_after_stop: false,
            ..ChatPolicy::default()
        })
        .await;
        let first = fx.fanout.post_message(&fx.room, "a", "hi").await.unwrap();
        stop(&fx).await;

        let err = fx.fanout.post_message(&fx.room, "a", "gg").await.unwrap_err();
        assert_eq!(err, ChatError::RoomClosed(fx.room.clone()));

        // deletion still works on a closed room
        assert!(fx.fanout.delete_message(&fx.room, first.id()).await.is_ok());
    }

    #[tokio::test]
    async fn edit_updates_text_and_broadcasts() {
        let fx = fixture(ChatPolicy::default()).await;
        let posted = fx.fanout.post_message(&fx.room, "a", "hi").await.unwrap();
        fx.bus.clear();

        let edited = fx
            .fanout
            .edit_message(&fx.room, posted.id(), "hello")
            .await
            .unwrap();

        assert_eq!(edited.text(), "hello");
        assert_eq!(edited.sequence(), posted.sequence());
        assert!(edited.edited_at().is_some());
        assert_eq!(
            fx.bus.events_for_room(&fx.room),
            vec![LiveEvent::MessageUpdated(edited)]
        );
    }

    #[tokio::test]
    async fn edit_unknown_message_is_not_found() {
        let fx = fixture(ChatPolicy::default()).await;
        let err = fx
            .fanout
            .edit_message(&fx.room, &MessageId::new(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::MessageNotFound { .. }));
        assert_eq!(fx.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn delete_removes_and_broadcasts_id() {
        let fx = fixture(ChatPolicy::default()).await;
        let posted = fx.fanout.post_message(&fx.room, "a", "hi").await.unwrap();

        fx.fanout.delete_message(&fx.room, posted.id()).await.unwrap();

        assert!(fx.fanout.list_messages(&fx.room).await.unwrap().is_empty());
        assert!(fx.bus.has_event("message-deleted"));
        let again = fx.fanout.delete_message(&fx.room, posted.id()).await;
        assert!(matches!(again, Err(ChatError::MessageNotFound { .. })));
    }

    #[tokio::test]
    async fn delete_in_unknown_room_is_room_not_found() {
        let fx = fixture(ChatPolicy::default()).await;
        let ghost = RoomId::new("ghost").unwrap();
        let err = fx
            .fanout
            .delete_message(&ghost, &MessageId::new())
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::RoomNotFound(ghost));
    }
}
