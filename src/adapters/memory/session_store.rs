//! In-memory implementation of SessionStore.
//!
//! Used when no database is configured and throughout the tests. Each
//! operation runs under one write lock, so every store call is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::ChatMessage;
use crate::domain::foundation::{DomainError, ErrorCode, MessageId, RoomId, Timestamp};
use crate::domain::session::{Session, SessionPatch};
use crate::ports::SessionStore;

/// Session store held in process memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<RoomId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn sorted(mut sessions: Vec<Session>) -> Vec<Session> {
        sessions.sort_by(|a, b| {
            a.start_time()
                .cmp(b.start_time())
                .then_with(|| a.room_id().cmp(b.room_id()))
        });
        sessions
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_all_sessions(&self) -> Result<Vec<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(Self::sorted(sessions.values().cloned().collect()))
    }

    async fn find_active_sessions(&self) -> Result<Vec<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(Self::sorted(
            sessions.values().filter(|s| s.is_live()).cloned().collect(),
        ))
    }

    async fn save_session(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.room_id()) {
            return Err(DomainError::new(
                ErrorCode::DuplicateRoom,
                format!("Room {} already has a session", session.room_id()),
            )
            .with_detail("room_id", session.room_id().as_str()));
        }
        sessions.insert(session.room_id().clone(), session.clone());
        Ok(())
    }

    async fn find_session_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(room_id).cloned())
    }

    async fn update_session_by_room_id(
        &self,
        room_id: &RoomId,
        patch: &SessionPatch,
    ) -> Result<Option<Session>, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(room_id).map(|session| {
            session.apply(patch);
            session.clone()
        }))
    }

    async fn delete_session_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.write().await.remove(room_id))
    }

    async fn append_chat_message(
        &self,
        room_id: &RoomId,
        message: &ChatMessage,
    ) -> Result<Option<ChatMessage>, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(room_id).map(|session| {
            session.push_message(message.clone());
            message.clone()
        }))
    }

    async fn update_chat_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
        text: &str,
        edited_at: Timestamp,
    ) -> Result<Option<ChatMessage>, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .get_mut(room_id)
            .and_then(|session| session.edit_message(message_id, text.to_string(), edited_at)))
    }

    async fn remove_chat_message(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> Result<Option<ChatMessage>, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .get_mut(room_id)
            .and_then(|session| session.remove_message(message_id)))
    }
}
