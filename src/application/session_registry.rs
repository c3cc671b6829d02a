//! SessionRegistry - Lifecycle of live sessions.
//!
//! Writes go through the store first; lifecycle events are published
//! only after the write succeeds, and a failed publish never undoes the
//! write. Listing always reads the store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::foundation::{ErrorCode, RoomId, SessionStatus, Timestamp};
use crate::domain::realtime::LiveEvent;
use crate::domain::session::{Owner, Session, SessionError, SessionPatch};
use crate::ports::{BroadcastBus, SessionStore};

use super::sequencer::RoomSequencer;

/// Command to start a session.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub owner: Owner,
    pub title: String,
    /// Externally chosen room id; allocated when absent.
    pub room_id: Option<RoomId>,
}

/// Owns every session status transition.
pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    bus: Arc<dyn BroadcastBus>,
    sequencer: Arc<RoomSequencer>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SessionStore>,
        bus: Arc<dyn BroadcastBus>,
        sequencer: Arc<RoomSequencer>,
    ) -> Self {
        Self {
            store,
            bus,
            sequencer,
        }
    }

    /// Start a session and announce it.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the room id is already taken
    /// - `ValidationFailed` for a bad title
    /// - `StoreUnavailable` if the write fails; nothing is published
    pub async fn create_session(&self, cmd: CreateSessionCommand) -> Result<Session, SessionError> {
        let room_id = cmd.room_id.unwrap_or_else(RoomId::generate);
        let _slot = self.sequencer.acquire(&room_id).await;

        let session = Session::start(room_id.clone(), cmd.owner, cmd.title, Timestamp::now())?;

        self.store.save_session(&session).await.map_err(|err| {
            if err.code == ErrorCode::DuplicateRoom {
                SessionError::conflict(room_id.clone())
            } else {
                SessionError::from(err)
            }
        })?;

        info!(room_id = %room_id, title = session.title(), "Session started");
        self.announce(LiveEvent::SessionStarted(session.clone())).await;

        Ok(session)
    }

    /// Stop a session.
    ///
    /// Stopping an already stopped session keeps its recorded end time,
    /// writes nothing, and re-publishes `session-stopped`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session exists for the room
    /// - `ValidationFailed` if `end_time` precedes the start time
    /// - `StoreUnavailable` if the store fails
    pub async fn stop_session(
        &self,
        room_id: &RoomId,
        end_time: Option<Timestamp>,
    ) -> Result<Session, SessionError> {
        let _slot = self.sequencer.acquire(room_id).await;

        let session = self.require(room_id).await?;
        let end_time = end_time.unwrap_or_else(Timestamp::now);

        let stopped = match session.plan_stop(end_time)? {
            Some(patch) => self
                .store
                .update_session_by_room_id(room_id, &patch)
                .await?
                .ok_or_else(|| SessionError::not_found(room_id.clone()))?,
            None => {
                debug!(room_id = %room_id, "Session already stopped");
                session
            }
        };

        info!(room_id = %room_id, "Session stopped");
        self.announce(LiveEvent::SessionStopped {
            room_id: room_id.clone(),
        })
        .await;

        Ok(stopped)
    }

    /// Sessions currently live, read from the store.
    pub async fn list_active(&self) -> Result<Vec<Session>, SessionError> {
        Ok(self.store.find_active_sessions().await?)
    }

    /// Every stored session, live or stopped.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, SessionError> {
        Ok(self.store.find_all_sessions().await?)
    }

    /// Administrative field update.
    ///
    /// A patch that stops the session also publishes `session-stopped`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session exists for the room
    /// - `InvalidState` for a transition out of Stopped
    /// - `ValidationFailed` for an empty patch or bad title
    pub async fn update_session(
        &self,
        room_id: &RoomId,
        patch: SessionPatch,
    ) -> Result<Session, SessionError> {
        let _slot = self.sequencer.acquire(room_id).await;

        let session = self.require(room_id).await?;
        let planned = session.plan_patch(patch, Timestamp::now())?;

        let updated = self
            .store
            .update_session_by_room_id(room_id, &planned)
            .await?
            .ok_or_else(|| SessionError::not_found(room_id.clone()))?;

        info!(room_id = %room_id, "Session updated");
        self.announce(LiveEvent::SessionUpdated(updated.clone())).await;
        if planned.status == Some(SessionStatus::Stopped) {
            self.announce(LiveEvent::SessionStopped {
                room_id: room_id.clone(),
            })
            .await;
        }

        Ok(updated)
    }

    /// Administrative delete of a session and its chat.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session exists for the room
    pub async fn delete_session(&self, room_id: &RoomId) -> Result<Session, SessionError> {
        let _slot = self.sequencer.acquire(room_id).await;

        let removed = self
            .store
            .delete_session_by_room_id(room_id)
            .await?
            .ok_or_else(|| SessionError::not_found(room_id.clone()))?;

        info!(room_id = %room_id, "Session deleted");
        self.announce(LiveEvent::SessionDeleted {
            room_id: room_id.clone(),
        })
        .await;

        Ok(removed)
    }

    async fn require(&self, room_id: &RoomId) -> Result<Session, SessionError> {
        self.store
            .find_session_by_room_id(room_id)
            .await?
            .ok_or_else(|| SessionError::not_found(room_id.clone()))
    }

    async fn announce(&self, event: LiveEvent) {
        let name = event.name();
        match self.bus.publish_global(event).await {
            Ok(delivered) => debug!(event = name, delivered, "Lifecycle event published"),
            Err(err) => warn!(event = name, error = %err, "Lifecycle event not published"),
        }
    }
}
