//! Shared handle to the room membership graph.
//!
//! The signaling relay is the only writer; the connection hub reads it to
//! target room-scoped deliveries. Mutating methods are crate-private.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::realtime::{JoinOutcome, ParticipantInfo, RoomMembership};

/// Cloneable, lock-protected membership.
///
/// Join and disconnect update both directions of the relation under one
/// write lock.
#[derive(Clone, Default)]
pub struct MembershipRegistry {
    inner: Arc<RwLock<RoomMembership>>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn member_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.inner.read().await.member_ids(room_id)
    }

    pub async fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.inner.read().await.rooms_of(connection_id)
    }

    pub async fn is_member(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.inner.read().await.is_member(connection_id, room_id)
    }

    pub async fn shares_room(&self, a: &ConnectionId, b: &ConnectionId) -> bool {
        self.inner.read().await.shares_room(a, b)
    }

    pub(crate) async fn join(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        info: ParticipantInfo,
    ) -> JoinOutcome {
        self.inner.write().await.join(connection_id, room_id, info)
    }

    pub(crate) async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.inner.write().await.remove_connection(connection_id)
    }
}
