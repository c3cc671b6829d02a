//! Recording broadcast bus for tests and local inspection.
//!
//! Captures every published event with its delivery scope instead of
//! sending it anywhere. Direct sends succeed only for connections that
//! were registered with [`RecordingBroadcastBus::connect`].

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::realtime::LiveEvent;
use crate::ports::{BroadcastBus, BroadcastError};

/// Where an event was addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Room(RoomId),
    Direct(ConnectionId),
}

/// Broadcast bus that records instead of delivering.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(RecordingBroadcastBus::new());
/// registry.create_session(cmd).await?;
/// assert!(bus.has_event("session-started"));
/// ```
#[derive(Default)]
pub struct RecordingBroadcastBus {
    published: RwLock<Vec<(Scope, LiveEvent)>>,
    connected: RwLock<HashSet<ConnectionId>>,
    fail_publish: bool,
}

impl RecordingBroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose every publish fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    /// Marks a connection as reachable for direct sends.
    pub fn connect(&self, connection_id: ConnectionId) {
        self.connected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection_id);
    }

    pub fn disconnect(&self, connection_id: &ConnectionId) {
        self.connected
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(connection_id);
    }

    // === Test Helpers ===

    /// Returns all published events with their scope.
    pub fn published(&self) -> Vec<(Scope, LiveEvent)> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns events with the given wire name.
    pub fn events_named(&self, name: &str) -> Vec<LiveEvent> {
        self.published()
            .into_iter()
            .filter(|(_, e)| e.name() == name)
            .map(|(_, e)| e)
            .collect()
    }

    /// Returns events addressed to one room, in publish order.
    pub fn events_for_room(&self, room_id: &RoomId) -> Vec<LiveEvent> {
        self.published()
            .into_iter()
            .filter(|(scope, _)| matches!(scope, Scope::Room(r) if r == room_id))
            .map(|(_, e)| e)
            .collect()
    }

    /// Returns events sent directly to one connection.
    pub fn events_for_connection(&self, connection_id: &ConnectionId) -> Vec<LiveEvent> {
        self.published()
            .into_iter()
            .filter(|(scope, _)| matches!(scope, Scope::Direct(c) if c == connection_id))
            .map(|(_, e)| e)
            .collect()
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.published().iter().any(|(_, e)| e.name() == name)
    }

    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, scope: Scope, event: LiveEvent) -> Result<(), BroadcastError> {
        if self.fail_publish {
            return Err(BroadcastError::Transport("simulated publish failure".into()));
        }
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((scope, event));
        Ok(())
    }
}

#[async_trait]
impl BroadcastBus for RecordingBroadcastBus {
    async fn publish_global(&self, event: LiveEvent) -> Result<usize, BroadcastError> {
        self.record(Scope::Global, event)?;
        Ok(self
            .connected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len())
    }

    async fn publish_to_room(
        &self,
        room_id: &RoomId,
        event: LiveEvent,
    ) -> Result<usize, BroadcastError> {
        self.record(Scope::Room(room_id.clone()), event)?;
        Ok(0)
    }

    async fn send_to(
        &self,
        connection_id: &ConnectionId,
        event: LiveEvent,
    ) -> Result<(), BroadcastError> {
        let reachable = self
            .connected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(connection_id);
        if !reachable {
            return Err(BroadcastError::DeliveryDropped(*connection_id));
        }
        self.record(Scope::Direct(*connection_id), event)
    }
}
