//! Connection hub: the broadcast bus over live WebSocket connections.
//!
//! Each connection gets a bounded outbound queue drained by its socket
//! task. Room-scoped publishes target the members recorded by the
//! signaling relay's membership.
//!
//! ```text
//! publish_to_room(R1) ─► membership(R1) = {c1, c2} ─► queue(c1), queue(c2)
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::application::MembershipRegistry;
use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::realtime::LiveEvent;
use crate::ports::{BroadcastBus, BroadcastError};

/// Default per-connection queue size.
pub const DEFAULT_CONNECTION_BUFFER: usize = 128;

/// Tracks live connections and delivers events to them.
///
/// # Thread Safety
///
/// Uses `RwLock` for the connection table since deliveries (reads)
/// vastly outnumber connects/disconnects (writes).
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<LiveEvent>>>,
    membership: MembershipRegistry,
    buffer: usize,
}

impl ConnectionHub {
    /// Create a hub whose queues hold `buffer` events each.
    ///
    /// A connection that falls `buffer` events behind misses the overflow.
    pub fn new(membership: MembershipRegistry, buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            membership,
            buffer: buffer.max(1),
        }
    }

    /// Register a new connection and return its id and outbound queue.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<LiveEvent>) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.buffer);
        self.connections.write().await.insert(connection_id, tx);
        (connection_id, rx)
    }

    /// Forget a connection. Later direct sends to it are dropped.
    pub async fn unregister(&self, connection_id: &ConnectionId) {
        self.connections.write().await.remove(connection_id);
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(connection_id)
    }

    fn deliver(
        connection_id: &ConnectionId,
        tx: &mpsc::Sender<LiveEvent>,
        event: LiveEvent,
    ) -> Result<(), BroadcastError> {
        tx.try_send(event).map_err(|err| {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "closed",
            };
            debug!(connection_id = %connection_id, reason, "Delivery dropped");
            BroadcastError::DeliveryDropped(*connection_id)
        })
    }
}

#[async_trait]
impl BroadcastBus for ConnectionHub {
    async fn publish_global(&self, event: LiveEvent) -> Result<usize, BroadcastError> {
        let connections = self.connections.read().await;
        let delivered = connections
            .iter()
            .filter(|(id, tx)| Self::deliver(id, tx, event.clone()).is_ok())
            .count();
        Ok(delivered)
    }

    async fn publish_to_room(
        &self,
        room_id: &RoomId,
        event: LiveEvent,
    ) -> Result<usize, BroadcastError> {
        let members = self.membership.member_ids(room_id).await;
        let connections = self.connections.read().await;
        let delivered = members
            .iter()
            .filter_map(|id| connections.get(id).map(|tx| (id, tx)))
            .filter(|(id, tx)| Self::deliver(id, tx, event.clone()).is_ok())
            .count();
        Ok(delivered)
    }

    async fn send_to(
        &self,
        connection_id: &ConnectionId,
        event: LiveEvent,
    ) -> Result<(), BroadcastError> {
        let connections = self.connections.read().await;
        let tx = connections
            .get(connection_id)
            .ok_or(BroadcastError::DeliveryDropped(*connection_id))?;
        Self::deliver(connection_id, tx, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::realtime::ParticipantInfo;

    fn event() -> LiveEvent {
        LiveEvent::SessionStopped {
            room_id: RoomId::new("R1").unwrap(),
        }
    }

    #[tokio::test]
    async fn global_publish_reaches_every_connection() {
        let hub = ConnectionHub::new(MembershipRegistry::new(), 8);
        let (_a, mut rx_a) = hub.register().await;
        let (_b, mut rx_b) = hub.register().await;

        assert_eq!(hub.publish_global(event()).await.unwrap(), 2);
        assert_eq!(rx_a.recv().await, Some(event()));
        assert_eq!(rx_b.recv().await, Some(event()));
    }

    #[tokio::test]
    async fn room_publish_reaches_members_only() {
        let membership = MembershipRegistry::new();
        let hub = ConnectionHub::new(membership.clone(), 8);
        let (a, mut rx_a) = hub.register().await;
        let (_b, mut rx_b) = hub.register().await;
        let room = RoomId::new("R1").unwrap();
        membership.join(a, room.clone(), ParticipantInfo::default()).await;

        assert_eq!(hub.publish_to_room(&room, event()).await.unwrap(), 1);
        assert_eq!(rx_a.recv().await, Some(event()));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unknown_connection_is_dropped() {
        let hub = ConnectionHub::new(MembershipRegistry::new(), 8);
        let id = ConnectionId::new();
        assert_eq!(
            hub.send_to(&id, event()).await,
            Err(BroadcastError::DeliveryDropped(id))
        );
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let hub = ConnectionHub::new(MembershipRegistry::new(), 8);
        let (a, _rx) = hub.register().await;
        hub.unregister(&a).await;

        assert!(!hub.is_connected(&a).await);
        assert!(hub.send_to(&a, event()).await.is_err());
        assert_eq!(hub.publish_global(event()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn full_queue_drops_overflow() {
        let hub = ConnectionHub::new(MembershipRegistry::new(), 1);
        let (a, mut rx) = hub.register().await;

        assert!(hub.send_to(&a, event()).await.is_ok());
        assert!(hub.send_to(&a, event()).await.is_err());
        assert_eq!(rx.recv().await, Some(event()));
    }
}
