//! BroadcastBus port - Interface for notifying connected clients.
//!
//! The bus is a notification channel only. It holds no session or chat
//! state and delivers to whoever is connected at publish time; there is
//! no replay for connections that arrive later.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::realtime::LiveEvent;

/// Failure to hand an event to a transport.
///
/// Never rolls back the store write that preceded the publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    /// The target connection is gone.
    #[error("Connection {0} is no longer connected")]
    DeliveryDropped(ConnectionId),

    /// The transport itself failed.
    #[error("Broadcast transport failed: {0}")]
    Transport(String),
}

/// Port for publishing real-time events.
///
/// Room-scoped delivery targets the connections currently joined to the
/// room, as recorded by the signaling relay's membership.
#[async_trait]
pub trait BroadcastBus: Send + Sync {
    /// Deliver to every connected client. Returns the number reached.
    async fn publish_global(&self, event: LiveEvent) -> Result<usize, BroadcastError>;

    /// Deliver to the members of one room. Returns the number reached.
    async fn publish_to_room(&self, room_id: &RoomId, event: LiveEvent)
        -> Result<usize, BroadcastError>;

    /// Deliver to exactly one connection.
    ///
    /// # Errors
    ///
    /// - `DeliveryDropped` if the connection is not present
    async fn send_to(&self, connection_id: &ConnectionId, event: LiveEvent)
        -> Result<(), BroadcastError>;
}
