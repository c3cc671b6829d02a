//! SignalingRelay - Room membership and point-to-point signal routing.
//!
//! Signals are opaque; the relay only decides whether the target is a
//! peer of the sender and hands the payload over. Delivery is best
//! effort: a target that has gone away drops the signal silently.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::foundation::{ConnectionId, RoomId};
use crate::domain::realtime::{LiveEvent, Participant, ParticipantInfo};
use crate::ports::BroadcastBus;

use super::membership::MembershipRegistry;

/// What happened to a relayed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// The target is gone or shares no room with the sender.
    Dropped,
}

/// Sole writer of room membership.
pub struct SignalingRelay {
    membership: MembershipRegistry,
    bus: Arc<dyn BroadcastBus>,
}

impl SignalingRelay {
    pub fn new(membership: MembershipRegistry, bus: Arc<dyn BroadcastBus>) -> Self {
        Self { membership, bus }
    }

    pub fn membership(&self) -> &MembershipRegistry {
        &self.membership
    }

    /// Add a connection to a room and return the peers already there.
    ///
    /// Existing members are told about the newcomer with
    /// `participant-joined`. Joining again is a no-op that still returns
    /// the current peers.
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        info: ParticipantInfo,
    ) -> Vec<Participant> {
        let outcome = self
            .membership
            .join(connection_id, room_id.clone(), info.clone())
            .await;

        if outcome.newly_joined {
            info!(room_id = %room_id, connection_id = %connection_id, peers = outcome.peers.len(), "Connection joined room");
            let participant = Participant {
                connection_id,
                info,
            };
            for peer in &outcome.peers {
                let event = LiveEvent::ParticipantJoined {
                    room_id: room_id.clone(),
                    participant: participant.clone(),
                };
                if let Err(err) = self.bus.send_to(&peer.connection_id, event).await {
                    debug!(room_id = %room_id, error = %err, "Presence notice dropped");
                }
            }
        }

        outcome.peers
    }

    /// Forward a signal to one peer, tagged with the sender.
    ///
    /// Never fails: a target that is not connected, or that shares no room
    /// with the sender, yields `Dropped`.
    pub async fn relay_signal(
        &self,
        from: ConnectionId,
        to: ConnectionId,
        signal: serde_json::Value,
    ) -> RelayOutcome {
        if !self.membership.shares_room(&from, &to).await {
            debug!(from = %from, to = %to, "Signal dropped: target is not a peer");
            return RelayOutcome::Dropped;
        }

        match self
            .bus
            .send_to(&to, LiveEvent::ReceiveSignal { from, signal })
            .await
        {
            Ok(()) => RelayOutcome::Delivered,
            Err(err) => {
                debug!(from = %from, to = %to, error = %err, "Signal dropped");
                RelayOutcome::Dropped
            }
        }
    }

    /// Remove a connection from every room it joined.
    ///
    /// Remaining members of each room receive `participant-left`. Returns
    /// the rooms that were left; a second call returns nothing.
    pub async fn handle_disconnect(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let left = self.membership.remove_connection(connection_id).await;

        for room_id in &left {
            let event = LiveEvent::ParticipantLeft {
                room_id: room_id.clone(),
                connection_id: *connection_id,
            };
            if let Err(err) = self.bus.publish_to_room(room_id, event).await {
                debug!(room_id = %room_id, error = %err, "Departure notice dropped");
            }
        }

        if !left.is_empty() {
            info!(connection_id = %connection_id, rooms = left.len(), "Connection left rooms");
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::{RecordingBroadcastBus, Scope};
    use serde_json::json;

    fn setup() -> (SignalingRelay, Arc<RecordingBroadcastBus>) {
        let bus = Arc::new(RecordingBroadcastBus::new());
        (SignalingRelay::new(MembershipRegistry::new(), bus.clone()), bus)
    }

    fn connected(bus: &RecordingBroadcastBus) -> ConnectionId {
        let id = ConnectionId::new();
        bus.connect(id);
        id
    }

    fn room(name: &str) -> RoomId {
        RoomId::new(name).unwrap()
    }

    #[tokio::test]
    async fn join_returns_peers_and_notifies_them() {
        let (relay, bus) = setup();
        let a = connected(&bus);
        let b = connected(&bus);

        assert!(relay.join_room(a, room("R1"), ParticipantInfo::named("a")).await.is_empty());
        let peers = relay.join_room(b, room("R1"), ParticipantInfo::named("b")).await;

        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].connection_id, a);
        let notices = bus.events_for_connection(&a);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].name(), "participant-joined");
    }

    #[tokio::test]
    async fn second_join_does_not_renotify() {
        let (relay, bus) = setup();
        let a = connected(&bus);
        let b = connected(&bus);
        relay.join_room(a, room("R1"), ParticipantInfo::default()).await;
        relay.join_room(b, room("R1"), ParticipantInfo::default()).await;
        relay.join_room(b, room("R1"), ParticipantInfo::default()).await;

        assert_eq!(bus.events_for_connection(&a).len(), 1);
        assert_eq!(relay.membership().member_ids(&room("R1")).await.len(), 2);
    }

    #[tokio::test]
    async fn relay_delivers_to_peer_tagged_with_sender() {
        let (relay, bus) = setup();
        let a = connected(&bus);
        let b = connected(&bus);
        relay.join_room(a, room("R1"), ParticipantInfo::default()).await;
        relay.join_room(b, room("R1"), ParticipantInfo::default()).await;
        bus.clear();

        let signal = json!({"type": "offer", "sdp": "v=0"});
        let outcome = relay.relay_signal(a, b, signal.clone()).await;

        assert_eq!(outcome, RelayOutcome::Delivered);
        assert_eq!(
            bus.published(),
            vec![(Scope::Direct(b), LiveEvent::ReceiveSignal { from: a, signal })]
        );
    }

    #[tokio::test]
    async fn relay_to_stranger_is_dropped() {
        let (relay, bus) = setup();
        let a = connected(&bus);
        let b = connected(&bus);
        relay.join_room(a, room("R1"), ParticipantInfo::default()).await;
        relay.join_room(b, room("R2"), ParticipantInfo::default()).await;
        bus.clear();

        assert_eq!(relay.relay_signal(a, b, json!({})).await, RelayOutcome::Dropped);
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn relay_to_vanished_transport_is_dropped() {
        let (relay, bus) = setup();
        let a = connected(&bus);
        let b = connected(&bus);
        relay.join_room(a, room("R1"), ParticipantInfo::default()).await;
        relay.join_room(b, room("R1"), ParticipantInfo::default()).await;
        bus.disconnect(&b);

        assert_eq!(relay.relay_signal(a, b, json!({})).await, RelayOutcome::Dropped);
    }

    #[tokio::test]
    async fn disconnect_clears_membership_and_notifies_rooms() {
        let (relay, bus) = setup();
        let a = connected(&bus);
        let b = connected(&bus);
        relay.join_room(a, room("R1"), ParticipantInfo::default()).await;
        relay.join_room(a, room("R2"), ParticipantInfo::default()).await;
        relay.join_room(b, room("R1"), ParticipantInfo::default()).await;
        bus.clear();

        let left = relay.handle_disconnect(&a).await;

        assert_eq!(left, vec![room("R1"), room("R2")]);
        assert!(relay.membership().rooms_of(&a).await.is_empty());
        assert_eq!(relay.membership().member_ids(&room("R1")).await, vec![b]);
        assert_eq!(bus.events_named("participant-left").len(), 2);

        assert_eq!(relay.relay_signal(b, a, json!({})).await, RelayOutcome::Dropped);
        assert!(relay.handle_disconnect(&a).await.is_empty());
    }
}
