//! Room membership of live connections.
//!
//! Membership is a many-to-many relation between connections and rooms,
//! kept as two coupled maps that are always updated together:
//!
//! ```text
//! rooms:        R1 -> {c1, c2}     R2 -> {c2}
//! connections:  c1 -> {R1}         c2 -> {R1, R2}
//! ```
//!
//! Connections hold no back-pointers; removing a connection walks its own
//! room set and clears it from each room.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::foundation::{ConnectionId, RoomId};

use super::participant::{Participant, ParticipantInfo};

/// Result of a join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// False when the connection was already a member (the join was a no-op).
    pub newly_joined: bool,
    /// The other members of the room at the time of the join.
    pub peers: Vec<Participant>,
}

/// Membership state. Not synchronized; owners wrap it in a lock.
#[derive(Debug, Default)]
pub struct RoomMembership {
    rooms: HashMap<RoomId, BTreeMap<ConnectionId, ParticipantInfo>>,
    connections: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room. Joining twice keeps the original info.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        room_id: RoomId,
        info: ParticipantInfo,
    ) -> JoinOutcome {
        let members = self.rooms.entry(room_id.clone()).or_default();
        let newly_joined = !members.contains_key(&connection_id);
        if newly_joined {
            members.insert(connection_id, info);
        }

        let peers = members
            .iter()
            .filter(|(id, _)| **id != connection_id)
            .map(|(id, info)| Participant {
                connection_id: *id,
                info: info.clone(),
            })
            .collect();

        self.connections
            .entry(connection_id)
            .or_default()
            .insert(room_id);

        JoinOutcome { newly_joined, peers }
    }

    /// Removes a connection from every room it joined.
    ///
    /// Returns the rooms it was removed from. Rooms left empty are dropped.
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let Some(joined) = self.connections.remove(connection_id) else {
            return Vec::new();
        };

        let mut left: Vec<RoomId> = joined.into_iter().collect();
        left.sort();
        for room_id in &left {
            if let Some(members) = self.rooms.get_mut(room_id) {
                members.remove(connection_id);
                if members.is_empty() {
                    self.rooms.remove(room_id);
                }
            }
        }
        left
    }

    pub fn member_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn participant(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Participant> {
        let info = self.rooms.get(room_id)?.get(connection_id)?;
        Some(Participant {
            connection_id: *connection_id,
            info: info.clone(),
        })
    }

    pub fn is_member(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.connections
            .get(connection_id)
            .is_some_and(|rooms| rooms.contains(room_id))
    }

    /// Rooms a connection has joined, sorted.
    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .connections
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// True when the two connections are members of at least one common room.
    pub fn shares_room(&self, a: &ConnectionId, b: &ConnectionId) -> bool {
        match (self.connections.get(a), self.connections.get(b)) {
            (Some(left), Some(right)) => !left.is_disjoint(right),
            _ => false,
        }
    }
}
