//! Per-room sequence point.
//!
//! Every operation that writes a room's durable state and then publishes
//! about it holds the room's slot for the whole write-then-publish. Two
//! operations on the same room therefore never interleave, while
//! operations on different rooms proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::RoomId;

/// Exclusive hold on one room. Released on drop.
pub type RoomSlot = OwnedMutexGuard<()>;

/// Hands out one async mutex per room.
///
/// Slots nobody holds or waits on are pruned on the next acquire, so the
/// map only grows with the number of rooms in active use.
#[derive(Default)]
pub struct RoomSequencer {
    slots: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `room_id`.
    ///
    /// Waiters are served in FIFO order.
    pub async fn acquire(&self, room_id: &RoomId) -> RoomSlot {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(room_id.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of rooms currently tracked.
    pub async fn tracked_rooms(&self) -> usize {
        self.slots.lock().await.len()
    }
}
