//! Real-time domain module.
//!
//! Events pushed to connected clients and the room membership graph of
//! live connections. Nothing here is persisted.

mod events;
mod membership;
mod participant;

pub use events::LiveEvent;
pub use membership::{JoinOutcome, RoomMembership};
pub use participant::{Participant, ParticipantInfo};
