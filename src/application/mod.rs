//! Application layer - Components that coordinate the ports.
//!
//! - `SessionRegistry` - session lifecycle, store-first then announce
//! - `ChatFanout` - durable chat with room-scoped delivery
//! - `SignalingRelay` - room membership and peer signaling
//! - `CommandDispatcher` - routes decoded client commands
//!
//! Registry and fanout share one `RoomSequencer` so all writes for a room
//! are published in the order they were made.

mod chat_fanout;
mod dispatch;
mod membership;
mod sequencer;
mod session_registry;
mod signaling_relay;

pub use chat_fanout::{ChatFanout, ChatPolicy};
pub use dispatch::{ClientCommand, CommandDispatcher};
pub use membership::MembershipRegistry;
pub use sequencer::{RoomSequencer, RoomSlot};
pub use session_registry::{CreateSessionCommand, SessionRegistry};
pub use signaling_relay::{RelayOutcome, SignalingRelay};
