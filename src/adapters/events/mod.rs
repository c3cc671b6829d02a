//! Broadcast bus adapters that do not touch the network.
//!
//! - `RecordingBroadcastBus` - Captures published events for assertions

mod recording;

pub use recording::{RecordingBroadcastBus, Scope};
