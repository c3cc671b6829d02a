//! Live Rooms - live session registry with room chat and peer signaling
//!
//! Hosts start and stop live sessions, participants chat inside a session's
//! room, and connected peers exchange opaque signaling payloads. Every state
//! change is fanned out to connected clients as a real-time event.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
