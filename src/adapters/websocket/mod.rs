//! WebSocket adapters for live rooms.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SessionRegistry · ChatFanout · SignalingRelay               │
//! └──────────────────────────────────────────────────────────────┘
//!                  │ publish_global / publish_to_room / send_to
//!                  ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ConnectionHub (BroadcastBus)                                │
//! │   c1 ─ queue      c2 ─ queue      c3 ─ queue                  │
//! └──────────────────────────────────────────────────────────────┘
//!                  │ drained by each socket task
//!                  ▼
//!              WebSocket clients ── frames ──► CommandDispatcher
//! ```
//!
//! # Components
//!
//! - [`hub`] - Connection table and event delivery
//! - [`messages`] - Client frame decoding
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use hub::{ConnectionHub, DEFAULT_CONNECTION_BUFFER};
pub use messages::ClientMessage;
