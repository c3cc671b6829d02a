//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-process session store
//! - `postgres` - PostgreSQL session store (sqlx)
//! - `events` - Recording broadcast bus for tests and inspection
//! - `websocket` - Live socket hub and upgrade handler
//! - `http` - REST endpoints (axum)

pub mod events;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;

pub use events::RecordingBroadcastBus;
pub use http::live_router;
pub use memory::InMemorySessionStore;
pub use postgres::PostgresSessionStore;
pub use websocket::{ConnectionHub, WebSocketState};
