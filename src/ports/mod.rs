//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `SessionStore` - Durable sessions and their chat
//! - `BroadcastBus` - Global, room-scoped, and direct delivery to clients

mod broadcast_bus;
mod session_store;

pub use broadcast_bus::{BroadcastBus, BroadcastError};
pub use session_store::SessionStore;
