//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `session` - Live session aggregate and lifecycle rules
//! - `chat` - Chat messages owned by a session
//! - `realtime` - Client-facing events and room membership

pub mod chat;
pub mod foundation;
pub mod realtime;
pub mod session;
