//! HTTP adapter for session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateSessionRequest, LiveAction, LiveRequest, StopSessionRequest, UpdateSessionRequest,
};
pub use handlers::SessionHandlers;
pub use routes::session_routes;
