//! HTTP adapter for chat endpoints.

mod handlers;
mod routes;

pub use handlers::{ChatHandlers, EditMessageRequest, PostMessageRequest};
pub use routes::chat_routes;
