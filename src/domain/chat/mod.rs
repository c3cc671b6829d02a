//! Chat domain module.
//!
//! A session owns its ordered sequence of chat messages. Messages become
//! visible to room subscribers only after they are durably appended.

mod cursor;
mod errors;
mod message;

pub use cursor::ChatCursor;
pub use errors::ChatError;
pub use message::{ChatMessage, DEFAULT_MAX_MESSAGE_LENGTH, MAX_AUTHOR_LENGTH};
