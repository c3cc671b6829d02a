//! Session domain module.
//!
//! A session is one live broadcast. Its room id is the rendezvous key for
//! chat, signaling, and presence, and it owns the room's chat history.

mod aggregate;
mod errors;

pub use aggregate::{Owner, Session, SessionPatch, MAX_OWNER_FIELD_LENGTH, MAX_TITLE_LENGTH};
pub use errors::SessionError;
