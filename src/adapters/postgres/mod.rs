//! PostgreSQL adapters.
//!
//! Sessions and chat persisted with sqlx. Schema lives in `migrations/`.

mod session_store;

pub use session_store::PostgresSessionStore;
