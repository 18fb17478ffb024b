//! JSON session database support for chatstat
//!
//! Reads the database file written by the chat client, where every user maps
//! session ids to stored sessions, and exposes it as a
//! [`SessionStore`](chatstat_core::SessionStore).

pub mod json_store;

pub use json_store::JsonSessionStore;

/// Environment variable overriding the database location
pub const DB_ENV_VAR: &str = "CHATSTAT_DB";
