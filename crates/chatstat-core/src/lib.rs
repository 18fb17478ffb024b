//! Core types, traits, and utilities for chatstat
//!
//! This crate provides the record model, the profile reducer and its
//! frequency tables, the tokenizer, error handling, and the
//! `SessionStore` trait used by every other chatstat crate.

pub mod error;
pub mod frequency;
pub mod profile;
pub mod reducer;
pub mod store;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ChatstatError, Result};
pub use profile::{Profile, ProfileSummary};
pub use reducer::{ProfileReducer, Reducer, TopKLimits};
pub use store::{MemorySessionStore, SessionStore};
pub use types::{Message, ModelName, Record, SessionId, UserId};
