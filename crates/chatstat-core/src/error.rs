//! Error types for chatstat
//!
//! This module defines the error types used throughout the chatstat crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use chatstat_core::error::{ChatstatError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to ChatstatError
//!     let _file = std::fs::read_to_string("nonexistent.json")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{SessionId, UserId};

/// Main error type for chatstat operations
///
/// Store failures, malformed records, and scheduling failures all end up
/// here. An aggregation either returns a complete profile or one of these.
#[derive(Error, Debug)]
pub enum ChatstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store has no sessions table for this user
    #[error("Unknown user: {0}")]
    UserNotFound(UserId),

    /// A record failed validation while being accumulated
    #[error("Malformed record {session}: {reason}")]
    MalformedRecord {
        /// The offending session
        session: SessionId,
        /// What was wrong with it
        reason: String,
    },

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Worker pool construction or task join failure
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Two strategies produced different profiles for the same input
    #[error("Strategy {strategy} produced a profile that differs from the serial baseline")]
    StrategyMismatch {
        /// Name of the diverging strategy
        strategy: String,
    },
}

/// Convenience type alias for Results in chatstat
pub type Result<T> = std::result::Result<T, ChatstatError>;
