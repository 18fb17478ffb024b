//! Core domain types for chatstat
//!
//! This module contains the fundamental types used throughout the chatstat
//! crates. These types provide strong typing for user identifiers, session
//! identifiers, model names, and the per-session `Record` the aggregation
//! engine consumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The user name that stands for "every user in the store"
pub const ADMIN_USER: &str = "admin";

/// Strongly-typed user identifier
///
/// # Examples
/// ```
/// use chatstat_core::types::UserId;
///
/// let user = UserId::new("alice");
/// assert_eq!(user.as_str(), "alice");
/// assert!(!user.is_admin());
/// assert!(UserId::admin().is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The pseudo-user whose profile covers all users
    pub fn admin() -> Self {
        Self(ADMIN_USER.to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id selects the union of every user's sessions
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_USER
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly-typed session ID wrapper
///
/// Sessions are keyed by this id inside each user's table in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly-typed model name wrapper
///
/// # Examples
/// ```
/// use chatstat_core::types::ModelName;
///
/// let model = ModelName::new("GPT-4o-mini");
/// assert_eq!(model.family(), "GPT");
/// assert_eq!(ModelName::new("llama").family(), "llama");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelName(String);

impl ModelName {
    /// Create a new ModelName from any string-like type
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The model family: everything before the first `-`
    pub fn family(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role in the conversation: system, user, assistant
    pub role: String,
    /// Message text
    pub content: String,
    /// Token count the client recorded for this message
    #[serde(default)]
    pub tokens: u64,
}

impl Message {
    /// Create a message without a recorded token count
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            tokens: 0,
        }
    }
}

/// Accounting view of one chat session
///
/// Records are produced by a `SessionStore` and only ever read by the
/// aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// User the session belongs to
    pub owner: UserId,
    /// Session key inside the owner's table
    pub session_id: SessionId,
    /// Client model, e.g. "GPT-4o"
    pub model_name: ModelName,
    /// User-assigned tags
    pub tags: BTreeSet<String>,
    /// Total prompt tokens sent during the session
    pub prompt_tokens: u64,
    /// Total completion tokens received during the session
    pub completion_tokens: u64,
    /// Sampling temperature, expected within [0, 2]
    pub temperature: f64,
    /// Creation time, seconds since epoch
    pub created_at: i64,
    /// Last time the session was opened, seconds since epoch
    pub last_opened_at: i64,
    /// Last time the session was exited, seconds since epoch.
    /// May precede `last_opened_at` for sessions that were never closed cleanly.
    pub last_exit_at: i64,
    /// Conversation history in order
    pub messages: Vec<Message>,
}

impl Record {
    /// Check the field constraints the reducer relies on
    ///
    /// Returns a human-readable reason for the first violated constraint.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.model_name.as_str().is_empty() {
            return Err("empty model name".to_string());
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} outside [0, 2]", self.temperature));
        }
        for (field, value) in [
            ("created_at", self.created_at),
            ("last_opened_at", self.last_opened_at),
            ("last_exit_at", self.last_exit_at),
        ] {
            if value < 0 {
                return Err(format!("{field} is negative ({value})"));
            }
        }
        Ok(())
    }

    /// Seconds between last open and last exit, clipped at zero
    pub fn session_seconds(&self) -> u64 {
        self.last_exit_at.saturating_sub(self.last_opened_at).max(0) as u64
    }

    /// Total bytes of message text, a rough measure of tokenizing cost
    pub fn content_len(&self) -> usize {
        self.messages.iter().map(|m| m.content.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordBuilder;

    #[test]
    fn test_model_family() {
        assert_eq!(ModelName::new("GPT-4o").family(), "GPT");
        assert_eq!(ModelName::new("GPT-4o-mini").family(), "GPT");
        assert_eq!(ModelName::new("-leading").family(), "");
        assert_eq!(ModelName::new("claude").family(), "claude");
    }

    #[test]
    fn test_admin_user() {
        assert!(UserId::new("admin").is_admin());
        assert!(!UserId::new("Admin").is_admin());
    }

    #[test]
    fn test_session_seconds_clipped() {
        let record = RecordBuilder::new().opened_at(1_000).exited_at(400).build();
        assert_eq!(record.session_seconds(), 0);

        let record = RecordBuilder::new().opened_at(1_000).exited_at(1_600).build();
        assert_eq!(record.session_seconds(), 600);
    }

    #[test]
    fn test_validate() {
        assert!(RecordBuilder::new().build().validate().is_ok());
        assert!(RecordBuilder::new().temperature(2.0).build().validate().is_ok());

        let err = RecordBuilder::new().temperature(2.5).build().validate();
        assert_eq!(err.unwrap_err(), "temperature 2.5 outside [0, 2]");

        let err = RecordBuilder::new().temperature(f64::NAN).build().validate();
        assert!(err.is_err());

        let err = RecordBuilder::new().model("").build().validate();
        assert_eq!(err.unwrap_err(), "empty model name");

        let err = RecordBuilder::new().created_at(-5).build().validate();
        assert_eq!(err.unwrap_err(), "created_at is negative (-5)");
    }
}
