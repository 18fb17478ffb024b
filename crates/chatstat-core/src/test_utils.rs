//! Shared test utilities for unit tests
//!
//! Integration tests cannot see this module because it is `#[cfg(test)]`;
//! they carry their own builder in `tests/common/mod.rs`.

use crate::types::{Message, ModelName, Record, SessionId, UserId};
use std::collections::BTreeSet;

/// Builder for creating test `Record` instances
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            record: Record {
                owner: UserId::new("tester"),
                session_id: SessionId::new("session"),
                model_name: ModelName::new("GPT-4o"),
                tags: BTreeSet::new(),
                prompt_tokens: 100,
                completion_tokens: 50,
                temperature: 1.0,
                created_at: 1_740_787_200,
                last_opened_at: 1_740_787_200,
                last_exit_at: 1_740_787_800,
                messages: Vec::new(),
            },
        }
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.record.owner = UserId::new(owner);
        self
    }

    pub fn session(mut self, id: &str) -> Self {
        self.record.session_id = SessionId::new(id);
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.record.model_name = ModelName::new(model);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.record.tags.insert(tag.to_string());
        self
    }

    pub fn tokens(mut self, prompt: u64, completion: u64) -> Self {
        self.record.prompt_tokens = prompt;
        self.record.completion_tokens = completion;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.record.temperature = temperature;
        self
    }

    pub fn created_at(mut self, ts: i64) -> Self {
        self.record.created_at = ts;
        self
    }

    pub fn opened_at(mut self, ts: i64) -> Self {
        self.record.last_opened_at = ts;
        self
    }

    pub fn exited_at(mut self, ts: i64) -> Self {
        self.record.last_exit_at = ts;
        self
    }

    pub fn message(mut self, role: &str, content: &str) -> Self {
        self.record.messages.push(Message::new(role, content));
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}
