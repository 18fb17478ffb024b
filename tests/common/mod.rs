//! Common test utilities and helpers for chatstat tests
//!
//! This module provides a record builder, deterministic dataset generators,
//! and store helpers shared by the integration tests and benches.

#![allow(dead_code)]

use chatstat_core::store::MemorySessionStore;
use chatstat_core::types::{Message, ModelName, Record, SessionId, UserId};
use std::collections::BTreeSet;

/// 2025-03-01 00:00:00 UTC
pub const BASE_TIME: i64 = 1_740_787_200;

/// Models seen in the chat client's database
pub const TEST_MODELS: &[&str] = &["GPT-4o", "GPT-4o-mini", "Llama-3-70b", "Claude-3-haiku"];

/// Tags the chat client offers
pub const TEST_TAGS: &[&str] = &["todo", "demo", "favorite", "unlike", "test"];

const VOCABULARY: &[&str] = &[
    "rust", "ownership", "borrow", "checker", "lifetime", "trait", "generic", "closure",
    "iterator", "vector", "string", "slice", "thread", "channel", "mutex", "async", "await",
    "future", "runtime", "tokio", "serde", "json", "parser", "compiler", "macro", "crate",
    "module", "cargo", "test", "bench", "error", "result", "option", "match", "enum", "struct",
    "the", "a", "and", "of", "to", "is", "in", "it", "you", "that",
];

/// Builder for creating test Record instances
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
                created_at: BASE_TIME,
                last_opened_at: BASE_TIME,
                last_exit_at: BASE_TIME + 600,
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

    /// Set created, opened and exit times
    pub fn times(mut self, created: i64, opened: i64, exited: i64) -> Self {
        self.record.created_at = created;
        self.record.last_opened_at = opened;
        self.record.last_exit_at = exited;
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

/// Small deterministic generator so datasets are reproducible without a seed file
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1))
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound.max(1)
    }
}

fn sentence(rng: &mut Lcg, words: usize) -> String {
    (0..words)
        .map(|_| VOCABULARY[rng.below(VOCABULARY.len() as u64) as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

/// One generated session with `words` words of conversation per turn
pub fn generated_record(rng: &mut Lcg, index: usize, users: usize, words: usize) -> Record {
    let created = BASE_TIME + rng.below(90 * 86_400) as i64;
    let opened = created + rng.below(86_400) as i64;
    let exited = opened + rng.below(7_200) as i64;
    let mut builder = RecordBuilder::new()
        .owner(&format!("user{}", index % users.max(1)))
        .session(&format!("session-{index}"))
        .model(TEST_MODELS[rng.below(TEST_MODELS.len() as u64) as usize])
        .tokens(rng.below(4_000), rng.below(8_000))
        .temperature(rng.below(21) as f64 / 10.0)
        .times(created, opened, exited);
    for _ in 0..rng.below(4) {
        builder = builder.tag(TEST_TAGS[rng.below(TEST_TAGS.len() as u64) as usize]);
    }
    builder
        .message("user", &sentence(rng, words))
        .message("assistant", &sentence(rng, words))
        .build()
}

/// `n` sessions of similar length spread over `users` users
pub fn uniform_dataset(n: usize, users: usize) -> Vec<Record> {
    let mut rng = Lcg::new(7);
    (0..n)
        .map(|i| generated_record(&mut rng, i, users, 24))
        .collect()
}

/// `n` sessions where the first 1% carry long conversations holding most
/// of the message bytes
pub fn skewed_dataset(n: usize, users: usize) -> Vec<Record> {
    let mut rng = Lcg::new(11);
    let long = (n / 100).max(1);
    (0..n)
        .map(|i| {
            let words = if i < long { 3_000 } else { 12 };
            generated_record(&mut rng, i, users, words)
        })
        .collect()
}

/// Whether the longest 1% of records hold at least half of all message bytes
pub fn is_skewed(records: &[Record]) -> bool {
    let mut lengths: Vec<usize> = records.iter().map(Record::content_len).collect();
    let total: usize = lengths.iter().sum();
    if total == 0 {
        return false;
    }
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    let top = lengths.len().div_ceil(100);
    let head: usize = lengths[..top].iter().sum();
    head * 2 >= total
}

/// Store holding `records`, grouped by owner
pub fn store_of(records: impl IntoIterator<Item = Record>) -> MemorySessionStore {
    records.into_iter().collect()
}
