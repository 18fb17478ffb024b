//! Word tokenizer for message text
//!
//! Splits every message of a record into lowercase alphabetic words,
//! treating any run of non-alphabetic characters as a separator and
//! dropping stop words. Tokens that are already lowercase are borrowed
//! straight from the message text.
//!
//! # Examples
//!
//! ```
//! use chatstat_core::tokenizer::{StopWords, tokenize};
//! use chatstat_core::types::{Message, ModelName, Record, SessionId, UserId};
//!
//! let record = Record {
//!     owner: UserId::new("alice"),
//!     session_id: SessionId::new("s1"),
//!     model_name: ModelName::new("GPT-4o"),
//!     tags: Default::default(),
//!     prompt_tokens: 0,
//!     completion_tokens: 0,
//!     temperature: 1.0,
//!     created_at: 0,
//!     last_opened_at: 0,
//!     last_exit_at: 0,
//!     messages: vec![Message::new("user", "Is the Rust-lang book good?")],
//! };
//!
//! let words: Vec<_> = tokenize(&record, StopWords::english()).collect();
//! assert_eq!(words, ["rust", "lang", "book", "good"]);
//! ```

use crate::error::Result;
use crate::types::{Message, Record};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "don", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "ll", "m", "me", "more", "most", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over",
    "own", "re", "s", "same", "she", "should", "so", "some", "such", "t", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "ve", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your", "yours", "yourself", "yourselves",
];

static ENGLISH: Lazy<StopWords> = Lazy::new(|| StopWords::new(ENGLISH_STOP_WORDS.iter().copied()));

/// Read-only set of words excluded from vocabulary counts
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Build a stop-word set; entries are lowercased
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// The built-in English list, built once per process
    pub fn english() -> &'static StopWords {
        &ENGLISH
    }

    /// Load a newline-separated stop-word file; blank lines and `#` comments are skipped
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let words = Self::new(
            content
                .lines()
                .filter(|line| !line.trim_start().starts_with('#')),
        );
        debug!("Loaded {} stop words from {}", words.len(), path.display());
        Ok(words)
    }

    /// Whether `word` is a stop word
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Lazy token sequence over a record's messages
///
/// A clone continues independently from the current position; call
/// [`tokenize`] again to start over from the first message.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    messages: std::slice::Iter<'a, Message>,
    rest: &'a str,
    stop_words: &'a StopWords,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(start) = self.rest.find(char::is_alphabetic) else {
                self.rest = &self.messages.next()?.content;
                continue;
            };

            let tail = &self.rest[start..];
            let end = tail
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(tail.len());
            let word = &tail[..end];
            self.rest = &tail[end..];

            let token = if word.chars().any(char::is_uppercase) {
                Cow::Owned(word.to_lowercase())
            } else {
                Cow::Borrowed(word)
            };

            if !self.stop_words.contains(&token) {
                return Some(token);
            }
        }
    }
}

/// Tokenize every message of `record`, in message order
pub fn tokenize<'a>(record: &'a Record, stop_words: &'a StopWords) -> Tokens<'a> {
    Tokens {
        messages: record.messages.iter(),
        rest: "",
        stop_words,
    }
}
