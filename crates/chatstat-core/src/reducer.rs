//! The reduction contract shared by every scheduling strategy
//!
//! A [`Reducer`] describes an aggregation as four operations:
//!
//! - `identity` creates an empty accumulator,
//! - `accumulate` folds one record into an accumulator,
//! - `combine` merges two accumulators built from disjoint inputs,
//! - `finish` computes the derived fields once at the end.
//!
//! `combine` must be associative and commutative, so any partitioning of the
//! input, folded independently and merged in any order, finishes to the same
//! result as a single in-order fold.
//!
//! # Examples
//!
//! ```
//! use chatstat_core::reducer::{ProfileReducer, Reducer};
//! use chatstat_core::types::{Message, ModelName, Record, SessionId, UserId};
//!
//! let record = Record {
//!     owner: UserId::new("alice"),
//!     session_id: SessionId::new("s1"),
//!     model_name: ModelName::new("GPT-4o"),
//!     tags: ["todo".to_string()].into(),
//!     prompt_tokens: 12,
//!     completion_tokens: 40,
//!     temperature: 0.7,
//!     created_at: 1_740_787_200,
//!     last_opened_at: 1_740_787_200,
//!     last_exit_at: 1_740_787_500,
//!     messages: vec![Message::new("user", "hello world")],
//! };
//!
//! let reducer = ProfileReducer::default();
//! let mut profile = reducer.identity();
//! reducer.accumulate(&mut profile, &record)?;
//! let profile = reducer.finish(profile);
//!
//! let summary = profile.summary.as_ref().unwrap();
//! assert_eq!(summary.avg_session_duration_minutes, 5.0);
//! assert_eq!(summary.top_words[0].key, "world");
//! # Ok::<(), chatstat_core::ChatstatError>(())
//! ```

use crate::error::{ChatstatError, Result};
use crate::profile::Profile;
use crate::tokenizer::StopWords;
use crate::types::Record;
use std::sync::Arc;

/// Identity / accumulate / combine / finish
///
/// Implementations are shared by reference across worker threads, so they
/// must be `Send + Sync`; accumulators move between threads once, at the
/// combine step.
pub trait Reducer: Send + Sync {
    /// Running aggregate, also the finished result
    type Accumulator: Send;

    /// A fresh, empty accumulator
    fn identity(&self) -> Self::Accumulator;

    /// Fold one record into `acc`
    ///
    /// On error `acc` is left untouched and the whole aggregation must be
    /// abandoned.
    fn accumulate(&self, acc: &mut Self::Accumulator, record: &Record) -> Result<()>;

    /// Merge two accumulators built from disjoint inputs
    fn combine(&self, a: Self::Accumulator, b: Self::Accumulator) -> Self::Accumulator;

    /// Compute derived fields; applying it twice changes nothing
    fn finish(&self, acc: Self::Accumulator) -> Self::Accumulator;
}

/// How many entries each top-K ranking keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKLimits {
    pub tags: usize,
    pub words: usize,
    pub model_families: usize,
}

impl Default for TopKLimits {
    fn default() -> Self {
        Self {
            tags: 3,
            words: 20,
            model_families: 5,
        }
    }
}

/// Reducer producing a [`Profile`]
#[derive(Debug, Clone)]
pub struct ProfileReducer {
    stop_words: Arc<StopWords>,
    limits: TopKLimits,
}

impl Default for ProfileReducer {
    fn default() -> Self {
        Self::new(Arc::new(StopWords::english().clone()), TopKLimits::default())
    }
}

impl ProfileReducer {
    pub fn new(stop_words: Arc<StopWords>, limits: TopKLimits) -> Self {
        Self { stop_words, limits }
    }

    pub fn limits(&self) -> TopKLimits {
        self.limits
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }
}

impl Reducer for ProfileReducer {
    type Accumulator = Profile;

    fn identity(&self) -> Profile {
        Profile::new()
    }

    fn accumulate(&self, acc: &mut Profile, record: &Record) -> Result<()> {
        record
            .validate()
            .map_err(|reason| ChatstatError::MalformedRecord {
                session: record.session_id.clone(),
                reason,
            })?;
        acc.add_record(record, &self.stop_words);
        Ok(())
    }

    fn combine(&self, mut a: Profile, b: Profile) -> Profile {
        a.merge(b);
        a
    }

    fn finish(&self, mut acc: Profile) -> Profile {
        acc.summary = Some(acc.summarize(
            self.limits.tags,
            self.limits.words,
            self.limits.model_families,
        ));
        acc
    }
}
