//! Profile accumulator and finished summary
//!
//! A [`Profile`] holds running sums, extrema, and frequency tables for a set
//! of session records. Two profiles built from disjoint record sets merge
//! into the profile of their union, independent of grouping or order.
//! Derived values (averages, top-K rankings) live in [`ProfileSummary`]
//! and are only present on finished profiles.

use crate::frequency::{FrequencyTable, RankedEntry};
use crate::tokenizer::{StopWords, tokenize};
use crate::types::Record;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Sum and extrema of a token counter
///
/// The sum is kept in `u128` so any number of `u64` counters adds up
/// without wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStats {
    pub sum: u128,
    pub min: u64,
    pub max: u64,
}

impl Default for TokenStats {
    fn default() -> Self {
        Self {
            sum: 0,
            min: u64::MAX,
            max: u64::MIN,
        }
    }
}

impl TokenStats {
    fn add(&mut self, value: u64) {
        self.sum += u128::from(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// Sum, extrema, and time-of-day sum of a timestamp field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampStats {
    pub sum: i128,
    pub min: i64,
    pub max: i64,
    /// Sum of `timestamp mod 86400`
    pub time_of_day_sum: u128,
}

impl Default for TimestampStats {
    fn default() -> Self {
        Self {
            sum: 0,
            min: i64::MAX,
            max: i64::MIN,
            time_of_day_sum: 0,
        }
    }
}

impl TimestampStats {
    fn add(&mut self, ts: i64) {
        self.sum += i128::from(ts);
        self.min = self.min.min(ts);
        self.max = self.max.max(ts);
        self.time_of_day_sum += ts.rem_euclid(SECONDS_PER_DAY) as u128;
    }

    fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.time_of_day_sum += other.time_of_day_sum;
    }
}

/// Derived fields of a finished profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub avg_prompt_tokens: f64,
    pub avg_completion_tokens: f64,
    pub avg_temperature: f64,
    /// Average seconds after midnight UTC
    pub avg_time_of_day_created: f64,
    pub avg_time_of_day_opened: f64,
    pub avg_time_of_day_exited: f64,
    pub avg_session_duration_minutes: f64,
    pub top_tags: Vec<RankedEntry>,
    pub top_words: Vec<RankedEntry>,
    pub top_model_families: Vec<RankedEntry>,
    /// Number of users covered (admin profiles only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_count: Option<u64>,
    /// Sessions per user (admin profiles only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avg_sessions_per_user: Option<f64>,
}

impl ProfileSummary {
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= epsilon;
        close(self.avg_prompt_tokens, other.avg_prompt_tokens)
            && close(self.avg_completion_tokens, other.avg_completion_tokens)
            && close(self.avg_temperature, other.avg_temperature)
            && close(self.avg_time_of_day_created, other.avg_time_of_day_created)
            && close(self.avg_time_of_day_opened, other.avg_time_of_day_opened)
            && close(self.avg_time_of_day_exited, other.avg_time_of_day_exited)
            && close(
                self.avg_session_duration_minutes,
                other.avg_session_duration_minutes,
            )
            && self.top_tags == other.top_tags
            && self.top_words == other.top_words
            && self.top_model_families == other.top_model_families
            && self.user_count == other.user_count
            && match (self.avg_sessions_per_user, other.avg_sessions_per_user) {
                (Some(a), Some(b)) => close(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Running aggregate over session records
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Number of records folded in
    pub sessions: u64,
    pub prompt_tokens: TokenStats,
    pub completion_tokens: TokenStats,
    pub temperature_sum: f64,
    pub created: TimestampStats,
    pub opened: TimestampStats,
    pub exited: TimestampStats,
    /// Sum of `last_exit_at - last_opened_at`, negatives counted as zero
    pub session_seconds: u128,
    pub tag_counts: FrequencyTable,
    pub word_counts: FrequencyTable,
    pub model_family_counts: FrequencyTable,
    /// Users covered, set only for the admin audience
    pub user_count: Option<u64>,
    /// Present once the profile has been finished
    pub summary: Option<ProfileSummary>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl Profile {
    /// An empty profile: zero sums, sentinel extrema, empty tables
    pub fn new() -> Self {
        Self {
            sessions: 0,
            prompt_tokens: TokenStats::default(),
            completion_tokens: TokenStats::default(),
            temperature_sum: 0.0,
            created: TimestampStats::default(),
            opened: TimestampStats::default(),
            exited: TimestampStats::default(),
            session_seconds: 0,
            tag_counts: FrequencyTable::new(),
            word_counts: FrequencyTable::new(),
            model_family_counts: FrequencyTable::new(),
            user_count: None,
            summary: None,
        }
    }

    /// Fold one record in
    ///
    /// The record is assumed to be valid; see [`Record::validate`].
    pub fn add_record(&mut self, record: &Record, stop_words: &StopWords) {
        self.sessions += 1;
        self.prompt_tokens.add(record.prompt_tokens);
        self.completion_tokens.add(record.completion_tokens);
        self.temperature_sum += record.temperature;
        self.created.add(record.created_at);
        self.opened.add(record.last_opened_at);
        self.exited.add(record.last_exit_at);
        self.session_seconds += u128::from(record.session_seconds());

        for tag in &record.tags {
            self.tag_counts.increment(tag);
        }
        for word in tokenize(record, stop_words) {
            self.word_counts.increment(&word);
        }
        self.model_family_counts.increment(record.model_name.family());

        self.summary = None;
    }

    /// Fold another independently built profile in
    pub fn merge(&mut self, other: Profile) {
        self.sessions += other.sessions;
        self.prompt_tokens.merge(&other.prompt_tokens);
        self.completion_tokens.merge(&other.completion_tokens);
        self.temperature_sum += other.temperature_sum;
        self.created.merge(&other.created);
        self.opened.merge(&other.opened);
        self.exited.merge(&other.exited);
        self.session_seconds += other.session_seconds;
        self.tag_counts.merge(other.tag_counts);
        self.word_counts.merge(other.word_counts);
        self.model_family_counts.merge(other.model_family_counts);
        self.user_count = match (self.user_count, other.user_count) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        self.summary = None;
    }

    /// Mark this profile as covering `users` users and refresh the
    /// per-user average if the profile is already finished
    pub fn with_audience(mut self, users: u64) -> Self {
        self.user_count = Some(users);
        let per_user = self.sessions_per_user();
        if let Some(summary) = self.summary.as_mut() {
            summary.user_count = Some(users);
            summary.avg_sessions_per_user = per_user;
        }
        self
    }

    fn average(&self, total: f64) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            total / self.sessions as f64
        }
    }

    fn sessions_per_user(&self) -> Option<f64> {
        self.user_count.map(|users| {
            if users == 0 {
                0.0
            } else {
                self.sessions as f64 / users as f64
            }
        })
    }

    /// Compute the derived fields from the running aggregates
    pub fn summarize(
        &self,
        top_tags: usize,
        top_words: usize,
        top_families: usize,
    ) -> ProfileSummary {
        ProfileSummary {
            avg_prompt_tokens: self.average(self.prompt_tokens.sum as f64),
            avg_completion_tokens: self.average(self.completion_tokens.sum as f64),
            avg_temperature: self.average(self.temperature_sum),
            avg_time_of_day_created: self.average(self.created.time_of_day_sum as f64),
            avg_time_of_day_opened: self.average(self.opened.time_of_day_sum as f64),
            avg_time_of_day_exited: self.average(self.exited.time_of_day_sum as f64),
            avg_session_duration_minutes: self.average(self.session_seconds as f64) / 60.0,
            top_tags: self.tag_counts.top_k(top_tags),
            top_words: self.word_counts.top_k(top_words),
            top_model_families: self.model_family_counts.top_k(top_families),
            user_count: self.user_count,
            avg_sessions_per_user: self.sessions_per_user(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some()
    }

    /// Smallest prompt token count, 0 for an empty profile
    pub fn min_prompt_tokens(&self) -> u64 {
        self.reported(self.prompt_tokens.min)
    }

    /// Largest prompt token count, 0 for an empty profile
    pub fn max_prompt_tokens(&self) -> u64 {
        self.reported(self.prompt_tokens.max)
    }

    pub fn min_completion_tokens(&self) -> u64 {
        self.reported(self.completion_tokens.min)
    }

    pub fn max_completion_tokens(&self) -> u64 {
        self.reported(self.completion_tokens.max)
    }

    /// Earliest and latest creation time, `None` for an empty profile
    pub fn created_range(&self) -> Option<(i64, i64)> {
        (self.sessions > 0).then_some((self.created.min, self.created.max))
    }

    pub fn opened_range(&self) -> Option<(i64, i64)> {
        (self.sessions > 0).then_some((self.opened.min, self.opened.max))
    }

    pub fn exited_range(&self) -> Option<(i64, i64)> {
        (self.sessions > 0).then_some((self.exited.min, self.exited.max))
    }

    fn reported(&self, value: u64) -> u64 {
        if self.sessions == 0 { 0 } else { value }
    }

    /// Field-by-field equality: integers and tables exactly, reals within `epsilon`
    pub fn approx_eq(&self, other: &Profile, epsilon: f64) -> bool {
        self.sessions == other.sessions
            && self.prompt_tokens == other.prompt_tokens
            && self.completion_tokens == other.completion_tokens
            && (self.temperature_sum - other.temperature_sum).abs() <= epsilon
            && self.created == other.created
            && self.opened == other.opened
            && self.exited == other.exited
            && self.session_seconds == other.session_seconds
            && self.tag_counts == other.tag_counts
            && self.word_counts == other.word_counts
            && self.model_family_counts == other.model_family_counts
            && self.user_count == other.user_count
            && match (&self.summary, &other.summary) {
                (Some(a), Some(b)) => a.approx_eq(b, epsilon),
                (None, None) => true,
                _ => false,
            }
    }
}
