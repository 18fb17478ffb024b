//! Frequency tables and top-K ranking
//!
//! A `FrequencyTable` counts occurrences per string key. Tables merge by
//! summing counts, which makes merging associative and commutative, and
//! rank with a fixed rule: count descending, then key descending.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One ranked entry of a top-K list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub key: String,
    pub count: u64,
}

impl RankedEntry {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Ranking order used by [`FrequencyTable::top_k`]
fn rank(a: (&str, u64), b: (&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0))
}

/// Count of occurrences per key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `key`
    ///
    /// Allocates only the first time a key is seen.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Add `count` occurrences of `key`
    pub fn add(&mut self, key: &str, count: u64) {
        if let Some(existing) = self.counts.get_mut(key) {
            *existing += count;
        } else {
            self.counts.insert(key.to_owned(), count);
        }
    }

    /// Fold another table into this one, summing counts per key
    pub fn merge(&mut self, other: FrequencyTable) {
        if self.counts.len() < other.counts.len() {
            let smaller = std::mem::replace(&mut self.counts, other.counts);
            for (key, count) in smaller {
                *self.counts.entry(key).or_insert(0) += count;
            }
        } else {
            for (key, count) in other.counts {
                *self.counts.entry(key).or_insert(0) += count;
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The `k` highest-count entries, ties broken by key descending
    ///
    /// # Examples
    /// ```
    /// use chatstat_core::frequency::{FrequencyTable, RankedEntry};
    ///
    /// let table: FrequencyTable = [("a", 5), ("b", 5), ("c", 3)].into_iter().collect();
    /// assert_eq!(
    ///     table.top_k(2),
    ///     vec![RankedEntry::new("b", 5), RankedEntry::new("a", 5)]
    /// );
    /// ```
    pub fn top_k(&self, k: usize) -> Vec<RankedEntry> {
        if k == 0 {
            return Vec::new();
        }

        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        if entries.len() > k {
            entries.select_nth_unstable_by(k - 1, |a, b| rank(*a, *b));
            entries.truncate(k);
        }
        entries.sort_unstable_by(|a, b| rank(*a, *b));

        entries
            .into_iter()
            .map(|(key, count)| RankedEntry::new(key, count))
            .collect()
    }
}

impl<K: AsRef<str>> FromIterator<(K, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, count) in iter {
            table.add(key.as_ref(), count);
        }
        table
    }
}

impl From<&[RankedEntry]> for FrequencyTable {
    fn from(entries: &[RankedEntry]) -> Self {
        entries.iter().map(|e| (e.key.as_str(), e.count)).collect()
    }
}
