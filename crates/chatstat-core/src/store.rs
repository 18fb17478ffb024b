//! Session store trait
//!
//! This module defines the `SessionStore` trait that every record source
//! implements, plus an in-memory implementation used for embedding and
//! tests. Stores hand out fully materialized records; the aggregation engine
//! never performs I/O while folding.

use crate::error::{ChatstatError, Result};
use crate::types::{Record, UserId};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Source of session records keyed by user
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All sessions of `user`
    ///
    /// Fails with [`ChatstatError::UserNotFound`] for an unknown user. A known
    /// user without sessions yields an empty vector.
    async fn sessions_of(&self, user: &UserId) -> Result<Vec<Record>>;

    /// Every user known to the store
    async fn all_users(&self) -> Result<BTreeSet<UserId>>;

    /// Number of sessions of `user`, with the same errors as [`sessions_of`]
    ///
    /// The default materializes the sessions and counts them. Stores that
    /// can count without copying records override it.
    ///
    /// [`sessions_of`]: SessionStore::sessions_of
    async fn session_count(&self, user: &UserId) -> Result<usize> {
        Ok(self.sessions_of(user).await?.len())
    }
}

/// Session store backed by an in-memory map
///
/// # Examples
/// ```
/// use chatstat_core::store::{MemorySessionStore, SessionStore};
/// use chatstat_core::types::UserId;
///
/// # tokio_test::block_on(async {
/// let mut store = MemorySessionStore::new();
/// store.add_user(UserId::new("alice"));
///
/// assert!(store.sessions_of(&UserId::new("alice")).await.unwrap().is_empty());
/// assert!(store.sessions_of(&UserId::new("bob")).await.is_err());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: BTreeMap<UserId, Vec<Record>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with no sessions (no-op if already present)
    pub fn add_user(&mut self, user: UserId) {
        self.sessions.entry(user).or_default();
    }

    /// Append a record to its owner's sessions, registering the owner if needed
    pub fn insert(&mut self, record: Record) {
        self.sessions
            .entry(record.owner.clone())
            .or_default()
            .push(record);
    }

    pub fn user_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of records across all users
    pub fn record_count(&self) -> usize {
        self.sessions.values().map(Vec::len).sum()
    }
}

impl FromIterator<Record> for MemorySessionStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn sessions_of(&self, user: &UserId) -> Result<Vec<Record>> {
        self.sessions
            .get(user)
            .cloned()
            .ok_or_else(|| ChatstatError::UserNotFound(user.clone()))
    }

    async fn all_users(&self) -> Result<BTreeSet<UserId>> {
        Ok(self.sessions.keys().cloned().collect())
    }

    async fn session_count(&self, user: &UserId) -> Result<usize> {
        self.sessions
            .get(user)
            .map(Vec::len)
            .ok_or_else(|| ChatstatError::UserNotFound(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordBuilder;

    #[tokio::test]
    async fn test_sessions_grouped_by_owner() {
        let store: MemorySessionStore = [
            RecordBuilder::new().owner("ann").session("a1").build(),
            RecordBuilder::new().owner("bob").session("b1").build(),
            RecordBuilder::new().owner("ann").session("a2").build(),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.user_count(), 2);
        assert_eq!(store.record_count(), 3);

        let ann = store.sessions_of(&UserId::new("ann")).await.unwrap();
        let ids: Vec<_> = ann.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2"]);

        assert_eq!(store.session_count(&UserId::new("ann")).await.unwrap(), 2);
        assert_eq!(store.session_count(&UserId::new("bob")).await.unwrap(), 1);

        let users = store.all_users().await.unwrap();
        assert_eq!(
            users.into_iter().collect::<Vec<_>>(),
            [UserId::new("ann"), UserId::new("bob")]
        );
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = MemorySessionStore::new();
        let err = store.sessions_of(&UserId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, ChatstatError::UserNotFound(ref u) if u.as_str() == "ghost"));
        assert!(store.session_count(&UserId::new("ghost")).await.is_err());
        assert!(store.all_users().await.unwrap().is_empty());
    }
}
