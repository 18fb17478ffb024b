//! Session store backed by the chat client's JSON database
//!
//! The database is a single JSON object keyed by user name. Each user maps
//! session ids to stored sessions:
//!
//! ```json
//! {
//!   "alice": {
//!     "8f1c": {
//!       "clientName": "GPT-4o",
//!       "tags": ["todo"],
//!       "totalPromptTokens": 120,
//!       "totalCompletionTokens": 340,
//!       "temperature": 0.7,
//!       "timeCreated": 1740787200,
//!       "timeLastOpen": 1740787260,
//!       "timeLastExit": 1740787800,
//!       "messages": { "contents": [ { "role": "user", "content": "hi", "tokens": 1 } ] }
//!     }
//!   }
//! }
//! ```
//!
//! Client settings stored next to the accounting fields (`apiKey`, `apiURL`,
//! `description`, `maxTokens`) are ignored.
//!
//! # Discovery
//!
//! [`JsonSessionStore::discover`] looks for the database in this order:
//! - the path in the `CHATSTAT_DB` environment variable
//! - `<data dir>/chatstat/db.json`, e.g. `~/.local/share/chatstat/db.json` on Linux
//! - `db.json` in the current directory

use crate::DB_ENV_VAR;
use async_trait::async_trait;
use chatstat_core::error::{ChatstatError, Result};
use chatstat_core::store::{MemorySessionStore, SessionStore};
use chatstat_core::types::{Message, ModelName, Record, SessionId, UserId};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stored session as written by the chat client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    client_name: String,
    #[serde(default)]
    tags: BTreeSet<String>,
    total_prompt_tokens: u64,
    total_completion_tokens: u64,
    temperature: f64,
    time_created: i64,
    time_last_open: i64,
    time_last_exit: i64,
    #[serde(default)]
    messages: StoredMessages,
}

#[derive(Debug, Default, Deserialize)]
struct StoredMessages {
    #[serde(default)]
    contents: Vec<Message>,
}

impl StoredSession {
    fn into_record(self, owner: UserId, session_id: SessionId) -> Record {
        Record {
            owner,
            session_id,
            model_name: ModelName::new(self.client_name),
            tags: self.tags,
            prompt_tokens: self.total_prompt_tokens,
            completion_tokens: self.total_completion_tokens,
            temperature: self.temperature,
            created_at: self.time_created,
            last_opened_at: self.time_last_open,
            last_exit_at: self.time_last_exit,
            messages: self.messages.contents,
        }
    }
}

/// Read-only session store loaded from a JSON database file
///
/// The whole file is read once by [`open`](Self::open); queries are then
/// served from memory.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
    sessions: MemorySessionStore,
}

impl JsonSessionStore {
    /// Load the database at `path`
    ///
    /// # Errors
    ///
    /// - [`ChatstatError::Io`] if the file cannot be read
    /// - [`ChatstatError::Json`] if it is not a JSON object of objects
    /// - [`ChatstatError::Parse`] if a session lacks a required field or has
    ///   one of the wrong type
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = tokio::fs::read(&path).await?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let sessions = Self::parse(&path, &bytes)?;
        info!(
            "Loaded {} sessions for {} users from {}",
            sessions.record_count(),
            sessions.user_count(),
            path.display()
        );
        Ok(Self { path, sessions })
    }

    /// Load the database from the first discovered location
    pub async fn discover() -> Result<Self> {
        Self::open(Self::default_path()).await
    }

    /// Where [`discover`](Self::discover) looks for the database
    pub fn default_path() -> PathBuf {
        match std::env::var(DB_ENV_VAR) {
            Ok(path) if !path.is_empty() => {
                debug!("Using database from {}: {}", DB_ENV_VAR, path);
                return PathBuf::from(path);
            }
            _ => {}
        }

        if let Some(data_dir) = dirs::data_dir() {
            let candidate = data_dir.join("chatstat").join("db.json");
            if candidate.exists() {
                return candidate;
            }
        }

        PathBuf::from("db.json")
    }

    fn parse(path: &Path, bytes: &[u8]) -> Result<MemorySessionStore> {
        let raw: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_slice(bytes)?;

        let mut store = MemorySessionStore::new();
        for (user, sessions) in raw {
            let owner = UserId::new(user);
            store.add_user(owner.clone());
            for (session_id, value) in sessions {
                let session: StoredSession =
                    serde_json::from_value(value).map_err(|e| ChatstatError::Parse {
                        file: path.to_path_buf(),
                        error: format!("session '{session_id}' of user '{owner}': {e}"),
                    })?;
                store.insert(session.into_record(owner.clone(), SessionId::new(session_id)));
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user_count(&self) -> usize {
        self.sessions.user_count()
    }

    pub fn record_count(&self) -> usize {
        self.sessions.record_count()
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn sessions_of(&self, user: &UserId) -> Result<Vec<Record>> {
        self.sessions.sessions_of(user).await
    }

    async fn all_users(&self) -> Result<BTreeSet<UserId>> {
        self.sessions.all_users().await
    }

    async fn session_count(&self, user: &UserId) -> Result<usize> {
        self.sessions.session_count(user).await
    }
}
