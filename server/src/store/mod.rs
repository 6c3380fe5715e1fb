//! Presence attributes in the user-profile store.
//!
//! The relay writes presence as a side effect of `updatePresence` and of
//! disconnects, and never reads it back for a routing decision. Reads exist
//! only for the HTTP presence endpoint.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use sqlite::SqlitePresenceStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One presence write. `None` fields keep whatever the store already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceFields {
    pub is_online: Option<bool>,
    pub status: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub socket_id: Option<String>,
}

impl PresenceFields {
    /// Fields written when a user's connection goes away.
    pub fn offline(last_seen: DateTime<Utc>) -> Self {
        Self {
            is_online: Some(false),
            status: None,
            last_seen,
            socket_id: None,
        }
    }
}

/// Stored presence of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub user_id: String,
    pub is_online: bool,
    pub status: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub socket_id: Option<String>,
}

#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Update presence fields by user id, creating the record if needed.
    async fn update_presence(
        &self,
        user_id: &str,
        fields: &PresenceFields,
    ) -> Result<(), StoreError>;

    async fn get_presence(&self, user_id: &str) -> Result<Option<PresenceRecord>, StoreError>;
}
