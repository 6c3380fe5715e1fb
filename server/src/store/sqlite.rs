use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;

use super::{PresenceFields, PresenceRecord, PresenceStore, StoreError};
use crate::db::DbPool;

/// Presence store backed by the relay's SQLite database.
#[derive(Clone)]
pub struct SqlitePresenceStore {
    db: DbPool,
}

impl SqlitePresenceStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PresenceStore for SqlitePresenceStore {
    async fn update_presence(
        &self,
        user_id: &str,
        fields: &PresenceFields,
    ) -> Result<(), StoreError> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let fields = fields.clone();

        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            conn.execute(
                "INSERT INTO user_presence (user_id, is_online, status, last_seen, socket_id, updated_at)
                 VALUES (?1, COALESCE(?2, 0), ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    is_online = COALESCE(?2, user_presence.is_online),
                    status = COALESCE(excluded.status, user_presence.status),
                    last_seen = excluded.last_seen,
                    socket_id = COALESCE(excluded.socket_id, user_presence.socket_id),
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    user_id,
                    fields.is_online,
                    fields.status,
                    fields.last_seen,
                    fields.socket_id,
                    Utc::now(),
                ],
            )?;
            Ok(())
        })
        .await?
    }

    async fn get_presence(&self, user_id: &str) -> Result<Option<PresenceRecord>, StoreError> {
        let db = self.db.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            let record = conn
                .query_row(
                    "SELECT user_id, is_online, status, last_seen, socket_id
                     FROM user_presence WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| {
                        Ok(PresenceRecord {
                            user_id: row.get(0)?,
                            is_online: row.get(1)?,
                            status: row.get(2)?,
                            last_seen: row.get(3)?,
                            socket_id: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await?
    }
}
