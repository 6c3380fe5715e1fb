use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking, no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: presence attributes written by the relay

CREATE TABLE user_presence (
    user_id TEXT PRIMARY KEY,
    is_online INTEGER NOT NULL DEFAULT 0,
    status TEXT,
    last_seen TEXT NOT NULL,
    socket_id TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_user_presence_online ON user_presence(is_online);
",
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }
}
