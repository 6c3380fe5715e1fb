//! Integration tests for the SQLite-backed presence store.

use chrono::{Duration, Utc};

use hive_relay::store::{PresenceFields, PresenceStore, SqlitePresenceStore};

fn open_store() -> (SqlitePresenceStore, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();
    let db = hive_relay::db::init_db(&data_dir).expect("Failed to init DB");
    (SqlitePresenceStore::new(db), tmp_dir)
}

#[tokio::test]
async fn test_unknown_user_has_no_presence() {
    let (store, _tmp) = open_store();
    assert_eq!(store.get_presence("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn test_presence_write_creates_record() {
    let (store, _tmp) = open_store();
    let now = Utc::now();

    store
        .update_presence(
            "alice",
            &PresenceFields {
                is_online: Some(true),
                status: Some("available".to_string()),
                last_seen: now,
                socket_id: Some("conn-1".to_string()),
            },
        )
        .await
        .unwrap();

    let record = store.get_presence("alice").await.unwrap().expect("record");
    assert_eq!(record.user_id, "alice");
    assert!(record.is_online);
    assert_eq!(record.status.as_deref(), Some("available"));
    assert_eq!(record.last_seen, now);
    assert_eq!(record.socket_id.as_deref(), Some("conn-1"));
}

#[tokio::test]
async fn test_offline_write_keeps_status_and_socket() {
    let (store, _tmp) = open_store();
    let online_at = Utc::now() - Duration::minutes(5);
    let offline_at = Utc::now();

    store
        .update_presence(
            "alice",
            &PresenceFields {
                is_online: Some(true),
                status: Some("busy".to_string()),
                last_seen: online_at,
                socket_id: Some("conn-1".to_string()),
            },
        )
        .await
        .unwrap();
    store
        .update_presence("alice", &PresenceFields::offline(offline_at))
        .await
        .unwrap();

    let record = store.get_presence("alice").await.unwrap().expect("record");
    assert!(!record.is_online);
    assert_eq!(record.last_seen, offline_at);
    assert_eq!(record.status.as_deref(), Some("busy"));
    assert_eq!(record.socket_id.as_deref(), Some("conn-1"));
}

#[tokio::test]
async fn test_presence_survives_reopen() {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    {
        let store = SqlitePresenceStore::new(hive_relay::db::init_db(&data_dir).unwrap());
        store
            .update_presence("bob", &PresenceFields::offline(Utc::now()))
            .await
            .unwrap();
    }

    let store = SqlitePresenceStore::new(hive_relay::db::init_db(&data_dir).unwrap());
    let record = store.get_presence("bob").await.unwrap().expect("record");
    assert!(!record.is_online);
    assert_eq!(record.status, None);
}

#[tokio::test]
async fn test_write_without_online_flag_keeps_stored_flag() {
    let (store, _tmp) = open_store();
    let status_only = |status: &str| PresenceFields {
        is_online: None,
        status: Some(status.to_string()),
        last_seen: Utc::now(),
        socket_id: None,
    };

    // A first write without the flag creates the record offline
    store.update_presence("carol", &status_only("away")).await.unwrap();
    let record = store.get_presence("carol").await.unwrap().expect("record");
    assert!(!record.is_online);
    assert_eq!(record.status.as_deref(), Some("away"));

    store
        .update_presence(
            "carol",
            &PresenceFields {
                is_online: Some(true),
                status: None,
                last_seen: Utc::now(),
                socket_id: Some("conn-9".to_string()),
            },
        )
        .await
        .unwrap();
    store.update_presence("carol", &status_only("busy")).await.unwrap();

    let record = store.get_presence("carol").await.unwrap().expect("record");
    assert!(record.is_online, "Status-only write must not mark the user offline");
    assert_eq!(record.status.as_deref(), Some("busy"));
    assert_eq!(record.socket_id.as_deref(), Some("conn-9"));
}
