use pushinbox_core::db::migrations::latest_version;
use pushinbox_core::db::{open_db, DbError};
use pushinbox_core::{
    normalize, IngestionStamp, NotificationDefaults, NotificationRecord, NotificationStore,
    PersistenceError, PersistenceGateway, RawNotification, SqliteGateway, StoreConfig,
};
use rusqlite::Connection;
use serde_json::json;

fn record_with_data(millis: i64, data: serde_json::Value) -> NotificationRecord {
    normalize(
        RawNotification {
            title: Some(format!("Title {millis}")),
            body: Some(format!("Body {millis}")),
            data: data.as_object().cloned(),
        },
        &NotificationDefaults::default(),
        IngestionStamp::from_millis(millis),
    )
}

#[test]
fn save_then_load_preserves_order_flags_and_data() {
    let mut gateway = SqliteGateway::open_in_memory().unwrap();
    let mut store = NotificationStore::ephemeral(&StoreConfig::default());
    store.insert(record_with_data(1, json!({ "screen": "messages", "senderId": "123" })));
    store.insert(record_with_data(2, json!(null)));
    store.insert(record_with_data(3, json!({ "nested": { "a": [1, 2] } })));
    store.mark_read("2");

    gateway.save(store.records()).unwrap();
    let loaded = gateway.load().unwrap();

    assert_eq!(loaded, store.records().to_vec());
    assert!(loaded[1].is_read());
    assert!(loaded[1].data().is_none());
}

#[test]
fn save_replaces_previous_snapshot() {
    let mut gateway = SqliteGateway::open_in_memory().unwrap();
    gateway
        .save(&[record_with_data(1, json!({})), record_with_data(2, json!({}))])
        .unwrap();
    gateway.save(&[record_with_data(3, json!({}))]).unwrap();

    let loaded = gateway.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), "3");

    gateway.save(&[]).unwrap();
    assert!(gateway.load().unwrap().is_empty());
}

#[test]
fn store_reopen_restores_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.db");

    {
        let gateway = SqliteGateway::open(&path).unwrap();
        let mut store =
            NotificationStore::open(Box::new(gateway), &StoreConfig::default(), None);
        store.insert(record_with_data(10, json!({ "type": "voice_call" })));
        store.insert(record_with_data(11, json!({})));
        store.mark_read("10");
        assert!(store.flush_saves());
    }

    let gateway = SqliteGateway::open(&path).unwrap();
    let store = NotificationStore::open(Box::new(gateway), &StoreConfig::default(), None);

    assert_eq!(store.ids(), vec!["11", "10"]);
    assert_eq!(store.badge_count(), 1);
    assert!(store.get("10").unwrap().is_read());
}

#[test]
fn opening_database_with_newer_schema_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = SqliteGateway::open(&path).err().unwrap();
    match err {
        PersistenceError::Db(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn load_rejects_invalid_read_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.db");
    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO notifications (id, position, title, body, data, received_at, is_read)
         VALUES ('1', 0, 't', 'b', NULL, '1970-01-01T00:00:00.001Z', 7);",
        [],
    )
    .unwrap();

    let mut gateway = SqliteGateway::from_connection(conn);
    let err = gateway.load().unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(message) if message.contains("is_read")));
}

#[test]
fn load_rejects_non_object_data() {
    let conn = open_db(":memory:").unwrap();
    conn.execute(
        "INSERT INTO notifications (id, position, title, body, data, received_at, is_read)
         VALUES ('1', 0, 't', 'b', '[1,2]', '1970-01-01T00:00:00.001Z', 0);",
        [],
    )
    .unwrap();

    let mut gateway = SqliteGateway::from_connection(conn);
    let err = gateway.load().unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn corrupt_snapshot_opens_empty_store() {
    let conn = open_db(":memory:").unwrap();
    conn.execute(
        "INSERT INTO notifications (id, position, title, body, data, received_at, is_read)
         VALUES ('1', 0, 't', 'b', 'not json', '1970-01-01T00:00:00.001Z', 0);",
        [],
    )
    .unwrap();

    let store = NotificationStore::open(
        Box::new(SqliteGateway::from_connection(conn)),
        &StoreConfig::default(),
        None,
    );

    assert!(store.is_empty());
    assert_eq!(store.badge_count(), 0);
}
