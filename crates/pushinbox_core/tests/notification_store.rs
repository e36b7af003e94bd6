use pushinbox_core::{
    normalize, ErrorReporter, IngestionStamp, MemoryGateway, NotificationDefaults,
    NotificationRecord, NotificationStore, PersistenceError, RawNotification, StoreConfig,
    StoreSnapshot,
};
use std::sync::{Arc, Mutex};

fn record(millis: i64) -> NotificationRecord {
    normalize(
        RawNotification {
            title: Some(format!("R{millis}")),
            ..RawNotification::default()
        },
        &NotificationDefaults::default(),
        IngestionStamp::from_millis(millis),
    )
}

fn open_store(gateway: &MemoryGateway) -> NotificationStore {
    NotificationStore::open(Box::new(gateway.clone()), &StoreConfig::default(), None)
}

fn counting_reporter() -> (ErrorReporter, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reporter: ErrorReporter = Arc::new(move |err: &PersistenceError| {
        sink.lock().unwrap().push(err.to_string());
    });
    (reporter, seen)
}

fn assert_badge_matches_scan(store: &NotificationStore) {
    let unread = store
        .records()
        .iter()
        .filter(|record| !record.is_read())
        .count();
    assert_eq!(store.badge_count(), unread);
}

#[test]
fn insert_places_newest_first() {
    let mut store = open_store(&MemoryGateway::new());

    store.insert(record(1));
    store.insert(record(2));

    assert_eq!(store.ids(), vec!["2".to_string(), "1".to_string()]);
    assert_eq!(store.records()[0].title(), "R2");
    assert_badge_matches_scan(&store);
}

#[test]
fn retention_keeps_newest_fifty() {
    let mut store = open_store(&MemoryGateway::new());

    let mut evicted = 0;
    for millis in 1..=60 {
        evicted += store.insert(record(millis));
        assert!(store.len() <= 50);
        assert_badge_matches_scan(&store);
    }

    let expected = (11..=60)
        .rev()
        .map(|millis: i64| millis.to_string())
        .collect::<Vec<_>>();
    assert_eq!(store.ids(), expected);
    assert_eq!(evicted, 10);
    assert_eq!(store.badge_count(), 50);
}

#[test]
fn retention_follows_configured_cap() {
    let config = StoreConfig {
        max_retained: 3,
        ..StoreConfig::default()
    };
    let mut store = NotificationStore::open(Box::new(MemoryGateway::new()), &config, None);

    for millis in 1..=5 {
        store.insert(record(millis));
    }

    assert_eq!(store.max_retained(), 3);
    assert_eq!(store.ids(), vec!["5", "4", "3"]);
}

#[test]
fn insert_does_not_deduplicate_identical_content() {
    let mut store = open_store(&MemoryGateway::new());

    store.insert(record(1));
    store.insert(normalize(
        RawNotification {
            title: Some("R1".to_string()),
            ..RawNotification::default()
        },
        &NotificationDefaults::default(),
        IngestionStamp::from_millis(2),
    ));

    assert_eq!(store.len(), 2);
    assert_eq!(store.records()[0].title(), store.records()[1].title());
}

#[test]
fn insert_refuses_record_with_held_id() {
    let gateway = MemoryGateway::new();
    let mut store = open_store(&gateway);
    store.insert(record(1));
    store.flush_saves();
    let saves_before = gateway.save_count();

    let evicted = store.insert(normalize(
        RawNotification {
            title: Some("Other".to_string()),
            ..RawNotification::default()
        },
        &NotificationDefaults::default(),
        IngestionStamp::from_millis(1),
    ));
    store.flush_saves();

    assert_eq!(evicted, 0);
    assert_eq!(store.len(), 1);
    assert_eq!(store.records()[0].title(), "R1");
    assert_eq!(store.badge_count(), 1);
    assert_eq!(gateway.save_count(), saves_before);
}

#[test]
fn mark_read_is_idempotent() {
    let mut store = open_store(&MemoryGateway::new());
    store.insert(record(1));
    store.insert(record(2));

    assert!(store.mark_read("1"));
    let once = store.snapshot();
    assert!(store.mark_read("1"));
    let twice = store.snapshot();

    assert_eq!(once, twice);
    assert_eq!(twice.badge_count, 1);
    assert!(store.get("1").unwrap().is_read());
    assert_badge_matches_scan(&store);
}

#[test]
fn absent_id_is_a_no_op() {
    let mut store = open_store(&MemoryGateway::new());
    store.insert(record(1));
    store.insert(record(2));
    let before = store.snapshot();

    assert!(!store.delete("nonexistent"));
    assert!(!store.mark_read("nonexistent"));

    assert_eq!(store.snapshot(), before);
    assert_eq!(store.badge_count(), 2);
}

#[test]
fn clear_resets_everything() {
    let mut store = open_store(&MemoryGateway::new());
    for millis in 1..=4 {
        store.insert(record(millis));
    }
    store.mark_read("2");

    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.badge_count(), 0);
}

#[test]
fn read_all_then_delete_scenario() {
    let mut store = open_store(&MemoryGateway::new());
    for millis in 1..=3 {
        store.insert(record(millis));
    }
    assert_eq!(store.badge_count(), 3);

    store.mark_all_read();
    assert_eq!(store.badge_count(), 0);
    assert!(store.records().iter().all(NotificationRecord::is_read));

    assert!(store.delete("2"));
    assert_eq!(store.len(), 2);
    assert_eq!(store.badge_count(), 0);
    assert_badge_matches_scan(&store);
}

#[test]
fn mutations_reach_gateway_after_flush() {
    let gateway = MemoryGateway::new();
    let mut store = open_store(&gateway);

    store.insert(record(1));
    store.insert(record(2));
    store.mark_read("1");
    assert!(store.flush_saves());

    assert_eq!(gateway.records(), store.records().to_vec());
    assert!(gateway.save_count() >= 1);

    store.clear();
    assert!(store.flush_saves());
    assert!(gateway.records().is_empty());
}

#[test]
fn save_failure_keeps_memory_state_and_reports() {
    let gateway = MemoryGateway::new();
    gateway.set_fail_saves(true);
    let (reporter, seen) = counting_reporter();
    let mut store =
        NotificationStore::open(Box::new(gateway.clone()), &StoreConfig::default(), Some(reporter));

    store.insert(record(1));
    assert!(store.flush_saves());

    assert_eq!(store.len(), 1);
    assert_eq!(store.badge_count(), 1);
    assert!(gateway.records().is_empty());
    assert_eq!(seen.lock().unwrap().len(), 1);

    gateway.set_fail_saves(false);
    store.mark_all_read();
    assert!(store.flush_saves());
    assert_eq!(gateway.records(), store.records().to_vec());
}

#[test]
fn load_failure_starts_empty() {
    let gateway = MemoryGateway::with_records(vec![record(1)]);
    gateway.set_fail_loads(true);
    let (reporter, seen) = counting_reporter();

    let store =
        NotificationStore::open(Box::new(gateway.clone()), &StoreConfig::default(), Some(reporter));

    assert!(store.is_empty());
    assert_eq!(store.badge_count(), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn restore_reconciles_badge_and_enforces_invariants() {
    let mut stored = (1..=55).rev().map(record).collect::<Vec<_>>();
    stored.insert(1, record(55));
    let gateway = MemoryGateway::with_records(stored);

    let store = open_store(&gateway);

    assert_eq!(store.len(), 50);
    assert_eq!(store.ids()[0], "55");
    assert_eq!(store.ids()[1], "54");
    assert_eq!(store.ids()[49], "6");
    assert_eq!(store.badge_count(), 50);
    assert!(store.flush_saves());
    assert_eq!(gateway.save_count(), 0);
}

#[test]
fn listeners_observe_every_mutation_until_unsubscribed() {
    let mut store = open_store(&MemoryGateway::new());
    let badges = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&badges);
    let listener = store.subscribe(Box::new(move |snapshot: &StoreSnapshot| {
        sink.lock().unwrap().push((snapshot.records.len(), snapshot.badge_count));
    }));

    store.insert(record(1));
    store.insert(record(2));
    store.mark_read("2");
    assert!(store.unsubscribe(listener));
    store.clear();

    assert_eq!(*badges.lock().unwrap(), vec![(1, 1), (2, 2), (2, 1)]);
    assert!(!store.unsubscribe(listener));
}

#[test]
fn ephemeral_store_has_no_save_worker() {
    let mut store = NotificationStore::ephemeral(&StoreConfig::default());
    store.insert(record(1));

    assert_eq!(store.len(), 1);
    assert!(!store.flush_saves());
}
