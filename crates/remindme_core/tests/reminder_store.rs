mod common;

use common::{draft, utc, FlakyKv};
use remindme_core::db::{open_db, open_db_in_memory};
use remindme_core::{
    Frequency, KvReminderStore, Reminder, ReminderStore, SqliteKeyValueStore, StoreError,
    REMINDERS_KEY,
};
use std::collections::HashSet;

fn reminder(title: &str) -> Reminder {
    Reminder::from_draft(&draft(title, utc(2025, 3, 2, 9, 0), Frequency::OneTime))
}

fn ids(reminders: &[Reminder]) -> Vec<String> {
    reminders.iter().map(|reminder| reminder.id.clone()).collect()
}

#[test]
fn insert_prepends_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));

    let first = reminder("first");
    let second = reminder("second");
    store.insert(&first).unwrap();
    store.insert(&second).unwrap();

    let listed = store.list().unwrap();
    assert_eq!(ids(&listed), vec![second.id.clone(), first.id.clone()]);
    assert_eq!(listed.iter().filter(|r| r.id == second.id).count(), 1);
}

#[test]
fn insert_rejects_duplicate_id() {
    let conn = open_db_in_memory().unwrap();
    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));

    let item = reminder("once");
    store.insert(&item).unwrap();
    let err = store.insert(&item).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(id) if id == item.id));
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn replace_keeps_position_and_length() {
    let conn = open_db_in_memory().unwrap();
    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));

    let a = reminder("a");
    let b = reminder("b");
    let c = reminder("c");
    for item in [&a, &b, &c] {
        store.insert(item).unwrap();
    }

    let mut edited = b.clone();
    edited.title = "b edited".to_string();
    edited.frequency = Frequency::Daily;
    edited.note = Some("bring shoes".to_string());
    assert!(store.replace(&edited).unwrap());

    let listed = store.list().unwrap();
    assert_eq!(ids(&listed), vec![c.id, b.id, a.id]);
    assert_eq!(listed[1], edited);
}

#[test]
fn replace_unknown_id_is_noop() {
    let kv = FlakyKv::default();
    let store = KvReminderStore::new(&kv);
    store.insert(&reminder("kept")).unwrap();
    let writes_before = *kv.writes.borrow();

    assert!(!store.replace(&reminder("ghost")).unwrap());
    assert_eq!(*kv.writes.borrow(), writes_before);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn remove_twice_is_noop_second_time() {
    let conn = open_db_in_memory().unwrap();
    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));

    let item = reminder("gym");
    store.insert(&item).unwrap();
    assert_eq!(store.remove(&item.id).unwrap(), 1);
    assert_eq!(store.remove(&item.id).unwrap(), 0);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn remove_many_removes_only_present_matches_in_one_write() {
    let kv = FlakyKv::default();
    let store = KvReminderStore::new(&kv);

    let items = ["a", "b", "c", "d"].map(reminder);
    for item in &items {
        store.insert(item).unwrap();
    }
    let writes_before = *kv.writes.borrow();

    let targets: HashSet<String> = [
        items[0].id.clone(),
        items[2].id.clone(),
        "missing".to_string(),
    ]
    .into_iter()
    .collect();
    let removed = store.remove_many(&targets).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(*kv.writes.borrow(), writes_before + 1);
    let left = store.list().unwrap();
    assert_eq!(ids(&left), vec![items[3].id.clone(), items[1].id.clone()]);
}

#[test]
fn clear_stores_empty_array() {
    let kv = FlakyKv::default();
    let store = KvReminderStore::new(&kv);
    store.insert(&reminder("x")).unwrap();

    store.clear().unwrap();
    assert_eq!(kv.raw(REMINDERS_KEY).as_deref(), Some("[]"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn missing_key_lists_empty_and_corrupt_blob_is_typed_error() {
    let kv = FlakyKv::default();
    let store = KvReminderStore::new(&kv);
    assert!(store.list().unwrap().is_empty());

    kv.put_raw(REMINDERS_KEY, "{not json");
    assert!(matches!(store.list().unwrap_err(), StoreError::Corrupt(_)));
}

#[test]
fn failed_write_leaves_previous_snapshot() {
    let kv = FlakyKv::default();
    let store = KvReminderStore::new(&kv);
    let kept = reminder("kept");
    store.insert(&kept).unwrap();

    *kv.fail_writes.borrow_mut() = true;
    assert!(matches!(
        store.insert(&reminder("lost")).unwrap_err(),
        StoreError::Db(_)
    ));
    *kv.fail_writes.borrow_mut() = false;

    assert_eq!(store.list().unwrap(), vec![kept]);
}

#[test]
fn reopened_database_reproduces_reminder_field_for_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remindme.db");

    let mut item = reminder("dentist");
    item.note = Some("bring insurance card".to_string());
    item.frequency = Frequency::Weekly;
    {
        let conn = open_db(&path).unwrap();
        let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));
        store.insert(&item).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));
    assert_eq!(store.list().unwrap(), vec![item]);
}

#[test]
fn reads_blob_written_by_existing_installs() {
    let kv = FlakyKv::default();
    kv.put_raw(
        REMINDERS_KEY,
        r#"[{"id":"3b241101-e2bb-4255-8caf-4136c566a962","title":"Team Meet","date":"2025-03-05T00:00:00.000Z","time":"2025-03-01T14:30:00.000Z","frequency":"Weekly"},
            {"id":"legacy-1","title":"Gym","date":"2025-03-01T10:00:00.000Z","time":"2025-03-01T18:00:00.000Z","note":"legs","frequency":"One time"}]"#,
    );
    let store = KvReminderStore::new(&kv);

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "Team Meet");
    assert_eq!(listed[0].note, None);
    assert_eq!(listed[0].frequency, Frequency::Weekly);
    assert_eq!(listed[1].id, "legacy-1");
    assert_eq!(listed[1].note.as_deref(), Some("legs"));
    assert_eq!(listed[1].frequency, Frequency::OneTime);
}

#[test]
fn concurrent_inserts_over_separate_connections_are_all_kept() {
    const WRITERS: usize = 4;
    const INSERTS_PER_WRITER: usize = 25;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("remindme.sqlite3");
    drop(open_db(&path).unwrap());

    let handles = (0..WRITERS)
        .map(|writer| {
            let path = path.clone();
            std::thread::spawn(move || {
                for n in 0..INSERTS_PER_WRITER {
                    // One connection and store per call, as the FFI layer does.
                    let conn = open_db(&path).unwrap();
                    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));
                    store.insert(&reminder(&format!("writer-{writer}-{n}"))).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = KvReminderStore::new(SqliteKeyValueStore::new(&conn));
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), WRITERS * INSERTS_PER_WRITER);
    let unique = listed
        .iter()
        .map(|reminder| reminder.id.clone())
        .collect::<HashSet<_>>();
    assert_eq!(unique.len(), listed.len());
}
