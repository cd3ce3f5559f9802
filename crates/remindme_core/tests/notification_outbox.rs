mod common;

use common::{clock, draft, utc};
use remindme_core::db::open_db_in_memory;
use remindme_core::{
    Frequency, KvReminderStore, NotificationBackend, NotificationRequest, NotificationScheduler,
    OutboxCommandKind, OutboxNotificationBackend, PermissionStatus, ReminderCoordinator,
    SqliteKeyValueStore, TriggerSpec,
};

#[test]
fn reschedule_queues_cancel_then_schedule_and_keeps_one_active_trigger() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = ReminderCoordinator::new(
        KvReminderStore::new(SqliteKeyValueStore::new(&conn)),
        NotificationScheduler::new(OutboxNotificationBackend::new(&conn)),
        clock(),
    );
    let id = coordinator
        .create_reminder(&draft("pills", utc(2025, 3, 1, 9, 0), Frequency::Daily))
        .unwrap()
        .reminder
        .id;
    coordinator
        .update_reminder(&id, &draft("pills", utc(2025, 3, 3, 9, 0), Frequency::OneTime))
        .unwrap();

    let outbox = coordinator.scheduler().backend();
    let commands = outbox.drain().unwrap();
    let kinds = commands.iter().map(|command| command.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            OutboxCommandKind::Schedule,
            OutboxCommandKind::Cancel,
            OutboxCommandKind::Schedule
        ]
    );
    assert!(commands
        .iter()
        .all(|command| command.reminder_id.as_deref() == Some(id.as_str())));

    let last: NotificationRequest =
        serde_json::from_str(commands[2].payload.as_deref().unwrap()).unwrap();
    assert!(matches!(last.trigger, TriggerSpec::At { .. }));
    assert_eq!(outbox.pending_ids().unwrap(), vec![id.clone()]);
    assert_eq!(outbox.active_trigger(&id).unwrap(), Some(last));

    assert!(outbox.drain().unwrap().is_empty());
}

#[test]
fn cancel_without_active_trigger_queues_nothing() {
    let conn = open_db_in_memory().unwrap();
    let outbox = OutboxNotificationBackend::new(&conn);

    outbox.cancel("ghost").unwrap();
    assert!(outbox.drain().unwrap().is_empty());
}

#[test]
fn channel_is_registered_once_and_permission_follows_host_answer() {
    let conn = open_db_in_memory().unwrap();
    let scheduler = NotificationScheduler::new(OutboxNotificationBackend::new(&conn));

    assert_eq!(scheduler.prepare(), PermissionStatus::Granted);
    scheduler
        .backend()
        .record_permission(PermissionStatus::Denied)
        .unwrap();
    assert_eq!(scheduler.prepare(), PermissionStatus::Denied);

    let commands = scheduler.backend().drain().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].kind, OutboxCommandKind::RegisterChannel);
    assert!(commands[0].reminder_id.is_none());
}
