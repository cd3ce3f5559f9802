//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `remindme_core` linkage.
//! - Exercise one create/list/delete cycle against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use chrono::{Duration, Utc};
use remindme_core::db::open_db_in_memory;
use remindme_core::{
    Frequency, InMemoryNotificationBackend, KvReminderStore, NotificationScheduler,
    ReminderCoordinator, ReminderDraft, SqliteKeyValueStore, SystemClock,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("remindme_core ping={}", remindme_core::ping());
    println!("remindme_core version={}", remindme_core::core_version());
    match smoke_cycle() {
        Ok(summary) => {
            println!("remindme_core smoke={summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("remindme_core smoke=failed error={err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke_cycle() -> Result<String, Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let coordinator = ReminderCoordinator::new(
        KvReminderStore::new(SqliteKeyValueStore::new(&conn)),
        NotificationScheduler::new(InMemoryNotificationBackend::new()),
        SystemClock,
    );
    coordinator.prepare_notifications();

    let tomorrow = Utc::now() + Duration::days(1);
    let draft = ReminderDraft {
        title: "smoke".to_string(),
        date: tomorrow,
        time: tomorrow,
        note: None,
        frequency: Frequency::Daily,
    };
    let outcome = coordinator.create_reminder(&draft)?;
    let listed = coordinator.list_visible("SMO").len();
    let pending = coordinator.scheduler().backend().requests().len();
    let removed = coordinator.delete_reminder(&outcome.reminder.id)?;
    Ok(format!(
        "ok listed={listed} pending={pending} removed={removed} scheduled={}",
        outcome.is_scheduled()
    ))
}
