//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose reminder use cases to Dart via FRB as plain sync calls.
//! - Hand queued notification commands to the host for platform delivery.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Instants cross the boundary as UTC epoch milliseconds.
//! - Every call reloads state from the database; nothing is cached here.

use chrono::{DateTime, Utc};
use log::warn;
use remindme_core::db::open_db;
use remindme_core::{
    clamp_time_for_date, core_version as core_version_inner, init_logging as init_logging_inner,
    new_draft, ping as ping_inner, Frequency, KvReminderStore, NotificationScheduler, OutboxNotificationBackend,
    PermissionStatus, Reminder, ReminderCoordinator, ReminderDraft, SaveOutcome, ScheduleStatus,
    SqliteKeyValueStore, SystemClock,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;

const DB_FILE_NAME: &str = "remindme.sqlite3";
const DB_PATH_ENV: &str = "REMINDME_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type DbCoordinator<'conn> = ReminderCoordinator<
    KvReminderStore<SqliteKeyValueStore<'conn>>,
    OutboxNotificationBackend<'conn>,
    SystemClock,
>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Safe to repeat with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the database file used by every later call.
///
/// Must run before the first reminder call; afterwards only the same path is
/// accepted. Returns an empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "db path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Reminder row shown by the list and editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub id: String,
    pub title: String,
    pub date_epoch_ms: i64,
    pub time_epoch_ms: i64,
    pub note: Option<String>,
    /// `One time|Daily|Weekly|Custom`.
    pub frequency: String,
}

/// Envelope for single-reminder calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderActionResponse {
    pub ok: bool,
    pub reminder: Option<ReminderItem>,
    /// Whether the notification trigger is registered.
    pub scheduled: bool,
    /// Records removed by delete calls.
    pub removed: u32,
    pub message: String,
}

impl ReminderActionResponse {
    fn saved(outcome: SaveOutcome, verb: &str) -> Self {
        let (scheduled, message) = match &outcome.schedule {
            ScheduleStatus::Scheduled(_) => (true, format!("Reminder {verb}.")),
            ScheduleStatus::Failed(err) => (
                false,
                format!("Reminder {verb}, but the notification could not be scheduled: {err}"),
            ),
        };
        Self {
            ok: true,
            reminder: Some(to_item(&outcome.reminder)),
            scheduled,
            removed: 0,
            message,
        }
    }

    fn deleted(count: usize) -> Self {
        Self {
            ok: true,
            reminder: None,
            scheduled: false,
            removed: u32::try_from(count).unwrap_or(u32::MAX),
            message: format!("Deleted {count} reminder(s)."),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            reminder: None,
            scheduled: false,
            removed: 0,
            message: message.into(),
        }
    }
}

/// Envelope for list calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderListResponse {
    pub items: Vec<ReminderItem>,
    pub message: String,
}

/// One queued notification command for the host to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCommandItem {
    pub seq: i64,
    /// `schedule|cancel|register_channel`.
    pub kind: String,
    pub reminder_id: Option<String>,
    /// JSON request or channel payload.
    pub payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCommandResponse {
    pub ok: bool,
    pub commands: Vec<NotificationCommandItem>,
    pub message: String,
}

/// Records the platform permission answer and runs one-time channel setup.
///
/// Returns `granted` or `denied`; denial leaves reminders fully usable.
#[flutter_rust_bridge::frb(sync)]
pub fn prepare_notifications(permission_granted: bool) -> String {
    let status = if permission_granted {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    };
    let result = with_coordinator(|coordinator| {
        coordinator
            .scheduler()
            .backend()
            .record_permission(status)
            .map_err(|err| err.to_string())?;
        Ok(coordinator.prepare_notifications())
    });
    match result {
        Ok(PermissionStatus::Granted) => "granted".to_string(),
        Ok(PermissionStatus::Denied) => "denied".to_string(),
        Err(err) => {
            warn!("event=ffi_prepare_notifications module=ffi status=error error={err}");
            "denied".to_string()
        }
    }
}

/// Creates a reminder and schedules its notification.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_create(
    title: String,
    date_epoch_ms: i64,
    time_epoch_ms: i64,
    note: Option<String>,
    frequency: String,
) -> ReminderActionResponse {
    let draft = match to_draft(title, date_epoch_ms, time_epoch_ms, note, &frequency) {
        Ok(draft) => draft,
        Err(err) => return ReminderActionResponse::failure(err),
    };
    match with_coordinator(|coordinator| {
        coordinator
            .create_reminder(&draft)
            .map_err(|err| err.to_string())
    }) {
        Ok(outcome) => ReminderActionResponse::saved(outcome, "created"),
        Err(err) => ReminderActionResponse::failure(format!("reminder_create failed: {err}")),
    }
}

/// Replaces a reminder's fields and reschedules its notification.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_update(
    id: String,
    title: String,
    date_epoch_ms: i64,
    time_epoch_ms: i64,
    note: Option<String>,
    frequency: String,
) -> ReminderActionResponse {
    let draft = match to_draft(title, date_epoch_ms, time_epoch_ms, note, &frequency) {
        Ok(draft) => draft,
        Err(err) => return ReminderActionResponse::failure(err),
    };
    match with_coordinator(|coordinator| {
        coordinator
            .update_reminder(id.trim(), &draft)
            .map_err(|err| err.to_string())
    }) {
        Ok(outcome) => ReminderActionResponse::saved(outcome, "updated"),
        Err(err) => ReminderActionResponse::failure(format!("reminder_update failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete(id: String) -> ReminderActionResponse {
    match with_coordinator(|coordinator| {
        coordinator
            .delete_reminder(id.trim())
            .map_err(|err| err.to_string())
    }) {
        Ok(count) => ReminderActionResponse::deleted(count),
        Err(err) => ReminderActionResponse::failure(format!("reminder_delete failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete_many(ids: Vec<String>) -> ReminderActionResponse {
    match with_coordinator(|coordinator| {
        coordinator.delete_many(&ids).map_err(|err| err.to_string())
    }) {
        Ok(count) => ReminderActionResponse::deleted(count),
        Err(err) => {
            ReminderActionResponse::failure(format!("reminder_delete_many failed: {err}"))
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete_all() -> ReminderActionResponse {
    match with_coordinator(|coordinator| coordinator.delete_all().map_err(|err| err.to_string()))
    {
        Ok(count) => ReminderActionResponse::deleted(count),
        Err(err) => ReminderActionResponse::failure(format!("reminder_delete_all failed: {err}")),
    }
}

/// Lists reminders whose title contains `query` (case-insensitive).
///
/// An unreadable database lists as empty with the error in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_list(query: String) -> ReminderListResponse {
    match with_coordinator(|coordinator| Ok(coordinator.list_visible(&query))) {
        Ok(reminders) => {
            let items = reminders.iter().map(to_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No reminders.".to_string()
            } else {
                format!("Found {} reminder(s).", items.len())
            };
            ReminderListResponse { items, message }
        }
        Err(err) => ReminderListResponse {
            items: Vec::new(),
            message: format!("reminder_list failed: {err}"),
        },
    }
}

/// Loads editor fields for a reminder.
///
/// Reminders whose time already passed come back with date and time set to now.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_get(id: String) -> ReminderActionResponse {
    let id = id.trim().to_string();
    match with_coordinator(|coordinator| {
        coordinator.load_for_edit(&id).map_err(|err| err.to_string())
    }) {
        Ok(Some(draft)) => ReminderActionResponse {
            ok: true,
            reminder: Some(to_item(&Reminder::with_id(id, &draft))),
            scheduled: false,
            removed: 0,
            message: "Reminder loaded.".to_string(),
        },
        Ok(None) => ReminderActionResponse::failure(format!("reminder not found: {id}")),
        Err(err) => ReminderActionResponse::failure(format!("reminder_get failed: {err}")),
    }
}

/// Initial editor fields for a new reminder: now, one-time.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_new_draft() -> ReminderItem {
    let draft = new_draft(&SystemClock);
    to_item(&Reminder::with_id(String::new(), &draft))
}

/// Editor time after the user picks `date`/`time`.
///
/// Returns now when `date` is today and `time` already passed, otherwise
/// `time_epoch_ms` unchanged (also for out-of-range input).
#[flutter_rust_bridge::frb(sync)]
pub fn editor_clamp_time(date_epoch_ms: i64, time_epoch_ms: i64) -> i64 {
    match (
        from_epoch_ms(date_epoch_ms, "date"),
        from_epoch_ms(time_epoch_ms, "time"),
    ) {
        (Ok(date), Ok(time)) => clamp_time_for_date(date, time, &SystemClock).timestamp_millis(),
        _ => time_epoch_ms,
    }
}

/// Returns and clears queued notification commands in apply order.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_notification_commands() -> NotificationCommandResponse {
    match with_coordinator(|coordinator| {
        coordinator
            .scheduler()
            .backend()
            .drain()
            .map_err(|err| err.to_string())
    }) {
        Ok(commands) => NotificationCommandResponse {
            ok: true,
            message: format!("Drained {} command(s).", commands.len()),
            commands: commands
                .into_iter()
                .map(|command| NotificationCommandItem {
                    seq: command.seq,
                    kind: command.kind.as_str().to_string(),
                    reminder_id: command.reminder_id,
                    payload: command.payload,
                })
                .collect(),
        },
        Err(err) => NotificationCommandResponse {
            ok: false,
            commands: Vec::new(),
            message: format!("drain_notification_commands failed: {err}"),
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_coordinator<T>(
    f: impl FnOnce(&DbCoordinator<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let conn: Connection =
        open_db(resolve_db_path()).map_err(|err| format!("reminder DB open failed: {err}"))?;
    let coordinator = ReminderCoordinator::new(
        KvReminderStore::new(SqliteKeyValueStore::new(&conn)),
        NotificationScheduler::new(OutboxNotificationBackend::new(&conn)),
        SystemClock,
    );
    f(&coordinator)
}

fn to_draft(
    title: String,
    date_epoch_ms: i64,
    time_epoch_ms: i64,
    note: Option<String>,
    frequency: &str,
) -> Result<ReminderDraft, String> {
    let frequency = Frequency::from_label(frequency.trim()).ok_or_else(|| {
        format!("unsupported frequency `{frequency}`; expected One time|Daily|Weekly|Custom")
    })?;
    Ok(ReminderDraft {
        title,
        date: from_epoch_ms(date_epoch_ms, "date")?,
        time: from_epoch_ms(time_epoch_ms, "time")?,
        note,
        frequency,
    })
}

fn from_epoch_ms(value: i64, field: &str) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| format!("{field} epoch milliseconds out of range: {value}"))
}

fn to_item(reminder: &Reminder) -> ReminderItem {
    ReminderItem {
        id: reminder.id.clone(),
        title: reminder.title.clone(),
        date_epoch_ms: reminder.date.timestamp_millis(),
        time_epoch_ms: reminder.time.timestamp_millis(),
        note: reminder.note.clone(),
        frequency: reminder.frequency.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_db_path, core_version, drain_notification_commands, editor_clamp_time,
        editor_new_draft, init_logging, ping, reminder_create, reminder_delete,
        reminder_delete_many, reminder_get, reminder_list, reminder_update,
    };
    use chrono::{Duration, Utc};
    use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    /// Pins the process-wide DB path to a scratch dir and serializes DB tests.
    fn isolated_db() -> MutexGuard<'static, ()> {
        static DB_DIR: OnceLock<TempDir> = OnceLock::new();
        static DB_LOCK: Mutex<()> = Mutex::new(());

        let dir = DB_DIR.get_or_init(|| tempfile::tempdir().expect("create temp db dir"));
        let path = dir.path().join("remindme.sqlite3");
        assert_eq!(configure_db_path(path.display().to_string()), "");
        DB_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn configure_db_path_rejects_switching_paths() {
        let _db = isolated_db();
        assert!(!configure_db_path("/elsewhere/remindme.sqlite3".to_string()).is_empty());
        assert!(!configure_db_path("  ".to_string()).is_empty());
    }

    #[test]
    fn editor_helpers_default_to_now_and_keep_future_times() {
        let before = Utc::now().timestamp_millis();
        let fresh = editor_new_draft();
        assert!(fresh.date_epoch_ms >= before);
        assert_eq!(fresh.frequency, "One time");
        assert!(fresh.title.is_empty());

        let tomorrow = (Utc::now() + Duration::days(1)).timestamp_millis();
        assert_eq!(editor_clamp_time(tomorrow, tomorrow), tomorrow);
        assert_eq!(editor_clamp_time(i64::MAX, 42), 42);
    }

    #[test]
    fn create_list_update_delete_roundtrip() {
        let _db = isolated_db();
        let title = unique_token("ffi-roundtrip");
        let tomorrow = (Utc::now() + Duration::days(1)).timestamp_millis();

        let created = reminder_create(title.clone(), tomorrow, tomorrow, None, "Daily".to_string());
        assert!(created.ok, "{}", created.message);
        let item = created.reminder.expect("created reminder should be returned");
        assert_eq!(item.frequency, "Daily");

        let listed = reminder_list(title.to_uppercase());
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].id, item.id);

        let updated = reminder_update(
            item.id.clone(),
            format!("{title} edited"),
            tomorrow,
            tomorrow,
            Some("note".to_string()),
            "One time".to_string(),
        );
        assert!(updated.ok, "{}", updated.message);
        let loaded = reminder_get(item.id.clone());
        let loaded = loaded.reminder.expect("reminder should load");
        assert_eq!(loaded.frequency, "One time");
        assert_eq!(loaded.note.as_deref(), Some("note"));

        let deleted = reminder_delete(item.id.clone());
        assert_eq!(deleted.removed, 1);
        assert!(reminder_list(title).items.is_empty());
        assert_eq!(reminder_delete(item.id).removed, 0);
    }

    #[test]
    fn create_rejects_past_time_and_unknown_frequency() {
        let _db = isolated_db();
        let title = unique_token("ffi-past");
        let yesterday = (Utc::now() - Duration::days(1)).timestamp_millis();
        let past = reminder_create(title.clone(), yesterday, yesterday, None, "Daily".to_string());
        assert!(!past.ok);
        assert!(past.message.contains("past"));

        let tomorrow = (Utc::now() + Duration::days(1)).timestamp_millis();
        let bad = reminder_create(title.clone(), tomorrow, tomorrow, None, "Hourly".to_string());
        assert!(!bad.ok);
        assert!(bad.message.contains("frequency"));
        assert!(reminder_list(title).items.is_empty());
    }

    #[test]
    fn created_reminder_reaches_notification_outbox() {
        let _db = isolated_db();
        let title = unique_token("ffi-outbox");
        let tomorrow = (Utc::now() + Duration::days(1)).timestamp_millis();
        let created = reminder_create(title, tomorrow, tomorrow, None, "Weekly".to_string());
        let id = created.reminder.expect("created reminder").id;

        let drained = drain_notification_commands();
        assert!(drained.ok, "{}", drained.message);
        assert!(drained
            .commands
            .iter()
            .any(|command| command.kind == "schedule"
                && command.reminder_id.as_deref() == Some(id.as_str())));

        assert_eq!(reminder_delete_many(vec![id]).removed, 1);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
