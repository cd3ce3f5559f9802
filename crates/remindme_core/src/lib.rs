//! Core domain logic for RemindMe.
//! This crate owns reminder persistence, trigger scheduling and the rules
//! keeping the two consistent.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::reminder::{
    Frequency, Reminder, ReminderDraft, ReminderId, ReminderValidationError,
};
pub use notify::memory::InMemoryNotificationBackend;
pub use notify::outbox::{OutboxCommand, OutboxCommandKind, OutboxNotificationBackend};
pub use notify::scheduler::{
    NotificationBackend, NotificationError, NotificationResult, NotificationScheduler,
    PermissionStatus,
};
pub use notify::trigger::{ChannelSpec, NotificationRequest, TriggerSpec};
pub use repo::reminder_repo::{KvReminderStore, ReminderStore, REMINDERS_KEY};
pub use search::title_filter::{filter_by_title, TitleFilter};
pub use service::editor::{clamp_time_for_date, new_draft};
pub use service::reminder_service::{
    CoordinatorError, CoordinatorResult, ReminderCoordinator, SaveOutcome, ScheduleStatus,
};
pub use session::{PressAction, Theme, UiSession};
pub use store::{KeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
