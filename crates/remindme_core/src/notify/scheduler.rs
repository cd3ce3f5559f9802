//! Notification scheduler adapter over a platform backend.
//!
//! # Responsibility
//! - Turn (id, title, instant, frequency) into one platform registration.
//! - Guarantee replace-by-id semantics whatever the platform primitive does.
//! - Run one-time channel setup and the permission request.
//!
//! # Invariants
//! - After `schedule(id, ..)` succeeds, exactly one trigger is registered
//!   under `id`.
//! - `cancel` of an unknown id is a no-op.
//! - `cancel_many` attempts every id even when some cancellations fail.

use crate::db::DbError;
use crate::model::reminder::{Frequency, ReminderId};
use crate::notify::trigger::{ChannelSpec, NotificationRequest, TriggerSpec};
use chrono::{DateTime, FixedOffset};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NotificationResult<T> = Result<T, NotificationError>;

/// Scheduler-layer error for platform registration and cancellation.
#[derive(Debug)]
pub enum NotificationError {
    /// Platform API rejected the call.
    Platform(String),
    Db(DbError),
    Serialization(serde_json::Error),
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform(message) => write!(f, "notification platform error: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode notification: {err}"),
        }
    }
}

impl Error for NotificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Platform(_) => None,
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
        }
    }
}

impl From<DbError> for NotificationError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for NotificationError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Outcome of the notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Raw platform notification primitive.
///
/// Implementations are not required to replace an existing registration
/// under the same id; the adapter cancels first.
pub trait NotificationBackend {
    fn schedule(&self, request: &NotificationRequest) -> NotificationResult<()>;
    /// Must be a no-op for ids without a registration.
    fn cancel(&self, id: &str) -> NotificationResult<()>;
    fn request_permission(&self) -> NotificationResult<PermissionStatus>;
    fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()>;
    /// Ids with at least one live registration.
    fn pending_ids(&self) -> NotificationResult<Vec<ReminderId>>;
}

impl<B: NotificationBackend + ?Sized> NotificationBackend for &B {
    fn schedule(&self, request: &NotificationRequest) -> NotificationResult<()> {
        (**self).schedule(request)
    }

    fn cancel(&self, id: &str) -> NotificationResult<()> {
        (**self).cancel(id)
    }

    fn request_permission(&self) -> NotificationResult<PermissionStatus> {
        (**self).request_permission()
    }

    fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()> {
        (**self).register_channel(channel)
    }

    fn pending_ids(&self) -> NotificationResult<Vec<ReminderId>> {
        (**self).pending_ids()
    }
}

/// Adapter mapping reminder timing onto backend registrations.
pub struct NotificationScheduler<B: NotificationBackend> {
    backend: B,
}

impl<B: NotificationBackend> NotificationScheduler<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registers the reminder channel and requests permission.
    ///
    /// Never fails: setup errors and denial are logged and reported as
    /// `Denied`, leaving the app usable without notifications.
    pub fn prepare(&self) -> PermissionStatus {
        if let Err(err) = self.backend.register_channel(&ChannelSpec::reminders()) {
            warn!(
                "event=notify_prepare module=notify status=error step=register_channel error={}",
                err
            );
        }

        match self.backend.request_permission() {
            Ok(PermissionStatus::Granted) => {
                info!("event=notify_prepare module=notify status=ok permission=granted");
                PermissionStatus::Granted
            }
            Ok(PermissionStatus::Denied) => {
                warn!("event=notify_prepare module=notify status=degraded permission=denied");
                PermissionStatus::Denied
            }
            Err(err) => {
                warn!(
                    "event=notify_prepare module=notify status=error step=request_permission error={}",
                    err
                );
                PermissionStatus::Denied
            }
        }
    }

    /// Registers the trigger for a reminder, replacing any previous one.
    ///
    /// Returns the registered trigger shape.
    pub fn schedule(
        &self,
        id: &str,
        title: &str,
        instant: DateTime<FixedOffset>,
        frequency: Frequency,
    ) -> NotificationResult<TriggerSpec> {
        let trigger = TriggerSpec::for_frequency(instant, frequency);
        self.backend.cancel(id)?;
        let request = NotificationRequest::for_reminder(id, title, trigger.clone());
        self.backend.schedule(&request)?;
        info!(
            "event=notify_schedule module=notify status=ok reminder_id={} frequency={} repeats={}",
            id,
            frequency.label(),
            trigger.repeats()
        );
        Ok(trigger)
    }

    /// Removes the trigger registered under `id`, if any.
    pub fn cancel(&self, id: &str) -> NotificationResult<()> {
        self.backend.cancel(id)?;
        info!("event=notify_cancel module=notify status=ok reminder_id={id}");
        Ok(())
    }

    /// Ids the backend still holds a live trigger for.
    pub fn pending_ids(&self) -> NotificationResult<Vec<ReminderId>> {
        self.backend.pending_ids()
    }

    /// Cancels every id, collecting failures instead of stopping at the first.
    pub fn cancel_many<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ReminderId>,
    ) -> Vec<(ReminderId, NotificationError)> {
        let mut failures = Vec::new();
        for id in ids {
            if let Err(err) = self.cancel(id) {
                warn!(
                    "event=notify_cancel module=notify status=error reminder_id={} error={}",
                    id, err
                );
                failures.push((id.clone(), err));
            }
        }
        failures
    }
}
