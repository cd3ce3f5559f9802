//! Reminder coordinator.
//!
//! # Responsibility
//! - Keep the reminder store and the notification scheduler in lockstep.
//! - Provide the create/update/delete/list use cases called by the host UI.
//!
//! # Invariants
//! - Validation runs before any store or scheduler mutation.
//! - Store writes happen before scheduling; a scheduling failure leaves the
//!   reminder persisted and is reported, never rolled back.
//! - Deletes cancel triggers first; cancellation failures never block the
//!   store removal.
//! - Listing never fails; storage errors degrade to an empty list and are
//!   logged.

use crate::clock::Clock;
use crate::model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
use crate::notify::scheduler::{
    NotificationBackend, NotificationScheduler, PermissionStatus,
};
use crate::notify::trigger::TriggerSpec;
use crate::repo::reminder_repo::ReminderStore;
use crate::search::title_filter::filter_by_title;
use crate::service::editor::prefill_for_edit;
use crate::store::StoreError;
use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Use-case error surfaced to the UI layer.
#[derive(Debug)]
pub enum CoordinatorError {
    Validation(ReminderValidationError),
    NotFound(ReminderId),
    Storage(StoreError),
}

impl Display for CoordinatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "reminder not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ReminderValidationError> for CoordinatorError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

/// Whether the trigger for a saved reminder is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleStatus {
    Scheduled(TriggerSpec),
    /// Reminder is persisted without an active trigger until its next edit.
    Failed(String),
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub reminder: Reminder,
    pub schedule: ScheduleStatus,
}

impl SaveOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self.schedule, ScheduleStatus::Scheduled(_))
    }
}

/// Orchestrates store and scheduler mutations per user action.
pub struct ReminderCoordinator<S, B, C>
where
    S: ReminderStore,
    B: NotificationBackend,
    C: Clock,
{
    store: S,
    scheduler: NotificationScheduler<B>,
    clock: C,
}

impl<S, B, C> ReminderCoordinator<S, B, C>
where
    S: ReminderStore,
    B: NotificationBackend,
    C: Clock,
{
    pub fn new(store: S, scheduler: NotificationScheduler<B>, clock: C) -> Self {
        Self {
            store,
            scheduler,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &NotificationScheduler<B> {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// One-time notification setup at app start.
    pub fn prepare_notifications(&self) -> PermissionStatus {
        self.scheduler.prepare()
    }

    /// Validates, persists and schedules a new reminder.
    ///
    /// # Errors
    /// - `Validation` for an empty title or past instant; nothing is written.
    /// - `Storage` when the insert fails; nothing is scheduled.
    pub fn create_reminder(&self, draft: &ReminderDraft) -> CoordinatorResult<SaveOutcome> {
        let started_at = Instant::now();
        let instant = self.validate(draft, "create")?;
        let reminder = Reminder::from_draft(draft);

        self.store.insert(&reminder).map_err(|err| {
            error!(
                "event=reminder_create module=service status=error reminder_id={} error={}",
                reminder.id, err
            );
            err
        })?;

        let schedule = self.schedule(&reminder, instant);
        info!(
            "event=reminder_create module=service status=ok reminder_id={} scheduled={} duration_ms={}",
            reminder.id,
            matches!(schedule, ScheduleStatus::Scheduled(_)),
            started_at.elapsed().as_millis()
        );
        Ok(SaveOutcome { reminder, schedule })
    }

    /// Validates and replaces an existing reminder, then reschedules it.
    ///
    /// The previous trigger for `id` is replaced, never left alongside the
    /// new one.
    ///
    /// # Errors
    /// - `Validation` before any mutation.
    /// - `NotFound` when no reminder has `id`; nothing is scheduled.
    /// - `Storage` when the replace fails.
    pub fn update_reminder(&self, id: &str, draft: &ReminderDraft) -> CoordinatorResult<SaveOutcome> {
        let started_at = Instant::now();
        let instant = self.validate(draft, "update")?;
        let reminder = Reminder::with_id(id, draft);

        if !self.store.replace(&reminder)? {
            warn!("event=reminder_update module=service status=not_found reminder_id={id}");
            return Err(CoordinatorError::NotFound(id.to_string()));
        }

        let schedule = self.schedule(&reminder, instant);
        info!(
            "event=reminder_update module=service status=ok reminder_id={} scheduled={} duration_ms={}",
            id,
            matches!(schedule, ScheduleStatus::Scheduled(_)),
            started_at.elapsed().as_millis()
        );
        Ok(SaveOutcome { reminder, schedule })
    }

    /// Cancels the trigger and removes the reminder.
    ///
    /// Returns the number of removed records; deleting an absent id is `Ok(0)`.
    pub fn delete_reminder(&self, id: &str) -> CoordinatorResult<usize> {
        if let Err(err) = self.scheduler.cancel(id) {
            warn!(
                "event=reminder_delete module=service status=cancel_failed reminder_id={} error={}",
                id, err
            );
        }
        let removed = self.store.remove(id)?;
        info!("event=reminder_delete module=service status=ok reminder_id={id} removed={removed}");
        Ok(removed)
    }

    /// Cancels all triggers and removes all matching reminders in one write.
    pub fn delete_many(&self, ids: &[ReminderId]) -> CoordinatorResult<usize> {
        let unique = ids.iter().cloned().collect::<HashSet<_>>();
        if unique.is_empty() {
            return Ok(0);
        }

        let failures = self.scheduler.cancel_many(&unique);
        let removed = self.store.remove_many(&unique)?;
        info!(
            "event=reminder_delete_many module=service status=ok requested={} removed={} cancel_failures={}",
            unique.len(),
            removed,
            failures.len()
        );
        Ok(removed)
    }

    /// Clears the store and cancels every trigger of the previous snapshot.
    ///
    /// Triggers the backend still reports are cancelled too, so an unreadable
    /// collection is reset without leaving orphaned notifications. Returns the
    /// number of records that were readable before the reset.
    pub fn delete_all(&self) -> CoordinatorResult<usize> {
        let snapshot = match self.store.list() {
            Ok(reminders) => reminders,
            Err(err) => {
                warn!("event=reminder_delete_all module=service status=degraded step=list error={err}");
                Vec::new()
            }
        };
        let mut ids = snapshot
            .iter()
            .map(|reminder| reminder.id.clone())
            .collect::<HashSet<_>>();
        match self.scheduler.pending_ids() {
            Ok(pending) => ids.extend(pending),
            Err(err) => {
                warn!("event=reminder_delete_all module=service status=degraded step=pending_ids error={err}");
            }
        }

        let failures = self.scheduler.cancel_many(&ids);
        self.store.clear()?;
        info!(
            "event=reminder_delete_all module=service status=ok removed={} cancelled={} cancel_failures={}",
            snapshot.len(),
            ids.len() - failures.len(),
            failures.len()
        );
        Ok(snapshot.len())
    }

    /// Reads the full collection and filters titles by `query`.
    ///
    /// Always reloads from the store. Storage errors are logged and shown as
    /// an empty list.
    pub fn list_visible(&self, query: &str) -> Vec<Reminder> {
        match self.store.list() {
            Ok(reminders) => filter_by_title(reminders, query),
            Err(err) => {
                error!("event=reminder_list module=service status=degraded error={err}");
                Vec::new()
            }
        }
    }

    pub fn get_reminder(&self, id: &str) -> CoordinatorResult<Option<Reminder>> {
        Ok(self.store.get(id)?)
    }

    /// Editor pre-fill for an existing reminder.
    pub fn load_for_edit(&self, id: &str) -> CoordinatorResult<Option<ReminderDraft>> {
        Ok(self
            .store
            .get(id)?
            .map(|reminder| prefill_for_edit(&reminder, &self.clock)))
    }

    fn validate(&self, draft: &ReminderDraft, op: &str) -> CoordinatorResult<DateTime<FixedOffset>> {
        draft.validate(&self.clock).map_err(|err| {
            info!("event=reminder_{op} module=service status=rejected reason={err}");
            CoordinatorError::Validation(err)
        })
    }

    fn schedule(&self, reminder: &Reminder, instant: DateTime<FixedOffset>) -> ScheduleStatus {
        match self
            .scheduler
            .schedule(&reminder.id, &reminder.title, instant, reminder.frequency)
        {
            Ok(trigger) => ScheduleStatus::Scheduled(trigger),
            Err(err) => {
                error!(
                    "event=notify_schedule module=service status=error reminder_id={} error={}",
                    reminder.id, err
                );
                ScheduleStatus::Failed(err.to_string())
            }
        }
    }
}
