//! In-process notification queue.
//!
//! Behaves like a platform scheduler that keeps every registration it is
//! given, including duplicates under one id. Used by hosts without a
//! notification API and by tests that inspect what would fire.

use super::scheduler::{NotificationBackend, NotificationResult, PermissionStatus};
use super::trigger::{ChannelSpec, NotificationRequest};
use crate::clock::Clock;
use crate::model::reminder::ReminderId;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct QueueState {
    requests: Vec<NotificationRequest>,
    channels: Vec<ChannelSpec>,
}

/// Notification backend holding registrations in memory.
#[derive(Debug)]
pub struct InMemoryNotificationBackend {
    state: Mutex<QueueState>,
    permission: PermissionStatus,
}

impl Default for InMemoryNotificationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNotificationBackend {
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            permission,
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All live registrations in registration order.
    pub fn requests(&self) -> Vec<NotificationRequest> {
        self.state().requests.clone()
    }

    pub fn requests_for(&self, id: &str) -> Vec<NotificationRequest> {
        self.state()
            .requests
            .iter()
            .filter(|request| request.id == id)
            .cloned()
            .collect()
    }

    pub fn channels(&self) -> Vec<ChannelSpec> {
        self.state().channels.clone()
    }

    /// Next firing per registration strictly after `after`, earliest first.
    ///
    /// Registrations that will never fire again are skipped.
    pub fn upcoming(&self, after: DateTime<Utc>, clock: &impl Clock) -> Vec<(ReminderId, DateTime<Utc>)> {
        let mut firings = self
            .state()
            .requests
            .iter()
            .filter_map(|request| {
                request
                    .trigger
                    .next_fire_after(after, clock)
                    .map(|at| (request.id.clone(), at))
            })
            .collect::<Vec<_>>();
        firings.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.0.cmp(&right.0)));
        firings
    }
}

impl NotificationBackend for InMemoryNotificationBackend {
    fn schedule(&self, request: &NotificationRequest) -> NotificationResult<()> {
        self.state().requests.push(request.clone());
        Ok(())
    }

    fn cancel(&self, id: &str) -> NotificationResult<()> {
        self.state().requests.retain(|request| request.id != id);
        Ok(())
    }

    fn request_permission(&self) -> NotificationResult<PermissionStatus> {
        Ok(self.permission)
    }

    fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()> {
        let mut state = self.state();
        state.channels.retain(|existing| existing.id != channel.id);
        state.channels.push(channel.clone());
        Ok(())
    }

    fn pending_ids(&self) -> NotificationResult<Vec<ReminderId>> {
        let mut ids = Vec::new();
        for request in &self.state().requests {
            if !ids.contains(&request.id) {
                ids.push(request.id.clone());
            }
        }
        Ok(ids)
    }
}
