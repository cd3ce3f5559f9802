#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use remindme_core::{
    ChannelSpec, FixedClock, Frequency, KeyValueStore, NotificationBackend, NotificationError,
    NotificationRequest, NotificationResult, PermissionStatus, ReminderDraft, ReminderId,
    StoreError, StoreResult,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Saturday 2025-03-01 08:00 UTC.
pub fn clock() -> FixedClock {
    FixedClock::utc(utc(2025, 3, 1, 8, 0))
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub fn draft(title: &str, at: DateTime<Utc>, frequency: Frequency) -> ReminderDraft {
    ReminderDraft {
        title: title.to_string(),
        date: at,
        time: at,
        note: None,
        frequency,
    }
}

/// Key-value slots in a map, with switchable read and write failures.
#[derive(Default)]
pub struct FlakyKv {
    values: RefCell<HashMap<String, String>>,
    pub fail_reads: RefCell<bool>,
    pub fail_writes: RefCell<bool>,
    pub writes: RefCell<usize>,
}

impl FlakyKv {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

fn io_error(op: &str) -> StoreError {
    StoreError::Db(remindme_core::db::DbError::Sqlite(
        rusqlite::Error::InvalidParameterName(format!("simulated {op} failure")),
    ))
}

impl KeyValueStore for FlakyKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if *self.fail_reads.borrow() {
            return Err(io_error("read"));
        }
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if *self.fail_writes.borrow() {
            return Err(io_error("write"));
        }
        *self.writes.borrow_mut() += 1;
        self.put_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        if *self.fail_writes.borrow() {
            return Err(io_error("write"));
        }
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Backend that records calls and fails for chosen ids.
#[derive(Default)]
pub struct RecordingBackend {
    pub calls: RefCell<Vec<String>>,
    pub fail_schedule: RefCell<bool>,
    pub fail_cancel_for: RefCell<HashSet<ReminderId>>,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl NotificationBackend for RecordingBackend {
    fn schedule(&self, request: &NotificationRequest) -> NotificationResult<()> {
        self.calls.borrow_mut().push(format!("schedule:{}", request.id));
        if *self.fail_schedule.borrow() {
            return Err(NotificationError::Platform("schedule rejected".to_string()));
        }
        Ok(())
    }

    fn cancel(&self, id: &str) -> NotificationResult<()> {
        self.calls.borrow_mut().push(format!("cancel:{id}"));
        if self.fail_cancel_for.borrow().contains(id) {
            return Err(NotificationError::Platform("cancel rejected".to_string()));
        }
        Ok(())
    }

    fn request_permission(&self) -> NotificationResult<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    fn register_channel(&self, _channel: &ChannelSpec) -> NotificationResult<()> {
        Ok(())
    }

    fn pending_ids(&self) -> NotificationResult<Vec<ReminderId>> {
        Ok(Vec::new())
    }
}
