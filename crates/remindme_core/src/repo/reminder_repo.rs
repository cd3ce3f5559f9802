//! Reminder store contracts and key-value implementation.
//!
//! # Responsibility
//! - Keep the whole reminder collection as one JSON array under one key.
//! - Provide whole-collection read-modify-write mutations.
//!
//! # Invariants
//! - Stored order is insertion order with the newest reminder first.
//! - Every mutation is at most one `set` of the whole blob.
//! - Each mutation is one `KeyValueStore::update` cycle; with the SQLite
//!   slot that cycle is a database transaction, so writers on separate
//!   connections cannot drop each other's changes. The in-process lock
//!   additionally serializes writers sharing one store value.
//! - A missing key is an empty collection; an undecodable blob is
//!   `StoreError::Corrupt`.

use crate::model::reminder::{Reminder, ReminderId};
use crate::store::{KeyValueStore, StoreError, StoreResult};
use log::{debug, error};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Key holding the serialized reminder collection.
pub const REMINDERS_KEY: &str = "reminders";

/// Durable reminder collection.
pub trait ReminderStore {
    /// Returns the collection in stored order.
    fn list(&self) -> StoreResult<Vec<Reminder>>;
    fn get(&self, id: &str) -> StoreResult<Option<Reminder>>;
    /// Prepends `reminder`; rejects an id already present.
    fn insert(&self, reminder: &Reminder) -> StoreResult<()>;
    /// Overwrites the record with the same id in place.
    ///
    /// Returns `false` when no record has that id.
    fn replace(&self, reminder: &Reminder) -> StoreResult<bool>;
    /// Returns the number of removed records (0 or 1).
    fn remove(&self, id: &str) -> StoreResult<usize>;
    /// Removes all matching records in one write.
    fn remove_many(&self, ids: &HashSet<ReminderId>) -> StoreResult<usize>;
    fn clear(&self) -> StoreResult<()>;
}

/// Reminder store writing one JSON blob into a key-value slot.
pub struct KvReminderStore<K: KeyValueStore> {
    kv: K,
    key: String,
    write_lock: Mutex<()>,
}

impl<K: KeyValueStore> KvReminderStore<K> {
    /// Creates a store using the default `reminders` key.
    pub fn new(kv: K) -> Self {
        Self::with_key(kv, REMINDERS_KEY)
    }

    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn load(&self) -> StoreResult<Vec<Reminder>> {
        decode(self.kv.get(&self.key)?.as_deref())
    }

    fn save(&self, reminders: &[Reminder], op: &str) -> StoreResult<()> {
        let encoded = encode(reminders)?;
        self.kv
            .set(&self.key, &encoded)
            .map_err(|err| log_write_error(op, err))?;
        debug!(
            "event=store_write module=repo status=ok op={} count={}",
            op,
            reminders.len()
        );
        Ok(())
    }

    /// Runs one locked read-modify-write cycle through `KeyValueStore::update`.
    ///
    /// `mutate` returns whether the collection changed; unchanged collections
    /// are not written back.
    fn mutate<T>(
        &self,
        op: &str,
        mutate: impl FnOnce(&mut Vec<Reminder>) -> StoreResult<(bool, T)>,
    ) -> StoreResult<T> {
        let _guard = self.lock()?;
        let mut written = None;
        let output = self
            .kv
            .update(&self.key, |raw| {
                let mut reminders = decode(raw.as_deref())?;
                let (changed, output) = mutate(&mut reminders)?;
                if !changed {
                    return Ok((None, output));
                }
                written = Some(reminders.len());
                Ok((Some(encode(&reminders)?), output))
            })
            .map_err(|err| log_write_error(op, err))?;
        if let Some(count) = written {
            debug!("event=store_write module=repo status=ok op={op} count={count}");
        }
        Ok(output)
    }
}

fn decode(raw: Option<&str>) -> StoreResult<Vec<Reminder>> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    serde_json::from_str::<Vec<Reminder>>(raw).map_err(|err| {
        error!(
            "event=store_load module=repo status=error error_code=blob_corrupt bytes={} error={}",
            raw.len(),
            err
        );
        StoreError::Corrupt(err.to_string())
    })
}

fn encode(reminders: &[Reminder]) -> StoreResult<String> {
    serde_json::to_string(reminders).map_err(StoreError::Serialization)
}

fn log_write_error(op: &str, err: StoreError) -> StoreError {
    if matches!(err, StoreError::Db(_)) {
        error!(
            "event=store_write module=repo status=error op={} error_code=write_failed error={}",
            op, err
        );
    }
    err
}

impl<K: KeyValueStore> ReminderStore for KvReminderStore<K> {
    fn list(&self) -> StoreResult<Vec<Reminder>> {
        let _guard = self.lock()?;
        self.load()
    }

    fn get(&self, id: &str) -> StoreResult<Option<Reminder>> {
        Ok(self.list()?.into_iter().find(|reminder| reminder.id == id))
    }

    fn insert(&self, reminder: &Reminder) -> StoreResult<()> {
        self.mutate("insert", |reminders| {
            if reminders.iter().any(|existing| existing.id == reminder.id) {
                return Err(StoreError::DuplicateId(reminder.id.clone()));
            }
            reminders.insert(0, reminder.clone());
            Ok((true, ()))
        })
    }

    fn replace(&self, reminder: &Reminder) -> StoreResult<bool> {
        self.mutate("replace", |reminders| {
            match reminders
                .iter_mut()
                .find(|existing| existing.id == reminder.id)
            {
                Some(slot) => {
                    *slot = reminder.clone();
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
    }

    fn remove(&self, id: &str) -> StoreResult<usize> {
        self.mutate("remove", |reminders| {
            let before = reminders.len();
            reminders.retain(|reminder| reminder.id != id);
            let removed = before - reminders.len();
            Ok((removed > 0, removed))
        })
    }

    fn remove_many(&self, ids: &HashSet<ReminderId>) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.mutate("remove_many", |reminders| {
            let before = reminders.len();
            reminders.retain(|reminder| !ids.contains(&reminder.id));
            let removed = before - reminders.len();
            Ok((removed > 0, removed))
        })
    }

    fn clear(&self) -> StoreResult<()> {
        let _guard = self.lock()?;
        self.save(&[], "clear")
    }
}
