//! Durable key-value slot abstraction.
//!
//! # Responsibility
//! - Define the storage substrate the reminder store writes its blob into.
//! - Define the storage error taxonomy shared by store callers.
//!
//! # Invariants
//! - `set` replaces the whole value in one write; readers never observe a
//!   partially written value.
//! - `get` on a missing key is `Ok(None)`, never an error.
//! - `update` is one atomic read-modify-write for implementations shared
//!   across connections; a failing closure leaves the slot untouched.

use crate::db::DbError;
use crate::model::reminder::ReminderId;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_kv;

pub use sqlite_kv::SqliteKeyValueStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer error for key-value access and blob decoding.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Collection could not be encoded before writing.
    Serialization(serde_json::Error),
    /// Stored blob exists but cannot be decoded.
    Corrupt(String),
    DuplicateId(ReminderId),
    /// A previous writer panicked while holding the write lock.
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode reminders: {err}"),
            Self::Corrupt(message) => write!(f, "stored reminders are corrupt: {message}"),
            Self::DuplicateId(id) => write!(f, "reminder id already exists: {id}"),
            Self::LockPoisoned => write!(f, "reminder store write lock is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Corrupt(_) | Self::DuplicateId(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Process-crash-surviving string slots addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Reads `key`, lets `update` compute the replacement, then writes it.
    ///
    /// `update` returns `None` to leave the slot as it was. The default runs
    /// `get` then `set` and is only atomic for single-owner slots.
    fn update<T>(
        &self,
        key: &str,
        update: impl FnOnce(Option<String>) -> StoreResult<(Option<String>, T)>,
    ) -> StoreResult<T> {
        let (next, output) = update(self.get(key)?)?;
        if let Some(value) = next {
            self.set(key, &value)?;
        }
        Ok(output)
    }
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for &K {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn update<T>(
        &self,
        key: &str,
        update: impl FnOnce(Option<String>) -> StoreResult<(Option<String>, T)>,
    ) -> StoreResult<T> {
        (**self).update(key, update)
    }
}
