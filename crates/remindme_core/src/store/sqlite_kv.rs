//! SQLite-backed key-value slots.
//!
//! `update` runs inside a `BEGIN IMMEDIATE` transaction, so writers on other
//! connections to the same file queue behind it instead of interleaving.

use super::{KeyValueStore, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Key-value slots stored in the `kv_store` table.
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

fn read_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1;",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

fn write_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![key, value],
    )?;
    Ok(())
}

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(read_value(self.conn, key)?)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        Ok(write_value(self.conn, key, value)?)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn update<T>(
        &self,
        key: &str,
        update: impl FnOnce(Option<String>) -> StoreResult<(Option<String>, T)>,
    ) -> StoreResult<T> {
        // Immediate: the read must already hold the database write lock.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let (next, output) = update(read_value(&tx, key)?)?;
        if let Some(value) = next {
            write_value(&tx, key, &value)?;
        }
        tx.commit()?;
        Ok(output)
    }
}
