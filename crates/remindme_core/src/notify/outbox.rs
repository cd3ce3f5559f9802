//! SQLite outbox bridging the scheduler to a host notification API.
//!
//! # Responsibility
//! - Persist schedule/cancel/channel commands for the host to apply.
//! - Mirror the currently registered trigger per reminder id.
//!
//! # Invariants
//! - Commands are drained in `seq` order and deleted in the same transaction.
//! - `active_triggers` holds at most one row per reminder id.
//! - Cancelling an id without an active trigger enqueues nothing.

use super::scheduler::{
    NotificationBackend, NotificationError, NotificationResult, PermissionStatus,
};
use super::trigger::{ChannelSpec, NotificationRequest};
use crate::model::reminder::ReminderId;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PERMISSION_KEY: &str = "permission";

/// Kind of a queued host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxCommandKind {
    Schedule,
    Cancel,
    RegisterChannel,
}

impl OutboxCommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Cancel => "cancel",
            Self::RegisterChannel => "register_channel",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "schedule" => Some(Self::Schedule),
            "cancel" => Some(Self::Cancel),
            "register_channel" => Some(Self::RegisterChannel),
            _ => None,
        }
    }
}

/// One queued host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxCommand {
    pub seq: i64,
    pub kind: OutboxCommandKind,
    /// Set for schedule and cancel commands.
    pub reminder_id: Option<ReminderId>,
    /// JSON `NotificationRequest` or `ChannelSpec`.
    pub payload: Option<String>,
}

/// Notification backend that queues commands in SQLite.
pub struct OutboxNotificationBackend<'conn> {
    conn: &'conn Connection,
}

impl<'conn> OutboxNotificationBackend<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Stores the permission answer reported by the host.
    pub fn record_permission(&self, status: PermissionStatus) -> NotificationResult<()> {
        let value = serde_json::to_string(&status)?;
        self.set_setting(PERMISSION_KEY, &value)
    }

    /// Returns and removes all queued commands in `seq` order.
    pub fn drain(&self) -> NotificationResult<Vec<OutboxCommand>> {
        let tx = self.conn.unchecked_transaction()?;
        let commands = {
            let mut stmt = tx.prepare(
                "SELECT seq, command, reminder_id, payload
                 FROM notification_outbox
                 ORDER BY seq ASC;",
            )?;
            let mut rows = stmt.query([])?;
            let mut commands = Vec::new();
            while let Some(row) = rows.next()? {
                commands.push(parse_command_row(row)?);
            }
            commands
        };
        if let Some(last) = commands.last() {
            tx.execute("DELETE FROM notification_outbox WHERE seq <= ?1;", [last.seq])?;
        }
        tx.commit()?;

        debug!(
            "event=outbox_drain module=notify status=ok count={}",
            commands.len()
        );
        Ok(commands)
    }

    /// Currently registered request for a reminder id.
    pub fn active_trigger(&self, id: &str) -> NotificationResult<Option<NotificationRequest>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM active_triggers WHERE reminder_id = ?1;",
                [id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn setting(&self, key: &str) -> NotificationResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM notification_settings WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> NotificationResult<()> {
        self.conn.execute(
            "INSERT INTO notification_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

impl NotificationBackend for OutboxNotificationBackend<'_> {
    fn schedule(&self, request: &NotificationRequest) -> NotificationResult<()> {
        let payload = serde_json::to_string(request)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notification_outbox (command, reminder_id, payload) VALUES (?1, ?2, ?3);",
            params![OutboxCommandKind::Schedule.as_str(), request.id, payload],
        )?;
        tx.execute(
            "INSERT INTO active_triggers (reminder_id, payload) VALUES (?1, ?2)
             ON CONFLICT(reminder_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![request.id, payload],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn cancel(&self, id: &str) -> NotificationResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM active_triggers WHERE reminder_id = ?1;", [id])?;
        if removed > 0 {
            tx.execute(
                "INSERT INTO notification_outbox (command, reminder_id) VALUES (?1, ?2);",
                params![OutboxCommandKind::Cancel.as_str(), id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Defaults to `Granted` until the host records an answer.
    fn request_permission(&self) -> NotificationResult<PermissionStatus> {
        match self.setting(PERMISSION_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(PermissionStatus::Granted),
        }
    }

    fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()> {
        let key = format!("channel:{}", channel.id);
        if self.setting(&key)?.is_some() {
            return Ok(());
        }
        let payload = serde_json::to_string(channel)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notification_outbox (command, payload) VALUES (?1, ?2);",
            params![OutboxCommandKind::RegisterChannel.as_str(), payload],
        )?;
        tx.execute(
            "INSERT INTO notification_settings (key, value) VALUES (?1, ?2);",
            params![key, "registered"],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn pending_ids(&self) -> NotificationResult<Vec<ReminderId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT reminder_id FROM active_triggers ORDER BY reminder_id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn parse_command_row(row: &Row<'_>) -> NotificationResult<OutboxCommand> {
    let command: String = row.get("command")?;
    let kind = OutboxCommandKind::parse(&command).ok_or_else(|| {
        NotificationError::Platform(format!("unknown outbox command `{command}`"))
    })?;
    Ok(OutboxCommand {
        seq: row.get("seq")?,
        kind,
        reminder_id: row.get("reminder_id")?,
        payload: row.get("payload")?,
    })
}
