//! Reminder domain model.
//!
//! # Responsibility
//! - Define the persisted reminder record and its JSON wire shape.
//! - Validate editable fields and derive the trigger instant.
//!
//! # Invariants
//! - `id` is minted once at creation and never changes.
//! - `title` is non-empty (after trimming) at save time.
//! - `date` and `time` are stored independently; only their local
//!   year/month/day and hour/minute are combined into the trigger instant.

use crate::clock::Clock;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque reminder identifier.
///
/// New ids are hyphenated UUID v4 strings; ids read from existing blobs are
/// kept verbatim.
pub type ReminderId = String;

/// Repetition cadence of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "One time")]
    OneTime,
    Daily,
    Weekly,
    /// Treated as one-time until custom recurrence rules exist.
    Custom,
}

impl Frequency {
    /// Returns the persisted label for this frequency.
    pub fn label(self) -> &'static str {
        match self {
            Self::OneTime => "One time",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Custom => "Custom",
        }
    }

    /// Parses a persisted label back into a frequency.
    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "One time" => Some(Self::OneTime),
            "Daily" => Some(Self::Daily),
            "Weekly" => Some(Self::Weekly),
            "Custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::OneTime
    }
}

/// Persisted reminder record.
///
/// Field names and value shapes match the stored JSON array, so existing
/// blobs stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    /// Only the local calendar day is meaningful.
    #[serde(with = "iso_timestamp")]
    pub date: DateTime<Utc>,
    /// Only the local hour and minute are meaningful.
    #[serde(with = "iso_timestamp")]
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub frequency: Frequency,
}

impl Reminder {
    /// Builds a record with a freshly minted id from validated draft fields.
    pub fn from_draft(draft: &ReminderDraft) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), draft)
    }

    /// Builds a record that keeps an existing id.
    pub fn with_id(id: impl Into<ReminderId>, draft: &ReminderDraft) -> Self {
        Self {
            id: id.into(),
            title: draft.title.trim().to_string(),
            date: draft.date,
            time: draft.time,
            note: normalize_note(draft.note.as_deref()),
            frequency: draft.frequency,
        }
    }

    /// Returns the editable fields of this record.
    pub fn to_draft(&self) -> ReminderDraft {
        ReminderDraft {
            title: self.title.clone(),
            date: self.date,
            time: self.time,
            note: self.note.clone(),
            frequency: self.frequency,
        }
    }

    /// Combines `date` and `time` into the local trigger instant.
    pub fn trigger_instant(&self, clock: &impl Clock) -> ReminderResult<DateTime<FixedOffset>> {
        combine_date_time(self.date, self.time, clock)
    }
}

/// Editable reminder fields as collected by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub title: String,
    pub date: DateTime<Utc>,
    pub time: DateTime<Utc>,
    pub note: Option<String>,
    pub frequency: Frequency,
}

impl ReminderDraft {
    /// Validates draft fields against the current time.
    ///
    /// Returns the combined local trigger instant on success.
    ///
    /// # Errors
    /// - `EmptyTitle` when the trimmed title is empty.
    /// - `NonexistentLocalTime` when the local wall time falls in a DST gap.
    /// - `InstantInPast` when the instant is strictly earlier than now.
    pub fn validate(&self, clock: &impl Clock) -> ReminderResult<DateTime<FixedOffset>> {
        if self.title.trim().is_empty() {
            return Err(ReminderValidationError::EmptyTitle);
        }

        let instant = combine_date_time(self.date, self.time, clock)?;
        if instant < clock.now() {
            return Err(ReminderValidationError::InstantInPast {
                instant: instant.naive_local(),
                now: clock.local_now(),
            });
        }

        Ok(instant)
    }
}

pub type ReminderResult<T> = Result<T, ReminderValidationError>;

/// Validation failure for reminder fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    EmptyTitle,
    InstantInPast {
        instant: NaiveDateTime,
        now: NaiveDateTime,
    },
    NonexistentLocalTime(NaiveDateTime),
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "reminder title cannot be empty"),
            Self::InstantInPast { instant, now } => write!(
                f,
                "reminder time {instant} is in the past (now {now})"
            ),
            Self::NonexistentLocalTime(local) => {
                write!(f, "local time {local} does not exist in the device time zone")
            }
        }
    }
}

impl Error for ReminderValidationError {}

/// Combines local year/month/day of `date` with local hour/minute of `time`.
///
/// Seconds and sub-second parts are dropped.
pub fn combine_date_time(
    date: DateTime<Utc>,
    time: DateTime<Utc>,
    clock: &impl Clock,
) -> ReminderResult<DateTime<FixedOffset>> {
    let day = clock.to_local(date).date();
    let wall = clock.to_local(time).time();
    let hour_minute = NaiveTime::from_hms_opt(wall.hour(), wall.minute(), 0).unwrap_or(wall);
    let local = day.and_time(hour_minute);

    clock
        .from_local(local)
        .ok_or(ReminderValidationError::NonexistentLocalTime(local))
}

fn normalize_note(note: Option<&str>) -> Option<String> {
    note.filter(|value| !value.trim().is_empty())
        .map(ToString::to_string)
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix.
mod iso_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| de::Error::custom(format!("invalid ISO-8601 timestamp `{raw}`: {err}")))
    }
}
