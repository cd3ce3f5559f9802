//! Trigger shapes and notification payloads.
//!
//! # Responsibility
//! - Map a trigger instant plus frequency onto exactly one trigger shape.
//! - Describe the notification content and channel handed to the platform.
//!
//! # Invariants
//! - `OneTime` and `Custom` map to `At`; `Daily` and `Weekly` repeat forever.
//! - Weekday uses the platform index 1..=7 with 1 = Sunday.

use crate::clock::Clock;
use crate::model::reminder::{Frequency, ReminderId};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Title shown on every reminder notification; the reminder title is the body.
pub const NOTIFICATION_TITLE: &str = "Reminder!";
/// Android channel carrying reminder notifications.
pub const REMINDER_CHANNEL_ID: &str = "reminders";
pub const ALARM_SOUND: &str = "alarm.mp3";

/// Scheduler trigger for one reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TriggerWire", from = "TriggerWire")]
pub enum TriggerSpec {
    /// Fires once at an absolute instant.
    At { instant: DateTime<FixedOffset> },
    /// Fires every day at local `hour:minute`.
    Daily { hour: u32, minute: u32 },
    /// Fires every week on `weekday` (1 = Sunday) at local `hour:minute`.
    Weekly { weekday: u8, hour: u32, minute: u32 },
}

impl TriggerSpec {
    /// Builds the trigger shape for a reminder instant and frequency.
    pub fn for_frequency(instant: DateTime<FixedOffset>, frequency: Frequency) -> Self {
        match frequency {
            Frequency::Daily => Self::Daily {
                hour: instant.hour(),
                minute: instant.minute(),
            },
            Frequency::Weekly => Self::Weekly {
                weekday: platform_weekday(instant.weekday()),
                hour: instant.hour(),
                minute: instant.minute(),
            },
            Frequency::OneTime | Frequency::Custom => Self::At { instant },
        }
    }

    pub fn repeats(&self) -> bool {
        !matches!(self, Self::At { .. })
    }

    /// Returns the first firing strictly after `after`.
    ///
    /// Elapsed one-time triggers return `None`. Recurring triggers whose
    /// wall time is skipped on a given day move to the next occurrence.
    pub fn next_fire_after(&self, after: DateTime<Utc>, clock: &impl Clock) -> Option<DateTime<Utc>> {
        match self {
            Self::At { instant } => {
                let instant = instant.with_timezone(&Utc);
                (instant > after).then_some(instant)
            }
            Self::Daily { hour, minute } => {
                let start = clock.to_local(after).date();
                next_local_match(start, 1, *hour, *minute, after, clock)
            }
            Self::Weekly {
                weekday,
                hour,
                minute,
            } => {
                let today = clock.to_local(after).date();
                let current = platform_weekday(today.weekday());
                let days_ahead = (i64::from(*weekday) - i64::from(current)).rem_euclid(7);
                let start = today + Duration::days(days_ahead);
                next_local_match(start, 7, *hour, *minute, after, clock)
            }
        }
    }
}

/// Maps a weekday to the platform index (Sunday = 1 ... Saturday = 7).
pub fn platform_weekday(day: Weekday) -> u8 {
    day.number_from_sunday() as u8
}

fn next_local_match(
    start: NaiveDate,
    step_days: i64,
    hour: u32,
    minute: u32,
    after: DateTime<Utc>,
    clock: &impl Clock,
) -> Option<DateTime<Utc>> {
    // Two steps cover "already passed today"; the rest absorb DST gaps.
    for step in 0..4 {
        let day = start + Duration::days(step * step_days);
        let local: NaiveDateTime = day.and_hms_opt(hour, minute, 0)?;
        if let Some(resolved) = clock.from_local(local) {
            let resolved = resolved.with_timezone(&Utc);
            if resolved > after {
                return Some(resolved);
            }
        }
    }
    None
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TriggerWire {
    Weekly {
        weekday: u8,
        hour: u32,
        minute: u32,
        repeats: bool,
    },
    Daily {
        hour: u32,
        minute: u32,
        repeats: bool,
    },
    At {
        instant: DateTime<FixedOffset>,
    },
}

impl From<TriggerSpec> for TriggerWire {
    fn from(value: TriggerSpec) -> Self {
        match value {
            TriggerSpec::At { instant } => Self::At { instant },
            TriggerSpec::Daily { hour, minute } => Self::Daily {
                hour,
                minute,
                repeats: true,
            },
            TriggerSpec::Weekly {
                weekday,
                hour,
                minute,
            } => Self::Weekly {
                weekday,
                hour,
                minute,
                repeats: true,
            },
        }
    }
}

impl From<TriggerWire> for TriggerSpec {
    fn from(value: TriggerWire) -> Self {
        match value {
            TriggerWire::At { instant } => Self::At { instant },
            TriggerWire::Daily { hour, minute, .. } => Self::Daily { hour, minute },
            TriggerWire::Weekly {
                weekday,
                hour,
                minute,
                ..
            } => Self::Weekly {
                weekday,
                hour,
                minute,
            },
        }
    }
}

/// One platform notification registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Platform identifier; always the reminder id.
    pub id: ReminderId,
    pub title: String,
    pub body: String,
    pub trigger: TriggerSpec,
    pub channel_id: String,
    pub sound: String,
}

impl NotificationRequest {
    pub fn for_reminder(id: &str, reminder_title: &str, trigger: TriggerSpec) -> Self {
        Self {
            id: id.to_string(),
            title: NOTIFICATION_TITLE.to_string(),
            body: reminder_title.to_string(),
            trigger,
            channel_id: REMINDER_CHANNEL_ID.to_string(),
            sound: ALARM_SOUND.to_string(),
        }
    }
}

/// Android notification channel importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelImportance {
    Default,
    High,
    Max,
}

/// One-time platform channel registration (Android only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
    pub sound: String,
    pub vibration_pattern: Vec<u64>,
    pub light_color: String,
}

impl ChannelSpec {
    /// Channel used for every reminder notification.
    pub fn reminders() -> Self {
        Self {
            id: REMINDER_CHANNEL_ID.to_string(),
            name: "Reminders".to_string(),
            importance: ChannelImportance::Max,
            sound: "alarm".to_string(),
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: "#FF231F7C".to_string(),
        }
    }
}
