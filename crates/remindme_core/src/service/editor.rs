//! Editor form helpers.
//!
//! # Responsibility
//! - Produce the initial field values for new and edited reminders.
//! - Keep picked date/time combinations from drifting into the past.

use crate::clock::Clock;
use crate::model::reminder::{Frequency, Reminder, ReminderDraft};
use chrono::{DateTime, Utc};

/// Empty draft defaulting to "now", one-time.
pub fn new_draft(clock: &impl Clock) -> ReminderDraft {
    let now = clock.now();
    ReminderDraft {
        title: String::new(),
        date: now,
        time: now,
        note: None,
        frequency: Frequency::OneTime,
    }
}

/// Draft used to pre-fill the editor for an existing reminder.
///
/// A reminder whose instant already passed gets date and time reset to now
/// instead of showing the elapsed values.
pub fn prefill_for_edit(reminder: &Reminder, clock: &impl Clock) -> ReminderDraft {
    let mut draft = reminder.to_draft();
    let elapsed = match reminder.trigger_instant(clock) {
        Ok(instant) => instant.with_timezone(&Utc) < clock.now(),
        Err(_) => true,
    };
    if elapsed {
        let now = clock.now();
        draft.date = now;
        draft.time = now;
    }
    draft
}

/// Snaps `time` to now when `date` is today and `time` already passed.
pub fn clamp_time_for_date(
    date: DateTime<Utc>,
    time: DateTime<Utc>,
    clock: &impl Clock,
) -> DateTime<Utc> {
    let now_local = clock.local_now();
    let is_today = clock.to_local(date).date() == now_local.date();
    if is_today && clock.to_local(time).time() < now_local.time() {
        clock.now()
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_time_for_date, prefill_for_edit};
    use crate::clock::{Clock, FixedClock};
    use crate::model::reminder::{Frequency, Reminder};
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::utc(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }

    fn reminder(day: u32, hour: u32) -> Reminder {
        Reminder {
            id: "r-1".to_string(),
            title: "call mom".to_string(),
            date: Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap(),
            time: Utc.with_ymd_and_hms(2025, 2, 1, hour, 15, 0).unwrap(),
            note: Some("birthday".to_string()),
            frequency: Frequency::Weekly,
        }
    }

    #[test]
    fn future_reminder_keeps_stored_fields() {
        let stored = reminder(2, 8);
        let draft = prefill_for_edit(&stored, &clock());
        assert_eq!(draft, stored.to_draft());
    }

    #[test]
    fn elapsed_reminder_resets_to_now() {
        let clock = clock();
        let draft = prefill_for_edit(&reminder(1, 8), &clock);
        assert_eq!(draft.date, clock.now());
        assert_eq!(draft.time, clock.now());
        assert_eq!(draft.title, "call mom");
        assert_eq!(draft.frequency, Frequency::Weekly);
    }

    #[test]
    fn past_time_today_snaps_to_now() {
        let clock = clock();
        let today = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(clamp_time_for_date(today, morning, &clock), clock.now());

        let tomorrow = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(clamp_time_for_date(tomorrow, morning, &clock), morning);
    }
}
