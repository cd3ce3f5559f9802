//! Wall-clock and time-zone seam.
//!
//! # Responsibility
//! - Provide "now" and local-time conversions to validation and scheduling.
//! - Let tests pin both the current instant and the zone.
//!
//! # Invariants
//! - `from_local` returns `None` for wall times skipped by a DST gap and the
//!   earliest instant for ambiguous (repeated) wall times.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};

/// Source of the current time and the device time zone.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Converts an instant to local wall time.
    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime;

    /// Resolves a local wall time to an instant with its offset.
    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>>;

    /// Current local wall time.
    fn local_now(&self) -> NaiveDateTime {
        self.to_local(self.now())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        (**self).to_local(instant)
    }

    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        (**self).from_local(local)
    }
}

/// Device clock using the process-local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&Local).naive_local()
    }

    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        Local
            .from_local_datetime(&local)
            .earliest()
            .map(|resolved| resolved.fixed_offset())
    }
}

/// Pinned clock with a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    /// Pinned clock in UTC.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }

    /// Returns a copy pinned to another instant in the same zone.
    pub fn at(&self, now: DateTime<Utc>) -> Self {
        Self::new(now, self.offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.offset.from_local_datetime(&local).single()
    }
}
