use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;

// ─── Clock ────────────────────────────────────────────────────────────────────

/// Source of "now". Everything date-sensitive takes its `today` from here
/// instead of reading the system clock directly.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        normalize_to_date(&self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock pinned to a calendar day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now:   DateTime<Utc>,
    today: NaiveDate,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        let noon = NaiveTime::MIN + Duration::hours(12);
        Self { now: today.and_time(noon).and_utc(), today }
    }

    #[cfg(test)]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, today: normalize_to_date(&now) }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> { self.now }
    fn today(&self) -> NaiveDate { self.today }
}

// ─── Date helpers ─────────────────────────────────────────────────────────────

/// Drops the time of day, in local time.
pub fn normalize_to_date<Tz: TimeZone>(ts: &DateTime<Tz>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// Whole days from `today` to `due`: negative when past, 0 on the day.
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Parses a `YYYY-MM-DD` due date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_owned()))
}
