use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("End date must be after start date ({end} is before {start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Date {0} has no valid local time")]
    InvalidLocalTime(NaiveDateTime),
}

/// Query window `[start, end]` passed to the calendar service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole local days from the start of `first` to the last millisecond of `last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self, WindowError> {
        Self::from_dates_in(&Local, first, last)
    }

    pub fn from_dates_in<Tz: TimeZone>(
        tz: &Tz,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Self, WindowError> {
        let start = resolve_local(tz, first.and_time(chrono::NaiveTime::MIN))?;
        let end_of_day = last
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or(WindowError::InvalidLocalTime(last.and_time(chrono::NaiveTime::MIN)))?;
        let end = resolve_local(tz, end_of_day)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Longest daylight-saving gap searched past a skipped local time.
const MAX_GAP_MINUTES: i64 = 180;

/// Resolves a local wall-clock time, taking the earlier instant when it is
/// ambiguous and the first valid minute after the gap when it was skipped.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>, WindowError> {
    (0..=MAX_GAP_MINUTES)
        .filter_map(|minutes| naive.checked_add_signed(Duration::minutes(minutes)))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(WindowError::InvalidLocalTime(naive))
}
