use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const BUSY_TITLE: &str = "Busy";

/// Calendar identifier of one person, usually an email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single busy period of one person. `start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub owner: PersonId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: Option<String>,
}

impl Interval {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(
        owner: PersonId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        title: Option<String>,
    ) -> Option<Self> {
        (start <= end).then_some(Self { owner, start, end, title })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(BUSY_TITLE)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    pub fn overlaps_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        overlaps(self.start, self.end, start, end)
    }
}

/// Half-open intersection test. Intervals that only touch at an endpoint do
/// not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// All canonical intervals of one person, in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub owner: PersonId,
    pub intervals: Vec<Interval>,
}

impl Schedule {
    pub fn new(owner: PersonId) -> Self {
        Self { owner, intervals: Vec::new() }
    }

    pub fn with_intervals(owner: PersonId, intervals: Vec<Interval>) -> Self {
        Self { owner, intervals }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn total_busy(&self) -> Duration {
        self.intervals
            .iter()
            .fold(Duration::zero(), |acc, interval| acc + interval.duration())
    }

    /// First interval, by input order, overlapping `[start, end)`.
    pub fn first_overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<&Interval> {
        self.intervals
            .iter()
            .find(|interval| interval.overlaps_window(start, end))
    }
}
