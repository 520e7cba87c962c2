//! Entry point tying the pieces together: validate the request, fetch every
//! calendar, normalize, and run the overlap engine on the calendars that
//! were retrieved.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::calendar::{NormalizedCalendar, PersonId, Schedule, TimeWindow, WindowError, normalize_events};
use crate::overlap::{OverlapError, OverlapReport, find_overlaps};
use crate::sync::{CalendarApi, FetchFailure, fetch_all};

pub const MIN_CALENDARS: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Please enter at least 2 calendar identifiers (got {found})")]
    TooFewCalendars { found: usize },
    #[error("Invalid date window: {0}")]
    InvalidWindow(#[from] WindowError),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Could not fetch enough calendars to compare ({succeeded} succeeded, {} failed)", .failures.len())]
    InsufficientData {
        succeeded: usize,
        failures: Vec<FetchFailure>,
    },
    #[error(transparent)]
    Overlap(#[from] OverlapError),
}

/// Trims identifiers, drops blanks, and removes case-insensitive duplicates
/// keeping the first spelling.
pub fn validate_calendar_ids<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PersonId>, ValidationError> {
    let mut seen = HashSet::new();
    let ids: Vec<PersonId> = raw
        .iter()
        .map(|id| id.as_ref().trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_lowercase()))
        .map(PersonId::from)
        .collect();

    if ids.len() < MIN_CALENDARS {
        return Err(ValidationError::TooFewCalendars { found: ids.len() });
    }
    Ok(ids)
}

/// A validated search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    calendars: Vec<PersonId>,
    window: TimeWindow,
}

impl SearchRequest {
    pub fn new<S: AsRef<str>>(raw_ids: &[S], window: TimeWindow) -> Result<Self, ValidationError> {
        let calendars = validate_calendar_ids(raw_ids)?;
        Ok(Self { calendars, window })
    }

    pub fn calendars(&self) -> &[PersonId] {
        &self.calendars
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

/// Normalization counts for one fetched calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDiagnostics {
    pub owner: PersonId,
    pub timed_events: usize,
    pub all_day_skipped: usize,
    pub cancelled_skipped: usize,
    pub rejected: usize,
}

impl From<&NormalizedCalendar> for CalendarDiagnostics {
    fn from(normalized: &NormalizedCalendar) -> Self {
        Self {
            owner: normalized.owner().clone(),
            timed_events: normalized.schedule.intervals.len(),
            all_day_skipped: normalized.all_day_skipped,
            cancelled_skipped: normalized.cancelled_skipped,
            rejected: normalized.rejected.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub report: OverlapReport,
    pub fetch_failures: Vec<FetchFailure>,
    pub diagnostics: Vec<CalendarDiagnostics>,
}

pub struct OverlapSearch {
    api: Arc<dyn CalendarApi>,
}

impl OverlapSearch {
    pub fn new(api: Arc<dyn CalendarApi>) -> Self {
        Self { api }
    }

    /// The first calendar, in request order, that was fetched successfully
    /// becomes the base of the overlap search.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let fetched = fetch_all(Arc::clone(&self.api), request.calendars(), request.window()).await;

        if fetched.calendars.len() < MIN_CALENDARS {
            tracing::error!(
                "Only {} of {} calendars fetched, not comparing",
                fetched.calendars.len(),
                request.calendars().len()
            );
            return Err(SearchError::InsufficientData {
                succeeded: fetched.calendars.len(),
                failures: fetched.failures,
            });
        }

        let normalized: Vec<NormalizedCalendar> = fetched
            .calendars
            .into_iter()
            .map(|(owner, events)| normalize_events(owner, &events))
            .collect();

        let diagnostics = normalized.iter().map(CalendarDiagnostics::from).collect();
        let schedules: Vec<Schedule> = normalized.into_iter().map(|n| n.schedule).collect();
        let report = find_overlaps(&schedules)?;

        Ok(SearchOutcome {
            report,
            fetch_failures: fetched.failures,
            diagnostics,
        })
    }
}
