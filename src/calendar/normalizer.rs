use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use super::event::{EventTime, RawEvent, TimeMarker};
use super::interval::{Interval, PersonId, Schedule};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MalformedEventError {
    #[error("Missing start marker")]
    MissingStart,
    #[error("Missing end marker")]
    MissingEnd,
    #[error("{0} marker has neither dateTime nor date")]
    EmptyMarker(MarkerSide),
    #[error("Invalid {side} timestamp '{value}': {reason}")]
    InvalidTimestamp {
        side: MarkerSide,
        value: String,
        reason: String,
    },
    #[error("Invalid {side} date '{value}': {reason}")]
    InvalidDate {
        side: MarkerSide,
        value: String,
        reason: String,
    },
    #[error("End {end} is before start {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSide {
    Start,
    End,
}

impl std::fmt::Display for MarkerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerSide::Start => f.write_str("start"),
            MarkerSide::End => f.write_str("end"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEvent {
    /// Position of the record in the input list.
    pub index: usize,
    pub error: MalformedEventError,
}

/// Normalizer output for one person.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCalendar {
    pub schedule: Schedule,
    pub all_day_skipped: usize,
    pub cancelled_skipped: usize,
    pub rejected: Vec<RejectedEvent>,
}

impl NormalizedCalendar {
    pub fn owner(&self) -> &PersonId {
        &self.schedule.owner
    }
}

enum Classified {
    Timed(Interval),
    AllDay,
    Cancelled,
}

/// Resolves a marker, preferring the precise timestamp. The date-only field
/// is only ever turned into an all-day marker.
pub fn resolve_marker(time: &EventTime, side: MarkerSide) -> Result<TimeMarker, MalformedEventError> {
    if let Some(value) = time.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(value)
            .map(|dt| TimeMarker::Timed(dt.with_timezone(&Utc)))
            .map_err(|e| MalformedEventError::InvalidTimestamp {
                side,
                value: value.to_string(),
                reason: e.to_string(),
            });
    }

    if let Some(value) = time.date.as_deref() {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(TimeMarker::AllDay)
            .map_err(|e| MalformedEventError::InvalidDate {
                side,
                value: value.to_string(),
                reason: e.to_string(),
            });
    }

    Err(MalformedEventError::EmptyMarker(side))
}

fn classify(owner: &PersonId, event: &RawEvent) -> Result<Classified, MalformedEventError> {
    let start = event.start.as_ref().ok_or(MalformedEventError::MissingStart)?;
    let end = event.end.as_ref().ok_or(MalformedEventError::MissingEnd)?;

    let start = resolve_marker(start, MarkerSide::Start)?;
    let end = resolve_marker(end, MarkerSide::End)?;

    if event.is_cancelled() {
        return Ok(Classified::Cancelled);
    }

    match (start, end) {
        (TimeMarker::Timed(start), TimeMarker::Timed(end)) => {
            let title = event
                .summary
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);
            Interval::new(owner.clone(), start, end, title)
                .map(Classified::Timed)
                .ok_or(MalformedEventError::EndBeforeStart { start, end })
        }
        _ => Ok(Classified::AllDay),
    }
}

/// Converts one person's raw events into canonical intervals, keeping input
/// order. All-day and cancelled events are skipped; malformed records are
/// counted and logged but never abort normalization.
pub fn normalize_events(owner: PersonId, events: &[RawEvent]) -> NormalizedCalendar {
    let mut schedule = Schedule::new(owner);
    let mut all_day_skipped = 0;
    let mut cancelled_skipped = 0;
    let mut rejected = Vec::new();

    for (index, event) in events.iter().enumerate() {
        match classify(&schedule.owner, event) {
            Ok(Classified::Timed(interval)) => schedule.intervals.push(interval),
            Ok(Classified::AllDay) => all_day_skipped += 1,
            Ok(Classified::Cancelled) => cancelled_skipped += 1,
            Err(error) => {
                tracing::warn!(
                    "Dropping malformed event #{} for {}: {}",
                    index,
                    schedule.owner,
                    error
                );
                tracing::debug!("Malformed event record: {:?}", event);
                rejected.push(RejectedEvent { index, error });
            }
        }
    }

    tracing::info!(
        "Normalized {} events for {}: {} timed, {} all-day, {} cancelled, {} rejected",
        events.len(),
        schedule.owner,
        schedule.intervals.len(),
        all_day_skipped,
        cancelled_skipped,
        rejected.len()
    );

    NormalizedCalendar {
        schedule,
        all_day_skipped,
        cancelled_skipped,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn owner() -> PersonId {
        PersonId::from("alice@example.com")
    }

    #[test]
    fn timed_events_become_intervals_in_input_order() {
        let events = vec![
            RawEvent::timed(Some("Late"), "2025-01-15T14:00:00Z", "2025-01-15T15:00:00Z"),
            RawEvent::timed(Some("Early"), "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z"),
        ];

        let normalized = normalize_events(owner(), &events);

        let titles: Vec<&str> = normalized
            .schedule
            .intervals
            .iter()
            .map(|i| i.display_title())
            .collect();
        assert_eq!(titles, vec!["Late", "Early"]);
        assert!(normalized.rejected.is_empty());
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let events = vec![RawEvent::timed(
            Some("Call"),
            "2025-01-15T09:00:00-05:00",
            "2025-01-15T10:00:00-05:00",
        )];

        let normalized = normalize_events(owner(), &events);

        let interval = &normalized.schedule.intervals[0];
        assert_eq!(interval.start, Utc.with_ymd_and_hms(2025, 1, 15, 14, 0, 0).unwrap());
        assert_eq!(interval.owner, owner());
    }

    #[test]
    fn all_day_events_are_skipped_not_rejected() {
        let events = vec![
            RawEvent::all_day(Some("Holiday"), "2025-01-15", "2025-01-16"),
            RawEvent::timed(Some("Sync"), "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z"),
        ];

        let normalized = normalize_events(owner(), &events);

        assert_eq!(normalized.schedule.intervals.len(), 1);
        assert_eq!(normalized.all_day_skipped, 1);
        assert!(normalized.rejected.is_empty());
    }

    #[test]
    fn mixed_marker_event_counts_as_all_day() {
        let event = RawEvent {
            start: Some(EventTime::timed("2025-01-15T09:00:00Z")),
            end: Some(EventTime::all_day("2025-01-16")),
            ..RawEvent::default()
        };

        let normalized = normalize_events(owner(), &[event]);

        assert!(normalized.schedule.is_empty());
        assert_eq!(normalized.all_day_skipped, 1);
    }

    #[test]
    fn missing_markers_are_rejected_with_index() {
        let events = vec![
            RawEvent::timed(Some("Ok"), "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z"),
            RawEvent {
                summary: Some("No end".to_string()),
                start: Some(EventTime::timed("2025-01-15T09:00:00Z")),
                ..RawEvent::default()
            },
            RawEvent::default(),
        ];

        let normalized = normalize_events(owner(), &events);

        assert_eq!(
            normalized.rejected,
            vec![
                RejectedEvent { index: 1, error: MalformedEventError::MissingEnd },
                RejectedEvent { index: 2, error: MalformedEventError::MissingStart },
            ]
        );
        assert_eq!(normalized.schedule.intervals.len(), 1);
    }

    #[test]
    fn empty_marker_is_rejected() {
        let event = RawEvent {
            start: Some(EventTime::default()),
            end: Some(EventTime::timed("2025-01-15T10:00:00Z")),
            ..RawEvent::default()
        };

        let normalized = normalize_events(owner(), &[event]);

        assert_eq!(
            normalized.rejected[0].error,
            MalformedEventError::EmptyMarker(MarkerSide::Start)
        );
    }

    #[test]
    fn unparsable_timestamp_is_rejected() {
        let events = vec![RawEvent::timed(None, "not a time", "2025-01-15T10:00:00Z")];

        let normalized = normalize_events(owner(), &events);

        assert!(matches!(
            normalized.rejected[0].error,
            MalformedEventError::InvalidTimestamp { side: MarkerSide::Start, .. }
        ));
    }

    #[test]
    fn unparsable_date_is_rejected() {
        let events = vec![RawEvent::all_day(None, "2025-01-15", "2025-13-40")];

        let normalized = normalize_events(owner(), &events);

        assert!(matches!(
            normalized.rejected[0].error,
            MalformedEventError::InvalidDate { side: MarkerSide::End, .. }
        ));
        assert_eq!(normalized.all_day_skipped, 0);
    }

    #[test]
    fn bad_timestamp_never_falls_back_to_date() {
        let event = RawEvent {
            start: Some(EventTime {
                date_time: Some("garbage".to_string()),
                date: Some("2025-01-15".to_string()),
                time_zone: None,
            }),
            end: Some(EventTime::all_day("2025-01-16")),
            ..RawEvent::default()
        };

        let normalized = normalize_events(owner(), &[event]);

        assert_eq!(normalized.all_day_skipped, 0);
        assert_eq!(normalized.rejected.len(), 1);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let events = vec![RawEvent::timed(None, "2025-01-15T10:00:00Z", "2025-01-15T09:00:00Z")];

        let normalized = normalize_events(owner(), &events);

        assert!(matches!(
            normalized.rejected[0].error,
            MalformedEventError::EndBeforeStart { .. }
        ));
    }

    #[test]
    fn zero_length_event_is_kept() {
        let events = vec![RawEvent::timed(None, "2025-01-15T10:00:00Z", "2025-01-15T10:00:00Z")];

        let normalized = normalize_events(owner(), &events);

        assert_eq!(normalized.schedule.intervals.len(), 1);
    }

    #[test]
    fn cancelled_events_are_skipped() {
        let mut event = RawEvent::timed(Some("Gone"), "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z");
        event.status = Some("cancelled".to_string());

        let normalized = normalize_events(owner(), &[event]);

        assert!(normalized.schedule.is_empty());
        assert_eq!(normalized.cancelled_skipped, 1);
    }

    #[test]
    fn blank_summary_has_no_title() {
        let events = vec![RawEvent::timed(Some("   "), "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z")];

        let normalized = normalize_events(owner(), &events);

        assert_eq!(normalized.schedule.intervals[0].title, None);
        assert_eq!(normalized.schedule.intervals[0].display_title(), "Busy");
    }
}
