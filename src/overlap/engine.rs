use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::calendar::{Interval, PersonId, Schedule};
use super::stats::{Statistics, compute_statistics, hours};

#[derive(Debug, Error, PartialEq)]
pub enum OverlapError {
    #[error("At least 2 calendars are required to find overlaps, got {found}")]
    TooFewCalendars { found: usize },
}

/// One person's entry in an overlap record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub owner: PersonId,
    pub title: String,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
}

impl Participant {
    fn from_interval(interval: &Interval) -> Self {
        Self {
            owner: interval.owner.clone(),
            title: interval.display_title().to_string(),
            event_start: interval.start,
            event_end: interval.end,
        }
    }
}

/// A window in which every person is busy, anchored to one of the base
/// person's events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapRecord {
    /// Index of the anchoring event in the base person's interval list.
    pub anchor: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub participants: Vec<Participant>,
}

impl OverlapRecord {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn hours(&self) -> f64 {
        hours(self.duration())
    }

    pub fn title_for(&self, owner: &PersonId) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| &p.owner == owner)
            .map(|p| p.title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapReport {
    pub overlaps: Vec<OverlapRecord>,
    pub statistics: Statistics,
}

impl OverlapReport {
    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }
}

/// Finds the shared busy windows of all schedules and derives statistics.
///
/// The first schedule is the base: every record is anchored to one of its
/// intervals, in that schedule's order. Each other schedule is checked
/// against the base interval on its own and contributes its first interval
/// overlapping it. A base interval with no match in some schedule yields no
/// record.
pub fn find_overlaps(schedules: &[Schedule]) -> Result<OverlapReport, OverlapError> {
    if schedules.len() < 2 {
        return Err(OverlapError::TooFewCalendars { found: schedules.len() });
    }

    let overlaps = match_overlaps(schedules);
    let statistics = compute_statistics(schedules, &overlaps);

    tracing::info!(
        "Found {} overlaps across {} calendars ({:.2} hours)",
        overlaps.len(),
        schedules.len(),
        statistics.total_overlap_hours
    );

    Ok(OverlapReport { overlaps, statistics })
}

fn match_overlaps(schedules: &[Schedule]) -> Vec<OverlapRecord> {
    let (base, others) = match schedules.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };

    base.intervals
        .iter()
        .enumerate()
        .filter_map(|(anchor, interval)| match_base(anchor, interval, base, others))
        .collect()
}

/// The base window clipped to every matched interval, or the whole base
/// window when the matches share no common time.
fn clip_to_matches(base_interval: &Interval, matched: &[&Interval]) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = matched
        .iter()
        .map(|m| m.start)
        .fold(base_interval.start, std::cmp::max);
    let end = matched
        .iter()
        .map(|m| m.end)
        .fold(base_interval.end, std::cmp::min);

    if start < end {
        (start, end)
    } else {
        (base_interval.start, base_interval.end)
    }
}

fn match_base(
    anchor: usize,
    base_interval: &Interval,
    base: &Schedule,
    others: &[Schedule],
) -> Option<OverlapRecord> {
    let mut matched = Vec::with_capacity(others.len());

    for schedule in others {
        let Some(interval) = schedule.first_overlapping(base_interval.start, base_interval.end)
        else {
            tracing::debug!(
                "Base event #{} has no overlap in calendar {}",
                anchor,
                schedule.owner
            );
            return None;
        };
        matched.push(interval);
    }

    let (start, end) = clip_to_matches(base_interval, &matched);

    // A zero-length base event overlaps nothing in its own schedule.
    let own = base
        .first_overlapping(base_interval.start, base_interval.end)
        .unwrap_or(base_interval);

    let participants = std::iter::once(own)
        .chain(matched)
        .map(Participant::from_interval)
        .collect();

    Some(OverlapRecord {
        anchor,
        start,
        end,
        participants,
    })
}


#[cfg(test)]
mod properties {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 13, 0, 0, 0).unwrap()
    }

    fn arb_schedule(owner: &'static str) -> impl Strategy<Value = Schedule> {
        prop::collection::vec((0i64..2_000, 0i64..240), 0..8).prop_map(move |spans| {
            let owner = PersonId::from(owner);
            let intervals = spans
                .into_iter()
                .map(|(offset, length)| {
                    let start = epoch() + Duration::minutes(offset);
                    Interval::new(owner.clone(), start, start + Duration::minutes(length), None).unwrap()
                })
                .collect();
            Schedule::with_intervals(owner, intervals)
        })
    }

    fn arb_schedules() -> impl Strategy<Value = Vec<Schedule>> {
        (arb_schedule("a"), arb_schedule("b"), arb_schedule("c"), 2usize..=3).prop_map(
            |(a, b, c, n)| vec![a, b, c].into_iter().take(n).collect(),
        )
    }

    proptest! {
        #[test]
        fn records_never_outnumber_base_events(schedules in arb_schedules()) {
            let report = find_overlaps(&schedules).unwrap();

            prop_assert!(report.overlaps.len() <= schedules[0].intervals.len());
            for record in &report.overlaps {
                prop_assert!(record.anchor < schedules[0].intervals.len());
                let base = &schedules[0].intervals[record.anchor];
                prop_assert!(base.start <= record.start && record.end <= base.end);
            }
        }

        #[test]
        fn every_participant_overlaps_the_base_event(schedules in arb_schedules()) {
            let report = find_overlaps(&schedules).unwrap();

            for record in &report.overlaps {
                prop_assert_eq!(record.participants.len(), schedules.len());
                let base = &schedules[0].intervals[record.anchor];
                for participant in &record.participants[1..] {
                    prop_assert!(participant.event_start < base.end && base.start < participant.event_end);
                }

                let clipped = record
                    .participants
                    .iter()
                    .skip(1)
                    .all(|p| p.event_start <= record.start && record.end <= p.event_end);
                let whole_base = record.start == base.start && record.end == base.end;
                prop_assert!(clipped || whole_base);
            }
        }

        #[test]
        fn rerunning_is_idempotent(schedules in arb_schedules()) {
            let first = find_overlaps(&schedules).unwrap();
            let second = find_overlaps(&schedules).unwrap();

            prop_assert_eq!(first, second);
        }

        #[test]
        fn total_hours_match_records(schedules in arb_schedules()) {
            let report = find_overlaps(&schedules).unwrap();

            let recomputed = report
                .overlaps
                .iter()
                .fold(Duration::zero(), |acc, r| acc + (r.end - r.start));
            prop_assert_eq!(report.statistics.total_overlap_hours, hours(recomputed));
        }
    }
}
