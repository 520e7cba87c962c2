use chrono::Duration;
use serde::Serialize;

use crate::calendar::{PersonId, Schedule};
use super::engine::OverlapRecord;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonStatistics {
    pub owner: PersonId,
    /// Busy time over all of the person's timed events in the window.
    pub total_busy_hours: f64,
    /// Shared busy time as a share of the person's busy time; 0 when the
    /// person has no busy time.
    pub overlap_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_overlap_hours: f64,
    pub per_person: Vec<PersonStatistics>,
}

pub fn hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / MILLIS_PER_HOUR
}

pub fn overlap_percentage(overlap_hours: f64, busy_hours: f64) -> f64 {
    if busy_hours <= 0.0 {
        0.0
    } else {
        overlap_hours / busy_hours * 100.0
    }
}

pub fn compute_statistics(schedules: &[Schedule], records: &[OverlapRecord]) -> Statistics {
    let total_overlap = records
        .iter()
        .fold(Duration::zero(), |acc, record| acc + record.duration());
    let total_overlap_hours = hours(total_overlap);

    let per_person = schedules
        .iter()
        .map(|schedule| {
            let total_busy_hours = hours(schedule.total_busy());
            PersonStatistics {
                owner: schedule.owner.clone(),
                total_busy_hours,
                overlap_percentage: overlap_percentage(total_overlap_hours, total_busy_hours),
            }
        })
        .collect();

    Statistics {
        total_overlap_hours,
        per_person,
    }
}
