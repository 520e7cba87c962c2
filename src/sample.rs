use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeZone};

use cal_overlap::calendar::{RawEvent, TimeWindow};
use cal_overlap::sync::{ApiError, CalendarApi};

const SAMPLE_IDS: [&str; 3] = ["alex@example.com", "blair@example.com", "casey@example.com"];

pub fn sample_calendar_ids() -> Vec<String> {
    SAMPLE_IDS.iter().map(|id| id.to_string()).collect()
}

/// Built-in calendars for trying the tool without network access.
pub struct SampleCalendars {
    events: HashMap<String, Vec<RawEvent>>,
}

type SampleEvent = (&'static str, (u32, u32), (u32, u32));

fn local_rfc3339(day: NaiveDate, (hour, minute): (u32, u32)) -> Option<String> {
    let naive = day.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).earliest().map(|dt| dt.to_rfc3339())
}

fn build_events(day: NaiveDate, entries: &[SampleEvent]) -> Vec<RawEvent> {
    entries
        .iter()
        .filter_map(|(title, start, end)| {
            let start = local_rfc3339(day, *start)?;
            let end = local_rfc3339(day, *end)?;
            Some(RawEvent::timed(Some(*title), &start, &end))
        })
        .collect()
}

impl SampleCalendars {
    pub fn around(day: NaiveDate) -> Self {
        let date = day.format("%Y-%m-%d").to_string();
        let next = day.succ_opt().unwrap_or(day).format("%Y-%m-%d").to_string();

        let mut alex = build_events(day, &[
            ("Morning Standup", (9, 0), (9, 30)),
            ("Design Review", (11, 0), (12, 0)),
            ("1:1", (14, 0), (15, 0)),
        ]);
        alex.push(RawEvent::all_day(Some("Company Holiday Prep"), &date, &next));

        let blair = build_events(day, &[
            ("Sync", (9, 15), (10, 0)),
            ("1:1", (14, 0), (15, 0)),
            ("Focus Time", (15, 0), (17, 0)),
        ]);

        let casey = build_events(day, &[
            ("Planning", (8, 30), (9, 45)),
            ("Lunch with Team", (12, 30), (13, 30)),
            ("Interview", (14, 30), (15, 30)),
        ]);

        let events = SAMPLE_IDS
            .iter()
            .map(|id| id.to_string())
            .zip([alex, blair, casey])
            .collect();

        Self { events }
    }
}

#[async_trait]
impl CalendarApi for SampleCalendars {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        _window: &TimeWindow,
    ) -> Result<Vec<RawEvent>, ApiError> {
        self.events
            .get(calendar_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(calendar_id.to_string()))
    }
}
