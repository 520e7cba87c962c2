use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use cal_overlap::search::SearchOutcome;
use cal_overlap::sync::FetchFailure;

fn format_time<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz, time_format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.with_timezone(tz).format(time_format).to_string()
}

pub fn render_failures(failures: &[FetchFailure]) -> String {
    failures.iter().map(|f| format!("{}\n", f)).collect()
}

pub fn render_text<Tz: TimeZone>(outcome: &SearchOutcome, tz: &Tz, time_format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut lines = Vec::new();

    for failure in &outcome.fetch_failures {
        lines.push(failure.to_string());
    }

    let report = &outcome.report;
    if report.is_empty() {
        lines.push("No overlapping meetings found".to_string());
    } else {
        for record in &report.overlaps {
            lines.push(String::new());
            for participant in &record.participants {
                lines.push(format!("  {}: {}", participant.owner, participant.title));
            }
            lines.push(format!(
                "  Overlap time: {} - {}",
                format_time(record.start, tz, time_format),
                format_time(record.end, tz, time_format)
            ));
        }
    }

    let stats = &report.statistics;
    lines.push(String::new());
    lines.push(format!("Total overlap: {:.2} hours", stats.total_overlap_hours));
    for person in &stats.per_person {
        lines.push(format!(
            "  {}: {:.2} busy hours, {:.1}% in overlaps",
            person.owner, person.total_busy_hours, person.overlap_percentage
        ));
    }

    let rejected: usize = outcome.diagnostics.iter().map(|d| d.rejected).sum();
    if rejected > 0 {
        lines.push(format!("({} malformed events ignored, see log)", rejected));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn render_json(outcome: &SearchOutcome) -> serde_json::Result<String> {
    let failures: Vec<_> = outcome
        .fetch_failures
        .iter()
        .map(|f| json!({ "calendar": f.calendar, "message": f.message }))
        .collect();

    serde_json::to_string_pretty(&json!({
        "overlaps": outcome.report.overlaps,
        "statistics": outcome.report.statistics,
        "fetchFailures": failures,
    }))
}
