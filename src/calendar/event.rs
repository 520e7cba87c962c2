use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An event record as returned by the calendar service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub organizer: Option<Organizer>,
}

/// Start or end marker of an event. Timed events carry `dateTime`,
/// all-day events only carry `date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMarker {
    Timed(DateTime<Utc>),
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn timed(value: &str) -> Self {
        Self {
            date_time: Some(value.to_string()),
            ..Self::default()
        }
    }

    pub fn all_day(value: &str) -> Self {
        Self {
            date: Some(value.to_string()),
            ..Self::default()
        }
    }
}

impl RawEvent {
    pub fn timed(summary: Option<&str>, start: &str, end: &str) -> Self {
        Self {
            summary: summary.map(String::from),
            start: Some(EventTime::timed(start)),
            end: Some(EventTime::timed(end)),
            ..Self::default()
        }
    }

    pub fn all_day(summary: Option<&str>, start: &str, end: &str) -> Self {
        Self {
            summary: summary.map(String::from),
            start: Some(EventTime::all_day(start)),
            end: Some(EventTime::all_day(end)),
            ..Self::default()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_timed_event_from_service_json() {
        let json = r#"{
            "id": "abc123",
            "summary": "Standup",
            "status": "confirmed",
            "start": {"dateTime": "2025-01-15T09:00:00-05:00", "timeZone": "America/New_York"},
            "end": {"dateTime": "2025-01-15T09:30:00-05:00"},
            "organizer": {"email": "lead@example.com", "displayName": "Lead"}
        }"#;

        let event: RawEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.summary.as_deref(), Some("Standup"));
        let start = event.start.unwrap();
        assert_eq!(start.date_time.as_deref(), Some("2025-01-15T09:00:00-05:00"));
        assert_eq!(start.time_zone.as_deref(), Some("America/New_York"));
        assert_eq!(event.organizer.unwrap().email.as_deref(), Some("lead@example.com"));
    }

    #[test]
    fn deserializes_all_day_event_without_date_time() {
        let json = r#"{"start": {"date": "2025-01-15"}, "end": {"date": "2025-01-16"}}"#;

        let event: RawEvent = serde_json::from_str(json).unwrap();

        let start = event.start.unwrap();
        assert!(start.date_time.is_none());
        assert_eq!(start.date.as_deref(), Some("2025-01-15"));
        assert!(event.summary.is_none());
    }

    #[test]
    fn deserializes_record_with_missing_markers() {
        let event: RawEvent = serde_json::from_str(r#"{"summary": "Broken"}"#).unwrap();

        assert!(event.start.is_none());
        assert!(event.end.is_none());
    }

    #[test]
    fn cancelled_status_is_detected() {
        let mut event = RawEvent::timed(None, "2025-01-15T09:00:00Z", "2025-01-15T10:00:00Z");
        assert!(!event.is_cancelled());

        event.status = Some("cancelled".to_string());
        assert!(event.is_cancelled());
    }
}
