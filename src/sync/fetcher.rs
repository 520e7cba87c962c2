use std::sync::Arc;

use tokio::task::JoinSet;

use crate::calendar::{PersonId, RawEvent, TimeWindow};
use super::google_api::CalendarApi;

/// One calendar that could not be retrieved.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub calendar: PersonId,
    pub message: String,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error fetching calendar for {}: {}", self.calendar, self.message)
    }
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Successfully fetched calendars, in request order.
    pub calendars: Vec<(PersonId, Vec<RawEvent>)>,
    /// Failed calendars, in request order.
    pub failures: Vec<FetchFailure>,
}

/// Fetches every calendar concurrently. A failure for one calendar is
/// recorded and never cancels the others.
pub async fn fetch_all(
    api: Arc<dyn CalendarApi>,
    calendars: &[PersonId],
    window: TimeWindow,
) -> FetchOutcome {
    let mut tasks = JoinSet::new();

    for (index, calendar) in calendars.iter().enumerate() {
        let api = Arc::clone(&api);
        let calendar = calendar.clone();
        tasks.spawn(async move {
            let result = api.fetch_events(calendar.as_str(), &window).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<Vec<RawEvent>, String>>> = vec![None; calendars.len()];

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                results[index] = Some(result.map_err(|e| e.to_string()));
            }
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
            }
        }
    }

    let mut outcome = FetchOutcome::default();
    for (calendar, result) in calendars.iter().zip(results) {
        match result {
            Some(Ok(events)) => outcome.calendars.push((calendar.clone(), events)),
            Some(Err(message)) => {
                tracing::error!("Error fetching calendar for {}: {}", calendar, message);
                outcome.failures.push(FetchFailure { calendar: calendar.clone(), message });
            }
            None => outcome.failures.push(FetchFailure {
                calendar: calendar.clone(),
                message: "fetch task did not complete".to_string(),
            }),
        }
    }

    tracing::info!(
        "Fetched {} of {} calendars",
        outcome.calendars.len(),
        calendars.len()
    );
    outcome
}
