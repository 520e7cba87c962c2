use crate::calendar::{RawEvent, TimeWindow};
use chrono::SecondsFormat;
use serde::Deserialize;
use thiserror::Error;
use async_trait::async_trait;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const PAGE_SIZE: &str = "250";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Calendar API error: {0}")]
    RequestError(String),
    #[error("Calendar not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    AuthenticationFailed,
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    items: Option<Vec<RawEvent>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Source of raw calendar events, one calendar at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<RawEvent>, ApiError>;
}

pub struct GoogleCalendarClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(access_token: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    async fn fetch_page(
        &self,
        url: &str,
        calendar_id: &str,
        window: &TimeWindow,
        page_token: Option<&str>,
    ) -> Result<EventListResponse, ApiError> {
        let time_min = window.start().to_rfc3339_opts(SecondsFormat::Millis, true);
        let time_max = window.end().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut query = vec![
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
            ("maxResults", PAGE_SIZE),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        tracing::info!("Fetch events for {} response status: {}", calendar_id, status);

        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when fetching events for {}", calendar_id);
            return Err(ApiError::AuthenticationFailed);
        }

        if status == 404 {
            tracing::error!("Calendar not found: {}", calendar_id);
            return Err(ApiError::NotFound(calendar_id.to_string()));
        }

        if status == 429 {
            tracing::warn!("Rate limit exceeded for {}", calendar_id);
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to fetch events. Status: {}, Body: {}", status, body);
            return Err(ApiError::RequestError(error_message(status, &body)));
        }

        Ok(response.json().await?)
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error: ErrorBody { message: Some(message) } }) => message,
        _ if body.trim().is_empty() => format!("Status {}", status),
        _ => format!("Status {}: {}", status, body),
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<RawEvent>, ApiError> {
        let url = self.events_url(calendar_id);

        tracing::info!(
            "Fetching events for {} from {} to {}",
            calendar_id,
            window.start(),
            window.end()
        );

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self
                .fetch_page(&url, calendar_id, window, page_token.as_deref())
                .await?;
            pages += 1;
            events.extend(page.items.unwrap_or_default());

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(
            "Fetched {} events for {} in {} page(s)",
            events.len(),
            calendar_id,
            pages
        );
        Ok(events)
    }
}
