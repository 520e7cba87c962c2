use std::sync::Arc;

use anyhow::Context;
use chrono::{Days, Local, NaiveDate};

use cal_overlap::{
    calendar::TimeWindow,
    search::{OverlapSearch, SearchError, SearchOutcome, SearchRequest},
    storage::{Config, IdentifierStore},
    sync::{CalendarApi, GoogleCalendarClient},
};

use crate::authentication::credential_provider;
use crate::presentation::{render_failures, render_json, render_text};
use crate::sample::{SampleCalendars, sample_calendar_ids};

pub const USAGE: &str = "Usage: cal-overlap [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--json] [--token TOKEN] [--sample] <calendar-id>...\n       cal-overlap --suggest <text>\n       cal-overlap --forget <calendar-id>";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchArgs {
    pub calendars: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub json: bool,
    pub token: Option<String>,
    pub sample: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliMode {
    Search(SearchArgs),
    Suggest(String),
    Forget(String),
    Help,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD.", value))
}

fn required_value(flag: &str, value: Option<String>) -> Result<String, String> {
    value
        .filter(|v| !v.starts_with("--"))
        .ok_or_else(|| format!("{} requires a value", flag))
}

pub fn parse_cli_mode<I: IntoIterator<Item = String>>(args: I) -> Result<CliMode, String> {
    let mut search = SearchArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--from" => search.from = Some(parse_date(&required_value("--from", args.next())?)?),
            "--to" => search.to = Some(parse_date(&required_value("--to", args.next())?)?),
            "--json" => search.json = true,
            "--sample" => search.sample = true,
            "--token" => search.token = Some(required_value("--token", args.next())?),
            "--suggest" => {
                let fragment = args.next().unwrap_or_default();
                return Ok(CliMode::Suggest(fragment));
            }
            "--forget" => return Ok(CliMode::Forget(required_value("--forget", args.next())?)),
            "--help" | "-h" => return Ok(CliMode::Help),
            flag if flag.starts_with("--") => return Err(format!("Unknown argument: {}", flag)),
            _ => search.calendars.push(arg),
        }
    }

    Ok(CliMode::Search(search))
}

/// Window from `--from` (default today) to `--to` (default `from` plus the
/// configured number of days).
pub fn resolve_dates(args: &SearchArgs, default_days: u32, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let from = args.from.unwrap_or(today);
    let to = args.to.unwrap_or_else(|| {
        from.checked_add_days(Days::new(default_days as u64))
            .unwrap_or(from)
    });
    (from, to)
}

pub async fn run_search(args: SearchArgs, config: &Config) -> anyhow::Result<()> {
    let mut calendars = args.calendars.clone();
    if calendars.is_empty() {
        calendars = if args.sample {
            sample_calendar_ids()
        } else {
            config.query.calendars.clone()
        };
    }

    let (from, to) = resolve_dates(&args, config.query.default_window_days, Local::now().date_naive());
    let window = TimeWindow::from_dates(from, to)
        .map_err(|e| SearchError::Validation(e.into()))?;
    let request = SearchRequest::new(&calendars, window).map_err(SearchError::from)?;

    let api: Arc<dyn CalendarApi> = if args.sample {
        Arc::new(SampleCalendars::around(from))
    } else {
        let mut provider = credential_provider(args.token.clone(), config).await?;
        let token = provider.access_token().await.context("Failed to get authentication token")?;
        Arc::new(GoogleCalendarClient::new(token).with_base_url(config.google.api_base_url.clone()))
    };

    let outcome = match OverlapSearch::new(api).run(&request).await {
        Ok(outcome) => outcome,
        Err(SearchError::InsufficientData { succeeded, failures }) => {
            eprint!("{}", render_failures(&failures));
            return Err(SearchError::InsufficientData { succeeded, failures }.into());
        }
        Err(e) => return Err(e.into()),
    };

    if config.history.enabled && !args.sample {
        remember_calendars(config, &outcome);
    }

    if args.json || config.output.json {
        println!("{}", render_json(&outcome)?);
    } else {
        print!("{}", render_text(&outcome, &Local, &config.output.time_format));
    }

    Ok(())
}

fn remember_calendars(config: &Config, outcome: &SearchOutcome) {
    let store = match IdentifierStore::open(&config.history.database) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Identifier history unavailable: {}", e);
            return;
        }
    };

    for diagnostics in &outcome.diagnostics {
        if let Err(e) = store.remember(diagnostics.owner.as_str()) {
            tracing::warn!("Failed to remember {}: {}", diagnostics.owner, e);
        }
    }
}

pub fn run_suggest(fragment: &str, config: &Config) -> anyhow::Result<()> {
    let store = IdentifierStore::open(&config.history.database)
        .context("Failed to open identifier history")?;

    for identifier in store.suggest(fragment)? {
        println!("{}", identifier);
    }
    Ok(())
}

pub fn run_forget(identifier: &str, config: &Config) -> anyhow::Result<()> {
    let store = IdentifierStore::open(&config.history.database)
        .context("Failed to open identifier history")?;

    if store.forget(identifier)? {
        println!("Forgot {}", identifier.trim());
    } else {
        println!("{} is not in the history", identifier.trim());
    }
    Ok(())
}
