pub mod fetcher;
pub mod google_api;
pub mod google_auth;

pub use fetcher::{FetchFailure, FetchOutcome, fetch_all};
pub use google_api::{ApiError, CalendarApi, GoogleCalendarClient};
pub use google_auth::{AuthError, CredentialProvider, GoogleAuthenticator, StaticToken};
