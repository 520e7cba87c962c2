use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use chrono::{DateTime, Utc};
use async_trait::async_trait;
use crate::storage::config::GoogleConfig;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const REDIRECT_URI: &str = "http://localhost:8080";
pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read token file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse token: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Token has expired")]
    TokenExpired,
    #[error("No refresh token available")]
    NoRefreshToken,
    #[error("Empty access token")]
    EmptyToken,
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("OAuth error: {0}")]
    OAuthError(String),
}

/// Supplies the bearer credential for calendar requests.
#[async_trait]
pub trait CredentialProvider: Send {
    async fn access_token(&mut self) -> Result<String, AuthError>;
}

/// A token obtained outside this program.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn access_token(&mut self) -> Result<String, AuthError> {
        let token = self.0.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(token.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save_token(&self, token: &TokenInfo) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn load_token(&self) -> Result<TokenInfo, AuthError> {
        let content = std::fs::read_to_string(&self.path)?;
        let token: TokenInfo = serde_json::from_str(&content)?;
        Ok(token)
    }
}

impl TokenInfo {
    pub fn new(access_token: String, expires_in_seconds: i64) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in_seconds),
            token_type: "Bearer".to_string(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: String) -> Self {
        self.refresh_token = Some(refresh_token);
        self
    }

    /// Valid for at least five more minutes.
    pub fn is_fresh(&self) -> bool {
        self.expires_at > Utc::now() + chrono::Duration::minutes(5)
    }
}

/// OAuth installed-app flow against Google, with an on-disk token cache.
pub struct GoogleAuthenticator {
    config: GoogleConfig,
    storage: TokenStorage,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

impl GoogleAuthenticator {
    pub fn new(config: GoogleConfig) -> Self {
        let storage = TokenStorage::new(config.token_cache.clone());

        Self {
            config,
            storage,
            client: reqwest::Client::new(),
        }
    }

    pub fn has_client_credentials(&self) -> bool {
        !self.config.client_id.is_empty() && !self.config.client_secret.is_empty()
    }

    pub async fn get_valid_token(&mut self) -> Result<TokenInfo, AuthError> {
        let token = self.storage.load_token()?;
        if token.is_fresh() {
            return Ok(token);
        }
        tracing::info!("Cached token expires at {}, refreshing", token.expires_at);
        self.refresh_token(&token).await
    }

    pub async fn refresh_token(&mut self, token: &TokenInfo) -> Result<TokenInfo, AuthError> {
        let refresh_token = token.refresh_token.as_ref()
            .ok_or(AuthError::NoRefreshToken)?;

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let token_response = self.request_token(&params).await?;

        let new_token = TokenInfo::new(token_response.access_token, token_response.expires_in)
            .with_refresh_token(refresh_token.clone());

        self.storage.save_token(&new_token)?;

        Ok(new_token)
    }

    pub fn get_auth_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            AUTH_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(REDIRECT_URI),
            urlencoding::encode(READONLY_SCOPE)
        )
    }

    pub async fn exchange_code_for_token(&mut self, code: &str) -> Result<TokenInfo, AuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ];

        let token_response = self.request_token(&params).await?;

        let new_token = TokenInfo::new(token_response.access_token, token_response.expires_in)
            .with_refresh_token(
                token_response.refresh_token
                    .ok_or(AuthError::NoRefreshToken)?
            );

        self.storage.save_token(&new_token)?;
        tracing::info!("Stored new token, valid until {}", new_token.expires_at);

        Ok(new_token)
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self.client
            .post(TOKEN_URL)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            tracing::error!("Token request failed: {}", error_text);
            return Err(AuthError::OAuthError(error_text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CredentialProvider for GoogleAuthenticator {
    async fn access_token(&mut self) -> Result<String, AuthError> {
        self.get_valid_token().await.map(|token| token.access_token)
    }
}
