use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sync::google_api::DEFAULT_BASE_URL;

const APP_DIR: &str = "cal-overlap";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub query: QueryConfig,
    pub output: OutputConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_cache: PathBuf,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Days after today covered when no end date is given.
    pub default_window_days: u32,
    /// Calendars compared when none are given on the command line.
    pub calendars: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub time_format: String,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub database: PathBuf,
}

pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        Self::load_or_create_at(&Self::config_path())
    }

    pub fn load_or_create_at(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    pub fn config_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_cache: app_dir().join("token.json"),
            api_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_window_days: 7,
            calendars: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            time_format: "%Y-%m-%d %H:%M".to_string(),
            json: false,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database: app_dir().join("identifiers.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_queries_one_week() {
        let config = Config::default();
        assert_eq!(config.query.default_window_days, 7);
        assert!(config.query.calendars.is_empty());
    }

    #[test]
    fn default_config_targets_google_api() {
        let config = Config::default();
        assert_eq!(config.google.api_base_url, "https://www.googleapis.com/calendar/v3");
    }

    #[test]
    fn default_config_remembers_identifiers() {
        let config = Config::default();
        assert!(config.history.enabled);
        assert!(config.history.database.ends_with("identifiers.db"));
    }

    #[test]
    fn parse_valid_toml_config() {
        let toml_content = r#"
            [google]
            client_id = "test_client_id"
            client_secret = "test_secret"
            token_cache = "/tmp/token.json"
            api_base_url = "http://localhost:9000"

            [query]
            default_window_days = 14
            calendars = ["alice@example.com", "bob@example.com"]

            [output]
            time_format = "%H:%M"
            json = true

            [history]
            enabled = false
            database = "/tmp/ids.db"
        "#;

        let config = Config::from_toml(toml_content).unwrap();

        assert_eq!(config.google.client_id, "test_client_id");
        assert_eq!(config.google.api_base_url, "http://localhost:9000");
        assert_eq!(config.query.default_window_days, 14);
        assert_eq!(config.query.calendars, vec!["alice@example.com", "bob@example.com"]);
        assert!(config.output.json);
        assert!(!config.history.enabled);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config = Config::from_toml("[query]\ncalendars = [\"a@example.com\"]\n").unwrap();

        assert_eq!(config.query.calendars, vec!["a@example.com"]);
        assert_eq!(config.query.default_window_days, 7);
        assert_eq!(config.output.time_format, "%Y-%m-%d %H:%M");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = Config::from_toml("this is not valid toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn missing_config_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cal-overlap").join("config.toml");

        let created = Config::load_or_create_at(&path).unwrap();
        let reloaded = Config::load_or_create_at(&path).unwrap();

        assert!(path.exists());
        assert_eq!(created, reloaded);
    }
}
