//! Configuration file parser for ~/.config/bloom/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, with a warning logged for each so
//! typos don't go unnoticed.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::util::{validate_base_url, UrlValidationError};

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "BLOOM_API_URL";

/// Mock API serving the flower catalog.
pub const DEFAULT_API_BASE_URL: &str = "https://64a59a6e00c3559aa9bff5ab.mockapi.io/api/v1/";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid api_base_url: {0}")]
    InvalidApiUrl(#[from] UrlValidationError),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog API; `category` is resolved against it.
    pub api_base_url: String,

    /// Deadline for one catalog request, in seconds. 0 falls back to 5.
    pub request_timeout_secs: u64,

    /// Ask before `remove` takes a single item out of favorites.
    pub confirm_remove: bool,

    /// Ask before `clear` removes every favorite.
    pub confirm_remove_all: bool,

    /// Save each fetched catalog and fall back to it when offline.
    pub offline_snapshot: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 5,
            confirm_remove: true,
            confirm_remove_all: true,
            offline_snapshot: true,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "api_base_url",
        "request_timeout_secs",
        "confirm_remove",
        "confirm_remove_all",
        "offline_snapshot",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), api = %config.api_base_url, "Loaded configuration");
        Ok(config)
    }

    /// Apply `BLOOM_API_URL` if it is set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(api = %url, "Using API URL from {}", API_URL_ENV);
            self.api_base_url = url;
        }
        self
    }

    /// The validated API base URL.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        Ok(validate_base_url(&self.api_base_url)?)
    }

    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => crate::catalog::DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(test_name: &str, content: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("bloom_config_test_{test_name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(config.confirm_remove);
        assert!(config.confirm_remove_all);
        assert!(config.offline_snapshot);
    }

    #[test]
    fn test_default_api_url_is_valid() {
        let url = Config::default().api_url().unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/bloom_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let (dir, path) = write_config("empty", "   \n  ");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("partial", "request_timeout_secs = 10\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.confirm_remove_all);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_base_url = "http://127.0.0.1:4000/api/v1/"
request_timeout_secs = 2
confirm_remove = false
confirm_remove_all = false
offline_snapshot = false
"#;
        let (dir, path) = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:4000/api/v1/");
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert!(!config.confirm_remove);
        assert!(!config.confirm_remove_all);
        assert!(!config.offline_snapshot);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), crate::catalog::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "theme = \"dark\"\noffline_snapshot = false\n");

        let config = Config::load(&path).unwrap();
        assert!(!config.offline_snapshot);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) = write_config("wrongtype", "request_timeout_secs = \"soon\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::default()
            .with_api_url_override(Some("http://localhost:9999/".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:9999/");
    }

    #[test]
    fn test_blank_api_url_override_ignored() {
        let config = Config::default().with_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        let config = Config::default().with_api_url_override(None);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_insecure_api_url_rejected() {
        let config = Config {
            api_base_url: "http://example.com/api/".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.api_url().unwrap_err(),
            ConfigError::InvalidApiUrl(_)
        ));
    }
}
