//! Configuration management for the webhook.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Default upstream API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the GitHub REST API
    pub api_base_url: String,
    /// Static token, takes precedence over app credentials
    pub token: Option<String>,
    /// GitHub App id, used as the JWT issuer
    pub app_id: Option<String>,
    /// GitHub App client id (recognized, not used for API calls)
    pub client_id: Option<String>,
    /// GitHub App client secret (recognized, not used for API calls)
    pub client_secret: Option<String>,
    /// PEM file holding the app's private key
    pub private_key_path: Option<PathBuf>,
    /// Secrets Manager ARN holding the app's private key PEM
    pub private_key_secret_arn: Option<String>,
    /// Timeout applied to every outbound call
    pub request_timeout: Duration,
    /// Maximum in-flight outbound calls
    pub max_concurrent_requests: usize,
    /// Page size for repository search
    pub search_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            token: None,
            app_id: None,
            client_id: None,
            client_secret: None,
            private_key_path: None,
            private_key_secret_arn: None,
            request_timeout: Duration::from_secs(10),
            max_concurrent_requests: 8,
            search_limit: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            api_base_url: non_empty("GITHUB_API_BASE").unwrap_or(defaults.api_base_url),
            token: non_empty("GITHUB_TOKEN"),
            app_id: non_empty("GITHUB_APP_ID"),
            client_id: non_empty("GITHUB_CLIENT_ID"),
            client_secret: non_empty("GITHUB_CLIENT_SECRET"),
            private_key_path: non_empty("GITHUB_PRIVATE_KEY_PATH").map(PathBuf::from),
            private_key_secret_arn: non_empty("GITHUB_PRIVATE_KEY_SECRET_ARN"),
            request_timeout: parsed::<u64>("GITHUB_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_concurrent_requests: parsed("GITHUB_MAX_CONCURRENT_REQUESTS")?
                .unwrap_or(defaults.max_concurrent_requests),
            search_limit: parsed("GITHUB_SEARCH_LIMIT")?.unwrap_or(defaults.search_limit),
        })
    }

    /// True when either a static token or app credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.token.is_some() || self.app_id.is_some()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{} must be a number ({}): {}", key, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.search_limit, 5);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_env_parsing() {
        // Variables are unique to this test.
        env::set_var("COPILOT_TEST_LIMIT", " 12 ");
        env::set_var("COPILOT_TEST_BAD_LIMIT", "twelve");

        assert_eq!(parsed::<u32>("COPILOT_TEST_LIMIT").unwrap(), Some(12));
        assert!(matches!(
            parsed::<u32>("COPILOT_TEST_BAD_LIMIT"),
            Err(Error::Config(_))
        ));
        assert_eq!(parsed::<u32>("COPILOT_TEST_UNSET_LIMIT").unwrap(), None);
    }

    #[test]
    fn test_blank_values_are_unset() {
        env::set_var("COPILOT_TEST_BLANK", "   ");
        assert_eq!(non_empty("COPILOT_TEST_BLANK"), None);
    }

    #[test]
    fn test_app_id_counts_as_credentials() {
        let config = Config {
            app_id: Some("12345".into()),
            ..Config::default()
        };
        assert!(config.has_credentials());
    }
}
