//! SDK configuration.
//!
//! Holds the API endpoint, retry policy, OAuth endpoints and logging
//! preferences. Configuration can be built in code (every section has
//! sensible defaults) or persisted as TOML on disk.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{LmError, LmResult};

/// Top-level SDK configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkConfig {
    /// REST API connection and request pipeline settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// OAuth endpoints and scopes.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the delay between retry attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Wait `retry_delay_ms` before every retry.
    #[default]
    Fixed,
    /// Double the delay on each retry, capped at `max_retry_delay_ms`.
    Exponential,
}

/// REST API connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API host, e.g. "https://api.lawmatics.com".
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Version path segment inserted between host and resource path.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether transient failures are retried at all.
    #[serde(default = "default_true")]
    pub enable_retry: bool,

    /// Additional attempts after the first one for transient failures.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Cap for exponential backoff in milliseconds.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Fixed or exponential delay growth.
    #[serde(default)]
    pub backoff: BackoffStrategy,

    /// Retry POST requests that carry no idempotency key.
    #[serde(default = "default_true")]
    pub retry_non_idempotent: bool,

    /// Attach the structured details map from error bodies to errors.
    #[serde(default = "default_true")]
    pub include_error_details: bool,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// User-Agent header value.
    #[serde(default = "constants::default_user_agent")]
    pub user_agent: String,
}

/// OAuth endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Authorization endpoint the user is sent to.
    #[serde(default = "default_authorization_url")]
    pub authorization_url: String,

    /// Token endpoint used for code exchange and refresh.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Redirect URI registered for the application.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, only console logging is set up.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output for the log file.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_base_url() -> String {
    constants::DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    constants::API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_max_retry_attempts() -> u32 {
    constants::DEFAULT_MAX_RETRY_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    constants::DEFAULT_RETRY_DELAY_MS
}

fn default_max_retry_delay_ms() -> u64 {
    constants::DEFAULT_MAX_RETRY_DELAY_MS
}

fn default_authorization_url() -> String {
    constants::DEFAULT_AUTHORIZATION_URL.to_string()
}

fn default_token_url() -> String {
    constants::DEFAULT_TOKEN_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            enable_retry: true,
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            backoff: BackoffStrategy::default(),
            retry_non_idempotent: true,
            include_error_details: true,
            custom_headers: HashMap::new(),
            user_agent: constants::default_user_agent(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_url: default_authorization_url(),
            token_url: default_token_url(),
            redirect_uri: None,
            scopes: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl ApiConfig {
    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the first retry.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Root URL for versioned resource paths, e.g. "https://api.lawmatics.com/v1".
    pub fn api_root(&self) -> String {
        let base = sanitize_base_url(&self.base_url);
        let version = self.api_version.trim_matches('/');
        if version.is_empty() {
            base
        } else {
            format!("{base}/{version}")
        }
    }
}

impl SdkConfig {
    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> LmResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SdkConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> LmResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| {
            LmError::InvalidConfiguration(format!("failed to serialize config: {e}"))
        })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check the configuration for values the request pipeline cannot use.
    pub fn validate(&self) -> LmResult<()> {
        check_http_url("api.base_url", &self.api.base_url)?;
        check_http_url("oauth.token_url", &self.oauth.token_url)?;
        check_http_url("oauth.authorization_url", &self.oauth.authorization_url)?;

        if let Some(ref redirect) = self.oauth.redirect_uri {
            url::Url::parse(redirect).map_err(|e| {
                LmError::InvalidConfiguration(format!("oauth.redirect_uri is not a valid URL: {e}"))
            })?;
        }
        if self.api.api_version.trim_matches('/').is_empty() {
            return Err(LmError::InvalidConfiguration(
                "api.api_version must not be empty".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(LmError::InvalidConfiguration(
                "api.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.api.backoff == BackoffStrategy::Exponential
            && self.api.max_retry_delay_ms < self.api.retry_delay_ms
        {
            return Err(LmError::InvalidConfiguration(
                "api.max_retry_delay_ms must not be below api.retry_delay_ms".into(),
            ));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(LmError::InvalidConfiguration(
                "api.user_agent must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Trim whitespace, surrounding quotes and trailing slashes from a base URL.
pub fn sanitize_base_url(address: &str) -> String {
    address
        .trim()
        .trim_matches('"')
        .trim()
        .trim_end_matches('/')
        .to_string()
}

fn check_http_url(field: &str, value: &str) -> LmResult<()> {
    let parsed = url::Url::parse(&sanitize_base_url(value))
        .map_err(|e| LmError::InvalidConfiguration(format!("{field} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(LmError::InvalidConfiguration(format!(
            "{field} must use http or https, got {other}"
        ))),
    }
}
