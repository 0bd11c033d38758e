/// Process configuration for the Redash MCP server
///
/// The configuration is built once at startup and handed to the backend
/// client by reference. Nothing mutates it after `validate()` succeeds.

use std::time::Duration;
use thiserror::Error;

/// Default HTTP request timeout for every backend call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between two job status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of job status polls before giving up
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

/// Errors raised while validating startup configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Redash URL is required")]
    MissingUrl,

    #[error("Redash API key is required")]
    MissingApiKey,

    #[error("Invalid Redash URL '{0}': must start with http:// or https://")]
    InvalidUrl(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Job polling policy: fixed interval, fixed attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollConfig {
    /// Upper bound on the time a single job can block the protocol loop,
    /// excluding the time spent inside the status requests themselves.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Connection settings for the Redash backend
#[derive(Debug, Clone)]
pub struct RedashConfig {
    /// Base URL of the Redash instance, without trailing slash
    pub base_url: String,
    /// API key sent as `Authorization: Key <api_key>`
    pub api_key: String,
    /// Bypass any proxy configured in the environment
    pub no_proxy: bool,
    pub request_timeout: Duration,
    pub poll: PollConfig,
}

impl RedashConfig {
    /// Create a configuration with default timeouts and polling policy
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        Self {
            base_url,
            api_key: api_key.into().trim().to_string(),
            no_proxy: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll: PollConfig::default(),
        }
    }

    pub fn with_no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Check that the configuration can be used to reach a backend
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }

        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout",
                message: "must be greater than zero".to_string(),
            });
        }

        if self.poll.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_poll_attempts",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Build a full endpoint URL from a path starting with `/`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
