//! Configuration System
//!
//! Layered configuration for the relay: built-in defaults, a user-level file,
//! workspace files and environment overrides, merged by [`ConfigLoader`] and
//! checked with [`RelayConfig::validate`].

use crate::api::DEFAULT_PAGE_SIZE;
use crate::logging::LoggingConfig;
use crate::pacer::Pacer;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransportOptions, DEFAULT_BASE_URL};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Upstream API endpoint and HTTP client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Minimum spacing between dispatches
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Rate-limit retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Overrides the default `jikan-relay/<version>` user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: None,
        }
    }
}

impl ApiConfig {
    pub fn transport_options(&self) -> HttpTransportOptions {
        let mut options = HttpTransportOptions {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..HttpTransportOptions::default()
        };
        if let Some(ref agent) = self.user_agent {
            options.user_agent = agent.clone();
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// 0 disables pacing
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

fn default_min_interval_ms() -> u64 {
    2500
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl PacingConfig {
    pub fn pacer(&self) -> Pacer {
        Pacer::new(Duration::from_millis(self.min_interval_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retry_attempts: self.max_retry_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Api(String),
    Search(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Api(msg) => write!(f, "api: {}", msg),
            ValidationError::Search(msg) => write!(f, "search: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RelayConfig {
    pub fn pacer(&self) -> Pacer {
        self.pacing.pacer()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match Url::parse(&self.api.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::Api(format!(
                "base_url must be http or https, got scheme '{}'",
                url.scheme()
            ))),
            Err(e) => errors.push(ValidationError::Api(format!(
                "invalid base_url '{}': {}",
                self.api.base_url, e
            ))),
        }

        if self.api.connect_timeout_ms == 0 {
            errors.push(ValidationError::Api(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.api.request_timeout_ms == 0 {
            errors.push(ValidationError::Api(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if !(1..=DEFAULT_PAGE_SIZE).contains(&self.search.default_page_size) {
            errors.push(ValidationError::Search(format!(
                "default_page_size must be between 1 and {}, got {}",
                DEFAULT_PAGE_SIZE, self.search.default_page_size
            )));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
