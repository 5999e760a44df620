//! HTTP client configuration module
//!
//! Centralizes timeouts and retry policy for calendar feed fetches.

use crate::config::WidgetConfig;
use crate::error::{AppError, AppResult};
use crate::utils::retry::RetryConfig;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const USER_AGENT: &str = concat!("meetwidget/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub base_retry_delay: Duration,
    /// Maximum retry delay
    pub max_retry_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::ics_fetch()
    }
}

impl HttpConfig {
    /// Defaults tuned for a single ICS download on a refresh tick
    pub fn ics_fetch() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            base_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    /// Applies the user-facing knobs from the widget configuration
    pub fn from_widget_config(config: &WidgetConfig) -> Self {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        Self {
            connect_timeout: std::cmp::min(Self::ics_fetch().connect_timeout, timeout),
            timeout,
            max_retries: config.fetch_retries,
            ..Self::ics_fetch()
        }
    }

    /// Build a reqwest client with this configuration
    pub fn build_client(&self) -> AppResult<Client> {
        ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .build()
            .map_err(|e| AppError::feed_fetch(format!("Failed to build HTTP client: {}", e)))
    }

    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries + 1,
            base_delay: self.base_retry_delay,
            max_delay: self.max_retry_delay,
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_config_overrides_timeout_and_retries() {
        let widget = WidgetConfig {
            fetch_timeout_secs: 5,
            fetch_retries: 0,
            ..WidgetConfig::default()
        };

        let http = HttpConfig::from_widget_config(&widget);
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.connect_timeout, Duration::from_secs(5));
        assert_eq!(http.to_retry_config().max_attempts, 1);
    }

    #[test]
    fn test_build_client() {
        assert!(HttpConfig::ics_fetch().build_client().is_ok());
    }
}
