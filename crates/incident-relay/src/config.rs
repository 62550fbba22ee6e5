//! Process configuration, read once at startup.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::error::ConfigError;
use crate::pagerduty::{Severity, EVENTS_API_URL};
use crate::retry::RetryPolicy;

const ENV_ROUTING_KEY: &str = "PD_INT_KEY";
const ENV_SEVERITY: &str = "PD_SEVERITY";
const ENV_SOURCE: &str = "PD_SOURCE";
const ENV_EVENTS_URL: &str = "PD_EVENTS_URL";
const ENV_REQUEST_TIMEOUT: &str = "PD_REQUEST_TIMEOUT_SECS";
const ENV_RETRY_MAX_ELAPSED: &str = "PD_RETRY_MAX_ELAPSED_SECS";
const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Relay configuration.
#[derive(Clone, PartialEq)]
pub struct RelayConfig {
    /// `PagerDuty` integration routing key.
    pub routing_key: String,
    /// Default incident severity.
    pub severity: Severity,
    /// Default incident source label.
    pub source: String,
    /// Minimum log level.
    pub log_level: LevelFilter,
    /// Log output format.
    pub log_format: LogFormat,
    /// Events API endpoint.
    pub events_url: String,
    /// Timeout for a single API request.
    pub request_timeout: Duration,
    /// Backoff used around the API call.
    pub retry: RetryPolicy,
}

impl RelayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Fails when the severity is not one the Events API accepts, so a
    /// misconfigured relay never starts processing events.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let severity = lookup(ENV_SEVERITY)
            .map_or(Ok(Severity::Error), |value| value.parse::<Severity>())?;

        let log_level = lookup(ENV_LOG_LEVEL)
            .map_or(Ok(LevelFilter::INFO), |value| parse_log_level(&value))?;

        let log_format = match lookup(ENV_LOG_FORMAT) {
            None => LogFormat::Text,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" | "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_LOG_FORMAT,
                        value,
                    })
                }
            },
        };

        let request_timeout = Duration::from_secs(parse_number(&lookup, ENV_REQUEST_TIMEOUT, 10)?);
        let max_elapsed = Duration::from_secs(parse_number(&lookup, ENV_RETRY_MAX_ELAPSED, 20)?);

        Ok(Self {
            routing_key: lookup(ENV_ROUTING_KEY).unwrap_or_default(),
            severity,
            source: lookup(ENV_SOURCE).unwrap_or_default(),
            log_level,
            log_format,
            events_url: lookup(ENV_EVENTS_URL)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| EVENTS_API_URL.to_string()),
            request_timeout,
            retry: RetryPolicy::default().with_max_elapsed(max_elapsed),
        })
    }
}

// Keeps the routing key out of logs.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("routing_key", &redact(&self.routing_key))
            .field("severity", &self.severity)
            .field("source", &self.source)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("events_url", &self.events_url)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Parse a log level name, accepting the usual aliases.
pub fn parse_log_level(value: &str) -> Result<LevelFilter, ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "NOTSET" => Ok(LevelFilter::TRACE),
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARN" | "WARNING" => Ok(LevelFilter::WARN),
        "ERROR" | "CRITICAL" => Ok(LevelFilter::ERROR),
        "OFF" => Ok(LevelFilter::OFF),
        _ => Err(ConfigError::LogLevel {
            value: value.to_string(),
        }),
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
