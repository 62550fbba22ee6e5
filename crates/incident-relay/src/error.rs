//! Error types for the incident relay.

use thiserror::Error;

use crate::retry::Retryable;

/// Failure reported by the incident-management API.
///
/// `status` is present when the API answered with a non-success HTTP status
/// and absent when no usable response came back at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// HTTP status code returned by the API, if any
    pub status: Option<u16>,
    /// Response body or transport error text
    pub message: String,
}

impl ApiFailure {
    /// Failure carrying an HTTP status code.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Failure without a status code (connection refused, timeout, bad body).
    pub fn without_status(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Classified failure of an incident publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncidentError {
    /// The incident request could not be built from its inputs.
    #[error("invalid incident request: {0}")]
    Validation(String),

    /// The API rejected the event and retrying will not help.
    #[error("{}", describe_api_error(.status, .message))]
    Api {
        /// HTTP status, if the API answered
        status: Option<u16>,
        /// Response body or transport error text
        message: String,
    },

    /// The API failed in a way worth retrying (400 or 5xx).
    #[error("retryable incident API error: HTTP {status}: {message}")]
    RetryableApi {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
}

impl IncidentError {
    /// Classify a raw API failure.
    ///
    /// 400 and every status from 500 up are retryable. Any other status, or
    /// no status at all, is terminal.
    pub fn classify(failure: ApiFailure) -> Self {
        match failure.status {
            Some(status) if status == 400 || status >= 500 => Self::RetryableApi {
                status,
                message: failure.message,
            },
            status => Self::Api {
                status,
                message: failure.message,
            },
        }
    }

    /// HTTP status attached to this error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => None,
            Self::Api { status, .. } => *status,
            Self::RetryableApi { status, .. } => Some(*status),
        }
    }
}

impl Retryable for IncidentError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableApi { .. })
    }
}

fn describe_api_error(status: &Option<u16>, message: &str) -> String {
    match *status {
        Some(status) => format!("incident API error: HTTP {status}: {message}"),
        None => format!("incident API error: {message}"),
    }
}

/// The inbound envelope did not have the expected shape.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The envelope is not an SNS notification.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The envelope contains no records.
    #[error("envelope has no records")]
    NoRecords,
}

/// Invalid process configuration, detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configured severity is not one the incident API accepts.
    #[error("invalid severity {value:?}: expected one of critical, error, warning, info")]
    Severity {
        /// The rejected value
        value: String,
    },

    /// The configured log level is not recognised.
    #[error("invalid log level {value:?}")]
    LogLevel {
        /// The rejected value
        value: String,
    },

    /// A variable could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Error surfaced from a relay invocation.
///
/// Both variants are transparent: callers see the extractor or
/// publisher error unchanged.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The envelope could not be read.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The incident could not be published.
    #[error(transparent)]
    Incident(#[from] IncidentError),
}
