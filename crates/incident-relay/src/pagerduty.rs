//! `PagerDuty` Events API v2 client.
//!
//! The [`IncidentApi`] trait is the seam between the publisher and the
//! network. [`PagerDutyClient`] is the production implementation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiFailure, ConfigError, IncidentError};

/// `PagerDuty` Events API v2 endpoint.
pub const EVENTS_API_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Incident severity accepted by the Events API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Critical severity
    Critical,
    /// Error severity
    Error,
    /// Warning severity
    Warning,
    /// Info severity
    Info,
}

impl Severity {
    /// Wire name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(ConfigError::Severity {
                value: s.to_string(),
            }),
        }
    }
}

/// Event action. The relay only ever triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    /// Trigger a new incident or add to an existing one
    Trigger,
}

/// Incident trigger sent to the Events API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRequest {
    /// Integration routing key
    pub routing_key: String,
    /// Event action
    pub event_action: EventAction,
    /// Dedup key, only when the caller supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
    /// Event payload
    pub payload: EventPayload,
}

/// Payload of an incident trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Incident summary (the relayed message)
    pub summary: String,
    /// Severity level
    pub severity: Severity,
    /// Source of the event
    pub source: String,
}

impl IncidentRequest {
    /// Build a trigger request, rejecting empty required fields.
    pub fn trigger(
        routing_key: impl Into<String>,
        summary: impl Into<String>,
        severity: Severity,
        source: impl Into<String>,
    ) -> Result<Self, IncidentError> {
        let request = Self {
            routing_key: routing_key.into(),
            event_action: EventAction::Trigger,
            dedup_key: None,
            payload: EventPayload {
                summary: summary.into(),
                severity,
                source: source.into(),
            },
        };

        // Checked before anything is sent: an empty field never reaches the
        // API or the retry loop.
        for (field, value) in [
            ("routing_key", &request.routing_key),
            ("payload.summary", &request.payload.summary),
            ("payload.source", &request.payload.source),
        ] {
            if value.trim().is_empty() {
                return Err(IncidentError::Validation(format!("{field} is required")));
            }
        }

        Ok(request)
    }

    /// Set the dedup key.
    #[must_use]
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }
}

/// Success body returned by the incident API, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentResponse(pub Value);

impl IncidentResponse {
    /// Dedup key assigned by `PagerDuty`, if the body carries one.
    pub fn dedup_key(&self) -> Option<&str> {
        self.0.get("dedup_key").and_then(Value::as_str)
    }
}

/// Create-event operation of an incident-management API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// Submit one event. Each call is a single, independent attempt.
    async fn create_event(
        &self,
        request: &IncidentRequest,
    ) -> Result<IncidentResponse, ApiFailure>;
}

/// `PagerDuty` client for Events API v2.
#[derive(Debug, Clone)]
pub struct PagerDutyClient {
    events_url: String,
    client: reqwest::Client,
}

impl PagerDutyClient {
    /// Create a client posting to `events_url`, with a per-request timeout.
    pub fn new(events_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            events_url: events_url.into(),
            client,
        })
    }

    /// Endpoint this client posts to.
    pub fn events_url(&self) -> &str {
        &self.events_url
    }
}

#[async_trait]
impl IncidentApi for PagerDutyClient {
    async fn create_event(
        &self,
        request: &IncidentRequest,
    ) -> Result<IncidentResponse, ApiFailure> {
        debug!(
            action = ?request.event_action,
            severity = %request.payload.severity,
            source = %request.payload.source,
            "Sending PagerDuty event"
        );

        let response = self
            .client
            .post(&self.events_url)
            .json(request)
            .send()
            .await
            .map_err(ApiFailure::from)?;

        let status = response.status();
        if status.is_success() {
            let body: IncidentResponse = response.json().await.map_err(ApiFailure::from)?;
            debug!(dedup_key = ?body.dedup_key(), "PagerDuty event accepted");
            Ok(body)
        } else {
            let body = response.text().await.unwrap_or_default();

            warn!(
                status = %status,
                body = %body,
                "PagerDuty API request failed"
            );

            Err(ApiFailure::with_status(status.as_u16(), body))
        }
    }
}
