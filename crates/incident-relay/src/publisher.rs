//! Incident publisher.
//!
//! Builds a trigger request from a message and the configured defaults, then
//! submits it through an [`IncidentApi`] under the configured retry policy.

use tracing::field::Empty;
use tracing::{debug, info, instrument};

use crate::config::RelayConfig;
use crate::error::IncidentError;
use crate::pagerduty::{IncidentApi, IncidentRequest, IncidentResponse, Severity};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Per-call overrides of the configured incident fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Routing key to use instead of the configured one
    pub routing_key: Option<String>,
    /// Severity to use instead of the configured one
    pub severity: Option<Severity>,
    /// Source to use instead of the configured one
    pub source: Option<String>,
    /// Dedup key to attach. None by default, so a retried trigger whose first
    /// attempt was accepted can open a second incident.
    pub dedup_key: Option<String>,
}

/// Publishes incident triggers.
pub struct IncidentPublisher<A> {
    api: A,
    routing_key: String,
    severity: Severity,
    source: String,
    retry: RetryPolicy,
}

impl<A: IncidentApi> IncidentPublisher<A> {
    /// Create a publisher using the defaults from `config`.
    pub fn new(api: A, config: &RelayConfig) -> Self {
        Self {
            api,
            routing_key: config.routing_key.clone(),
            severity: config.severity,
            source: config.source.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Publish `message` with the configured defaults.
    pub async fn publish(&self, message: &str) -> Result<IncidentResponse, IncidentError> {
        self.publish_with(message, &PublishOptions::default()).await
    }

    /// Publish `message`, overriding defaults with anything set in `options`.
    ///
    /// Validation failures and non-retryable API errors are returned on first
    /// occurrence. Retryable API errors are retried until the policy's budget
    /// runs out, after which the last one is returned unchanged.
    #[instrument(skip_all, fields(severity = Empty, source = Empty))]
    pub async fn publish_with(
        &self,
        message: &str,
        options: &PublishOptions,
    ) -> Result<IncidentResponse, IncidentError> {
        let request = self.build_request(message, options)?;

        let span = tracing::Span::current();
        span.record("severity", request.payload.severity.as_str());
        span.record("source", request.payload.source.as_str());

        let api = &self.api;
        let request = &request;
        let response = retry_with_backoff(&self.retry, || async move {
            api.create_event(request)
                .await
                .map_err(IncidentError::classify)
        })
        .await?;

        info!(dedup_key = ?response.dedup_key(), "Incident triggered");
        Ok(response)
    }

    fn build_request(
        &self,
        message: &str,
        options: &PublishOptions,
    ) -> Result<IncidentRequest, IncidentError> {
        let request = IncidentRequest::trigger(
            options
                .routing_key
                .as_deref()
                .unwrap_or(&self.routing_key),
            message,
            options.severity.unwrap_or(self.severity),
            options.source.as_deref().unwrap_or(&self.source),
        )?;

        Ok(match &options.dedup_key {
            Some(key) => {
                debug!(dedup_key = %key, "Attaching caller-supplied dedup key");
                request.with_dedup_key(key.clone())
            }
            None => request,
        })
    }
}
