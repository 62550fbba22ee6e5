//! Invocation entry point.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::envelope::extract_message;
use crate::error::RelayError;
use crate::pagerduty::{IncidentApi, IncidentResponse};
use crate::publisher::IncidentPublisher;

/// Status reported for a successful invocation.
pub const STATUS_OK: &str = "OK";

/// Metadata about the current invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Identifier for log correlation
    pub invocation_id: String,
}

impl InvocationContext {
    /// Context with a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            invocation_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Successful invocation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Body returned by `PagerDuty`
    pub pagerduty_response: IncidentResponse,
    /// Always [`STATUS_OK`]
    pub status: String,
}

/// Relay one SNS envelope to the incident API.
///
/// Extraction and publish errors are returned as they are; nothing is
/// converted into a success-shaped response.
pub async fn handle<A: IncidentApi>(
    publisher: &IncidentPublisher<A>,
    event: &Value,
    context: &InvocationContext,
) -> Result<RelayResponse, RelayError> {
    let span = info_span!("invocation", invocation_id = %context.invocation_id);

    async move {
        debug!(event = %event, "Event received");

        let message = extract_message(event)?;
        let pagerduty_response = publisher.publish(&message).await?;

        let response = RelayResponse {
            pagerduty_response,
            status: STATUS_OK.to_string(),
        };

        debug!(
            response = %serde_json::to_string(&response).unwrap_or_default(),
            "Response"
        );
        Ok(response)
    }
    .instrument(span)
    .await
}
