//! Relays SNS notifications to `PagerDuty` as incident triggers.
//!
//! Each invocation takes an SNS envelope, pulls out `Records[0].Sns.Message`
//! and triggers a `PagerDuty` incident with that message as the summary.
//!
//! # Usage
//!
//! ```no_run
//! use incident_relay::{
//!     handle, IncidentPublisher, InvocationContext, PagerDutyClient, RelayConfig,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RelayConfig::from_env()?;
//! let client = PagerDutyClient::new(&config.events_url, config.request_timeout)?;
//! let publisher = IncidentPublisher::new(client, &config);
//!
//! let event = serde_json::json!({"Records": [{"Sns": {"Message": "disk full"}}]});
//! let response = handle(&publisher, &event, &InvocationContext::new()).await?;
//! assert_eq!(response.status, "OK");
//! # Ok(())
//! # }
//! ```
//!
//! # Retry behaviour
//!
//! API failures are classified by [`IncidentError::classify`]. HTTP 400 and
//! 5xx responses are retried with exponential backoff until the retry budget
//! (20 seconds by default) is spent. Everything else fails immediately.
//!
//! # Configuration
//!
//! Read once at startup by [`RelayConfig::from_env`]:
//!
//! - `PD_INT_KEY`: `PagerDuty` integration routing key
//! - `PD_SEVERITY`: default severity (`critical`, `error`, `warning`, `info`)
//! - `PD_SOURCE`: default source label
//! - `LOG_LEVEL`: minimum log level
//! - `LOG_FORMAT`: `text` or `json`
//! - `PD_EVENTS_URL`: Events API endpoint override
//! - `PD_REQUEST_TIMEOUT_SECS`: timeout for each API request
//! - `PD_RETRY_MAX_ELAPSED_SECS`: retry budget

pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod pagerduty;
pub mod publisher;
pub mod retry;

pub use config::{LogFormat, RelayConfig};
pub use envelope::{extract_message, Envelope};
pub use error::{ApiFailure, ConfigError, ExtractError, IncidentError, RelayError};
pub use handler::{handle, InvocationContext, RelayResponse, STATUS_OK};
pub use pagerduty::{IncidentApi, IncidentRequest, IncidentResponse, PagerDutyClient, Severity};
pub use publisher::{IncidentPublisher, PublishOptions};
pub use retry::{retry_with_backoff, RetryPolicy, Retryable};
