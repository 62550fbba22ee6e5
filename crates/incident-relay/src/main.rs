//! Incident relay binary.
//!
//! Reads an SNS envelope, triggers a `PagerDuty` incident and prints the
//! response as JSON.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use incident_relay::{
    handle, IncidentPublisher, InvocationContext, LogFormat, PagerDutyClient, RelayConfig,
};

/// Relay SNS notifications to PagerDuty
#[derive(Parser)]
#[command(name = "incident-relay")]
#[command(about = "Relay SNS notifications to PagerDuty")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay one envelope and print the PagerDuty response
    Invoke {
        /// Path to the envelope JSON ("-" reads stdin)
        #[arg(long, default_value = "-")]
        event: PathBuf,
    },
    /// Validate configuration and print it with secrets redacted
    CheckConfig,
}

fn init_tracing(config: &RelayConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.log_level.into()));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}

fn read_event(path: &Path) -> Result<serde_json::Value> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?
    };

    serde_json::from_str(&raw).context("Event is not valid JSON")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration errors (including an unknown severity) stop the process
    // before any event is read.
    let config = RelayConfig::from_env().context("Invalid relay configuration")?;
    init_tracing(&config);

    match cli.command {
        Commands::CheckConfig => {
            info!(severity = %config.severity, "Configuration is valid");
            println!("{config:#?}");
            Ok(())
        }
        Commands::Invoke { event } => {
            let event = read_event(&event)?;

            let client = PagerDutyClient::new(&config.events_url, config.request_timeout)
                .context("Failed to build HTTP client")?;
            debug!(events_url = %client.events_url(), "PagerDuty client ready");
            let publisher = IncidentPublisher::new(client, &config);

            match handle(&publisher, &event, &InvocationContext::new()).await {
                Ok(response) => {
                    println!("{}", serde_json::to_string(&response)?);
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "Invocation failed");
                    Err(e.into())
                }
            }
        }
    }
}
