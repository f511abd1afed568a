//! Pull-mode observer for the Binwatch dashboard.
//!
//! Stands in for a client with no `WebSocket`: it polls the REST API on a
//! fixed period, triggers a tick whenever the simulation is running, and
//! synthesizes `binUpdate`, `simulationStatus`, and `alert` events by
//! diffing consecutive snapshots. Events are written to the log.
//!
//! # Architecture
//!
//! ```text
//! interval --> trigger (if running) --> GET config + bins --> diff --> log
//! ```
//!
//! Pair it with a server running `tick_mode: external`.

mod client;
mod config;
mod error;
mod poller;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::client::ApiClient;
use crate::config::PollerConfig;
use crate::error::PollerError;
use crate::poller::{LogSink, Poller};

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// then polls until `Ctrl-C`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
#[tokio::main]
async fn main() -> Result<(), PollerError> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("binwatch-poller starting");

    let config = PollerConfig::from_env()?;
    info!(
        api_url = config.api_url,
        poll_interval_ms = config.poll_interval.as_millis(),
        "configuration loaded"
    );

    let poller = Poller::new(ApiClient::new(&config.api_url), Arc::new(LogSink));
    poller.run(config.poll_interval).await;

    info!("binwatch-poller stopped");
    Ok(())
}
