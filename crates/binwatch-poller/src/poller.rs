//! The poll loop.
//!
//! Each cycle mirrors what a dashboard without a push channel does: if the
//! simulation is running, ask the server for one tick (there is no server
//! timer in this mode), then re-fetch the config and bin list and diff them
//! against the previous cycle. The synthesized events go to an
//! [`EventSink`].

use std::sync::Arc;
use std::time::Duration;

use binwatch_core::EventSink;
use binwatch_core::poll::{PollObserver, PollSnapshot};
use binwatch_types::ObserverEvent;
use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::PollerError;

/// Sink that writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: ObserverEvent) {
        match event {
            ObserverEvent::BinUpdate(update) => info!(
                bin = %update.bin_id,
                fill_level = update.fill_level,
                status = %update.status,
                "binUpdate"
            ),
            ObserverEvent::SimulationStatus(status) => info!(
                is_running = status.is_running,
                pattern = %status.config.pattern,
                update_interval = status.config.update_interval,
                "simulationStatus"
            ),
            ObserverEvent::Alert(alert) => warn!(
                bin = %alert.bin_id,
                severity = ?alert.severity,
                "{}",
                alert.message
            ),
        }
    }
}

/// Pull-mode observer bound to one server.
pub struct Poller {
    client: ApiClient,
    observer: PollObserver,
    sink: Arc<dyn EventSink>,
}

impl Poller {
    /// Create a poller with no history.
    pub fn new(client: ApiClient, sink: Arc<dyn EventSink>) -> Self {
        Self {
            client,
            observer: PollObserver::new(),
            sink,
        }
    }

    /// Run one cycle and emit what changed. Returns the number of events.
    pub async fn poll_once(&mut self) -> Result<usize, PollerError> {
        let config = self.client.get_config().await?;
        if config.is_running {
            let outcome = self.client.trigger().await?;
            debug!(
                updated = outcome.updated,
                still_running = outcome.config.as_ref().map(|c| c.is_running),
                "{}",
                outcome.message
            );
        }

        let snapshot = PollSnapshot {
            config: self.client.get_config().await?,
            bins: self.client.get_bins().await?,
        };

        let events = self.observer.observe(snapshot, Utc::now());
        let count = events.len();
        for event in events {
            self.sink.emit(event);
        }
        Ok(count)
    }

    /// Poll every `period` until `Ctrl-C`. Failed cycles are logged and
    /// retried on the next period with the previous snapshot intact.
    pub async fn run(mut self, period: Duration) {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(count) => debug!(events = count, "Poll cycle complete"),
                        Err(e) => warn!(error = %e, "Poll cycle failed"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    return;
                }
            }
        }
    }
}
