//! Server binary for the Binwatch fill-level dashboard.
//!
//! Wires storage, the simulation scheduler, and the HTTP/`WebSocket` API
//! together, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `binwatch-config.yaml`
//! 3. Open the configured storage backend (running migrations for postgres)
//! 4. Seed bins if the store is empty
//! 5. Build the shared application state and scheduler
//! 6. Re-arm the scheduler if the stored config says it was running
//! 7. Serve the API until shutdown

mod error;
mod storage;

use std::path::Path;
use std::sync::Arc;

use binwatch_core::config::AppConfig;
use binwatch_observer::{AppState, CorsPolicy};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Configuration file looked up relative to the working directory.
const CONFIG_PATH: &str = "binwatch-config.yaml";

/// Application entry point for the Binwatch server.
///
/// # Errors
///
/// Returns an error if any initialization step or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("binwatch-engine starting");

    // 2. Load configuration.
    let config = AppConfig::load(Path::new(CONFIG_PATH))?;
    info!(
        addr = config.server.bind_addr(),
        environment = ?config.server.environment,
        backend = ?config.storage.backend,
        tick_mode = ?config.simulation.tick_mode,
        "Configuration loaded"
    );

    // 3. Open storage.
    let store = storage::open_store(&config.storage).await?;

    // 4. Seed bins.
    let seeded = storage::seed_bins(&store, &config.bins).await?;
    if seeded > 0 {
        info!(count = seeded, "Seed bins created");
    }

    // 5. Build shared state.
    let cors = CorsPolicy::from_config(&config.server);
    let state = Arc::new(AppState::new(store, config.simulation.tick_mode, cors));

    // 6. Resume the scheduler if it was running before the restart.
    let sim_config = state.simulation.restore().await?;
    info!(
        pattern = %sim_config.pattern,
        update_interval = sim_config.update_interval,
        alert_threshold = sim_config.alert_threshold,
        is_running = sim_config.is_running,
        "Simulation state restored"
    );

    // 7. Serve until Ctrl-C.
    // The persisted running flag is left as-is so the next start resumes.
    binwatch_observer::start_server(&config.server, state).await?;

    info!("binwatch-engine shutdown complete");
    Ok(())
}
