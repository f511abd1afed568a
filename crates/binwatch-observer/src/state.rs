//! Shared application state for the dashboard API server.
//!
//! [`AppState`] holds the broadcast channel that fans events out to
//! `WebSocket` clients, the [`Simulation`] controller that owns every
//! mutation, and a read cache that keeps REST reads answering with the
//! last good view while storage is down.

use std::sync::Arc;

use binwatch_core::{Simulation, TickMode};
use binwatch_db::BinStore;
use binwatch_types::{Bin, ObserverEvent, SimulationConfig};
use tokio::sync::{RwLock, broadcast};

use crate::cors::CorsPolicy;

/// Capacity of the broadcast channel for observer events.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Last successful reads, served when storage fails.
#[derive(Debug, Clone, Default)]
pub struct ReadCache {
    /// Bin list from the last successful `GET /api/bins`.
    pub bins: Option<Vec<Bin>>,
    /// Config from the last successful config read or write.
    pub config: Option<SimulationConfig>,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Broadcast sender for observer events.
    pub tx: broadcast::Sender<ObserverEvent>,
    /// The simulation controller; emits into `tx`.
    pub simulation: Arc<Simulation>,
    /// Stale-read fallback.
    pub cache: RwLock<ReadCache>,
    /// Cross-origin policy applied by the router.
    pub cors: CorsPolicy,
}

impl AppState {
    /// Create state over `store`, wiring the simulation to the broadcast
    /// channel.
    pub fn new(store: BinStore, mode: TickMode, cors: CorsPolicy) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let simulation = Simulation::new(store, Arc::new(tx.clone()), mode);
        Self {
            tx,
            simulation,
            cache: RwLock::new(ReadCache::default()),
            cors,
        }
    }

    /// The storage handle.
    pub fn store(&self) -> &BinStore {
        self.simulation.store()
    }

    /// Subscribe to the event broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<ObserverEvent> {
        self.tx.subscribe()
    }

    /// Record a successful bin list read.
    pub async fn remember_bins(&self, bins: &[Bin]) {
        self.cache.write().await.bins = Some(bins.to_vec());
    }

    /// Record a successful config read or write.
    pub async fn remember_config(&self, config: &SimulationConfig) {
        self.cache.write().await.config = Some(config.clone());
    }

    /// The cached bin list, if any read has succeeded.
    pub async fn cached_bins(&self) -> Option<Vec<Bin>> {
        self.cache.read().await.bins.clone()
    }

    /// The cached config, if any read has succeeded.
    pub async fn cached_config(&self) -> Option<SimulationConfig> {
        self.cache.read().await.config.clone()
    }
}
