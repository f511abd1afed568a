//! In-memory storage backend.
//!
//! Holds bins, per-bin reading history, and the simulation config behind a
//! single [`RwLock`]. Used for development and tests, and whenever no
//! database URL is configured. State is lost on restart.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use binwatch_types::{
    Bin, BinId, BinPatch, BinReading, ConfigPatch, NewBin, NewReading, READING_HISTORY_CAP,
    ReadingId, SimulationConfig,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::DbError;

#[derive(Debug, Default)]
struct MemoryState {
    bins: BTreeMap<BinId, Bin>,
    readings: BTreeMap<BinId, VecDeque<BinReading>>,
    config: SimulationConfig,
}

/// Process-local store. Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store with the default simulation config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store starting from the given config.
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryState {
                config,
                ..MemoryState::default()
            })),
        }
    }

    /// Look up one bin.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn get_bin(&self, id: BinId) -> Result<Option<Bin>, DbError> {
        Ok(self.inner.read().await.bins.get(&id).cloned())
    }

    /// All bins in ID order.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn get_all_bins(&self) -> Result<Vec<Bin>, DbError> {
        Ok(self.inner.read().await.bins.values().cloned().collect())
    }

    /// Insert a new bin with an empty reading history.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn create_bin(&self, new: NewBin) -> Result<Bin, DbError> {
        let bin = Bin::from_new(new, Utc::now());
        let mut state = self.inner.write().await;
        state.readings.insert(bin.id, VecDeque::new());
        state.bins.insert(bin.id, bin.clone());
        Ok(bin)
    }

    /// Merge a partial update into a bin.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn update_bin(&self, id: BinId, patch: &BinPatch) -> Result<Option<Bin>, DbError> {
        let mut state = self.inner.write().await;
        Ok(state.bins.get_mut(&id).map(|bin| {
            bin.apply(patch, Utc::now());
            bin.clone()
        }))
    }

    /// Append a reading, evicting the oldest once the history is full.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn add_reading(&self, new: &NewReading) -> Result<Option<BinReading>, DbError> {
        let mut state = self.inner.write().await;
        if !state.bins.contains_key(&new.bin_id) {
            return Ok(None);
        }
        let reading = BinReading {
            id: ReadingId::new(),
            bin_id: new.bin_id,
            fill_level: new.fill_level,
            status: new.status,
            timestamp: Utc::now(),
        };
        let history = state.readings.entry(new.bin_id).or_default();
        history.push_back(reading.clone());
        while history.len() > READING_HISTORY_CAP {
            history.pop_front();
        }
        Ok(Some(reading))
    }

    /// The latest `limit` readings for a bin, oldest first.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn get_bin_readings(
        &self,
        bin_id: BinId,
        limit: usize,
    ) -> Result<Vec<BinReading>, DbError> {
        let state = self.inner.read().await;
        Ok(state.readings.get(&bin_id).map_or_else(Vec::new, |history| {
            let skip = history.len().saturating_sub(limit);
            history.iter().skip(skip).cloned().collect()
        }))
    }

    /// A copy of the simulation config.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn get_simulation_config(&self) -> Result<SimulationConfig, DbError> {
        Ok(self.inner.read().await.config.clone())
    }

    /// Merge a patch into the simulation config and return the result.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other backends.
    pub async fn update_simulation_config(
        &self,
        patch: &ConfigPatch,
    ) -> Result<SimulationConfig, DbError> {
        let mut state = self.inner.write().await;
        state.config.apply(patch);
        Ok(state.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use binwatch_types::{BinStatus, FillPattern};

    use super::*;

    fn reading(bin_id: BinId, fill_level: f64) -> NewReading {
        NewReading {
            bin_id,
            fill_level,
            status: BinStatus::Normal,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_bin() {
        let store = MemoryStore::new();
        let bin = store
            .create_bin(NewBin::named("Lobby", "Ground"))
            .await
            .ok();
        let id = bin.as_ref().map(|b| b.id);
        assert!(id.is_some());

        let fetched = store.get_bin(id.unwrap_or_default()).await.ok().flatten();
        assert_eq!(fetched, bin);
    }

    #[tokio::test]
    async fn unknown_bin_is_absent_not_an_error() {
        let store = MemoryStore::new();
        let missing = BinId::new();
        assert!(matches!(store.get_bin(missing).await, Ok(None)));
        assert!(matches!(
            store.update_bin(missing, &BinPatch::default()).await,
            Ok(None)
        ));
        assert!(matches!(
            store.add_reading(&reading(missing, 5.0)).await,
            Ok(None)
        ));
        assert!(matches!(
            store.get_bin_readings(missing, 20).await,
            Ok(v) if v.is_empty()
        ));
    }

    #[tokio::test]
    async fn history_keeps_the_newest_fifty() {
        let store = MemoryStore::new();
        let bin = store.create_bin(NewBin::named("Lobby", "Ground")).await;
        let id = bin.map(|b| b.id).unwrap_or_default();

        for i in 0..51_u32 {
            let _ = store.add_reading(&reading(id, f64::from(i))).await;
        }

        let all = store.get_bin_readings(id, 100).await.unwrap_or_default();
        assert_eq!(all.len(), READING_HISTORY_CAP);
        let levels: Vec<f64> = all.iter().map(|r| r.fill_level).collect();
        assert!(!levels.contains(&0.0));
        assert_eq!(levels.first().copied(), Some(1.0));
        assert_eq!(levels.last().copied(), Some(50.0));
    }

    #[tokio::test]
    async fn readings_limit_returns_latest_oldest_first() {
        let store = MemoryStore::new();
        let id = store
            .create_bin(NewBin::named("Lobby", "Ground"))
            .await
            .map(|b| b.id)
            .unwrap_or_default();
        for level in [10.0, 20.0, 30.0, 40.0] {
            let _ = store.add_reading(&reading(id, level)).await;
        }

        let latest = store.get_bin_readings(id, 2).await.unwrap_or_default();
        let levels: Vec<f64> = latest.iter().map(|r| r.fill_level).collect();
        assert_eq!(levels, vec![30.0, 40.0]);
    }

    #[tokio::test]
    async fn update_bin_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .create_bin(NewBin::named("Lobby", "Ground"))
            .await
            .map(|b| b.id)
            .unwrap_or_default();

        let updated = store
            .update_bin(id, &BinPatch::fill(55.0, BinStatus::Normal))
            .await
            .ok()
            .flatten();
        assert_eq!(updated.as_ref().map(|b| b.name.as_str()), Some("Lobby"));
        assert_eq!(updated.map(|b| b.fill_level), Some(55.0));
    }

    #[tokio::test]
    async fn config_patch_merges_in_place() {
        let store = MemoryStore::new();
        let merged = store
            .update_simulation_config(&ConfigPatch {
                pattern: Some(FillPattern::Realistic),
                ..ConfigPatch::default()
            })
            .await
            .unwrap_or_default();
        assert_eq!(merged.pattern, FillPattern::Realistic);
        assert_eq!(merged.update_interval, 10);

        let again = store.get_simulation_config().await.unwrap_or_default();
        assert_eq!(again, merged);
    }
}
