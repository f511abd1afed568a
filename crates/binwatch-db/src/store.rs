//! Backend-agnostic storage handle.
//!
//! Uses enum dispatch rather than a trait object because async methods are
//! not dyn-compatible. Callers hold a [`BinStore`] and never care which
//! backend is behind it.

use binwatch_types::{
    Bin, BinId, BinPatch, BinReading, ConfigPatch, NewBin, NewReading, READING_HISTORY_CAP,
    SimulationConfig,
};

use crate::error::DbError;
use crate::memory::MemoryStore;
use crate::postgres_store::PostgresStore;

/// Storage for bins, readings, and the simulation config.
///
/// Missing bins surface as `None` or an empty list, never as an error.
/// Errors mean the backend itself failed.
#[derive(Clone)]
pub enum BinStore {
    /// Process-local state.
    Memory(MemoryStore),
    /// `PostgreSQL` tables.
    Postgres(PostgresStore),
}

impl BinStore {
    /// Short backend name for logs.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Look up one bin.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn get_bin(&self, id: BinId) -> Result<Option<Bin>, DbError> {
        match self {
            Self::Memory(s) => s.get_bin(id).await,
            Self::Postgres(s) => s.get_bin(id).await,
        }
    }

    /// All bins in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn get_all_bins(&self) -> Result<Vec<Bin>, DbError> {
        match self {
            Self::Memory(s) => s.get_all_bins().await,
            Self::Postgres(s) => s.get_all_bins().await,
        }
    }

    /// Insert a new bin.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn create_bin(&self, new: NewBin) -> Result<Bin, DbError> {
        match self {
            Self::Memory(s) => s.create_bin(new).await,
            Self::Postgres(s) => s.create_bin(new).await,
        }
    }

    /// Merge a partial update into a bin. `None` if the bin does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn update_bin(&self, id: BinId, patch: &BinPatch) -> Result<Option<Bin>, DbError> {
        match self {
            Self::Memory(s) => s.update_bin(id, patch).await,
            Self::Postgres(s) => s.update_bin(id, patch).await,
        }
    }

    /// Append a reading. `None` if the bin does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn add_reading(&self, new: &NewReading) -> Result<Option<BinReading>, DbError> {
        match self {
            Self::Memory(s) => s.add_reading(new).await,
            Self::Postgres(s) => s.add_reading(new).await,
        }
    }

    /// The latest `limit` readings for a bin, oldest first.
    ///
    /// `limit` is clamped to the history cap; zero yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn get_bin_readings(
        &self,
        bin_id: BinId,
        limit: usize,
    ) -> Result<Vec<BinReading>, DbError> {
        let limit = limit.min(READING_HISTORY_CAP);
        if limit == 0 {
            return Ok(Vec::new());
        }
        match self {
            Self::Memory(s) => s.get_bin_readings(bin_id, limit).await,
            Self::Postgres(s) => s.get_bin_readings(bin_id, limit).await,
        }
    }

    /// The current simulation config.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn get_simulation_config(&self) -> Result<SimulationConfig, DbError> {
        match self {
            Self::Memory(s) => s.get_simulation_config().await,
            Self::Postgres(s) => s.get_simulation_config().await,
        }
    }

    /// Merge a patch into the simulation config and return the result.
    ///
    /// The patch is assumed to be validated already.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn update_simulation_config(
        &self,
        patch: &ConfigPatch,
    ) -> Result<SimulationConfig, DbError> {
        match self {
            Self::Memory(s) => s.update_simulation_config(patch).await,
            Self::Postgres(s) => s.update_simulation_config(patch).await,
        }
    }
}

impl From<MemoryStore> for BinStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<PostgresStore> for BinStore {
    fn from(store: PostgresStore) -> Self {
        Self::Postgres(store)
    }
}

#[cfg(test)]
mod tests {
    use binwatch_types::BinStatus;

    use super::*;

    #[tokio::test]
    async fn readings_limit_is_clamped_and_zero_is_empty() {
        let store = BinStore::from(MemoryStore::new());
        let id = store
            .create_bin(NewBin::named("Dock", "Loading Bay"))
            .await
            .map(|b| b.id)
            .unwrap_or_default();
        for i in 0..60_u32 {
            let _ = store
                .add_reading(&NewReading {
                    bin_id: id,
                    fill_level: f64::from(i),
                    status: BinStatus::Normal,
                })
                .await;
        }

        let none = store.get_bin_readings(id, 0).await.unwrap_or_default();
        assert!(none.is_empty());

        let capped = store.get_bin_readings(id, 500).await.unwrap_or_default();
        assert_eq!(capped.len(), READING_HISTORY_CAP);
        assert_eq!(capped.last().map(|r| r.fill_level), Some(59.0));
    }

    #[test]
    fn backend_names() {
        assert_eq!(BinStore::from(MemoryStore::new()).backend(), "memory");
    }
}
