//! `PostgreSQL` storage backend.
//!
//! Same contract as [`MemoryStore`](crate::memory::MemoryStore), backed by
//! the `bins`, `bin_readings`, and `simulation_config` tables. Partial
//! updates are merged in Rust inside a transaction holding the row lock, so
//! both backends share one merge implementation.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time checked)
//! to avoid requiring a live database at build time.

use binwatch_types::{
    Bin, BinId, BinPatch, BinReading, ConfigPatch, NewBin, NewReading, READING_HISTORY_CAP,
    ReadingId, SimulationConfig,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::PostgresPool;

const BIN_COLUMNS: &str =
    "id, name, location, fill_level, status, alert_threshold, is_active, created_at, updated_at";

/// History cap as a SQL bind value.
fn history_cap() -> i64 {
    i64::try_from(READING_HISTORY_CAP).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `bins` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct BinRow {
    id: Uuid,
    name: String,
    location: String,
    fill_level: f64,
    status: String,
    alert_threshold: Option<f64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BinRow> for Bin {
    type Error = DbError;

    fn try_from(row: BinRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BinId::from(row.id),
            name: row.name,
            location: row.location,
            fill_level: row.fill_level,
            status: row.status.parse()?,
            alert_threshold: row.alert_threshold,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `bin_readings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ReadingRow {
    id: Uuid,
    bin_id: Uuid,
    fill_level: f64,
    status: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<ReadingRow> for BinReading {
    type Error = DbError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReadingId::from(row.id),
            bin_id: BinId::from(row.bin_id),
            fill_level: row.fill_level,
            status: row.status.parse()?,
            timestamp: row.recorded_at,
        })
    }
}

/// The single row of the `simulation_config` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ConfigRow {
    pattern: String,
    update_interval: i32,
    alert_threshold: f64,
    is_running: bool,
}

impl TryFrom<ConfigRow> for SimulationConfig {
    type Error = DbError;

    fn try_from(row: ConfigRow) -> Result<Self, Self::Error> {
        let update_interval = u64::try_from(row.update_interval).map_err(|e| {
            DbError::Corrupt(format!(
                "update_interval {} is not a valid interval: {e}",
                row.update_interval
            ))
        })?;
        Ok(Self {
            pattern: row.pattern.parse()?,
            update_interval,
            alert_threshold: row.alert_threshold,
            is_running: row.is_running,
        })
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Persistent store backed by a [`PostgresPool`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: PostgresPool,
}

impl PostgresStore {
    /// Wrap a connected (or lazily connecting) pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// Look up one bin.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_bin(&self, id: BinId) -> Result<Option<Bin>, DbError> {
        let row = sqlx::query_as::<_, BinRow>(&format!(
            "SELECT {BIN_COLUMNS} FROM bins WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.pool())
        .await?;
        row.map(Bin::try_from).transpose()
    }

    /// All bins in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_all_bins(&self) -> Result<Vec<Bin>, DbError> {
        let rows = sqlx::query_as::<_, BinRow>(&format!(
            "SELECT {BIN_COLUMNS} FROM bins ORDER BY created_at, id"
        ))
        .fetch_all(self.pool.pool())
        .await?;
        rows.into_iter().map(Bin::try_from).collect()
    }

    /// Insert a new bin.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn create_bin(&self, new: NewBin) -> Result<Bin, DbError> {
        let bin = Bin::from_new(new, Utc::now());
        sqlx::query(&format!(
            "INSERT INTO bins ({BIN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(bin.id.into_inner())
        .bind(&bin.name)
        .bind(&bin.location)
        .bind(bin.fill_level)
        .bind(bin.status.as_str())
        .bind(bin.alert_threshold)
        .bind(bin.is_active)
        .bind(bin.created_at)
        .bind(bin.updated_at)
        .execute(self.pool.pool())
        .await?;
        tracing::debug!(bin = %bin.id, name = bin.name, "Inserted bin");
        Ok(bin)
    }

    /// Merge a partial update into a bin under a row lock.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement fails.
    pub async fn update_bin(&self, id: BinId, patch: &BinPatch) -> Result<Option<Bin>, DbError> {
        let mut tx = self.pool.pool().begin().await?;

        let row = sqlx::query_as::<_, BinRow>(&format!(
            "SELECT {BIN_COLUMNS} FROM bins WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.into_inner())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut bin = Bin::try_from(row)?;
        bin.apply(patch, Utc::now());

        sqlx::query(
            r"UPDATE bins
              SET name = $2, location = $3, fill_level = $4, status = $5,
                  alert_threshold = $6, is_active = $7, updated_at = $8
              WHERE id = $1",
        )
        .bind(bin.id.into_inner())
        .bind(&bin.name)
        .bind(&bin.location)
        .bind(bin.fill_level)
        .bind(bin.status.as_str())
        .bind(bin.alert_threshold)
        .bind(bin.is_active)
        .bind(bin.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(bin))
    }

    /// Append a reading and prune the bin's history to the newest
    /// [`READING_HISTORY_CAP`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement fails.
    pub async fn add_reading(&self, new: &NewReading) -> Result<Option<BinReading>, DbError> {
        let mut tx = self.pool.pool().begin().await?;

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM bins WHERE id = $1")
            .bind(new.bin_id.into_inner())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let reading = BinReading {
            id: ReadingId::new(),
            bin_id: new.bin_id,
            fill_level: new.fill_level,
            status: new.status,
            timestamp: Utc::now(),
        };

        sqlx::query(
            r"INSERT INTO bin_readings (id, bin_id, fill_level, status, recorded_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(reading.id.into_inner())
        .bind(reading.bin_id.into_inner())
        .bind(reading.fill_level)
        .bind(reading.status.as_str())
        .bind(reading.timestamp)
        .execute(&mut *tx)
        .await?;

        let pruned = sqlx::query(
            r"DELETE FROM bin_readings
              WHERE bin_id = $1
                AND id NOT IN (
                    SELECT id FROM bin_readings
                    WHERE bin_id = $1
                    ORDER BY recorded_at DESC, id DESC
                    LIMIT $2
                )",
        )
        .bind(new.bin_id.into_inner())
        .bind(history_cap())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if pruned > 0 {
            tracing::trace!(bin = %new.bin_id, pruned, "Evicted oldest readings");
        }
        Ok(Some(reading))
    }

    /// The latest `limit` readings for a bin, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_bin_readings(
        &self,
        bin_id: BinId,
        limit: usize,
    ) -> Result<Vec<BinReading>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, ReadingRow>(
            r"SELECT id, bin_id, fill_level, status, recorded_at FROM (
                  SELECT id, bin_id, fill_level, status, recorded_at
                  FROM bin_readings
                  WHERE bin_id = $1
                  ORDER BY recorded_at DESC, id DESC
                  LIMIT $2
              ) latest
              ORDER BY recorded_at ASC, id ASC",
        )
        .bind(bin_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await?;
        rows.into_iter().map(BinReading::try_from).collect()
    }

    /// The stored simulation config.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if the row holds an unknown pattern.
    pub async fn get_simulation_config(&self) -> Result<SimulationConfig, DbError> {
        let row = sqlx::query_as::<_, ConfigRow>(
            "SELECT pattern, update_interval, alert_threshold, is_running FROM simulation_config WHERE id = 1",
        )
        .fetch_one(self.pool.pool())
        .await?;
        SimulationConfig::try_from(row)
    }

    /// Merge a patch into the stored config under a row lock.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement fails.
    pub async fn update_simulation_config(
        &self,
        patch: &ConfigPatch,
    ) -> Result<SimulationConfig, DbError> {
        let mut tx = self.pool.pool().begin().await?;

        let row = sqlx::query_as::<_, ConfigRow>(
            "SELECT pattern, update_interval, alert_threshold, is_running FROM simulation_config WHERE id = 1 FOR UPDATE",
        )
        .fetch_one(&mut *tx)
        .await?;
        let mut config = SimulationConfig::try_from(row)?;
        config.apply(patch);

        let update_interval = i32::try_from(config.update_interval).map_err(|e| {
            DbError::Corrupt(format!(
                "update_interval {} does not fit the column: {e}",
                config.update_interval
            ))
        })?;

        sqlx::query(
            r"UPDATE simulation_config
              SET pattern = $1, update_interval = $2, alert_threshold = $3, is_running = $4
              WHERE id = 1",
        )
        .bind(config.pattern.as_str())
        .bind(update_interval)
        .bind(config.alert_threshold)
        .bind(config.is_running)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(config)
    }
}
