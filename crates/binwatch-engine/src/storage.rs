//! Storage selection and first-start seeding.

use binwatch_core::config::{SeedBin, StorageBackend, StorageConfig};
use binwatch_db::{BinStore, DbError, MemoryStore, PostgresConfig, PostgresPool, PostgresStore};
use tracing::info;

/// Open the configured backend. The postgres backend connects eagerly and
/// runs pending migrations before returning.
pub async fn open_store(config: &StorageConfig) -> Result<BinStore, DbError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Ok(BinStore::from(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pg = PostgresConfig::new(&config.postgres_url)
                .with_max_connections(config.max_connections);
            let pool = PostgresPool::connect(&pg).await?;
            pool.run_migrations().await?;
            info!(
                max_connections = config.max_connections,
                "Using PostgreSQL storage"
            );
            Ok(BinStore::from(PostgresStore::new(pool)))
        }
    }
}

/// Create the seed bins if the store holds none. Returns how many were
/// created.
pub async fn seed_bins(store: &BinStore, seeds: &[SeedBin]) -> Result<usize, DbError> {
    if !store.get_all_bins().await?.is_empty() {
        return Ok(0);
    }

    let mut created: usize = 0;
    for seed in seeds {
        let bin = store.create_bin(seed.to_new_bin()).await?;
        info!(bin = %bin.id, name = bin.name, location = bin.location, "Seeded bin");
        created = created.saturating_add(1);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use binwatch_types::NewBin;

    use super::*;

    fn seeds() -> Vec<SeedBin> {
        vec![
            SeedBin {
                name: "Main Lobby".to_owned(),
                location: "Building A - Ground Floor".to_owned(),
                alert_threshold: None,
            },
            SeedBin {
                name: "Loading Dock".to_owned(),
                location: "Building C".to_owned(),
                alert_threshold: Some(80.0),
            },
        ]
    }

    #[tokio::test]
    async fn seeds_an_empty_store() {
        let store = BinStore::from(MemoryStore::new());
        let created = seed_bins(&store, &seeds()).await.ok();
        assert_eq!(created, Some(2));

        let bins = store.get_all_bins().await.unwrap_or_default();
        assert_eq!(bins.len(), 2);
        assert!(bins.iter().all(|b| b.is_active));
        assert!(
            bins.iter()
                .any(|b| b.name == "Loading Dock" && b.alert_threshold.is_some())
        );
    }

    #[tokio::test]
    async fn leaves_existing_bins_alone() {
        let store = BinStore::from(MemoryStore::new());
        let _ = store.create_bin(NewBin::named("Existing", "Annex")).await;

        let created = seed_bins(&store, &seeds()).await.ok();
        assert_eq!(created, Some(0));
        assert_eq!(store.get_all_bins().await.as_ref().map(Vec::len).ok(), Some(1));
    }

    #[tokio::test]
    async fn memory_backend_opens_empty() {
        let store = open_store(&StorageConfig::default()).await;
        let store = store.ok();
        assert_eq!(store.as_ref().map(BinStore::backend), Some("memory"));
    }
}
