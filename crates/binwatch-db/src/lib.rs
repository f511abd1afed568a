//! Storage layer for the Binwatch dashboard.
//!
//! Two interchangeable backends sit behind [`BinStore`]:
//!
//! ```text
//! BinStore
//!     |
//!     +-- Memory   --> MemoryStore   (process-local, default)
//!     |
//!     +-- Postgres --> PostgresStore (bins, bin_readings, simulation_config)
//! ```
//!
//! Both keep at most [`READING_HISTORY_CAP`](binwatch_types::READING_HISTORY_CAP)
//! readings per bin and merge partial updates with the same rules.
//!
//! # Modules
//!
//! - [`store`] -- Backend-agnostic dispatch
//! - [`memory`] -- In-memory backend
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`postgres_store`] -- `PostgreSQL` queries
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod postgres;
pub mod postgres_store;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use postgres_store::PostgresStore;
pub use store::BinStore;
