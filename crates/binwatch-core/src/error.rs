//! Errors surfaced by simulation control operations.

use binwatch_db::DbError;
use binwatch_types::ValidationError;

/// A control operation or tick failed.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The config patch was rejected; nothing was merged.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// The storage backend failed; the operation was abandoned.
    #[error("storage failure: {0}")]
    Storage(#[from] DbError),
}
