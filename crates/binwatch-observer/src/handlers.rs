//! REST API endpoint handlers for the dashboard server.
//!
//! Reads go straight to storage and refresh the [`ReadCache`]; if storage
//! fails and a cached view exists it is served instead. All mutations go
//! through the [`Simulation`] controller so they serialize with ticks.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/bins` | List all bins |
//! | `POST` | `/api/bins` | Create a bin |
//! | `GET` | `/api/bins/{id}` | Get a single bin |
//! | `GET` | `/api/bins/{id}/readings` | Latest readings, oldest first |
//! | `GET` | `/api/simulation/config` | Current simulation config |
//! | `PATCH` | `/api/simulation/config` | Merge a config patch |
//! | `POST` | `/api/simulation/start` | Start the scheduler |
//! | `POST` | `/api/simulation/stop` | Stop the scheduler |
//! | `POST` | `/api/simulation/reset` | Stop and empty every bin |
//! | `POST` | `/api/simulation/trigger` | Run one tick if running |
//!
//! [`ReadCache`]: crate::state::ReadCache
//! [`Simulation`]: binwatch_core::Simulation

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use binwatch_core::TickOutcome;
use binwatch_core::engine::classify_status;
use binwatch_types::{BinId, ConfigPatch, DEFAULT_READINGS_LIMIT, NewBin};
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/bins/{id}/readings`.
#[derive(Debug, serde::Deserialize)]
pub struct ReadingsQuery {
    /// Maximum number of readings to return (default 20, capped at 50).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Bins
// ---------------------------------------------------------------------------

/// List every bin.
pub async fn list_bins(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    match state.store().get_all_bins().await {
        Ok(bins) => {
            state.remember_bins(&bins).await;
            Ok(Json(bins))
        }
        Err(e) => {
            let fail = ApiError::storage("Failed to fetch bins")(e);
            let cached = state.cached_bins().await.ok_or(fail)?;
            warn!(bins = cached.len(), "Serving cached bin list");
            Ok(Json(cached))
        }
    }
}

/// Return one bin.
pub async fn get_bin(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_bin_id(&id_str)?;

    let bin = match state.store().get_bin(id).await {
        Ok(bin) => bin,
        Err(e) => {
            let fail = ApiError::storage("Failed to fetch bin")(e);
            let cached = state.cached_bins().await.ok_or(fail)?;
            warn!(bin = %id, "Serving cached bin");
            cached.into_iter().find(|b| b.id == id)
        }
    };

    bin.map(Json)
        .ok_or_else(|| ApiError::NotFound("Bin not found".to_owned()))
}

/// Create a bin. Its status is derived from the starting fill level and
/// the threshold in effect.
pub async fn create_bin(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewBin>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut new) = body.map_err(|e| ApiError::BadRequest(format!("Invalid bin data: {e}")))?;
    new.validate()
        .map_err(|e| ApiError::BadRequest(format!("Invalid bin data: {e}")))?;

    let config = state
        .store()
        .get_simulation_config()
        .await
        .map_err(ApiError::storage("Failed to create bin"))?;
    let threshold = new.alert_threshold.unwrap_or(config.alert_threshold);
    new.status = classify_status(new.fill_level, threshold);

    let bin = state
        .store()
        .create_bin(new)
        .await
        .map_err(ApiError::storage("Failed to create bin"))?;
    info!(bin = %bin.id, name = bin.name, "Bin created");

    Ok((StatusCode::CREATED, Json(bin)))
}

/// Latest readings for a bin, oldest first. Unknown bins yield an empty
/// list.
pub async fn get_bin_readings(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    query: Result<Query<ReadingsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_bin_id(&id_str)?;
    let Query(query) = query.map_err(|e| ApiError::BadRequest(format!("Invalid query: {e}")))?;
    let limit = query.limit.unwrap_or(DEFAULT_READINGS_LIMIT);

    let readings = state
        .store()
        .get_bin_readings(id, limit)
        .await
        .map_err(ApiError::storage("Failed to fetch readings"))?;
    Ok(Json(readings))
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

/// Return the simulation config.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    match state.store().get_simulation_config().await {
        Ok(config) => {
            state.remember_config(&config).await;
            Ok(Json(config))
        }
        Err(e) => {
            let fail = ApiError::storage("Failed to fetch simulation config")(e);
            let cached = state.cached_config().await.ok_or(fail)?;
            warn!("Serving cached simulation config");
            Ok(Json(cached))
        }
    }
}

/// Validate and merge a config patch. Unknown or out-of-range fields
/// reject the whole patch.
pub async fn patch_config(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConfigPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid configuration: {e}")))?;

    let config = state
        .simulation
        .reconfigure(&patch)
        .await
        .map_err(ApiError::simulation("Failed to update simulation config"))?;
    state.remember_config(&config).await;
    Ok(Json(config))
}

// ---------------------------------------------------------------------------
// Simulation control
// ---------------------------------------------------------------------------

/// Start the simulation.
pub async fn start(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let config = state
        .simulation
        .start()
        .await
        .map_err(ApiError::simulation("Failed to start simulation"))?;
    state.remember_config(&config).await;
    Ok(Json(json!({ "message": "Simulation started", "config": config })))
}

/// Stop the simulation.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let config = state
        .simulation
        .stop()
        .await
        .map_err(ApiError::simulation("Failed to stop simulation"))?;
    state.remember_config(&config).await;
    Ok(Json(json!({ "message": "Simulation stopped", "config": config })))
}

/// Stop the simulation and empty every bin.
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let config = state
        .simulation
        .reset()
        .await
        .map_err(ApiError::simulation("Failed to reset simulation"))?;
    state.remember_config(&config).await;
    Ok(Json(json!({ "message": "Simulation reset", "config": config })))
}

/// Run exactly one tick if the simulation is running.
pub async fn trigger(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .simulation
        .trigger()
        .await
        .map_err(ApiError::simulation("Failed to trigger simulation update"))?;

    if report.outcome == TickOutcome::Idle {
        return Ok(Json(json!({
            "message": "Simulation is not running",
            "updated": false,
        })));
    }

    state.remember_config(&report.config).await;
    Ok(Json(json!({
        "message": "Simulation updated",
        "updated": report.outcome.updated_any(),
        "config": report.config,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a bin ID from a path segment, returning an [`ApiError`] on failure.
fn parse_bin_id(s: &str) -> Result<BinId, ApiError> {
    s.parse::<BinId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid bin id {s:?}: {e}")))
}
