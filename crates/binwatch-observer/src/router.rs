//! Axum router construction for the dashboard API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`] with
//! the configured CORS policy and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the dashboard server.
///
/// The router includes:
/// - `GET /ws` -- `WebSocket` event stream
/// - `GET|POST /api/bins` -- list or create bins
/// - `GET /api/bins/{id}` -- single bin
/// - `GET /api/bins/{id}/readings` -- reading history
/// - `GET|PATCH /api/simulation/config` -- simulation config
/// - `POST /api/simulation/{start,stop,reset,trigger}` -- control
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.cors.layer();

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_events))
        // Bins
        .route(
            "/api/bins",
            get(handlers::list_bins).post(handlers::create_bin),
        )
        .route("/api/bins/{id}", get(handlers::get_bin))
        .route("/api/bins/{id}/readings", get(handlers::get_bin_readings))
        // Simulation
        .route(
            "/api/simulation/config",
            get(handlers::get_config).patch(handlers::patch_config),
        )
        .route("/api/simulation/start", post(handlers::start))
        .route("/api/simulation/stop", post(handlers::stop))
        .route("/api/simulation/reset", post(handlers::reset))
        .route("/api/simulation/trigger", post(handlers::trigger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
