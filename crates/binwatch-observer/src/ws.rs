//! `WebSocket` handler for real-time event streaming.
//!
//! Clients connect to `GET /ws`. On connect they receive the current
//! `simulationStatus` and a `binUpdate` for every bin, then every event the
//! simulation emits. The handler uses a [`broadcast::Receiver`] so all
//! connected clients see the same stream.
//!
//! If a client falls behind, lagged messages are silently skipped and the
//! client resumes from the most recent event. Delivery is best-effort: a
//! disconnected client simply misses events.
//!
//! [`broadcast::Receiver`]: tokio::sync::broadcast::Receiver

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use binwatch_db::DbError;
use binwatch_types::ObserverEvent;
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming events.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Full-state bootstrap for a newly connected client: the simulation
/// status followed by one `binUpdate` per bin.
///
/// # Errors
///
/// Returns [`DbError`] if storage cannot be read.
pub async fn bootstrap(state: &AppState) -> Result<Vec<ObserverEvent>, DbError> {
    let config = state.store().get_simulation_config().await?;
    let bins = state.store().get_all_bins().await?;
    let now = Utc::now();

    let mut events = Vec::with_capacity(bins.len().saturating_add(1));
    events.push(ObserverEvent::simulation_status(&config));
    events.extend(bins.iter().map(|bin| ObserverEvent::bin_snapshot(bin, now)));
    Ok(events)
}

/// Serialize and send one event. Returns `false` once the client is gone.
async fn send_event(socket: &mut WebSocket, event: &ObserverEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize observer event: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handle the `WebSocket` lifecycle: subscribe, send the bootstrap, then
/// forward each broadcast event as a text frame.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the bootstrap so nothing emitted in
    // between is lost.
    let mut rx = state.subscribe();

    match bootstrap(&state).await {
        Ok(events) => {
            for event in &events {
                if !send_event(&mut socket, event).await {
                    debug!("WebSocket client disconnected during bootstrap");
                    return;
                }
            }
        }
        Err(e) => warn!(error = %e, "Skipping WebSocket bootstrap"),
    }

    loop {
        tokio::select! {
            // Receive an event from the simulation.
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients have nothing to say; ignore text and binary.
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use binwatch_core::TickMode;
    use binwatch_db::{BinStore, MemoryStore};
    use binwatch_types::NewBin;

    use super::*;
    use crate::cors::CorsPolicy;

    #[tokio::test]
    async fn bootstrap_sends_status_then_every_bin() {
        let store = BinStore::from(MemoryStore::new());
        for name in ["A", "B"] {
            let _ = store.create_bin(NewBin::named(name, "Hall")).await;
        }
        let state = AppState::new(store, TickMode::External, CorsPolicy::default());

        let events = bootstrap(&state).await.unwrap_or_default();
        let kinds: Vec<&str> = events.iter().map(ObserverEvent::kind).collect();
        assert_eq!(kinds, vec!["simulationStatus", "binUpdate", "binUpdate"]);
    }
}
