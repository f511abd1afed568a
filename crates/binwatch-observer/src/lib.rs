//! Dashboard API server for the Binwatch fill-level dashboard.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) pushing `binUpdate`,
//!   `simulationStatus`, and `alert` events via [`tokio::sync::broadcast`]
//! - **REST endpoints** for bins, reading history, and the simulation
//!   config
//! - **Control endpoints** to start, stop, reset, and trigger the
//!   simulation
//!
//! # Architecture
//!
//! Every mutation goes through the [`Simulation`] controller held in
//! [`AppState`], which emits into the same broadcast channel the
//! `WebSocket` clients subscribe to. REST reads hit storage directly and
//! fall back to the last good view when storage fails.
//!
//! [`Simulation`]: binwatch_core::Simulation

pub mod cors;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use cors::CorsPolicy;
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::{AppState, ReadCache};
