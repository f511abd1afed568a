//! Simulation engine and scheduler for the Binwatch dashboard.
//!
//! Each tick advances every active bin by one pattern-drawn increment,
//! persists the new level and a reading, and emits change events. The
//! scheduler decides when ticks happen: a server-owned interval timer, or an
//! external caller in pull mode.
//!
//! # Modules
//!
//! - [`engine`] -- Pure increment, status, and threshold arithmetic.
//! - [`scheduler`] -- [`Simulation`], the tick driver and control state
//!   machine (start, stop, reset, reconfigure, trigger).
//! - [`sink`] -- [`EventSink`], where the scheduler delivers events.
//! - [`poll`] -- Snapshot diffing for pull-mode observers.
//! - [`config`] -- Configuration loading from `binwatch-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`SimulationError`].
//!
//! [`Simulation`]: scheduler::Simulation
//! [`EventSink`]: sink::EventSink
//! [`SimulationError`]: error::SimulationError

pub mod config;
pub mod engine;
pub mod error;
pub mod poll;
pub mod scheduler;
pub mod sink;

pub use error::SimulationError;
pub use scheduler::{Simulation, TickMode, TickOutcome, TickReport};
pub use sink::{EventSink, NullSink};
