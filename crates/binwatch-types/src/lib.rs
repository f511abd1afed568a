//! Shared type definitions for the Binwatch fill-level dashboard.
//!
//! This crate is the single source of truth for the records and event
//! shapes used across the workspace. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the dashboard client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for bins and readings
//! - [`enums`] -- Bin status, fill pattern, and alert severity
//! - [`structs`] -- Bins, readings, simulation config, and their patches
//! - [`events`] -- The three observer event shapes

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AlertSeverity, BinStatus, FillPattern, ParseEnumError};
pub use events::{AlertEvent, BinUpdateEvent, ObserverEvent, SimulationStatusEvent};
pub use ids::{BinId, ReadingId};
pub use structs::{
    ALERT_THRESHOLD_RANGE, Bin, BinPatch, BinReading, ConfigPatch, DEFAULT_ALERT_THRESHOLD,
    DEFAULT_READINGS_LIMIT, DEFAULT_UPDATE_INTERVAL_SECS, FILL_LEVEL_MAX, NewBin, NewReading,
    READING_HISTORY_CAP, SimulationConfig, UPDATE_INTERVAL_RANGE, ValidationError,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the dashboard client.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::BinId::export_all();
        let _ = crate::ids::ReadingId::export_all();
        let _ = crate::enums::BinStatus::export_all();
        let _ = crate::enums::FillPattern::export_all();
        let _ = crate::enums::AlertSeverity::export_all();
        let _ = crate::structs::Bin::export_all();
        let _ = crate::structs::NewBin::export_all();
        let _ = crate::structs::BinReading::export_all();
        let _ = crate::structs::SimulationConfig::export_all();
        let _ = crate::structs::ConfigPatch::export_all();
        let _ = crate::events::ObserverEvent::export_all();
    }
}
