//! Event shapes delivered to dashboard observers.
//!
//! Every event is a JSON object `{ "type": ..., "data": { ... } }`. Push
//! (`WebSocket`) and poll delivery produce exactly the same three shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AlertSeverity, BinStatus};
use crate::ids::BinId;
use crate::structs::{Bin, SimulationConfig, FILL_LEVEL_MAX};

/// A state change pushed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ObserverEvent {
    /// A bin's fill level or status changed.
    BinUpdate(BinUpdateEvent),
    /// The simulation started, stopped, or was reconfigured.
    SimulationStatus(SimulationStatusEvent),
    /// A bin crossed its alert mark.
    Alert(AlertEvent),
}

/// Payload of a `binUpdate` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BinUpdateEvent {
    /// The bin that changed.
    pub bin_id: BinId,
    /// Its new fill level.
    pub fill_level: f64,
    /// Its new status.
    pub status: BinStatus,
    /// When the change was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Payload of a `simulationStatus` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SimulationStatusEvent {
    /// Mirrors `config.isRunning`.
    pub is_running: bool,
    /// The full configuration after the change.
    pub config: SimulationConfig,
}

/// Payload of an `alert` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AlertEvent {
    /// The bin that crossed the mark.
    pub bin_id: BinId,
    /// Human-readable notice.
    pub message: String,
    /// `alert` once the bin is full, `warning` before that.
    pub severity: AlertSeverity,
}

impl ObserverEvent {
    /// A `binUpdate` for the given values.
    pub const fn bin_update(
        bin_id: BinId,
        fill_level: f64,
        status: BinStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::BinUpdate(BinUpdateEvent {
            bin_id,
            fill_level,
            status,
            timestamp,
        })
    }

    /// A `binUpdate` carrying the bin's current stored state.
    pub const fn bin_snapshot(bin: &Bin, timestamp: DateTime<Utc>) -> Self {
        Self::bin_update(bin.id, bin.fill_level, bin.status, timestamp)
    }

    /// A `simulationStatus` for the given configuration.
    pub fn simulation_status(config: &SimulationConfig) -> Self {
        Self::SimulationStatus(SimulationStatusEvent {
            is_running: config.is_running,
            config: config.clone(),
        })
    }

    /// An `alert` for a bin that now sits at `fill_level`.
    ///
    /// Severity is `alert` when the bin is full, `warning` otherwise.
    pub fn fill_alert(bin_id: BinId, bin_name: &str, fill_level: f64) -> Self {
        let severity = if fill_level >= FILL_LEVEL_MAX {
            AlertSeverity::Alert
        } else {
            AlertSeverity::Warning
        };
        Self::Alert(AlertEvent {
            bin_id,
            message: format!(
                "Dustbin {bin_name} is {}% full and requires attention!",
                fill_level.round()
            ),
            severity,
        })
    }

    /// The wire tag of this event.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BinUpdate(_) => "binUpdate",
            Self::SimulationStatus(_) => "simulationStatus",
            Self::Alert(_) => "alert",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_type_and_data_envelope() {
        let id = BinId::new();
        let event = ObserverEvent::bin_update(id, 42.5, BinStatus::Normal, Utc::now());
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["type"], "binUpdate");
        assert_eq!(json["data"]["binId"], id.to_string());
        assert_eq!(json["data"]["fillLevel"], 42.5);
        assert_eq!(json["data"]["status"], "normal");
    }

    #[test]
    fn status_event_mirrors_running_flag() {
        let config = SimulationConfig {
            is_running: true,
            ..SimulationConfig::default()
        };
        let json = serde_json::to_value(ObserverEvent::simulation_status(&config))
            .unwrap_or_default();
        assert_eq!(json["type"], "simulationStatus");
        assert_eq!(json["data"]["isRunning"], true);
        assert_eq!(json["data"]["config"]["alertThreshold"], 90.0);
    }

    fn alert_payload(event: ObserverEvent) -> Option<AlertEvent> {
        match event {
            ObserverEvent::Alert(alert) => Some(alert),
            _ => None,
        }
    }

    #[test]
    fn fill_alert_severity_depends_on_capacity() {
        let id = BinId::new();
        let partial = alert_payload(ObserverEvent::fill_alert(id, "Lobby", 90.0));
        assert_eq!(
            partial.as_ref().map(|a| a.severity),
            Some(AlertSeverity::Warning)
        );
        assert_eq!(
            partial.map(|a| a.message).as_deref(),
            Some("Dustbin Lobby is 90% full and requires attention!")
        );

        let full = alert_payload(ObserverEvent::fill_alert(id, "Lobby", 100.0));
        assert_eq!(full.map(|a| a.severity), Some(AlertSeverity::Alert));
    }

    #[test]
    fn alert_message_rounds_fill_level() {
        let event = ObserverEvent::fill_alert(BinId::new(), "Dock", 81.6);
        assert_eq!(event.kind(), "alert");
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            json["data"]["message"],
            "Dustbin Dock is 82% full and requires attention!"
        );
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = ObserverEvent::fill_alert(BinId::new(), "Dock", 85.0);
        let json = serde_json::to_string(&event).unwrap_or_default();
        let parsed: Option<ObserverEvent> = serde_json::from_str(&json).ok();
        assert_eq!(parsed, Some(event));
    }
}
