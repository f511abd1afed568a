//! Core entity structs: bins, readings, and the simulation configuration.
//!
//! Records serialize with camelCase keys (`fillLevel`, `isActive`, ...) so
//! they can be handed to the dashboard client unchanged.

use core::ops::RangeInclusive;
use core::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BinStatus, FillPattern};
use crate::ids::{BinId, ReadingId};

/// Maximum number of readings retained per bin. Older readings are evicted
/// first once a bin exceeds this count.
pub const READING_HISTORY_CAP: usize = 50;

/// Number of readings returned when the caller does not ask for a limit.
pub const DEFAULT_READINGS_LIMIT: usize = 20;

/// A bin is full at this fill level.
pub const FILL_LEVEL_MAX: f64 = 100.0;

/// Allowed range for `updateInterval`, in seconds.
pub const UPDATE_INTERVAL_RANGE: RangeInclusive<u64> = 5..=60;

/// Allowed range for alert thresholds, global or per bin.
pub const ALERT_THRESHOLD_RANGE: RangeInclusive<f64> = 70.0..=100.0;

/// Default global alert threshold.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 90.0;

/// Default seconds between ticks.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A request field failed validation. The whole request is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// `updateInterval` outside 5..=60 seconds.
    #[error("updateInterval must be between 5 and 60 seconds (got {0})")]
    UpdateInterval(u64),

    /// An alert threshold outside 70..=100.
    #[error("alertThreshold must be between 70 and 100 (got {0})")]
    AlertThreshold(f64),

    /// A fill level outside 0..=100.
    #[error("fillLevel must be between 0 and 100 (got {0})")]
    FillLevel(f64),

    /// A required text field was empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

fn check_threshold(threshold: f64) -> Result<(), ValidationError> {
    if ALERT_THRESHOLD_RANGE.contains(&threshold) {
        Ok(())
    } else {
        Err(ValidationError::AlertThreshold(threshold))
    }
}

// ---------------------------------------------------------------------------
// Bin
// ---------------------------------------------------------------------------

/// A monitored container whose fill percentage is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Bin {
    /// Immutable identity, assigned at creation.
    pub id: BinId,
    /// Display name.
    pub name: String,
    /// Display location.
    pub location: String,
    /// Fill percentage in `[0, 100]`.
    pub fill_level: f64,
    /// Cached status, always derived from `fill_level` at the last update.
    pub status: BinStatus,
    /// Per-bin threshold override. `None` means the global threshold applies.
    pub alert_threshold: Option<f64>,
    /// Whether the bin takes part in simulation ticks.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Bin {
    /// Build a new bin record from insert fields.
    pub fn from_new(new: NewBin, now: DateTime<Utc>) -> Self {
        Self {
            id: BinId::new(),
            name: new.name,
            location: new.location,
            fill_level: new.fill_level,
            status: new.status,
            alert_threshold: new.alert_threshold,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// The per-bin override if set, else `global`.
    pub fn effective_threshold(&self, global: f64) -> f64 {
        self.alert_threshold.unwrap_or(global)
    }

    /// Merge a partial update and refresh `updated_at`.
    pub fn apply(&mut self, patch: &BinPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(location) = &patch.location {
            self.location.clone_from(location);
        }
        if let Some(fill_level) = patch.fill_level {
            self.fill_level = fill_level;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(threshold) = patch.alert_threshold {
            self.alert_threshold = Some(threshold);
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }
}

/// Fields supplied when creating a bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export, export_to = "bindings/")]
pub struct NewBin {
    /// Display name.
    pub name: String,
    /// Display location.
    pub location: String,
    /// Starting fill level.
    #[serde(default)]
    pub fill_level: f64,
    /// Starting status. Callers that know the global threshold should
    /// recompute this from `fill_level`.
    #[serde(default)]
    pub status: BinStatus,
    /// Optional per-bin threshold override.
    #[serde(default)]
    pub alert_threshold: Option<f64>,
    /// Whether the bin takes part in ticks.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl NewBin {
    /// Shorthand for an empty, active bin with no threshold override.
    pub fn named(name: &str, location: &str) -> Self {
        Self {
            name: name.to_owned(),
            location: location.to_owned(),
            fill_level: 0.0,
            status: BinStatus::Normal,
            alert_threshold: None,
            is_active: true,
        }
    }

    /// Check every field against its bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::EmptyField("location"));
        }
        if !(0.0..=FILL_LEVEL_MAX).contains(&self.fill_level) {
            return Err(ValidationError::FillLevel(self.fill_level));
        }
        if let Some(threshold) = self.alert_threshold {
            check_threshold(threshold)?;
        }
        Ok(())
    }
}

/// Partial update for a bin. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinPatch {
    /// New display name.
    pub name: Option<String>,
    /// New display location.
    pub location: Option<String>,
    /// New fill level.
    pub fill_level: Option<f64>,
    /// New cached status.
    pub status: Option<BinStatus>,
    /// New per-bin threshold override.
    pub alert_threshold: Option<f64>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl BinPatch {
    /// A patch that sets only the fill level and its derived status.
    pub fn fill(fill_level: f64, status: BinStatus) -> Self {
        Self {
            fill_level: Some(fill_level),
            status: Some(status),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// An immutable historical fill-level sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BinReading {
    /// Reading identity.
    pub id: ReadingId,
    /// The bin this sample belongs to.
    pub bin_id: BinId,
    /// Fill level at sampling time.
    pub fill_level: f64,
    /// Status at sampling time.
    pub status: BinStatus,
    /// Insertion time.
    pub timestamp: DateTime<Utc>,
}

/// Fields supplied when appending a reading. The store assigns the ID and
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    /// The bin being sampled.
    pub bin_id: BinId,
    /// Fill level to record.
    pub fill_level: f64,
    /// Status to record.
    pub status: BinStatus,
}

// ---------------------------------------------------------------------------
// Simulation configuration
// ---------------------------------------------------------------------------

/// The single global simulation configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SimulationConfig {
    /// Increment-generating function.
    pub pattern: FillPattern,
    /// Seconds between ticks, in `[5, 60]`.
    pub update_interval: u64,
    /// Global default threshold percentage, in `[70, 100]`.
    pub alert_threshold: f64,
    /// Whether the scheduler is active.
    pub is_running: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pattern: FillPattern::Random,
            update_interval: DEFAULT_UPDATE_INTERVAL_SECS,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            is_running: false,
        }
    }
}

impl SimulationConfig {
    /// Tick cadence as a [`Duration`].
    pub const fn update_period(&self) -> Duration {
        Duration::from_secs(self.update_interval)
    }

    /// Merge a patch into this config in place.
    ///
    /// The patch is expected to have passed [`ConfigPatch::validate`].
    pub fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(pattern) = patch.pattern {
            self.pattern = pattern;
        }
        if let Some(interval) = patch.update_interval {
            self.update_interval = interval;
        }
        if let Some(threshold) = patch.alert_threshold {
            self.alert_threshold = threshold;
        }
        if let Some(is_running) = patch.is_running {
            self.is_running = is_running;
        }
    }
}

/// Partial update for [`SimulationConfig`].
///
/// Unknown fields are rejected at deserialization; out-of-range values are
/// rejected by [`ConfigPatch::validate`]. Either way nothing is merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export, export_to = "bindings/")]
pub struct ConfigPatch {
    /// New increment pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<FillPattern>,
    /// New tick interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u64>,
    /// New global threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<f64>,
    /// New running flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
}

impl ConfigPatch {
    /// A patch that only flips the running flag.
    pub fn running(is_running: bool) -> Self {
        Self {
            is_running: Some(is_running),
            ..Self::default()
        }
    }

    /// The same patch with the running flag removed.
    #[must_use]
    pub fn without_running(&self) -> Self {
        Self {
            is_running: None,
            ..self.clone()
        }
    }

    /// Check every present field against its bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(interval) = self.update_interval
            && !UPDATE_INTERVAL_RANGE.contains(&interval)
        {
            return Err(ValidationError::UpdateInterval(interval));
        }
        if let Some(threshold) = self.alert_threshold {
            check_threshold(threshold)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_first_boot_values() {
        let config = SimulationConfig::default();
        assert_eq!(config.pattern, FillPattern::Random);
        assert_eq!(config.update_interval, 10);
        assert!(!config.is_running);
        assert_eq!(config.update_period(), Duration::from_secs(10));
    }

    #[test]
    fn config_serializes_camel_case() {
        let json = serde_json::to_value(SimulationConfig::default()).unwrap_or_default();
        assert_eq!(json["updateInterval"], 10);
        assert_eq!(json["isRunning"], false);
        assert_eq!(json["pattern"], "random");
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let parsed: Result<ConfigPatch, _> =
            serde_json::from_str(r#"{"pattern":"linear","speed":3}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn patch_bounds_are_inclusive() {
        let ok = ConfigPatch {
            update_interval: Some(5),
            alert_threshold: Some(100.0),
            ..ConfigPatch::default()
        };
        assert!(ok.validate().is_ok());

        let too_fast = ConfigPatch {
            update_interval: Some(4),
            ..ConfigPatch::default()
        };
        assert_eq!(too_fast.validate(), Err(ValidationError::UpdateInterval(4)));

        let too_low = ConfigPatch {
            alert_threshold: Some(69.5),
            ..ConfigPatch::default()
        };
        assert_eq!(
            too_low.validate(),
            Err(ValidationError::AlertThreshold(69.5))
        );
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut config = SimulationConfig::default();
        config.apply(&ConfigPatch {
            pattern: Some(FillPattern::Linear),
            ..ConfigPatch::default()
        });
        assert_eq!(config.pattern, FillPattern::Linear);
        assert_eq!(config.update_interval, 10);
        assert!(!config.is_running);
    }

    #[test]
    fn without_running_strips_flag() {
        let patch = ConfigPatch {
            update_interval: Some(30),
            is_running: Some(true),
            ..ConfigPatch::default()
        };
        let stripped = patch.without_running();
        assert_eq!(stripped.is_running, None);
        assert_eq!(stripped.update_interval, Some(30));
    }

    #[test]
    fn bin_threshold_override_wins() {
        let mut bin = Bin::from_new(NewBin::named("Lobby", "Ground"), Utc::now());
        assert!((bin.effective_threshold(90.0) - 90.0).abs() < f64::EPSILON);
        bin.alert_threshold = Some(75.0);
        assert!((bin.effective_threshold(90.0) - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bin_apply_refreshes_updated_at() {
        let created = Utc::now();
        let mut bin = Bin::from_new(NewBin::named("Lobby", "Ground"), created);
        let later = created + chrono::Duration::seconds(5);
        bin.apply(&BinPatch::fill(42.0, BinStatus::Normal), later);
        assert_eq!(bin.updated_at, later);
        assert_eq!(bin.created_at, created);
        assert!((bin.fill_level - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn new_bin_validation() {
        assert!(NewBin::named("Lobby", "Ground").validate().is_ok());
        assert_eq!(
            NewBin::named(" ", "Ground").validate(),
            Err(ValidationError::EmptyField("name"))
        );
        let mut over = NewBin::named("Lobby", "Ground");
        over.fill_level = 101.0;
        assert_eq!(over.validate(), Err(ValidationError::FillLevel(101.0)));
        let mut low = NewBin::named("Lobby", "Ground");
        low.alert_threshold = Some(50.0);
        assert_eq!(low.validate(), Err(ValidationError::AlertThreshold(50.0)));
    }

    #[test]
    fn new_bin_defaults_to_active() {
        let parsed: Result<NewBin, _> =
            serde_json::from_str(r#"{"name":"Dock","location":"Yard"}"#);
        let bin = parsed.ok();
        assert_eq!(bin.as_ref().map(|b| b.is_active), Some(true));
        assert_eq!(bin.map(|b| b.status), Some(BinStatus::Normal));
    }
}
