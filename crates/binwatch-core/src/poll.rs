//! Differential polling: synthesize observer events from two snapshots.
//!
//! A pull-mode observer has no push channel. It re-fetches the config and
//! the bin list on every cycle and diffs them against what it saw last time.
//! The diff is a pure function so it can be tested without a server.
//!
//! The alert rule here uses a fixed 80% crossing ([`POLL_ALERT_MARK`]),
//! independent of any configured threshold.

use binwatch_types::{Bin, ObserverEvent, SimulationConfig};
use chrono::{DateTime, Utc};

/// Fill level whose upward crossing raises an alert in poll mode.
pub const POLL_ALERT_MARK: f64 = 80.0;

/// Everything a poll cycle fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    /// Current simulation config.
    pub config: SimulationConfig,
    /// Current bins.
    pub bins: Vec<Bin>,
}

/// Events implied by moving from `previous` to `current`.
///
/// - `simulationStatus` when `isRunning` differs, including on the very
///   first poll.
/// - `binUpdate` for each bin that is new or whose fill level or status
///   changed. Bins are only compared once a previous snapshot exists.
/// - `alert` after a `binUpdate` when an already-known bin crossed
///   [`POLL_ALERT_MARK`] upward.
pub fn diff_snapshots(
    previous: Option<&PollSnapshot>,
    current: &PollSnapshot,
    now: DateTime<Utc>,
) -> Vec<ObserverEvent> {
    let mut events = Vec::new();

    let was_running = previous.map(|p| p.config.is_running);
    if was_running != Some(current.config.is_running) {
        events.push(ObserverEvent::simulation_status(&current.config));
    }

    let Some(previous) = previous else {
        return events;
    };

    for bin in &current.bins {
        let old = previous.bins.iter().find(|b| b.id == bin.id);
        let changed = old.is_none_or(|old| {
            old.status != bin.status || (old.fill_level - bin.fill_level).abs() > f64::EPSILON
        });
        if !changed {
            continue;
        }

        events.push(ObserverEvent::bin_snapshot(bin, now));

        if let Some(old) = old
            && bin.fill_level >= POLL_ALERT_MARK
            && old.fill_level < POLL_ALERT_MARK
        {
            events.push(ObserverEvent::fill_alert(bin.id, &bin.name, bin.fill_level));
        }
    }

    events
}

/// Stateful wrapper that remembers the last snapshot between cycles.
#[derive(Debug, Default)]
pub struct PollObserver {
    last: Option<PollSnapshot>,
}

impl PollObserver {
    /// Start with no history; the first observation reports the status.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Diff `current` against the last snapshot and remember it.
    pub fn observe(&mut self, current: PollSnapshot, now: DateTime<Utc>) -> Vec<ObserverEvent> {
        let events = diff_snapshots(self.last.as_ref(), &current, now);
        self.last = Some(current);
        events
    }

    /// The most recent snapshot, if any.
    pub const fn last(&self) -> Option<&PollSnapshot> {
        self.last.as_ref()
    }
}
