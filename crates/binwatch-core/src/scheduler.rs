//! The simulation controller: tick orchestration plus the scheduler state
//! machine.
//!
//! [`Simulation`] owns the only mutation path for bins and config during a
//! run. Ticks and control operations all take the same async mutex, so a
//! control request arriving mid-tick waits for the tick to finish and no two
//! ticks ever overlap.
//!
//! # Timer
//!
//! In [`TickMode::Interval`] at most one timer task is live. Every arm
//! cancels the previous handle and bumps a generation counter; a timer whose
//! generation is stale when it acquires the lock skips its tick and exits on
//! the next poll. In [`TickMode::External`] no timer is ever spawned and
//! ticks come only from [`Simulation::trigger`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use binwatch_db::BinStore;
use binwatch_types::{BinPatch, BinStatus, ConfigPatch, NewReading, ObserverEvent, SimulationConfig};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tokio::sync::{Mutex, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::engine;
use crate::error::SimulationError;
use crate::sink::EventSink;

/// Who drives ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickMode {
    /// The server owns a periodic timer while running.
    #[default]
    Interval,
    /// An outside caller invokes [`Simulation::trigger`] repeatedly.
    External,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The simulation was not running; nothing changed.
    Idle,
    /// Every active bin was advanced.
    Advanced {
        /// Bins written this tick.
        updated: usize,
    },
    /// A bin reached capacity; the simulation stopped and the remaining
    /// bins were skipped.
    Halted {
        /// Bins written this tick, including the full one.
        updated: usize,
    },
}

impl TickOutcome {
    /// Whether any bin changed.
    pub const fn updated_any(self) -> bool {
        match self {
            Self::Idle => false,
            Self::Advanced { updated } | Self::Halted { updated } => updated > 0,
        }
    }
}

/// A tick outcome with the config in effect afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// What happened.
    pub outcome: TickOutcome,
    /// Config after the tick. `is_running` is false after a halt.
    pub config: SimulationConfig,
}

/// Cancels its timer task when dropped or cancelled.
struct TimerHandle {
    cancel: oneshot::Sender<()>,
}

impl TimerHandle {
    fn cancel(self) {
        // The task may already have exited after a capacity halt.
        let _ = self.cancel.send(());
    }
}

/// Decrements the live-timer count when the task ends.
struct LiveTimer(Arc<AtomicUsize>);

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// State guarded by the control lock.
struct Control {
    rng: StdRng,
    timer: Option<TimerHandle>,
    generation: u64,
}

/// Simulation engine plus scheduler.
pub struct Simulation {
    store: BinStore,
    sink: Arc<dyn EventSink>,
    mode: TickMode,
    control: Mutex<Control>,
    live_timers: Arc<AtomicUsize>,
}

impl Simulation {
    /// Build a controller over `store`, emitting into `sink`.
    pub fn new(store: BinStore, sink: Arc<dyn EventSink>, mode: TickMode) -> Arc<Self> {
        Self::with_rng(store, sink, mode, StdRng::from_rng(&mut rand::rng()))
    }

    /// Same as [`Simulation::new`] with a caller-supplied RNG.
    pub fn with_rng(
        store: BinStore,
        sink: Arc<dyn EventSink>,
        mode: TickMode,
        rng: StdRng,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            sink,
            mode,
            control: Mutex::new(Control {
                rng,
                timer: None,
                generation: 0,
            }),
            live_timers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The storage handle ticks write through.
    pub const fn store(&self) -> &BinStore {
        &self.store
    }

    /// The configured tick mode.
    pub const fn mode(&self) -> TickMode {
        self.mode
    }

    /// Number of timer tasks that have not yet exited.
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Control operations
    // -----------------------------------------------------------------------

    /// Mark the simulation running and (re)arm the timer at the current
    /// interval. Starting while running resets the timer phase.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Storage`] if the config write fails.
    pub async fn start(self: &Arc<Self>) -> Result<SimulationConfig, SimulationError> {
        let mut control = self.control.lock().await;
        let config = self.start_locked(&mut control).await?;
        self.sink.emit(ObserverEvent::simulation_status(&config));
        Ok(config)
    }

    /// Cancel any live timer and mark the simulation stopped.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Storage`] if the config write fails.
    pub async fn stop(&self) -> Result<SimulationConfig, SimulationError> {
        let mut control = self.control.lock().await;
        let config = self.stop_locked(&mut control).await?;
        self.sink.emit(ObserverEvent::simulation_status(&config));
        Ok(config)
    }

    /// Stop, then empty every bin. Emits the status first, then one
    /// `binUpdate` per bin. Reading history is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Storage`] if any write fails.
    pub async fn reset(&self) -> Result<SimulationConfig, SimulationError> {
        let mut control = self.control.lock().await;
        let config = self.stop_locked(&mut control).await?;

        let bins = self.store.get_all_bins().await?;
        let mut emptied = Vec::with_capacity(bins.len());
        for bin in &bins {
            let patch = BinPatch::fill(0.0, BinStatus::Normal);
            if let Some(bin) = self.store.update_bin(bin.id, &patch).await? {
                emptied.push(bin);
            }
        }

        info!(bins = emptied.len(), "Simulation reset");
        self.sink.emit(ObserverEvent::simulation_status(&config));
        let now = Utc::now();
        for bin in &emptied {
            self.sink.emit(ObserverEvent::bin_snapshot(bin, now));
        }
        Ok(config)
    }

    /// Validate and merge a config patch.
    ///
    /// `isRunning` in the patch is routed through start/stop so the timer
    /// always agrees with the flag. If the simulation stays running and the
    /// interval changed, the timer is re-armed at the new cadence.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Validation`] without merging anything if
    /// any field is out of range, or [`SimulationError::Storage`] if a
    /// write fails.
    pub async fn reconfigure(
        self: &Arc<Self>,
        patch: &ConfigPatch,
    ) -> Result<SimulationConfig, SimulationError> {
        patch.validate()?;

        let mut control = self.control.lock().await;
        let before = self.store.get_simulation_config().await?;
        let mut config = self
            .store
            .update_simulation_config(&patch.without_running())
            .await?;

        match (patch.is_running, config.is_running) {
            (Some(true), false) => config = self.start_locked(&mut control).await?,
            (Some(false), true) => config = self.stop_locked(&mut control).await?,
            _ => {
                let interval_changed = config.update_interval != before.update_interval;
                if config.is_running && interval_changed && self.mode == TickMode::Interval {
                    self.arm(&mut control, config.update_period());
                    info!(
                        interval_secs = config.update_interval,
                        "Timer re-armed at new interval"
                    );
                }
            }
        }

        debug!(?config, "Simulation config updated");
        self.sink.emit(ObserverEvent::simulation_status(&config));
        Ok(config)
    }

    /// Run one tick now if the simulation is running.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Storage`] if the tick was abandoned.
    pub async fn trigger(&self) -> Result<TickReport, SimulationError> {
        let mut control = self.control.lock().await;
        self.tick_locked(&mut control).await
    }

    /// Re-arm the timer after a restart if the stored config says the
    /// simulation was running. Emits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Storage`] if the config cannot be read.
    pub async fn restore(self: &Arc<Self>) -> Result<SimulationConfig, SimulationError> {
        let mut control = self.control.lock().await;
        let config = self.store.get_simulation_config().await?;
        if config.is_running && self.mode == TickMode::Interval {
            self.arm(&mut control, config.update_period());
            info!(
                interval_secs = config.update_interval,
                "Resumed running simulation"
            );
        }
        Ok(config)
    }

    // -----------------------------------------------------------------------
    // Internals (control lock held)
    // -----------------------------------------------------------------------

    async fn start_locked(
        self: &Arc<Self>,
        control: &mut Control,
    ) -> Result<SimulationConfig, SimulationError> {
        let config = self
            .store
            .update_simulation_config(&ConfigPatch::running(true))
            .await?;
        self.arm(control, config.update_period());
        info!(
            pattern = %config.pattern,
            interval_secs = config.update_interval,
            mode = ?self.mode,
            "Simulation started"
        );
        Ok(config)
    }

    async fn stop_locked(&self, control: &mut Control) -> Result<SimulationConfig, SimulationError> {
        let config = self
            .store
            .update_simulation_config(&ConfigPatch::running(false))
            .await?;
        Self::disarm(control);
        info!("Simulation stopped");
        Ok(config)
    }

    /// Replace any live timer with one firing every `period`. No-op in
    /// [`TickMode::External`].
    fn arm(self: &Arc<Self>, control: &mut Control, period: Duration) {
        if self.mode != TickMode::Interval {
            return;
        }
        Self::disarm(control);
        control.generation = control.generation.wrapping_add(1);
        control.timer = Some(spawn_timer(
            Arc::downgrade(self),
            period,
            control.generation,
            Arc::clone(&self.live_timers),
        ));
    }

    fn disarm(control: &mut Control) {
        if let Some(timer) = control.timer.take() {
            timer.cancel();
        }
        control.generation = control.generation.wrapping_add(1);
    }

    async fn scheduled_tick(&self, generation: u64) {
        let mut control = self.control.lock().await;
        if control.generation != generation {
            return;
        }
        match self.tick_locked(&mut control).await {
            Ok(report) => debug!(outcome = ?report.outcome, "Scheduled tick complete"),
            Err(e) => error!(error = %e, "Tick abandoned"),
        }
    }

    /// One pass over the active bins. Any storage error abandons the rest
    /// of the tick.
    async fn tick_locked(&self, control: &mut Control) -> Result<TickReport, SimulationError> {
        let config = self.store.get_simulation_config().await?;
        if !config.is_running {
            return Ok(TickReport {
                outcome: TickOutcome::Idle,
                config,
            });
        }

        let bins = self.store.get_all_bins().await?;
        let mut updated: usize = 0;

        for bin in bins.iter().filter(|b| b.is_active) {
            let threshold = bin.effective_threshold(config.alert_threshold);
            let increment = engine::compute_increment(config.pattern, &mut control.rng);
            let step = engine::advance(bin.fill_level, increment, threshold);

            let patch = BinPatch::fill(step.fill_level, step.status);
            let Some(stored) = self.store.update_bin(bin.id, &patch).await? else {
                continue;
            };
            self.store
                .add_reading(&NewReading {
                    bin_id: stored.id,
                    fill_level: stored.fill_level,
                    status: stored.status,
                })
                .await?;
            updated = updated.saturating_add(1);

            self.sink
                .emit(ObserverEvent::bin_snapshot(&stored, Utc::now()));
            if step.crossed_threshold {
                self.sink.emit(ObserverEvent::fill_alert(
                    stored.id,
                    &stored.name,
                    step.fill_level,
                ));
            }

            if step.reached_capacity {
                let config = self
                    .store
                    .update_simulation_config(&ConfigPatch::running(false))
                    .await?;
                Self::disarm(control);
                info!(bin = %stored.id, name = stored.name, "Bin full, simulation halted");
                self.sink.emit(ObserverEvent::simulation_status(&config));
                return Ok(TickReport {
                    outcome: TickOutcome::Halted { updated },
                    config,
                });
            }
        }

        debug!(updated, "Tick complete");
        Ok(TickReport {
            outcome: TickOutcome::Advanced { updated },
            config,
        })
    }
}

/// Spawn a periodic timer task. The first tick fires one full `period`
/// after arming.
fn spawn_timer(
    simulation: Weak<Simulation>,
    period: Duration,
    generation: u64,
    live: Arc<AtomicUsize>,
) -> TimerHandle {
    let (cancel, mut cancelled) = oneshot::channel::<()>();
    live.fetch_add(1, Ordering::SeqCst);
    let guard = LiveTimer(live);

    tokio::spawn(async move {
        let _guard = guard;
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => break,
                _ = ticker.tick() => {}
            }
            let Some(simulation) = simulation.upgrade() else {
                break;
            };
            simulation.scheduled_tick(generation).await;
        }
        debug!(generation, "Timer exited");
    });

    TimerHandle { cancel }
}
