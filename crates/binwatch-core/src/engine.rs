//! Pure fill-level arithmetic.
//!
//! Everything here is side-effect-free apart from drawing from the caller's
//! RNG. The scheduler applies these functions to each active bin on every
//! tick; keeping them separate lets the arithmetic be tested without storage
//! or timers.

use binwatch_types::{BinStatus, FILL_LEVEL_MAX, FillPattern};
use rand::Rng;

/// Constant increment used by [`FillPattern::Linear`].
pub const LINEAR_INCREMENT: f64 = 2.0;

/// Centre of the [`FillPattern::Realistic`] distribution.
pub const REALISTIC_BASE: f64 = 1.5;

/// Floor applied to [`FillPattern::Realistic`] draws.
pub const REALISTIC_MIN: f64 = 0.5;

/// Width of the warning band below the threshold.
pub const WARNING_BAND: f64 = 10.0;

/// Draw one increment for `pattern`.
///
/// Must be called once per bin per tick; increments are never shared.
pub fn compute_increment<R: Rng + ?Sized>(pattern: FillPattern, rng: &mut R) -> f64 {
    match pattern {
        FillPattern::Random => f64::from(rng.random_range(2_u32..=9)),
        FillPattern::Linear => LINEAR_INCREMENT,
        FillPattern::Realistic => {
            let noise = (rng.random::<f64>() - 0.5) * 2.0;
            (REALISTIC_BASE + noise).max(REALISTIC_MIN)
        }
    }
}

/// Status for a fill level under a threshold. Boundaries belong to the
/// more severe bucket.
pub fn classify_status(fill_level: f64, threshold: f64) -> BinStatus {
    if fill_level >= threshold {
        BinStatus::Alert
    } else if fill_level >= threshold - WARNING_BAND {
        BinStatus::Warning
    } else {
        BinStatus::Normal
    }
}

/// The outcome of advancing one bin by one increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStep {
    /// New fill level, capped at 100.
    pub fill_level: f64,
    /// Status derived from the new fill level.
    pub status: BinStatus,
    /// The bin moved from below the threshold to at-or-above it.
    pub crossed_threshold: bool,
    /// The bin is full; the simulation must halt.
    pub reached_capacity: bool,
}

/// Advance a bin currently at `current` by `increment` under `threshold`.
pub fn advance(current: f64, increment: f64, threshold: f64) -> FillStep {
    let fill_level = (current + increment).min(FILL_LEVEL_MAX);
    FillStep {
        fill_level,
        status: classify_status(fill_level, threshold),
        crossed_threshold: fill_level >= threshold && current < threshold,
        reached_capacity: fill_level >= FILL_LEVEL_MAX,
    }
}
