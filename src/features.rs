//! Trial metric derivation
//!
//! This module derives the scalar trial metrics from a bout sequence:
//! - Bout counts and trial duration
//! - Idle time and rates
//! - Success classification
//! - Area under the bout-index curve

use crate::error::{AssayError, Result};
use crate::types::{BoutSequence, TrialMetrics, DEFAULT_IDLE_THRESHOLD_SEC};

/// Maximum TIBI weight, one per minute of the trial window
const TIBI_WINDOW_MIN: f64 = 5.0;

/// Feature deriver for computing trial metrics
pub struct TrialFeatureDeriver {
    idle_threshold_sec: f64,
}

impl Default for TrialFeatureDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_THRESHOLD_SEC)
    }
}

impl TrialFeatureDeriver {
    pub fn new(idle_threshold_sec: f64) -> Self {
        Self { idle_threshold_sec }
    }

    /// Derive all scalar metrics.
    ///
    /// Fails with [`AssayError::DegenerateTrial`] when the trial lasted zero
    /// seconds, since rates would be infinite.
    pub fn derive(&self, bouts: &BoutSequence) -> Result<TrialMetrics> {
        let total_bouts = total_bouts(bouts);
        let total_time = total_time(bouts);
        let idle_time = idle_time(bouts, self.idle_threshold_sec);
        let bouts_per_minute = bouts_per_minute(total_bouts, total_time)?;

        Ok(TrialMetrics {
            total_bouts,
            total_time,
            success: trial_success(bouts),
            idle_time,
            bouts_per_minute,
            tibi: tape_induced_behaviour_index(bouts_per_minute, idle_time),
            auc: area_under_curve(bouts),
        })
    }
}

/// Count real bouts; a trailing sentinel is not a bout
pub fn total_bouts(bouts: &BoutSequence) -> u32 {
    let len = bouts.len() as u32;
    if bouts.is_timed_out() {
        len - 1
    } else {
        len
    }
}

/// Trial duration: the last element of the sequence
pub fn total_time(bouts: &BoutSequence) -> f64 {
    bouts.last()
}

/// Whether the subject removed the tape before the window elapsed
pub fn trial_success(bouts: &BoutSequence) -> bool {
    !bouts.is_timed_out()
}

/// Sum of inter-bout gaps longer than `threshold_sec`.
///
/// Only pairs `(i, i + 1)` with `i < len - 2` are considered, so the final
/// adjacent pair never contributes. A two-element sequence has no idle time.
pub fn idle_time(bouts: &BoutSequence, threshold_sec: f64) -> f64 {
    let times = bouts.as_slice();
    let pairs = times.len().saturating_sub(2);

    times
        .windows(2)
        .take(pairs)
        .map(|pair| pair[1] - pair[0])
        .filter(|&gap| gap > threshold_sec)
        .sum()
}

/// Bouts per minute over the trial duration
fn bouts_per_minute(total_bouts: u32, total_time: f64) -> Result<f64> {
    if total_time <= 0.0 {
        return Err(AssayError::DegenerateTrial(format!(
            "total time is {total_time} s, bout rate is undefined"
        )));
    }
    Ok(total_bouts as f64 / total_time * 60.0)
}

/// Tape induced behaviour index
///
/// Formula: `bpm * (5 - idle_time / 60)`
fn tape_induced_behaviour_index(bouts_per_minute: f64, idle_time: f64) -> f64 {
    bouts_per_minute * (TIBI_WINDOW_MIN - idle_time / 60.0)
}

/// Trapezoidal area with elapsed time on x and 0-based bout rank on y.
///
/// A strictly non-increasing sequence integrates right to left, so the area is
/// positive either way. A single element has no area.
pub fn area_under_curve(bouts: &BoutSequence) -> f64 {
    let times = bouts.as_slice();

    let area: f64 = times
        .windows(2)
        .enumerate()
        .map(|(rank, pair)| (pair[1] - pair[0]) * (rank as f64 + (rank + 1) as f64) / 2.0)
        .sum();

    let decreasing = times.windows(2).any(|p| p[1] < p[0]);
    let non_increasing = times.windows(2).all(|p| p[1] <= p[0]);
    if decreasing && non_increasing {
        -area
    } else {
        area
    }
}
