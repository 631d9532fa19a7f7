//! Core types for the tape assay pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: bout sequences, trial records, group aggregates, and report output.

use crate::error::AssayError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Length of one trial in seconds. Also the value of the timeout sentinel.
pub const TRIAL_WINDOW_SEC: f64 = 300.0;

/// Number of per-second intervals in the fixed-length time course
pub const TIMECOURSE_SECONDS: usize = 300;

/// Gaps between bouts longer than this count as idle time
pub const DEFAULT_IDLE_THRESHOLD_SEC: f64 = 15.0;

/// Cumulative bout count at one second of a time course, `None` once the trial has ended
pub type CountSample = Option<u32>;

/// Trapezoidal area of one second of a time course, `None` if either edge is missing
pub type AreaSample = Option<f64>;

/// Ordered elapsed bout times in seconds since trial start.
///
/// Values keep file order. Every value is below [`TRIAL_WINDOW_SEC`] except an
/// optional trailing sentinel equal to it, which marks a trial that timed out
/// rather than a real bout. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BoutSequence(Vec<f64>);

impl BoutSequence {
    /// Wrap an already clipped sequence (sentinel included if the trial timed out)
    pub fn new(times: Vec<f64>) -> Result<Self, AssayError> {
        if times.is_empty() {
            return Err(AssayError::EmptyBoutSequence);
        }
        let last = times.len() - 1;
        for (i, &t) in times.iter().enumerate() {
            let in_window = t < TRIAL_WINDOW_SEC || (i == last && t == TRIAL_WINDOW_SEC);
            if !t.is_finite() || t < 0.0 || !in_window {
                return Err(AssayError::InvalidBoutTime(t));
            }
        }
        Ok(Self(times))
    }

    /// Clip raw elapsed times to the trial window.
    ///
    /// Times at or after the window end are dropped; if any were dropped a single
    /// sentinel is appended.
    pub fn from_elapsed<I>(elapsed: I) -> Result<Self, AssayError>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut kept = Vec::new();
        let mut after_window = 0usize;

        for t in elapsed {
            if !t.is_finite() || t < 0.0 {
                return Err(AssayError::InvalidBoutTime(t));
            }
            if t < TRIAL_WINDOW_SEC {
                kept.push(t);
            } else {
                after_window += 1;
            }
        }

        if after_window > 0 {
            kept.push(TRIAL_WINDOW_SEC);
        }

        Self::new(kept)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last element: the final bout, or the sentinel for a timed-out trial
    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Whether the sequence ends with the timeout sentinel
    pub fn is_timed_out(&self) -> bool {
        self.last() == TRIAL_WINDOW_SEC
    }

    /// Whether times never decrease
    pub fn is_monotonic(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

impl TryFrom<Vec<f64>> for BoutSequence {
    type Error = AssayError;

    fn try_from(times: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(times)
    }
}

impl From<BoutSequence> for Vec<f64> {
    fn from(bouts: BoutSequence) -> Self {
        bouts.0
    }
}

/// Trial identity decoded from the source file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialId {
    /// Source file name including extension
    pub name: String,
    /// Date token (first 6 characters, `YYMMDD`)
    pub date: String,
    /// Subject token (next 2 characters)
    pub mouse: String,
    /// Experimental group (remaining characters before the extension)
    pub group: String,
}

impl TrialId {
    /// Date token as a calendar date, if it is one
    pub fn date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%y%m%d").ok()
    }
}

/// Scalar metrics derived from one bout sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialMetrics {
    /// Number of real bouts (sentinel excluded)
    pub total_bouts: u32,
    /// Seconds until the last bout, or the window length on timeout
    pub total_time: f64,
    /// Whether the tape came off before the window elapsed
    pub success: bool,
    /// Seconds spent in inter-bout gaps longer than the idle threshold
    pub idle_time: f64,
    pub bouts_per_minute: f64,
    /// Tape induced behaviour index: `bpm * (5 - idle_time / 60)`
    pub tibi: f64,
    /// Trapezoidal area of bout rank over elapsed time
    pub auc: f64,
}

/// All derived fields for a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: TrialId,
    pub bouts: BoutSequence,

    pub total_bouts: u32,
    pub total_time: f64,
    pub success: bool,
    pub idle_time: f64,
    pub bouts_per_minute: f64,
    pub tibi: f64,
    pub auc: f64,

    /// Cumulative bout counts for seconds 0..=300
    pub timecourse_300: Vec<CountSample>,
    /// Cumulative bout counts over the trial's own duration
    pub timecourse: Vec<CountSample>,
    /// Per-second trapezoidal increments of `timecourse_300`
    pub auc_timecourse_300: Vec<AreaSample>,
}

impl TrialRecord {
    pub fn metrics(&self) -> TrialMetrics {
        TrialMetrics {
            total_bouts: self.total_bouts,
            total_time: self.total_time,
            success: self.success,
            idle_time: self.idle_time,
            bouts_per_minute: self.bouts_per_minute,
            tibi: self.tibi,
            auc: self.auc,
        }
    }
}

/// A trial that could not be loaded, recorded under [`FailurePolicy::Skip`](crate::config::FailurePolicy::Skip)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub path: String,
    pub error: String,
}

/// One row of the per-trial metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMetricsRow {
    pub group: String,
    pub mouse: String,
    pub date: String,
    pub success: bool,
    pub total_bouts: u32,
    pub total_time: f64,
    pub idle_time: f64,
    pub bouts_per_minute: f64,
    pub tibi: f64,
    pub auc: f64,
}

/// Mean and standard error of the mean of one metric across a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanSem {
    pub mean: Option<f64>,
    /// Sample standard deviation (n-1) over sqrt(n); `None` below two trials
    pub sem: Option<f64>,
}

/// Summary metrics for one experimental group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: String,
    pub n: usize,
    /// Fraction of trials that ended before the timeout
    pub success_rate: f64,
    pub total_bouts: MeanSem,
    pub bouts_per_minute: MeanSem,
    pub idle_time: MeanSem,
    pub tibi: MeanSem,
    pub auc: MeanSem,
}

/// One mouse's fixed-length time course within a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseTimecourse {
    pub mouse: String,
    pub samples: Vec<CountSample>,
}

/// Per-second time course statistics for one experimental group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTimecourse {
    pub group: String,
    /// Missing-aware mean per second
    pub mean: Vec<Option<f64>>,
    /// Sample standard deviation (n-1) per second
    pub sd: Vec<Option<f64>>,
    /// Number of trials still running at each second
    pub n: Vec<usize>,
    pub mice: Vec<MouseTimecourse>,
}

/// Area under a group's averaged time course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupAuc {
    /// Largest per-second trial count
    pub n: usize,
    /// Sum of per-second mean increments
    pub mean: f64,
    /// Square root of the summed per-second sample variances
    pub sd: f64,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Group section of an experiment report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub summary: GroupSummary,
    pub auc: GroupAuc,
    pub timecourse: GroupTimecourse,
}

/// Complete experiment report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssayReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub folder: String,
    pub trials: Vec<TrialMetricsRow>,
    pub groups: Vec<GroupReport>,
    pub failures: Vec<TrialFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_elapsed_appends_single_sentinel() {
        let bouts = BoutSequence::from_elapsed([2.5, 10.0, 400.0, 512.0]).unwrap();
        assert_eq!(bouts.as_slice(), &[2.5, 10.0, 300.0]);
        assert!(bouts.is_timed_out());
    }

    #[test]
    fn test_from_elapsed_boundary_is_excluded() {
        let bouts = BoutSequence::from_elapsed([299.99, 300.0]).unwrap();
        assert_eq!(bouts.as_slice(), &[299.99, 300.0]);
        assert!(bouts.is_timed_out());
    }

    #[test]
    fn test_from_elapsed_without_timeout() {
        let bouts = BoutSequence::from_elapsed([5.0, 20.0, 40.0]).unwrap();
        assert_eq!(bouts.as_slice(), &[5.0, 20.0, 40.0]);
        assert!(!bouts.is_timed_out());
        assert_eq!(bouts.last(), 40.0);
    }

    #[test]
    fn test_only_late_events_yield_sentinel() {
        let bouts = BoutSequence::from_elapsed([301.0]).unwrap();
        assert_eq!(bouts.as_slice(), &[300.0]);
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(matches!(
            BoutSequence::new(vec![]),
            Err(AssayError::EmptyBoutSequence)
        ));
        assert!(matches!(
            BoutSequence::from_elapsed(Vec::<f64>::new()),
            Err(AssayError::EmptyBoutSequence)
        ));
    }

    #[test]
    fn test_new_rejects_out_of_window_values() {
        assert!(BoutSequence::new(vec![300.0, 10.0]).is_err());
        assert!(BoutSequence::new(vec![10.0, 350.0]).is_err());
        assert!(BoutSequence::new(vec![-1.0]).is_err());
        assert!(BoutSequence::new(vec![f64::NAN]).is_err());
        assert!(BoutSequence::new(vec![10.0, 300.0]).is_ok());
    }

    #[test]
    fn test_monotonic_check_keeps_file_order() {
        let bouts = BoutSequence::new(vec![10.0, 5.0]).unwrap();
        assert_eq!(bouts.as_slice(), &[10.0, 5.0]);
        assert!(!bouts.is_monotonic());
    }

    #[test]
    fn test_bout_sequence_serde_validates() {
        let bouts: BoutSequence = serde_json::from_str("[1.5, 300.0]").unwrap();
        assert_eq!(serde_json::to_string(&bouts).unwrap(), "[1.5,300.0]");
        assert!(serde_json::from_str::<BoutSequence>("[]").is_err());
    }

    #[test]
    fn test_trial_id_date_parsed() {
        let id = TrialId {
            name: "20031401Group 1.txt".to_string(),
            date: "200314".to_string(),
            mouse: "01".to_string(),
            group: "Group 1".to_string(),
        };
        assert_eq!(id.date_parsed(), NaiveDate::from_ymd_opt(2020, 3, 14));

        let bad = TrialId {
            date: "abcdef".to_string(),
            ..id
        };
        assert_eq!(bad.date_parsed(), None);
    }
}
