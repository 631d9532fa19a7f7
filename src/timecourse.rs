//! Per-second time courses
//!
//! Converts a bout sequence into cumulative bout counts per second, and the
//! fixed-length course into per-second trapezoidal areas. Seconds after a trial
//! has ended are `None` so that cross-trial statistics skip them instead of
//! treating them as zero activity.

use crate::types::{AreaSample, BoutSequence, CountSample, TIMECOURSE_SECONDS};

/// Number of entries in `bouts` at or before `second`
fn count_until(bouts: &BoutSequence, second: usize) -> u32 {
    let second = second as f64;
    bouts.as_slice().iter().filter(|&&t| t <= second).count() as u32
}

/// Seconds covered by the trial: `ceil(total_time) + 1`
fn covered_seconds(bouts: &BoutSequence) -> usize {
    bouts.last().ceil() as usize + 1
}

/// Cumulative counts for seconds `0..=300`.
///
/// Counting includes every sequence entry, so a timed-out trial counts its
/// sentinel at second 300.
pub fn bout_time_curve_300(bouts: &BoutSequence) -> Vec<CountSample> {
    let covered = covered_seconds(bouts);

    (0..=TIMECOURSE_SECONDS)
        .map(|second| (second < covered).then(|| count_until(bouts, second)))
        .collect()
}

/// Cumulative counts over the trial's own duration.
///
/// A count above `total_bouts` is marked missing, and second 300 (when the
/// trial reaches it) is pinned to `total_bouts`.
pub fn bout_time_curve(bouts: &BoutSequence, total_bouts: u32) -> Vec<CountSample> {
    (0..covered_seconds(bouts))
        .map(|second| {
            if second == TIMECOURSE_SECONDS {
                return Some(total_bouts);
            }
            let count = count_until(bouts, second);
            (count <= total_bouts).then_some(count)
        })
        .collect()
}

/// Trapezoidal area of each one-second interval of a time course
pub fn auc_time_curve_300(timecourse_300: &[CountSample]) -> Vec<AreaSample> {
    timecourse_300
        .windows(2)
        .map(|pair| match (pair[0], pair[1]) {
            (Some(a), Some(b)) => Some(0.5 * (a as f64 + b as f64)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::total_bouts;
    use pretty_assertions::assert_eq;

    fn seq(times: &[f64]) -> BoutSequence {
        BoutSequence::new(times.to_vec()).unwrap()
    }

    #[test]
    fn test_timecourse_300_timed_out() {
        let bouts = seq(&[2.5, 10.0, 300.0]);
        let tc = bout_time_curve_300(&bouts);

        assert_eq!(tc.len(), 301);
        assert!(tc[0..=2].iter().all(|&s| s == Some(0)));
        assert!(tc[3..=9].iter().all(|&s| s == Some(1)));
        assert!(tc[10..=299].iter().all(|&s| s == Some(2)));
        // the sentinel is counted in the fixed-length course
        assert_eq!(tc[300], Some(3));
    }

    #[test]
    fn test_timecourse_pins_second_300() {
        let bouts = seq(&[2.5, 10.0, 300.0]);
        let tc = bout_time_curve(&bouts, total_bouts(&bouts));

        assert_eq!(tc.len(), 301);
        assert_eq!(tc[9], Some(1));
        assert_eq!(tc[299], Some(2));
        assert_eq!(tc[300], Some(2));
    }

    #[test]
    fn test_timecourse_300_marks_ended_seconds_missing() {
        let bouts = seq(&[5.0, 20.0, 40.0]);
        let tc = bout_time_curve_300(&bouts);

        assert_eq!(tc.len(), 301);
        assert_eq!(tc[4], Some(0));
        assert_eq!(tc[5], Some(1));
        assert_eq!(tc[40], Some(3));
        assert_eq!(tc[41], None);
        assert!(tc[41..].iter().all(Option::is_none));
    }

    #[test]
    fn test_fractional_end_covers_next_second() {
        let bouts = seq(&[5.0, 40.5]);
        let tc = bout_time_curve_300(&bouts);

        // ceil(40.5) + 1 = 42 seconds covered
        assert_eq!(tc[40], Some(1));
        assert_eq!(tc[41], Some(2));
        assert_eq!(tc[42], None);

        let own = bout_time_curve(&bouts, total_bouts(&bouts));
        assert_eq!(own.len(), 42);
        assert_eq!(own[41], Some(2));
    }

    #[test]
    fn test_timecourse_non_decreasing_until_missing() {
        let bouts = seq(&[1.0, 1.5, 30.0, 31.0, 120.25, 300.0]);
        let tc = bout_time_curve_300(&bouts);

        let present: Vec<u32> = tc.iter().map_while(|s| *s).collect();
        assert!(present.windows(2).all(|w| w[0] <= w[1]));
        assert!(tc[present.len()..].iter().all(Option::is_none));
    }

    #[test]
    fn test_auc_timecourse_length_and_values() {
        let bouts = seq(&[2.5, 10.0, 300.0]);
        let auc = auc_time_curve_300(&bout_time_curve_300(&bouts));

        assert_eq!(auc.len(), 300);
        assert_eq!(auc[0], Some(0.0));
        assert_eq!(auc[2], Some(0.5));
        assert_eq!(auc[3], Some(1.0));
        assert_eq!(auc[299], Some(2.5));
    }

    #[test]
    fn test_auc_timecourse_propagates_missing() {
        let bouts = seq(&[5.0, 20.0, 40.0]);
        let auc = auc_time_curve_300(&bout_time_curve_300(&bouts));

        assert_eq!(auc.len(), 300);
        assert_eq!(auc[38], Some(2.0));
        assert_eq!(auc[39], Some(2.5));
        // interval 40 -> 41 has a missing right edge
        assert_eq!(auc[40], None);
        assert!(auc[40..].iter().all(Option::is_none));
    }

    #[test]
    fn test_auc_timecourse_sum_matches_trapezoid() {
        let bouts = seq(&[5.0, 20.0, 40.0]);
        let tc = bout_time_curve_300(&bouts);
        let total: f64 = auc_time_curve_300(&tc).into_iter().flatten().sum();

        let present: Vec<f64> = tc.iter().flatten().map(|&c| c as f64).collect();
        let trapz: f64 = present.windows(2).map(|w| 0.5 * (w[0] + w[1])).sum();
        assert!((total - trapz).abs() < 1e-9);
    }
}
