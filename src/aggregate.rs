//! Group aggregation
//!
//! Groups trials by their experimental group and summarizes them. Missing
//! time course samples (seconds after a trial ended) are skipped by every
//! statistic here rather than counted as zero.

use crate::types::{
    GroupAuc, GroupSummary, GroupTimecourse, MeanSem, MouseTimecourse, TrialMetricsRow,
    TrialRecord, TIMECOURSE_SECONDS,
};
use std::collections::BTreeMap;

/// Map each group to its trials, preserving input order within a group
pub fn group_trials(trials: &[TrialRecord]) -> BTreeMap<String, Vec<&TrialRecord>> {
    let mut groups: BTreeMap<String, Vec<&TrialRecord>> = BTreeMap::new();
    for trial in trials {
        groups.entry(trial.id.group.clone()).or_default().push(trial);
    }
    groups
}

/// Flatten trials into metric rows
pub fn metrics_table(trials: &[TrialRecord]) -> Vec<TrialMetricsRow> {
    trials
        .iter()
        .map(|t| TrialMetricsRow {
            group: t.id.group.clone(),
            mouse: t.id.mouse.clone(),
            date: t.id.date.clone(),
            success: t.success,
            total_bouts: t.total_bouts,
            total_time: t.total_time,
            idle_time: t.idle_time,
            bouts_per_minute: t.bouts_per_minute,
            tibi: t.tibi,
            auc: t.auc,
        })
        .collect()
}

/// Mean ± SEM of the scalar metrics and the success rate of one group
pub fn group_summary(group: &str, trials: &[&TrialRecord]) -> GroupSummary {
    let n = trials.len();
    let successes = trials.iter().filter(|t| t.success).count();
    let success_rate = if n == 0 {
        0.0
    } else {
        successes as f64 / n as f64
    };

    let column = |select: fn(&TrialRecord) -> f64| -> MeanSem {
        let values: Vec<f64> = trials.iter().map(|t| select(t)).collect();
        mean_sem(&values)
    };

    GroupSummary {
        group: group.to_string(),
        n,
        success_rate,
        total_bouts: column(|t| t.total_bouts as f64),
        bouts_per_minute: column(|t| t.bouts_per_minute),
        idle_time: column(|t| t.idle_time),
        tibi: column(|t| t.tibi),
        auc: column(|t| t.auc),
    }
}

/// Per-second mean, SD and count of the fixed-length time courses in a group
pub fn group_timecourse(group: &str, trials: &[&TrialRecord]) -> GroupTimecourse {
    let seconds = TIMECOURSE_SECONDS + 1;
    let mut mean = Vec::with_capacity(seconds);
    let mut sd = Vec::with_capacity(seconds);
    let mut n = Vec::with_capacity(seconds);

    for second in 0..seconds {
        let values: Vec<f64> = trials
            .iter()
            .filter_map(|t| t.timecourse_300.get(second).copied().flatten())
            .map(|count| count as f64)
            .collect();

        mean.push(mean_of(&values));
        sd.push(sample_variance(&values).map(f64::sqrt));
        n.push(values.len());
    }

    GroupTimecourse {
        group: group.to_string(),
        mean,
        sd,
        n,
        mice: trials
            .iter()
            .map(|t| MouseTimecourse {
                mouse: t.id.mouse.clone(),
                samples: t.timecourse_300.clone(),
            })
            .collect(),
    }
}

/// Area under a group's averaged time course.
///
/// Per-second means and sample variances of `auc_timecourse_300` are summed;
/// seconds without enough data contribute nothing.
pub fn group_auc(trials: &[&TrialRecord]) -> GroupAuc {
    let mut mean = 0.0;
    let mut variance = 0.0;
    let mut n = 0;

    for second in 0..TIMECOURSE_SECONDS {
        let values: Vec<f64> = trials
            .iter()
            .filter_map(|t| t.auc_timecourse_300.get(second).copied().flatten())
            .collect();

        if let Some(m) = mean_of(&values) {
            mean += m;
        }
        if let Some(v) = sample_variance(&values) {
            variance += v;
        }
        n = n.max(values.len());
    }

    GroupAuc {
        n,
        mean,
        sd: variance.sqrt(),
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with n-1 degrees of freedom; `None` below two values
fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean_of(values)?;
    let sum_sq: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
    Some(sum_sq / (values.len() - 1) as f64)
}

fn mean_sem(values: &[f64]) -> MeanSem {
    MeanSem {
        mean: mean_of(values),
        sem: sample_variance(values).map(|v| (v / values.len() as f64).sqrt()),
    }
}
