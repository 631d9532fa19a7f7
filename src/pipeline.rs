//! Pipeline orchestration
//!
//! This module provides the public API for tape-assay.
//! It orchestrates the full pipeline from bout log files to trial records and
//! experiment-level collections.

use crate::adapter::{parse_trial_id, read_bout_log};
use crate::aggregate;
use crate::config::{AssayConfig, FailurePolicy};
use crate::error::{AssayError, Result};
use crate::features::TrialFeatureDeriver;
use crate::timecourse::{auc_time_curve_300, bout_time_curve, bout_time_curve_300};
use crate::types::{
    BoutSequence, GroupAuc, GroupSummary, GroupTimecourse, TrialFailure, TrialId,
    TrialMetricsRow, TrialRecord,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Derive every trial field from a parsed bout sequence.
///
/// # Example
/// ```ignore
/// let bouts = BoutSequence::from_elapsed([2.5, 10.0, 400.0])?;
/// let trial = derive_trial(id, bouts, 15.0)?;
/// assert!(!trial.success);
/// ```
pub fn derive_trial(
    id: TrialId,
    bouts: BoutSequence,
    idle_threshold_sec: f64,
) -> Result<TrialRecord> {
    // Stage 1: Scalar metrics
    let metrics = TrialFeatureDeriver::new(idle_threshold_sec).derive(&bouts)?;

    // Stage 2: Per-second time courses
    let timecourse_300 = bout_time_curve_300(&bouts);
    let timecourse = bout_time_curve(&bouts, metrics.total_bouts);

    // Stage 3: Per-second areas
    let auc_timecourse_300 = auc_time_curve_300(&timecourse_300);

    Ok(TrialRecord {
        id,
        bouts,
        total_bouts: metrics.total_bouts,
        total_time: metrics.total_time,
        success: metrics.success,
        idle_time: metrics.idle_time,
        bouts_per_minute: metrics.bouts_per_minute,
        tibi: metrics.tibi,
        auc: metrics.auc,
        timecourse_300,
        timecourse,
        auc_timecourse_300,
    })
}

/// Load one trial from its bout log file
pub fn trial_from_file(path: &Path, config: &AssayConfig) -> Result<TrialRecord> {
    let id = parse_trial_id(path)?;
    let bouts = read_bout_log(path)?;
    derive_trial(id, bouts, config.idle_threshold_sec)
}

/// Sorted paths of files in `folder` with the given extension
pub fn txt_file_paths(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let io_err = |source: std::io::Error| AssayError::Io {
        path: folder.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == extension);
        if matches && path.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// All trials loaded from one folder, ordered by file name
#[derive(Debug, Clone)]
pub struct Experiment {
    pub folder: PathBuf,
    pub trials: Vec<TrialRecord>,
    /// Trials skipped under [`FailurePolicy::Skip`]
    pub failures: Vec<TrialFailure>,
}

impl Experiment {
    /// Build an experiment from already derived trials
    pub fn from_trials(folder: impl Into<PathBuf>, mut trials: Vec<TrialRecord>) -> Self {
        trials.sort_by(|a, b| a.id.name.cmp(&b.id.name));
        Self {
            folder: folder.into(),
            trials,
            failures: Vec::new(),
        }
    }

    /// Sorted experimental groups
    pub fn groups(&self) -> BTreeSet<String> {
        self.trials.iter().map(|t| t.id.group.clone()).collect()
    }

    /// Sorted trial dates
    pub fn dates(&self) -> BTreeSet<String> {
        self.trials.iter().map(|t| t.id.date.clone()).collect()
    }

    /// Sorted subject tokens
    pub fn mice(&self) -> BTreeSet<String> {
        self.trials.iter().map(|t| t.id.mouse.clone()).collect()
    }

    pub fn group_trials(&self) -> BTreeMap<String, Vec<&TrialRecord>> {
        aggregate::group_trials(&self.trials)
    }

    pub fn metrics_table(&self) -> Vec<TrialMetricsRow> {
        aggregate::metrics_table(&self.trials)
    }

    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        self.group_trials()
            .iter()
            .map(|(group, trials)| aggregate::group_summary(group, trials))
            .collect()
    }

    pub fn group_timecourses(&self) -> Vec<GroupTimecourse> {
        self.group_trials()
            .iter()
            .map(|(group, trials)| aggregate::group_timecourse(group, trials))
            .collect()
    }

    pub fn group_aucs(&self) -> BTreeMap<String, GroupAuc> {
        self.group_trials()
            .iter()
            .map(|(group, trials)| (group.clone(), aggregate::group_auc(trials)))
            .collect()
    }
}

/// Loads experiment folders with a fixed configuration
pub struct AssayProcessor {
    config: AssayConfig,
}

impl Default for AssayProcessor {
    fn default() -> Self {
        Self {
            config: AssayConfig::default(),
        }
    }
}

impl AssayProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: AssayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    /// Load every bout log in `folder`.
    ///
    /// Files are processed in parallel; results keep sorted path order.
    pub fn load_folder(&self, folder: &Path) -> Result<Experiment> {
        let paths = txt_file_paths(folder, &self.config.file_extension)?;
        if paths.is_empty() {
            return Err(AssayError::NoTrials(folder.to_path_buf()));
        }

        let experiment = self.load_files(folder, &paths)?;
        info!(
            folder = %folder.display(),
            trials = experiment.trials.len(),
            failures = experiment.failures.len(),
            "Calculated metrics for experiment"
        );
        Ok(experiment)
    }

    /// Load the given bout log files as one experiment
    pub fn load_files(&self, folder: &Path, paths: &[PathBuf]) -> Result<Experiment> {
        let mut sorted = paths.to_vec();
        sorted.sort();

        let results: Vec<(PathBuf, Result<TrialRecord>)> = sorted
            .into_par_iter()
            .map(|path| {
                let result = trial_from_file(&path, &self.config);
                (path, result)
            })
            .collect();

        let mut trials = Vec::with_capacity(results.len());
        let mut failures = Vec::new();

        for (path, result) in results {
            match (result, self.config.failure_policy) {
                (Ok(trial), _) => trials.push(trial),
                (Err(e), FailurePolicy::Abort) => return Err(e),
                (Err(e), FailurePolicy::Skip) => {
                    warn!(path = %path.display(), error = %e, "Skipping trial");
                    failures.push(TrialFailure {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(Experiment {
            folder: folder.to_path_buf(),
            trials,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trial(name: &str, times: &[f64]) -> TrialRecord {
        let id = parse_trial_id(Path::new(name)).unwrap();
        let bouts = BoutSequence::new(times.to_vec()).unwrap();
        derive_trial(id, bouts, 15.0).unwrap()
    }

    #[test]
    fn test_derive_trial_timed_out() {
        let bouts = BoutSequence::from_elapsed([2.5, 10.0, 400.0]).unwrap();
        let id = parse_trial_id(Path::new("20031401Group 1.txt")).unwrap();
        let record = derive_trial(id, bouts, 15.0).unwrap();

        assert_eq!(record.bouts.as_slice(), &[2.5, 10.0, 300.0]);
        assert_eq!(record.total_bouts, 2);
        assert_eq!(record.total_time, 300.0);
        assert!(!record.success);
        assert_eq!(record.timecourse_300.len(), 301);
        assert_eq!(record.timecourse.len(), 301);
        assert_eq!(record.timecourse[300], Some(2));
        assert_eq!(record.auc_timecourse_300.len(), 300);
    }

    #[test]
    fn test_derive_trial_degenerate() {
        let bouts = BoutSequence::new(vec![0.0]).unwrap();
        let id = parse_trial_id(Path::new("20031401Group 1.txt")).unwrap();
        let err = derive_trial(id, bouts, 15.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Arithmetic);
    }

    #[test]
    fn test_derive_trial_is_deterministic() {
        let a = trial("20031401G1.txt", &[1.0, 18.5, 40.25, 300.0]);
        let b = trial("20031401G1.txt", &[1.0, 18.5, 40.25, 300.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_experiment_sets_are_sorted() {
        let experiment = Experiment::from_trials(
            "/data",
            vec![
                trial("20031502B.txt", &[5.0, 20.0]),
                trial("20031401A.txt", &[5.0, 20.0]),
                trial("20031403A.txt", &[5.0, 300.0]),
            ],
        );

        let names: Vec<&str> = experiment.trials.iter().map(|t| t.id.name.as_str()).collect();
        assert_eq!(names, vec!["20031401A.txt", "20031403A.txt", "20031502B.txt"]);
        assert_eq!(
            experiment.groups().into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
        assert_eq!(experiment.dates().len(), 2);
        assert_eq!(experiment.mice().len(), 3);
        assert_eq!(experiment.group_summaries().len(), 2);
        assert_eq!(experiment.group_timecourses().len(), 2);
        assert_eq!(experiment.group_aucs()["A"].n, 2);
    }

    #[test]
    fn test_processor_rejects_invalid_config() {
        let config = AssayConfig {
            idle_threshold_sec: -1.0,
            ..AssayConfig::default()
        };
        assert!(AssayProcessor::new(config).is_err());
    }

    #[test]
    fn test_missing_folder() {
        let err = AssayProcessor::default()
            .load_folder(Path::new("/nonexistent/folder"))
            .unwrap_err();
        assert!(matches!(err, AssayError::Io { .. }));
    }
}
