//! Report encoding
//!
//! This module encodes a loaded experiment into a JSON report holding the
//! per-trial metrics table and the per-group summaries, time courses and AUCs.
//! Missing time course samples encode as `null`.

use crate::aggregate;
use crate::error::{AssayError, Result};
use crate::pipeline::Experiment;
use crate::types::{AssayReport, GroupReport, ReportProducer};
use crate::{ASSAY_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Encoder for experiment reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the report for an experiment
    pub fn encode(&self, experiment: &Experiment) -> Result<AssayReport> {
        if experiment.trials.is_empty() {
            return Err(AssayError::NoTrials(experiment.folder.clone()));
        }

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ASSAY_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let groups = experiment
            .group_trials()
            .iter()
            .map(|(group, trials)| GroupReport {
                summary: aggregate::group_summary(group, trials),
                auc: aggregate::group_auc(trials),
                timecourse: aggregate::group_timecourse(group, trials),
            })
            .collect();

        Ok(AssayReport {
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            folder: experiment.folder.display().to_string(),
            trials: experiment.metrics_table(),
            groups,
            failures: experiment.failures.clone(),
        })
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, experiment: &Experiment) -> Result<String> {
        let report = self.encode(experiment)?;
        serde_json::to_string_pretty(&report).map_err(AssayError::JsonError)
    }
}
