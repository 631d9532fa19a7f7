//! Tape Assay - Metric derivation engine for tape response assay bout logs
//!
//! A trial log records every tape-directed bout a mouse performed during a
//! 300 second trial. Trials flow through a deterministic pipeline:
//! bout log parsing → trial metrics → per-second time courses → group aggregation
//! → report encoding.
//!
//! ## Modules
//!
//! - **Trial pipeline**: parse one bout log and derive its metrics and time courses
//! - **Experiment pipeline**: load a folder of trials in parallel and summarize groups

pub mod adapter;
pub mod aggregate;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod logging;
pub mod pipeline;
pub mod timecourse;
pub mod types;

pub use config::{AssayConfig, FailurePolicy};
pub use error::{AssayError, ErrorKind};
pub use pipeline::{derive_trial, trial_from_file, AssayProcessor, Experiment};
pub use types::{BoutSequence, TrialId, TrialRecord};

/// Crate version embedded in every report
pub const ASSAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "tape-assay";
