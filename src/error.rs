//! Error types for tape-assay

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading trials and deriving metrics
#[derive(Debug, Error)]
pub enum AssayError {
    #[error("Failed to read bout log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bout log line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Bout log contains no events")]
    EmptyBoutSequence,

    #[error("Invalid bout time: {0}")]
    InvalidBoutTime(f64),

    #[error("Invalid trial name: {0}")]
    InvalidTrialName(String),

    #[error("Degenerate trial: {0}")]
    DegenerateTrial(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("No trials found in {0}")]
    NoTrials(PathBuf),
}

/// Coarse classification of an [`AssayError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unreadable source, or an empty bout sequence
    Parse,
    /// Degenerate trial encountered while computing rate-based metrics
    Arithmetic,
    /// Configuration, serialization and batch-level errors
    Other,
}

impl AssayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssayError::Io { .. }
            | AssayError::MalformedLine { .. }
            | AssayError::EmptyBoutSequence
            | AssayError::InvalidBoutTime(_)
            | AssayError::InvalidTrialName(_) => ErrorKind::Parse,
            AssayError::DegenerateTrial(_) => ErrorKind::Arithmetic,
            AssayError::Config(_) | AssayError::JsonError(_) | AssayError::NoTrials(_) => {
                ErrorKind::Other
            }
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        AssayError::MalformedLine {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AssayError::EmptyBoutSequence.kind(), ErrorKind::Parse);
        assert_eq!(
            AssayError::malformed(3, "expected 5 tokens").kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            AssayError::DegenerateTrial("zero total time".to_string()).kind(),
            ErrorKind::Arithmetic
        );
        assert_eq!(
            AssayError::Config("bad".to_string()).kind(),
            ErrorKind::Other
        );
    }

    #[test]
    fn test_malformed_message_names_line() {
        let err = AssayError::malformed(7, "non-numeric field 'xh'");
        assert_eq!(
            err.to_string(),
            "Malformed bout log line 7: non-numeric field 'xh'"
        );
    }
}
