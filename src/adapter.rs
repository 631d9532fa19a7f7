//! Bout log adapter
//!
//! Parses timer-app bout logs and trial file names into typed trial inputs.
//!
//! Each log line is `<label> <H>h <M>m <S>s <CS>ms`. The last field is in
//! hundredths of a second despite its suffix.

use crate::error::{AssayError, Result};
use crate::types::{BoutSequence, TrialId};
use std::path::Path;
use tracing::{debug, warn};

/// Number of whitespace-separated tokens on a bout log line
const TOKENS_PER_LINE: usize = 5;

/// Length of the date token at the start of a trial file name
const DATE_TOKEN_LEN: usize = 6;

/// Length of the subject token following the date
const MOUSE_TOKEN_LEN: usize = 2;

/// Parse a bout log into a clipped bout sequence
pub fn parse_bout_log(text: &str) -> Result<BoutSequence> {
    let mut elapsed = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        elapsed.push(parse_bout_line(index + 1, line)?);
    }

    let bouts = BoutSequence::from_elapsed(elapsed)?;
    if !bouts.is_monotonic() {
        warn!(
            bouts = bouts.len(),
            "Bout log is not in chronological order; time courses assume it is"
        );
    }
    Ok(bouts)
}

/// Read and parse a bout log file
pub fn read_bout_log(path: &Path) -> Result<BoutSequence> {
    let text = std::fs::read_to_string(path).map_err(|source| AssayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bouts = parse_bout_log(&text)?;
    debug!(
        path = %path.display(),
        entries = bouts.len(),
        timed_out = bouts.is_timed_out(),
        "Parsed bout log"
    );
    Ok(bouts)
}

/// Convert one log line to elapsed seconds
fn parse_bout_line(line_no: usize, line: &str) -> Result<f64> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != TOKENS_PER_LINE {
        return Err(AssayError::malformed(
            line_no,
            format!(
                "expected {TOKENS_PER_LINE} tokens, found {}",
                tokens.len()
            ),
        ));
    }

    let hours = parse_field(line_no, tokens[1], "h")?;
    let minutes = parse_field(line_no, tokens[2], "m")?;
    let seconds = parse_field(line_no, tokens[3], "s")?;
    let centis = parse_field(line_no, tokens[4], "ms")?;

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(|| AssayError::malformed(line_no, "elapsed time out of range"))?;
    Ok(whole as f64 + centis as f64 * 0.01)
}

/// Parse a non-negative integer field, tolerating a missing unit suffix
fn parse_field(line_no: usize, token: &str, unit: &str) -> Result<u64> {
    let digits = token.strip_suffix(unit).unwrap_or(token);
    digits.parse::<u64>().map_err(|_| {
        AssayError::malformed(line_no, format!("non-numeric field '{token}'"))
    })
}

/// Decode the trial identity from a file path.
///
/// The file stem holds a 6-character date, a 2-character mouse token and the
/// group name.
pub fn parse_trial_id(path: &Path) -> Result<TrialId> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AssayError::InvalidTrialName(path.display().to_string()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AssayError::InvalidTrialName(name.to_string()))?;

    let chars: Vec<char> = stem.chars().collect();
    if chars.len() < DATE_TOKEN_LEN + MOUSE_TOKEN_LEN {
        return Err(AssayError::InvalidTrialName(format!(
            "'{name}' is shorter than date and mouse tokens"
        )));
    }

    let date: String = chars[..DATE_TOKEN_LEN].iter().collect();
    let mouse: String = chars[DATE_TOKEN_LEN..DATE_TOKEN_LEN + MOUSE_TOKEN_LEN]
        .iter()
        .collect();
    let group: String = chars[DATE_TOKEN_LEN + MOUSE_TOKEN_LEN..].iter().collect();

    Ok(TrialId {
        name: name.to_string(),
        date,
        mouse,
        group,
    })
}
