//! Grading response normalization.
//!
//! Grading services are asked for a single `O: ...` / `X: ...` line, but the
//! format is a request, not a guarantee. `normalize` turns whatever came back
//! into a strict [`Verdict`]:
//!
//! - empty or missing text becomes a failing verdict with a fixed message
//! - only the first line is kept
//! - drifted markers (`O.`, `X )`, `O：`) are repaired
//! - text without a marker is treated as failing
//! - the message payload is capped at [`MAX_FEEDBACK_CHARS`] characters

use crate::model::{Outcome, Verdict};

/// Message used when the grading service produced nothing usable.
pub const FEEDBACK_FAILED: &str = "feedback generation failed";

/// Maximum message payload length, in characters (not bytes).
pub const MAX_FEEDBACK_CHARS: usize = 200;

/// Appended to a message cut at [`MAX_FEEDBACK_CHARS`].
pub const TRUNCATION_MARKER: char = '…';

/// Normalize a raw grading response into a verdict. Never fails.
pub fn normalize(raw: Option<&str>) -> Verdict {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Verdict::fail(FEEDBACK_FAILED);
    };

    let first_line = text.lines().next().unwrap_or_default().trim();
    let (outcome, body) = split_marker(first_line);

    Verdict {
        outcome,
        message: truncate(body.trim()),
    }
}

/// Shorthand for [`normalize`] on a present string.
pub fn normalize_str(raw: &str) -> Verdict {
    normalize(Some(raw))
}

/// Split a line into its outcome marker and body, repairing drifted markers.
fn split_marker(line: &str) -> (Outcome, &str) {
    for outcome in [Outcome::Pass, Outcome::Fail] {
        let Some(rest) = line.strip_prefix(outcome.marker()) else {
            continue;
        };
        let body = rest
            .strip_prefix(':')
            .unwrap_or_else(|| rest.trim_start_matches(is_separator));
        return (outcome, body);
    }
    (Outcome::Fail, line)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '：' | '.' | ')' | '-' | ',' | '|')
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_FEEDBACK_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_FEEDBACK_CHARS).collect();
    cut.push(TRUNCATION_MARKER);
    cut
}
