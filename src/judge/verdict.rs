//! Verdict parsing
//!
//! The judge answers in free text; we only trust two marker lines.

use serde::{Deserialize, Serialize};

pub const VERDICT_MARKER: &str = "VERDICT:";
pub const FEEDBACK_MARKER: &str = "FEEDBACK:";

pub const UNPARSED_VERDICT: &str = "Error";
pub const UNPARSED_FEEDBACK: &str = "Unable to parse response";
pub const EMPTY_REPLY_FEEDBACK: &str = "Failed to get response from AI";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub verdict: String,
    pub feedback: String,
    pub passed: bool,
}

impl EvaluationResult {
    pub fn unparsed() -> Self {
        Self {
            verdict: UNPARSED_VERDICT.to_string(),
            feedback: UNPARSED_FEEDBACK.to_string(),
            passed: false,
        }
    }

    /// Stand-in result when the provider answered with no choices at all.
    pub fn empty_reply() -> Self {
        Self {
            verdict: UNPARSED_VERDICT.to_string(),
            feedback: EMPTY_REPLY_FEEDBACK.to_string(),
            passed: false,
        }
    }
}

/// Any verdict mentioning "accepted", in any case, counts as a pass.
/// Substring match: "Not Accepted" passes too.
pub fn is_passing(verdict: &str) -> bool {
    verdict.to_lowercase().contains("accepted")
}

/// Extract the verdict from raw judge text. Never fails.
///
/// Lines are trimmed and scanned top to bottom; a later marker line overrides
/// an earlier one. Without a `VERDICT:` line the result is
/// `EvaluationResult::unparsed()`, whatever else the text contains.
pub fn parse_verdict(text: &str) -> EvaluationResult {
    let mut verdict: Option<String> = None;
    let mut feedback: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(VERDICT_MARKER) {
            verdict = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(FEEDBACK_MARKER) {
            feedback = Some(rest.trim().to_string());
        }
    }

    match verdict {
        Some(verdict) => EvaluationResult {
            passed: is_passing(&verdict),
            verdict,
            feedback: feedback.unwrap_or_else(|| UNPARSED_FEEDBACK.to_string()),
        },
        None => EvaluationResult::unparsed(),
    }
}
