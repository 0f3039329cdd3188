//! Deterministic prose rollup of check results
//!
//! The text is a fixed lookup on each check's status. Nothing is inferred
//! beyond what the results already state.

use crate::types::{CheckDigest, Status};
use serde::{Deserialize, Serialize};

pub const ASSISTANT: &str = "ai_ops_summarizer";
pub const RULES: &str = "summarization_only_no_inference";

/// Status label used for checks that produced no result
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Prose for a status, `None` meaning the check did not run
pub fn status_text(status: Option<Status>) -> &'static str {
    match status {
        Some(Status::Pass) => "No issues detected. System behavior is within expected parameters.",
        Some(Status::Warn) => {
            "Potential issues detected. Review warnings to prevent possible degradation."
        }
        Some(Status::Fail) => {
            "Critical issues detected. Immediate investigation is recommended to prevent service impact."
        }
        None => "Status could not be determined from provided data.",
    }
}

/// One check's entry in the rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupSection {
    pub check: String,
    pub status: String,
    pub summary: String,
    pub findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub assistant: String,
    pub rules: String,
    pub summary: Vec<RollupSection>,
}

impl Rollup {
    /// Worst status across the checks that ran
    pub fn overall(digests: &[CheckDigest]) -> Status {
        Status::worst(digests.iter().filter_map(|d| d.status))
    }
}

/// Build the rollup, keeping the order of `digests`
pub fn summarize(digests: &[CheckDigest]) -> Rollup {
    let summary = digests
        .iter()
        .map(|d| RollupSection {
            check: d.check.clone(),
            status: d
                .status
                .map(|s| s.as_str())
                .unwrap_or(UNKNOWN_STATUS)
                .to_string(),
            summary: status_text(d.status).to_string(),
            findings: d.findings.clone(),
        })
        .collect();

    Rollup {
        assistant: ASSISTANT.to_string(),
        rules: RULES.to_string(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(check: &str, status: Option<Status>) -> CheckDigest {
        CheckDigest {
            check: check.to_string(),
            status,
            findings: vec![format!("{check} finding")],
        }
    }

    #[test]
    fn sections_follow_input_order() {
        let rollup = summarize(&[
            digest("log_check", Some(Status::Fail)),
            digest("service_check", Some(Status::Pass)),
            digest("config_check", Some(Status::Warn)),
        ]);

        let checks: Vec<_> = rollup.summary.iter().map(|s| s.check.as_str()).collect();
        assert_eq!(checks, vec!["log_check", "service_check", "config_check"]);
        assert_eq!(rollup.summary[0].status, "FAIL");
        assert!(rollup.summary[0].summary.starts_with("Critical issues detected"));
        assert!(rollup.summary[1].summary.starts_with("No issues detected"));
        assert!(rollup.summary[2].summary.starts_with("Potential issues detected"));
        assert_eq!(rollup.summary[2].findings, vec!["config_check finding".to_string()]);
        assert_eq!(rollup.rules, RULES);
        assert_eq!(rollup.assistant, "ai_ops_summarizer");
    }

    #[test]
    fn skipped_check_is_unknown() {
        let rollup = summarize(&[CheckDigest::skipped("config_check")]);
        assert_eq!(rollup.summary[0].status, UNKNOWN_STATUS);
        assert_eq!(rollup.summary[0].summary, status_text(None));
        assert!(rollup.summary[0].findings.is_empty());
    }

    #[test]
    fn overall_ignores_skipped_checks() {
        let digests = [
            digest("log_check", Some(Status::Warn)),
            CheckDigest::skipped("service_check"),
        ];
        assert_eq!(Rollup::overall(&digests), Status::Warn);
        assert_eq!(Rollup::overall(&[]), Status::Pass);
    }
}
