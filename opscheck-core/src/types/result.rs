use serde::{Deserialize, Serialize};

use super::Status;

/// Uniform envelope produced by every analyzer
///
/// `S` is the analyzer's summary block and `E` its evidence preview. The
/// status is derived from the normalized records alone, so analyzing the
/// same input twice yields an identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult<S, E> {
    /// Check identifier, e.g. `log_check`
    pub check: String,

    /// The evidence source that was inspected
    pub target: String,

    pub status: Status,

    pub summary: S,

    /// Short flags for rule conditions that held, in rule order
    pub findings: Vec<String>,

    /// Size-capped sample of the normalized records
    pub evidence_preview: E,
}

impl<S, E> CheckResult<S, E> {
    /// Status, check name and findings, without the typed payload
    pub fn digest(&self) -> CheckDigest {
        CheckDigest {
            check: self.check.clone(),
            status: Some(self.status),
            findings: self.findings.clone(),
        }
    }
}

/// The part of a result the rollup summarizer looks at
///
/// `status` is `None` when the check could not be run at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDigest {
    pub check: String,
    pub status: Option<Status>,
    pub findings: Vec<String>,
}

impl CheckDigest {
    /// Digest for a check that was skipped after a fatal error
    pub fn skipped(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status: None,
            findings: Vec::new(),
        }
    }
}
