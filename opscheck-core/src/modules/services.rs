use crate::error::{CheckError, Result};
use crate::modules::{parse_json, Analyzer, EVIDENCE_PREVIEW_LIMIT};
use crate::types::{CheckResult, Status};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

pub const CHECK_NAME: &str = "service_check";

/// Name given to records that do not carry one
pub const UNNAMED_SERVICE: &str = "unknown-service";

pub const FINDING_STOPPED: &str = "One or more services are stopped.";
pub const FINDING_DEGRADED: &str = "One or more services are degraded.";
pub const FINDING_UNKNOWN: &str = "One or more services have unknown status.";

pub type ServiceCheckResult = CheckResult<ServiceSummary, Vec<ServiceRecord>>;

/// Normalized service state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Running,
    Degraded,
    Stopped,
    Unknown,
}

impl ServiceState {
    /// Normalize a raw status; anything unrecognized is `Unknown`
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("running") => ServiceState::Running,
            Some("degraded") => ServiceState::Degraded,
            Some("stopped") => ServiceState::Stopped,
            _ => ServiceState::Unknown,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Running => write!(f, "running"),
            ServiceState::Degraded => write!(f, "degraded"),
            ServiceState::Stopped => write!(f, "stopped"),
            ServiceState::Unknown => write!(f, "unknown"),
        }
    }
}

/// One service after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub status: ServiceState,
}

impl ServiceRecord {
    /// Normalize a raw record, tolerating missing or garbled fields
    pub fn from_value(raw: &Value) -> Self {
        let name = match raw.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => UNNAMED_SERVICE.to_string(),
            Some(other) => other.to_string(),
        };
        let status = ServiceState::normalize(raw.get("status").and_then(Value::as_str));
        Self { name, status }
    }
}

/// Count of services per normalized state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub running: usize,
    pub degraded: usize,
    pub stopped: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn record(&mut self, state: ServiceState) {
        match state {
            ServiceState::Running => self.running += 1,
            ServiceState::Degraded => self.degraded += 1,
            ServiceState::Stopped => self.stopped += 1,
            ServiceState::Unknown => self.unknown += 1,
        }
    }
}

/// Tallies and triage lists of the service check
///
/// Running services are only counted; the lists hold the ones that need
/// attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub total_services: usize,
    pub status_counts: StatusCounts,
    pub stopped: Vec<ServiceRecord>,
    pub degraded: Vec<ServiceRecord>,
    pub unknown: Vec<ServiceRecord>,
}

/// Service status snapshot analyzer
///
/// Reads a `{"services": [{"name", "status"}, ...]}` document.
pub struct ServicesAnalyzer;

impl ServicesAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Extract and normalize the records of a parsed document
    pub fn records(&self, doc: &Value, target: &str) -> Result<Vec<ServiceRecord>> {
        let Value::Object(map) = doc else {
            return Err(CheckError::Shape {
                target: target.to_string(),
                expected: "an object with a `services` list",
            });
        };

        match map.get("services") {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.iter().map(ServiceRecord::from_value).collect()),
            Some(_) => Err(CheckError::Shape {
                target: target.to_string(),
                expected: "`services` to be a list",
            }),
        }
    }

    /// Apply the status rules to normalized records
    pub fn evaluate(&self, records: Vec<ServiceRecord>, target: &str) -> ServiceCheckResult {
        let mut counts = StatusCounts::default();
        for record in &records {
            counts.record(record.status);
        }

        let pick = |state: ServiceState| -> Vec<ServiceRecord> {
            records.iter().filter(|r| r.status == state).cloned().collect()
        };

        let summary = ServiceSummary {
            total_services: records.len(),
            status_counts: counts,
            stopped: pick(ServiceState::Stopped),
            degraded: pick(ServiceState::Degraded),
            unknown: pick(ServiceState::Unknown),
        };

        let status = Status::from_conditions(&[
            (counts.stopped > 0, Status::Fail),
            (counts.degraded > 0, Status::Warn),
            (counts.unknown > 0, Status::Warn),
        ]);

        let mut findings = Vec::new();
        if status == Status::Fail {
            findings.push(FINDING_STOPPED.to_string());
        } else {
            if counts.degraded > 0 {
                findings.push(FINDING_DEGRADED.to_string());
            }
            if counts.unknown > 0 {
                findings.push(FINDING_UNKNOWN.to_string());
            }
        }

        debug!(
            target_path = target,
            total = records.len(),
            running = counts.running,
            degraded = counts.degraded,
            stopped = counts.stopped,
            unknown = counts.unknown,
            %status,
            "service check evaluated"
        );

        let evidence_preview = records.into_iter().take(EVIDENCE_PREVIEW_LIMIT).collect();

        CheckResult {
            check: CHECK_NAME.to_string(),
            target: target.to_string(),
            status,
            summary,
            findings,
            evidence_preview,
        }
    }
}

impl Default for ServicesAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ServicesAnalyzer {
    type Summary = ServiceSummary;
    type Evidence = Vec<ServiceRecord>;

    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn analyze_content(&self, content: &str, target: &str) -> Result<ServiceCheckResult> {
        let doc = parse_json(content, target)?;
        let records = self.records(&doc, target)?;
        Ok(self.evaluate(records, target))
    }
}
