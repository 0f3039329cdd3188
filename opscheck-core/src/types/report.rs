use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::CheckDigest;
use crate::modules::config::ConfigCheckResult;
use crate::modules::log::LogCheckResult;
use crate::modules::services::ServiceCheckResult;

/// Metadata about when and where the checks were run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub version: String,
    pub timestamp: DateTime<Local>,
    pub hostname: String,
}

/// A check that hit a fatal error and was left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCheck {
    pub check: String,
    pub target: String,
    pub error: String,
}

/// Everything one run of the three checks produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogCheckResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceCheckResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigCheckResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedCheck>,
}

impl RunReport {
    /// Digests in run order: log, service, config
    ///
    /// Skipped checks appear with no status so the rollup still mentions them.
    pub fn digests(&self) -> Vec<CheckDigest> {
        let mut digests = Vec::new();
        for (name, digest) in [
            (crate::modules::log::CHECK_NAME, self.log.as_ref().map(|r| r.digest())),
            (crate::modules::services::CHECK_NAME, self.services.as_ref().map(|r| r.digest())),
            (crate::modules::config::CHECK_NAME, self.config.as_ref().map(|r| r.digest())),
        ] {
            match digest {
                Some(d) => digests.push(d),
                None if self.skipped.iter().any(|s| s.check == name) => {
                    digests.push(CheckDigest::skipped(name))
                }
                None => {}
            }
        }
        digests
    }
}
