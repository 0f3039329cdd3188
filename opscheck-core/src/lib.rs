pub mod error;
pub mod modules;
pub mod output;
pub mod summary;
pub mod types;

use chrono::Local;
use error::Result;
use modules::config::ConfigAnalyzer;
use modules::log::LogAnalyzer;
use modules::services::ServicesAnalyzer;
use modules::Analyzer;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use types::*;

/// Default evidence locations relative to a root directory
pub const DEFAULT_LOG_PATH: &str = "data/logs/sample_auth.log";
pub const DEFAULT_SERVICES_PATH: &str = "data/simulated_config/services.json";
pub const DEFAULT_CONFIG_PATH: &str = "data/simulated_config/app_config.json";

/// Where the three evidence sources live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPaths {
    pub log: PathBuf,
    pub services: PathBuf,
    pub config: PathBuf,
}

impl CheckPaths {
    /// The default layout under `root`
    pub fn under(root: &Path) -> Self {
        Self {
            log: root.join(DEFAULT_LOG_PATH),
            services: root.join(DEFAULT_SERVICES_PATH),
            config: root.join(DEFAULT_CONFIG_PATH),
        }
    }
}

/// Main orchestrator for running the three checks
pub struct CheckRunner {
    paths: CheckPaths,
    log: LogAnalyzer,
    services: ServicesAnalyzer,
    config: ConfigAnalyzer,
    keep_going: bool,
}

impl CheckRunner {
    pub fn new(paths: CheckPaths) -> Self {
        Self {
            paths,
            log: LogAnalyzer::new(),
            services: ServicesAnalyzer::new(),
            config: ConfigAnalyzer::new(),
            keep_going: false,
        }
    }

    pub fn with_log_analyzer(mut self, analyzer: LogAnalyzer) -> Self {
        self.log = analyzer;
        self
    }

    pub fn with_config_analyzer(mut self, analyzer: ConfigAnalyzer) -> Self {
        self.config = analyzer;
        self
    }

    /// Skip a check that fails structurally instead of aborting the run
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Get hostname
    fn get_hostname() -> String {
        nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Run one analyzer, recording it as skipped when allowed
    fn run_check<A: Analyzer>(
        &self,
        analyzer: &A,
        path: &Path,
        skipped: &mut Vec<SkippedCheck>,
    ) -> Result<Option<CheckResult<A::Summary, A::Evidence>>> {
        match analyzer.analyze(path) {
            Ok(result) => {
                info!(check = analyzer.check_name(), status = %result.status, "check completed");
                Ok(Some(result))
            }
            Err(err) if self.keep_going => {
                warn!(check = analyzer.check_name(), error = %err, "check skipped");
                skipped.push(SkippedCheck {
                    check: analyzer.check_name().to_string(),
                    target: path.display().to_string(),
                    error: err.to_string(),
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Run log, service and config checks in that order
    pub fn run(&self) -> Result<RunReport> {
        let metadata = RunMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Local::now(),
            hostname: Self::get_hostname(),
        };

        let mut skipped = Vec::new();
        let log = self.run_check(&self.log, &self.paths.log, &mut skipped)?;
        let services = self.run_check(&self.services, &self.paths.services, &mut skipped)?;
        let config = self.run_check(&self.config, &self.paths.config, &mut skipped)?;

        Ok(RunReport {
            metadata,
            log,
            services,
            config,
            skipped,
        })
    }
}
