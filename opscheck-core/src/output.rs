//! Writing results to disk as sorted, pretty-printed JSON

use crate::error::{CheckError, Result};
use crate::summary::{summarize, Rollup};
use crate::types::{RunMetadata, RunReport};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LOG_RESULT_FILE: &str = "results_log_check.json";
pub const SERVICE_RESULT_FILE: &str = "results_service_check.json";
pub const CONFIG_RESULT_FILE: &str = "results_config_check.json";
pub const SUMMARY_FILE: &str = "results_ai_summary.json";

/// Directory name for a run started at `timestamp`
pub fn run_dir_name<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.format("%Y-%m-%d_%H%M%S").to_string()
}

/// Default output directory, `<root>/outputs/<timestamp>`
pub fn default_output_dir<Tz: TimeZone>(root: &Path, timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    root.join("outputs").join(run_dir_name(timestamp))
}

/// Render a value as pretty JSON with object keys sorted
pub fn to_sorted_json<T: Serialize>(value: &T) -> Result<String> {
    // serde_json::Map is a BTreeMap without `preserve_order`
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Write a value to `path`, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = to_sorted_json(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CheckError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, body).map_err(|source| CheckError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote result");
    Ok(())
}

/// Rollup document together with the run it describes
#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    pub metadata: &'a RunMetadata,
    #[serde(flatten)]
    pub rollup: Rollup,
}

/// Write every available result and the rollup into `dir`
///
/// Returns the written paths in write order.
pub fn write_run(dir: &Path, report: &RunReport) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(result) = &report.log {
        let path = dir.join(LOG_RESULT_FILE);
        write_json(&path, result)?;
        written.push(path);
    }
    if let Some(result) = &report.services {
        let path = dir.join(SERVICE_RESULT_FILE);
        write_json(&path, result)?;
        written.push(path);
    }
    if let Some(result) = &report.config {
        let path = dir.join(CONFIG_RESULT_FILE);
        write_json(&path, result)?;
        written.push(path);
    }

    let summary = SummaryDocument {
        metadata: &report.metadata,
        rollup: summarize(&report.digests()),
    };
    let path = dir.join(SUMMARY_FILE);
    write_json(&path, &summary)?;
    written.push(path);

    Ok(written)
}
