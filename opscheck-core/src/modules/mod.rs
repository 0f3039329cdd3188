pub mod config;
pub mod log;
pub mod services;

use crate::error::{CheckError, Result};
use crate::types::CheckResult;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Number of normalized records kept in an evidence preview
pub const EVIDENCE_PREVIEW_LIMIT: usize = 10;

/// Trait that all analyzer modules must implement
pub trait Analyzer {
    type Summary: Serialize;
    type Evidence: Serialize;

    /// Check identifier written into the result
    fn check_name(&self) -> &'static str;

    /// Analyze already-loaded evidence
    ///
    /// `target` names the source in the result and in error messages.
    fn analyze_content(
        &self,
        content: &str,
        target: &str,
    ) -> Result<CheckResult<Self::Summary, Self::Evidence>>;

    /// Read the evidence source once and analyze it
    fn analyze(&self, path: &Path) -> Result<CheckResult<Self::Summary, Self::Evidence>> {
        let content = read_source(path)?;
        self.analyze_content(&content, &path.display().to_string())
    }
}

/// Read a source file, replacing invalid UTF-8 instead of failing
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| CheckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse a JSON document, keeping the target in the error
pub(crate) fn parse_json(content: &str, target: &str) -> Result<serde_json::Value> {
    serde_json::from_str(content).map_err(|source| CheckError::Json {
        target: target.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_source_replaces_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ok \xff\xfe line\n").unwrap();

        let content = read_source(file.path()).unwrap();
        assert!(content.contains('\u{FFFD}'));
        assert!(content.starts_with("ok "));
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("absent.log")).unwrap_err();
        assert!(matches!(err, CheckError::Io { .. }));
    }

    #[test]
    fn parse_json_reports_target() {
        let err = parse_json("{not json", "services.json").unwrap_err();
        assert!(err.to_string().contains("services.json"));
    }
}
