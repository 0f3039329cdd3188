use crate::error::{CheckError, Result};
use crate::modules::{parse_json, Analyzer};
use crate::types::{CheckResult, Status, ValueFinding};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const CHECK_NAME: &str = "config_check";

pub const KEY_ENV: &str = "env";
pub const KEY_LOG_LEVEL: &str = "log_level";
pub const KEY_MAX_LOGIN_ATTEMPTS: &str = "max_login_attempts";
pub const KEY_ALLOWED_CIDRS: &str = "allowed_cidrs";

/// Keys every configuration must define, in reporting order
pub const REQUIRED_KEYS: [&str; 4] = [
    KEY_ENV,
    KEY_LOG_LEVEL,
    KEY_MAX_LOGIN_ATTEMPTS,
    KEY_ALLOWED_CIDRS,
];

pub const LOGIN_ATTEMPTS_MIN: i64 = 1;
pub const LOGIN_ATTEMPTS_MAX: i64 = 10;
/// Valid ceilings at or above this raise a brute-force advisory
pub const LOGIN_ATTEMPTS_ADVISORY: i64 = 8;

pub const OPEN_CIDR: &str = "0.0.0.0/0";

pub const FINDING_MISSING: &str = "Missing required configuration keys.";
pub const FINDING_INVALID: &str = "Invalid configuration values detected.";
pub const FINDING_ADVISORY: &str = "Configuration is valid but contains risk warnings.";

pub type ConfigCheckResult = CheckResult<ConfigSummary, BTreeMap<String, Value>>;

/// Deployment environment named by `env`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Test,
    Stage,
    Prod,
}

impl Environment {
    pub const ALLOWED: [&'static str; 4] = ["dev", "prod", "stage", "test"];
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "stage" => Ok(Environment::Stage),
            "prod" => Ok(Environment::Prod),
            _ => Err(()),
        }
    }
}

/// Application log level named by `log_level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppLogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl AppLogLevel {
    pub const ALLOWED: [&'static str; 4] = ["DEBUG", "ERROR", "INFO", "WARN"];
}

impl FromStr for AppLogLevel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(AppLogLevel::Debug),
            "INFO" => Ok(AppLogLevel::Info),
            "WARN" => Ok(AppLogLevel::Warn),
            "ERROR" => Ok(AppLogLevel::Error),
            _ => Err(()),
        }
    }
}

/// Serialization format of the configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML, everything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// The recognized keys of a configuration document
///
/// Each slot holds the raw value when the key is present. A present `null`
/// is `Some(Value::Null)`, distinct from an absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    pub env: Option<Value>,
    pub log_level: Option<Value>,
    pub max_login_attempts: Option<Value>,
    pub allowed_cidrs: Option<Value>,
}

impl ConfigDocument {
    /// Pick the recognized keys out of a parsed mapping, ignoring the rest
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        Self {
            env: map.remove(KEY_ENV),
            log_level: map.remove(KEY_LOG_LEVEL),
            max_login_attempts: map.remove(KEY_MAX_LOGIN_ATTEMPTS),
            allowed_cidrs: map.remove(KEY_ALLOWED_CIDRS),
        }
    }

    /// Parse a document in the given format
    pub fn parse(content: &str, format: ConfigFormat, target: &str) -> Result<Self> {
        let value = match format {
            ConfigFormat::Json => parse_json(content, target)?,
            ConfigFormat::Toml => {
                let table: toml::Table =
                    toml::from_str(content).map_err(|source| CheckError::Toml {
                        target: target.to_string(),
                        source,
                    })?;
                serde_json::to_value(table)?
            }
        };

        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(CheckError::Shape {
                target: target.to_string(),
                expected: "a key/value mapping at the top level",
            }),
        }
    }
}

/// Outcome of validating a single present key
enum KeyCheck {
    Valid,
    Advisory(String),
    Invalid(String),
}

/// Findings collected while walking the recognized keys
#[derive(Default)]
struct KeyReport {
    missing_keys: Vec<String>,
    invalid_values: Vec<ValueFinding>,
    warnings: Vec<ValueFinding>,
    evidence: BTreeMap<String, Value>,
}

impl KeyReport {
    /// Record one key: missing, or validated by its own rule
    fn apply(&mut self, key: &str, slot: Option<&Value>, check: fn(&Value) -> KeyCheck) {
        let Some(value) = slot else {
            self.missing_keys.push(key.to_string());
            return;
        };
        self.evidence.insert(key.to_string(), value.clone());

        match check(value) {
            KeyCheck::Valid => {}
            KeyCheck::Advisory(note) => self
                .warnings
                .push(ValueFinding::new(key, value.clone()).with_note(note)),
            KeyCheck::Invalid(rule) => self
                .invalid_values
                .push(ValueFinding::new(key, value.clone()).with_rule(rule)),
        }
    }
}

fn check_env(value: &Value) -> KeyCheck {
    match value.as_str().map(Environment::from_str) {
        Some(Ok(_)) => KeyCheck::Valid,
        _ => KeyCheck::Invalid(format!("must be one of {:?}", Environment::ALLOWED)),
    }
}

fn check_log_level(value: &Value) -> KeyCheck {
    match value.as_str().map(AppLogLevel::from_str) {
        Some(Ok(_)) => KeyCheck::Valid,
        _ => KeyCheck::Invalid(format!("must be one of {:?}", AppLogLevel::ALLOWED)),
    }
}

fn check_max_login_attempts(value: &Value) -> KeyCheck {
    // booleans and floats are not integers here
    match value.as_i64() {
        Some(n) if (LOGIN_ATTEMPTS_MIN..=LOGIN_ATTEMPTS_MAX).contains(&n) => {
            if n >= LOGIN_ATTEMPTS_ADVISORY {
                KeyCheck::Advisory(
                    "High value may increase brute-force risk (consider <= 5)".to_string(),
                )
            } else {
                KeyCheck::Valid
            }
        }
        _ => KeyCheck::Invalid(format!(
            "must be an integer between {} and {}",
            LOGIN_ATTEMPTS_MIN, LOGIN_ATTEMPTS_MAX
        )),
    }
}

fn check_allowed_cidrs(value: &Value) -> KeyCheck {
    let cidrs: Option<Vec<&str>> = value
        .as_array()
        .and_then(|items| items.iter().map(Value::as_str).collect());

    match cidrs {
        Some(cidrs) if cidrs.iter().any(|c| c.trim() == OPEN_CIDR) => KeyCheck::Advisory(format!(
            "{} is overly permissive; restrict CIDRs",
            OPEN_CIDR
        )),
        Some(_) => KeyCheck::Valid,
        None => KeyCheck::Invalid("must be a list of strings".to_string()),
    }
}

/// Validation outcome of the configuration check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub required_keys: Vec<String>,
    pub missing_keys: Vec<String>,
    pub invalid_values: Vec<ValueFinding>,
    pub warnings: Vec<ValueFinding>,
}

/// Application configuration analyzer
///
/// Validates the four security-relevant keys independently, so one bad key
/// never hides problems with the others.
pub struct ConfigAnalyzer {
    format: Option<ConfigFormat>,
}

impl ConfigAnalyzer {
    pub fn new() -> Self {
        Self { format: None }
    }

    /// Force a document format instead of inferring it from the file name
    pub fn with_format(mut self, format: ConfigFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Apply the key rules to an already parsed document
    pub fn evaluate(&self, doc: &ConfigDocument, target: &str) -> ConfigCheckResult {
        let mut report = KeyReport::default();
        report.apply(KEY_ENV, doc.env.as_ref(), check_env);
        report.apply(KEY_LOG_LEVEL, doc.log_level.as_ref(), check_log_level);
        report.apply(
            KEY_MAX_LOGIN_ATTEMPTS,
            doc.max_login_attempts.as_ref(),
            check_max_login_attempts,
        );
        report.apply(KEY_ALLOWED_CIDRS, doc.allowed_cidrs.as_ref(), check_allowed_cidrs);

        let KeyReport {
            missing_keys,
            invalid_values,
            warnings,
            evidence: evidence_preview,
        } = report;

        let status = Status::from_conditions(&[
            (!missing_keys.is_empty(), Status::Fail),
            (!invalid_values.is_empty(), Status::Fail),
            (!warnings.is_empty(), Status::Warn),
        ]);

        let mut findings = Vec::new();
        if !missing_keys.is_empty() {
            findings.push(FINDING_MISSING.to_string());
        }
        if !invalid_values.is_empty() {
            findings.push(FINDING_INVALID.to_string());
        }
        if status != Status::Fail && !warnings.is_empty() {
            findings.push(FINDING_ADVISORY.to_string());
        }

        debug!(
            target_path = target,
            missing = missing_keys.len(),
            invalid = invalid_values.len(),
            advisories = warnings.len(),
            %status,
            "config check evaluated"
        );

        CheckResult {
            check: CHECK_NAME.to_string(),
            target: target.to_string(),
            status,
            summary: ConfigSummary {
                required_keys: REQUIRED_KEYS.iter().map(|k| k.to_string()).collect(),
                missing_keys,
                invalid_values,
                warnings,
            },
            findings,
            evidence_preview,
        }
    }
}

impl Default for ConfigAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ConfigAnalyzer {
    type Summary = ConfigSummary;
    type Evidence = BTreeMap<String, Value>;

    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn analyze_content(&self, content: &str, target: &str) -> Result<ConfigCheckResult> {
        let format = self.format.unwrap_or(ConfigFormat::Json);
        let doc = ConfigDocument::parse(content, format, target)?;
        Ok(self.evaluate(&doc, target))
    }

    fn analyze(&self, path: &Path) -> Result<ConfigCheckResult> {
        let content = super::read_source(path)?;
        let format = self.format.unwrap_or_else(|| ConfigFormat::from_path(path));
        let target = path.display().to_string();
        let doc = ConfigDocument::parse(&content, format, &target)?;
        Ok(self.evaluate(&doc, &target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(doc: Value) -> ConfigCheckResult {
        ConfigAnalyzer::new()
            .analyze_content(&doc.to_string(), "app_config.json")
            .unwrap()
    }

    fn baseline() -> Value {
        json!({
            "env": "prod",
            "log_level": "INFO",
            "max_login_attempts": 5,
            "allowed_cidrs": ["10.0.0.0/8"],
        })
    }

    #[test]
    fn valid_config_passes() {
        let result = run(baseline());
        assert_eq!(result.status, Status::Pass);
        assert!(result.findings.is_empty());
        assert!(result.summary.missing_keys.is_empty());
        assert_eq!(result.summary.required_keys, REQUIRED_KEYS.to_vec());
    }

    #[test]
    fn values_are_normalized_before_matching() {
        let mut doc = baseline();
        doc["env"] = json!("  Stage ");
        doc["log_level"] = json!(" debug");
        assert_eq!(run(doc).status, Status::Pass);
    }

    #[test]
    fn missing_allowed_cidrs_fails() {
        let mut doc = baseline();
        doc.as_object_mut().unwrap().remove("allowed_cidrs");

        let result = run(doc);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.summary.missing_keys, vec!["allowed_cidrs".to_string()]);
        assert_eq!(result.findings, vec![FINDING_MISSING.to_string()]);
        assert!(!result.evidence_preview.contains_key("allowed_cidrs"));
    }

    #[test]
    fn high_login_ceiling_is_advisory_not_failure() {
        let mut doc = baseline();
        doc["max_login_attempts"] = json!(9);

        let result = run(doc);
        assert_eq!(result.status, Status::Warn);
        assert!(result.summary.invalid_values.is_empty());
        assert_eq!(result.summary.warnings.len(), 1);
        assert_eq!(result.summary.warnings[0].key, "max_login_attempts");
        assert!(result.summary.warnings[0].note.is_some());
        assert_eq!(result.findings, vec![FINDING_ADVISORY.to_string()]);
    }

    #[test]
    fn out_of_range_login_ceiling_fails() {
        let mut doc = baseline();
        doc["max_login_attempts"] = json!(11);

        let result = run(doc);
        assert_eq!(result.status, Status::Fail);
        assert!(result.summary.warnings.is_empty());
        assert_eq!(result.summary.invalid_values.len(), 1);
        let invalid = &result.summary.invalid_values[0];
        assert_eq!(invalid.key, "max_login_attempts");
        assert_eq!(invalid.value, json!(11));
        assert!(invalid.rule.is_some());
        assert_eq!(result.findings, vec![FINDING_INVALID.to_string()]);
    }

    #[test]
    fn non_integer_login_ceiling_is_invalid() {
        for bad in [json!(true), json!(5.0), json!("5"), json!(0), Value::Null] {
            let mut doc = baseline();
            doc["max_login_attempts"] = bad.clone();
            let result = run(doc);
            assert_eq!(result.status, Status::Fail, "value {bad}");
            assert!(result.summary.missing_keys.is_empty());
        }
    }

    #[test]
    fn open_cidr_is_advisory_and_still_valid() {
        let mut doc = baseline();
        doc["allowed_cidrs"] = json!([" 0.0.0.0/0 ", "10.0.0.0/8"]);

        let result = run(doc);
        assert_eq!(result.status, Status::Warn);
        assert!(result.summary.invalid_values.is_empty());
        assert_eq!(result.summary.warnings[0].key, "allowed_cidrs");
    }

    #[test]
    fn cidrs_must_be_list_of_strings() {
        for bad in [json!("10.0.0.0/8"), json!(["10.0.0.0/8", 7])] {
            let mut doc = baseline();
            doc["allowed_cidrs"] = bad;
            let result = run(doc);
            assert_eq!(result.status, Status::Fail);
            assert_eq!(result.summary.invalid_values[0].key, "allowed_cidrs");
        }
    }

    #[test]
    fn empty_cidr_list_is_valid() {
        let mut doc = baseline();
        doc["allowed_cidrs"] = json!([]);
        assert_eq!(run(doc).status, Status::Pass);
    }

    #[test]
    fn keys_are_checked_independently() {
        let result = run(json!({
            "env": "qa",
            "log_level": "TRACE",
            "max_login_attempts": 8,
            "allowed_cidrs": ["0.0.0.0/0"],
        }));

        assert_eq!(result.status, Status::Fail);
        let invalid: Vec<_> = result.summary.invalid_values.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(invalid, vec!["env", "log_level"]);
        assert_eq!(result.summary.warnings.len(), 2);
        // advisories are recorded but do not add the "valid" finding under FAIL
        assert_eq!(result.findings, vec![FINDING_INVALID.to_string()]);
    }

    #[test]
    fn each_key_is_judged_by_its_own_rule() {
        let mut doc = baseline();
        doc["env"] = json!(["10.0.0.0/8"]);
        doc["allowed_cidrs"] = json!(3);
        doc.as_object_mut().unwrap().remove("log_level");

        let result = run(doc);
        let invalid: Vec<_> = result.summary.invalid_values.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(invalid, vec!["env", "allowed_cidrs"]);
        assert_eq!(result.summary.missing_keys, vec!["log_level".to_string()]);
        let evidence: Vec<_> = result.evidence_preview.keys().map(String::as_str).collect();
        assert_eq!(evidence, vec!["allowed_cidrs", "env", "max_login_attempts"]);
    }

    #[test]
    fn null_value_is_present_but_invalid() {
        let mut doc = baseline();
        doc["env"] = Value::Null;
        let result = run(doc);
        assert!(result.summary.missing_keys.is_empty());
        assert_eq!(result.summary.invalid_values[0].key, "env");
    }

    #[test]
    fn evidence_holds_only_recognized_keys() {
        let mut doc = baseline();
        doc["db_password"] = json!("hunter2");
        let result = run(doc);
        assert_eq!(result.evidence_preview.len(), 4);
        assert!(!result.evidence_preview.contains_key("db_password"));
    }

    #[test]
    fn malformed_document_is_fatal() {
        let analyzer = ConfigAnalyzer::new();
        assert!(matches!(
            analyzer.analyze_content("{\"env\": ", "cfg.json"),
            Err(CheckError::Json { .. })
        ));
        assert!(matches!(
            analyzer.analyze_content("[1, 2]", "cfg.json"),
            Err(CheckError::Shape { .. })
        ));
    }

    #[test]
    fn toml_documents_are_supported() {
        let content = r#"
env = "dev"
log_level = "warn"
max_login_attempts = 3
allowed_cidrs = ["192.168.0.0/16"]

[database]
host = "db.internal"
"#;
        let result = ConfigAnalyzer::new()
            .with_format(ConfigFormat::Toml)
            .analyze_content(content, "app_config.toml")
            .unwrap();
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.evidence_preview["max_login_attempts"], json!(3));
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/app.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a/app.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a/app")), ConfigFormat::Json);
    }
}
