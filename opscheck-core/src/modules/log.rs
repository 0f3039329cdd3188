use crate::error::Result;
use crate::modules::{Analyzer, EVIDENCE_PREVIEW_LIMIT};
use crate::types::{CheckResult, Status};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

pub const CHECK_NAME: &str = "log_check";

/// Default number of issue signatures kept in the summary
pub const DEFAULT_TOP_N: usize = 5;

pub const FINDING_ERRORS: &str = "Errors detected in logs.";
pub const FINDING_MULTIPLE_WARNINGS: &str =
    "Multiple warnings detected; investigate potential degradation.";
pub const FINDING_UNPARSABLE: &str = "Some log lines could not be parsed; review raw evidence.";

// TIMESTAMP LEVEL SOURCE MESSAGE, applied to an already trimmed line
static LINE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ts>\S+)\s+(?P<level>INFO|WARN|ERROR)\s+(?P<source>\S+)\s+(?P<message>.+)$")
        .expect("log line grammar is a valid regex")
});

pub type LogCheckResult = CheckResult<LogSummary, Vec<Event>>;

/// Level of a normalized log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warn,
    Error,
    Unknown,
}

impl Level {
    /// Severity points contributed by one event of this level
    pub fn severity(&self) -> u32 {
        match self {
            Level::Info => 1,
            Level::Warn => 5,
            Level::Error => 10,
            Level::Unknown => 0,
        }
    }

    /// Parse a level token exactly as it appears in the grammar
    pub fn from_token(token: &str) -> Self {
        match token {
            "INFO" => Level::Info,
            "WARN" => Level::Warn,
            "ERROR" => Level::Error,
            _ => Level::Unknown,
        }
    }

    /// Whether events at this level count towards issue signatures
    pub fn is_issue(&self) -> bool {
        matches!(self, Level::Warn | Level::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
            Level::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One non-blank log line after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Trimmed source line
    pub raw: String,

    pub parse_ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,

    pub level: Level,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub severity: u32,
}

impl Event {
    /// Normalize one raw line, `None` for blank lines
    pub fn parse(line: &str) -> Option<Self> {
        let raw = line.trim();
        if raw.is_empty() {
            return None;
        }

        let event = match LINE_GRAMMAR.captures(raw) {
            Some(caps) => {
                let level = Level::from_token(&caps["level"]);
                Event {
                    raw: raw.to_string(),
                    parse_ok: true,
                    ts: Some(caps["ts"].to_string()),
                    level,
                    source: Some(caps["source"].to_string()),
                    message: Some(caps["message"].to_string()),
                    severity: level.severity(),
                }
            }
            None => Event {
                raw: raw.to_string(),
                parse_ok: false,
                ts: None,
                level: Level::Unknown,
                source: None,
                message: None,
                severity: Level::Unknown.severity(),
            },
        };

        Some(event)
    }

    /// `"<source> | <message>"` for WARN and ERROR events
    pub fn issue_signature(&self) -> Option<String> {
        if !self.level.is_issue() {
            return None;
        }
        Some(format!(
            "{} | {}",
            self.source.as_deref().unwrap_or_default(),
            self.message.as_deref().unwrap_or_default()
        ))
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split text into lines on every Unicode line boundary
///
/// `\r\n` counts as one terminator and a trailing terminator does not
/// start an extra line, so `"a\rb\r"` gives `["a", "b"]`.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&content[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                end += 1;
            }
        }
        start = end;
    }

    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// Normalize every line, dropping blank ones
pub fn normalize<'a, I>(lines: I) -> Vec<Event>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(Event::parse).collect()
}

/// A recurring WARN/ERROR signature and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopIssue {
    pub issue: String,
    pub count: usize,
}

/// Most frequent issue signatures, ties kept in first-seen order
pub fn top_issues(events: &[Event], top_n: usize) -> Vec<TopIssue> {
    let mut order: Vec<TopIssue> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for signature in events.iter().filter_map(Event::issue_signature) {
        match index.get(&signature) {
            Some(&i) => order[i].count += 1,
            None => {
                index.insert(signature.clone(), order.len());
                order.push(TopIssue {
                    issue: signature,
                    count: 1,
                });
            }
        }
    }

    // stable sort keeps first-seen order between equal counts
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(top_n);
    order
}

/// Aggregates reported by the log check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    /// Input lines, blank ones included
    pub total_lines: usize,

    /// Events that matched the line grammar
    pub parsed_events: usize,

    /// Event count per level, only levels that occurred
    pub level_counts: BTreeMap<Level, usize>,

    pub total_severity: u64,

    pub top_issues: Vec<TopIssue>,
}

impl LogSummary {
    pub fn count(&self, level: Level) -> usize {
        self.level_counts.get(&level).copied().unwrap_or(0)
    }
}

/// Authentication / application log analyzer
///
/// Normalizes each line against the `TIMESTAMP LEVEL SOURCE MESSAGE`
/// grammar and grades the log by the worst level it contains.
pub struct LogAnalyzer {
    top_n: usize,
}

impl LogAnalyzer {
    pub fn new() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Run the log rules over already-split content
    pub fn evaluate(&self, content: &str, target: &str) -> LogCheckResult {
        let lines = split_lines(content);
        let total_lines = lines.len();
        let events = normalize(lines);

        let mut level_counts: BTreeMap<Level, usize> = BTreeMap::new();
        for event in &events {
            *level_counts.entry(event.level).or_insert(0) += 1;
        }
        let total_severity: u64 = events.iter().map(|e| u64::from(e.severity)).sum();
        let parsed_events = events.iter().filter(|e| e.parse_ok).count();

        let summary = LogSummary {
            total_lines,
            parsed_events,
            level_counts,
            total_severity,
            top_issues: top_issues(&events, self.top_n),
        };

        let errors = summary.count(Level::Error);
        let warnings = summary.count(Level::Warn);
        let unknown = summary.count(Level::Unknown);

        let mut findings = Vec::new();
        if errors > 0 {
            findings.push(FINDING_ERRORS.to_string());
        }
        if warnings >= 2 {
            findings.push(FINDING_MULTIPLE_WARNINGS.to_string());
        }
        if unknown > 0 {
            findings.push(FINDING_UNPARSABLE.to_string());
        }

        let status = Status::from_conditions(&[
            (errors > 0, Status::Fail),
            (warnings > 0, Status::Warn),
        ]);

        debug!(
            target_path = target,
            total_lines,
            parsed_events,
            errors,
            warnings,
            unknown,
            %status,
            "log check evaluated"
        );

        let evidence_preview = events.into_iter().take(EVIDENCE_PREVIEW_LIMIT).collect();

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

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for LogAnalyzer {
    type Summary = LogSummary;
    type Evidence = Vec<Event>;

    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn analyze_content(&self, content: &str, target: &str) -> Result<LogCheckResult> {
        Ok(self.evaluate(content, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str) -> LogCheckResult {
        LogAnalyzer::new().evaluate(content, "auth.log")
    }

    #[test]
    fn parses_grammar_line() {
        let event = Event::parse("2024-01-01T00:00:00Z WARN sshd  failed login for root").unwrap();
        assert!(event.parse_ok);
        assert_eq!(event.ts.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(event.level, Level::Warn);
        assert_eq!(event.source.as_deref(), Some("sshd"));
        assert_eq!(event.message.as_deref(), Some("failed login for root"));
        assert_eq!(event.severity, 5);
    }

    #[test]
    fn blank_lines_are_dropped() {
        assert!(Event::parse("   \t ").is_none());
        let result = run("\n2024-01-01T00:00:00Z INFO auth ok\n\n");
        assert_eq!(result.evidence_preview.len(), 1);
        assert_eq!(result.summary.total_lines, 3);
    }

    #[test]
    fn splits_on_every_line_boundary() {
        assert_eq!(split_lines("a\rb\r\nc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\x0cb\x0bc\u{2028}d\u{85}"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn carriage_return_endings_keep_entries_apart() {
        let result = run("t1 INFO auth ok\rt2 ERROR auth bad password\r");
        assert_eq!(result.summary.total_lines, 2);
        assert_eq!(result.evidence_preview.len(), 2);
        assert_eq!(result.summary.count(Level::Error), 1);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.evidence_preview[0].message.as_deref(), Some("ok"));
    }

    #[test]
    fn form_feed_separates_entries() {
        let result = run("t1 INFO auth ok\x0ct2 ERROR auth bad");
        assert_eq!(result.summary.total_lines, 2);
        assert_eq!(result.summary.count(Level::Info), 1);
        assert_eq!(result.summary.count(Level::Error), 1);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.evidence_preview[0].message.as_deref(), Some("ok"));
    }

    #[test]
    fn level_is_case_sensitive() {
        let event = Event::parse("2024-01-01T00:00:00Z error auth boom").unwrap();
        assert!(!event.parse_ok);
        assert_eq!(event.level, Level::Unknown);
    }

    #[test]
    fn clean_log_passes() {
        let result = run("2024-01-01T00:00:00Z INFO auth login ok\n2024-01-01T00:00:01Z INFO auth logout\n");
        assert_eq!(result.status, Status::Pass);
        assert!(result.findings.is_empty());
        assert_eq!(result.summary.total_severity, 2);
        assert_eq!(result.summary.parsed_events, 2);
    }

    #[test]
    fn single_error_line_fails() {
        let result = run("2024-01-01T00:00:00Z ERROR auth \"bad password\"\n");
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.summary.count(Level::Error), 1);
        assert_eq!(result.findings, vec![FINDING_ERRORS.to_string()]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["level_counts"]["ERROR"], 1);
        assert_eq!(json["status"], "FAIL");
    }

    #[test]
    fn single_warning_warns_without_multiple_warning_finding() {
        let result = run("2024-01-01T00:00:00Z WARN auth slow\n");
        assert_eq!(result.status, Status::Warn);
        assert!(result.findings.is_empty());
    }

    #[test]
    fn two_warnings_add_finding() {
        let result = run("t1 WARN auth slow\nt2 WARN auth slow\n");
        assert_eq!(result.status, Status::Warn);
        assert_eq!(result.findings, vec![FINDING_MULTIPLE_WARNINGS.to_string()]);
    }

    #[test]
    fn unparsable_line_is_kept_as_evidence() {
        let result = run("garbage\n2024-01-01T00:00:00Z INFO auth ok\n");
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.findings, vec![FINDING_UNPARSABLE.to_string()]);

        let first = &result.evidence_preview[0];
        assert!(!first.parse_ok);
        assert_eq!(first.level, Level::Unknown);
        assert_eq!(first.severity, 0);
        assert_eq!(first.raw, "garbage");
        assert_eq!(result.summary.total_severity, 1);
        assert_eq!(result.summary.count(Level::Unknown), 1);
    }

    #[test]
    fn findings_follow_rule_order() {
        let result = run("???\nt WARN a x\nt WARN a y\nt ERROR b z\n");
        assert_eq!(
            result.findings,
            vec![
                FINDING_ERRORS.to_string(),
                FINDING_MULTIPLE_WARNINGS.to_string(),
                FINDING_UNPARSABLE.to_string(),
            ]
        );
    }

    #[test]
    fn top_issue_ranking() {
        let content = "t WARN svc A\nt ERROR svc B\nt WARN svc A\nt ERROR svc A\nt INFO svc C\n";
        let events = normalize(content.lines());

        let top = top_issues(&events, 1);
        assert_eq!(
            top,
            vec![TopIssue {
                issue: "svc | A".to_string(),
                count: 3
            }]
        );
        assert_eq!(top_issues(&events, 5).len(), 2);
        assert!(top_issues(&events, 0).is_empty());
    }

    #[test]
    fn top_issue_ties_keep_first_seen_order() {
        let events = normalize("t WARN x second\nt WARN x first\nt ERROR y third\n".lines());
        let issues: Vec<_> = top_issues(&events, 5).into_iter().map(|i| i.issue).collect();
        assert_eq!(issues, vec!["x | second", "x | first", "y | third"]);
    }

    #[test]
    fn evidence_preview_is_capped() {
        let content: String = (0..25).map(|i| format!("t{} INFO auth line {}\n", i, i)).collect();
        let result = run(&content);
        assert_eq!(result.evidence_preview.len(), EVIDENCE_PREVIEW_LIMIT);
        assert_eq!(result.summary.parsed_events, 25);
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let content = "t WARN a x\nnope\nt ERROR b y\n";
        let first = serde_json::to_string(&run(content)).unwrap();
        let second = serde_json::to_string(&run(content)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn analyzer_reports_target() {
        let result = LogAnalyzer::new().with_top_n(2).analyze_content("", "empty.log").unwrap();
        assert_eq!(result.check, CHECK_NAME);
        assert_eq!(result.target, "empty.log");
        assert_eq!(result.status, Status::Pass);
        assert!(result.summary.level_counts.is_empty());
    }
}
