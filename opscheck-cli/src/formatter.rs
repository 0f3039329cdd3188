use anyhow::Result;
use opscheck_core::modules::log::Level;
use opscheck_core::summary::{summarize, Rollup};
use opscheck_core::types::RunReport;
use std::path::PathBuf;

const RULE: &str = "─────────────────────────────────────────────────────────────\n";

/// Format a run as human-readable text
pub fn format_text(report: &RunReport, written: &[PathBuf]) -> String {
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push_str("                    Ops Sanity Check\n");
    output.push_str("═══════════════════════════════════════════════════════════════\n\n");

    output.push_str(&format!("Version: {}\n", report.metadata.version));
    output.push_str(&format!(
        "Timestamp: {}\n",
        report.metadata.timestamp.format("%Y-%m-%d %H:%M:%S %Z")
    ));
    output.push_str(&format!("Hostname: {}\n\n", report.metadata.hostname));

    output.push_str(RULE);
    output.push_str("CHECKS\n");
    output.push_str(RULE);

    if let Some(log) = &report.log {
        output.push_str(&format!(
            "[{}] {} | errors={} warns={}\n",
            log.status,
            log.check,
            log.summary.count(Level::Error),
            log.summary.count(Level::Warn)
        ));
        push_findings(&mut output, &log.findings);
    }

    if let Some(services) = &report.services {
        let counts = &services.summary.status_counts;
        output.push_str(&format!(
            "[{}] {} | stopped={} degraded={}\n",
            services.status, services.check, counts.stopped, counts.degraded
        ));
        push_findings(&mut output, &services.findings);
    }

    if let Some(config) = &report.config {
        output.push_str(&format!(
            "[{}] {} | missing={} invalid={} warnings={}\n",
            config.status,
            config.check,
            config.summary.missing_keys.len(),
            config.summary.invalid_values.len(),
            config.summary.warnings.len()
        ));
        push_findings(&mut output, &config.findings);
    }

    for skipped in &report.skipped {
        output.push_str(&format!("[SKIPPED] {} | {}\n", skipped.check, skipped.error));
    }
    output.push('\n');

    let digests = report.digests();
    let rollup = summarize(&digests);

    output.push_str(RULE);
    output.push_str(&format!("SUMMARY (overall {})\n", Rollup::overall(&digests)));
    output.push_str(RULE);
    for section in &rollup.summary {
        output.push_str(&format!("{}: {}\n", section.check, section.summary));
    }

    if !written.is_empty() {
        output.push('\n');
        for path in written {
            output.push_str(&format!("Wrote: {}\n", path.display()));
        }
    }

    output
}

fn push_findings(output: &mut String, findings: &[String]) {
    for finding in findings {
        output.push_str(&format!("    → {}\n", finding));
    }
}

/// Format a run as JSON
pub fn format_json(report: &RunReport, pretty: bool) -> Result<String> {
    if pretty {
        Ok(opscheck_core::output::to_sorted_json(report)?)
    } else {
        let value = serde_json::to_value(report)?;
        Ok(serde_json::to_string(&value)?)
    }
}
