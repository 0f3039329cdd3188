mod formatter;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use formatter::{format_json, format_text};
use opscheck_core::modules::config::{ConfigAnalyzer, ConfigFormat};
use opscheck_core::modules::log::{LogAnalyzer, DEFAULT_TOP_N};
use opscheck_core::output::{default_output_dir, write_run};
use opscheck_core::{CheckPaths, CheckRunner};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opscheck")]
#[command(version)]
#[command(about = "Point-in-time ops sanity check over auth logs, service status and app config", long_about = None)]
struct Cli {
    /// Base directory for default input paths and outputs
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Authentication log to analyze
    #[arg(long)]
    log: Option<PathBuf>,

    /// Service status snapshot (JSON)
    #[arg(long)]
    services: Option<PathBuf>,

    /// Application config (JSON, or TOML by extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Config document format (default: by file extension)
    #[arg(long, value_enum, default_value_t = ConfigFormatArg::Auto)]
    config_format: ConfigFormatArg,

    /// Output directory (default: <root>/outputs/<timestamp>)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Number of recurring log issues to report
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Stdout format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Do not write result files
    #[arg(long)]
    no_write: bool,

    /// Skip a check whose input is unreadable or malformed instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// JSON with pretty printing
    JsonPretty,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ConfigFormatArg {
    /// TOML for `.toml` files, JSON otherwise
    Auto,
    Json,
    Toml,
}

impl ConfigFormatArg {
    fn format(self) -> Option<ConfigFormat> {
        match self {
            ConfigFormatArg::Auto => None,
            ConfigFormatArg::Json => Some(ConfigFormat::Json),
            ConfigFormatArg::Toml => Some(ConfigFormat::Toml),
        }
    }
}

impl Cli {
    fn paths(&self) -> CheckPaths {
        let defaults = CheckPaths::under(&self.root);
        CheckPaths {
            log: self.log.clone().unwrap_or(defaults.log),
            services: self.services.clone().unwrap_or(defaults.services),
            config: self.config.clone().unwrap_or(defaults.config),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = cli.paths();
    debug!(?paths, "resolved evidence sources");

    let mut runner = CheckRunner::new(paths)
        .with_log_analyzer(LogAnalyzer::new().with_top_n(cli.top_n))
        .keep_going(cli.keep_going);
    if let Some(format) = cli.config_format.format() {
        runner = runner.with_config_analyzer(ConfigAnalyzer::new().with_format(format));
    }

    let report = runner.run().context("ops check run failed")?;

    let written = if cli.no_write {
        Vec::new()
    } else {
        let dir = cli
            .out_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&cli.root, &report.metadata.timestamp));
        write_run(&dir, &report)
            .with_context(|| format!("failed to write results to {}", dir.display()))?
    };

    let output = match cli.format {
        OutputFormat::Text => format_text(&report, &written),
        OutputFormat::Json => format_json(&report, false)?,
        OutputFormat::JsonPretty => format_json(&report, true)?,
    };
    print!("{}", output);

    Ok(())
}
