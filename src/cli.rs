//! Command-line interface (CLI) argument parsing module.
//!
//! This module provides CLI argument parsing using `clap`, duration
//! parsing for the timeout flags, and shell completion generation.

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// CLI argument parser using clap derive macro.
///
/// Every tuning flag is optional so that unset flags fall back to the
/// loaded [`Settings`](crate::config::Settings).
#[derive(Parser, Debug)]
#[command(
    name = "resolvalid",
    version,
    about = "Validate DNS resolvers against a known-good answer set",
    long_about = "Checks a list of DNS resolvers concurrently and keeps only those \
                  returning the same answer as well-known public resolvers for a test domain"
)]
pub struct Cli {
    /// File containing the list of DNS servers, one per line ("-" for stdin)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// URL of a list of DNS servers (default: public-dns.info nameservers)
    #[arg(short, long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Output file for valid DNS servers
    #[arg(short, long, required_unless_present = "completions")]
    pub output: Option<PathBuf>,

    /// Domain used to test DNS servers (default: one of the built-in test domains)
    #[arg(long, visible_alias = "td")]
    pub test_domain: Option<String>,

    /// Number of concurrent checks [default: 20]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub threads: Option<u64>,

    /// Timeout for each DNS query, e.g. "2s" or "500ms" [default: 2s]
    #[arg(long, visible_alias = "to", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Extra attempts for a DNS server that failed [default: 0]
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Reject DNS servers answering slower than this, e.g. "300ms" (0 = no limit)
    #[arg(long, value_parser = parse_duration)]
    pub max_latency: Option<Duration>,

    /// Append to the output file instead of overwriting it
    #[arg(long)]
    pub append: bool,

    /// Suppress progress and summary output
    #[arg(short, long)]
    pub silent: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Summary format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// Settings file (JSON) [default: <config dir>/resolvalid/config.json]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default, human-readable)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get all available output format names.
    #[must_use]
    pub fn names() -> &'static [&'static str] {
        &["table", "json"]
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options are: {:?}",
                s,
                Self::names()
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a duration such as `2s`, `500ms`, `1m` or a bare number of seconds.
///
/// # Errors
///
/// Returns a message if the number or the unit is invalid.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let (number, unit) = match s.find(|c: char| !(c.is_ascii_digit() || c == '.')) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };

    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid duration: {s:?}"))?;
    let secs = match unit.trim() {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        other => return Err(format!("Unknown duration unit {other:?} in {s:?}")),
    };

    Duration::try_from_secs_f64(secs).map_err(|_| format!("Invalid duration: {s:?}"))
}

/// Parse CLI arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Write completions for `shell` to stdout.
pub fn print_completions(shell: Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
}
