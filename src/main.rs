//! resolvalid - DNS resolver validation tool
//!
//! Binary entry point for the resolvalid CLI application.

#![warn(clippy::all, warnings)]
#![warn(clippy::pedantic, clippy::nursery)]

use chrono::Utc;
use resolvalid::cli::{self, Cli, OutputFormat};
use resolvalid::config::{CandidateLoader, ListSource, Settings};
use resolvalid::dns::{EngineConfig, GroundTruthResolver, UdpTransport, ValidationEngine};
use resolvalid::error::{Error, Result};
use resolvalid::progress::{SilentProgress, TerminalProgress};
use resolvalid::report::RunReport;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set up logging based on verbosity level.
///
/// Logs go to stderr so that stdout only carries progress and the summary.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging
/// * `quiet` - Enable error-level only logging
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

/// Build the engine settings from the loaded settings and CLI overrides.
fn engine_config(cli: &Cli, settings: &Settings, test_domain: String) -> EngineConfig {
    EngineConfig::new(test_domain)
        .with_concurrency(cli.threads.map_or(settings.threads, |t| t as usize))
        .with_timeout(cli.timeout.unwrap_or_else(|| settings.timeout()))
        .with_retries(cli.retries.unwrap_or(settings.retries))
        .with_max_latency(cli.max_latency.or_else(|| settings.max_latency()))
}

/// Run a full validation: ground truth, candidate list, engine, summary.
async fn run(cli: Cli, output: PathBuf) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    let test_domain = match cli.test_domain.as_deref().map(str::trim) {
        Some(domain) if !domain.is_empty() => domain.to_string(),
        Some(_) => return Err(Error::config("test domain cannot be empty")),
        None => settings
            .pick_test_domain()
            .map(ToString::to_string)
            .ok_or_else(|| Error::config("no test domain configured"))?,
    };

    let config = engine_config(&cli, &settings, test_domain.clone());
    let engine = ValidationEngine::new(UdpTransport::new(), config)?;

    let expected = GroundTruthResolver::new(UdpTransport::new(), settings.known_good_servers.clone())
        .with_timeout(settings.ground_truth_timeout())
        .resolve(&test_domain)
        .await?;

    let source = ListSource::select(cli.file.as_deref(), cli.url.as_deref(), &settings.list_url);
    if cli.file.is_none() && cli.url.is_none() && !cli.silent {
        println!("No DNS server source file or URL provided. Using default public DNS list.");
    }
    let candidates = CandidateLoader::load(&source).await?.resolvers;

    let expected_answers = expected.sorted();
    let started_at = Utc::now();
    let tally = if cli.silent {
        engine
            .run_to_file(candidates, expected, &output, cli.append, SilentProgress)
            .await?
    } else {
        engine
            .run_to_file(candidates, expected, &output, cli.append, TerminalProgress::new())
            .await?
    };

    let report = RunReport {
        test_domain,
        expected_answers,
        output,
        tally,
        started_at,
        finished_at: Utc::now(),
    };

    if !cli.silent {
        match cli.format {
            OutputFormat::Table => print!("{}", report.to_table()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
    }

    Ok(())
}

/// Main entry point for the resolvalid CLI application.
#[tokio::main]
async fn main() {
    let cli = cli::parse();

    if let Some(shell) = cli.completions {
        cli::print_completions(shell);
        return;
    }

    setup_logging(cli.verbose, cli.quiet || cli.silent);
    tracing::debug!("resolvalid starting...");

    let Some(output) = cli.output.clone() else {
        eprintln!("Error: You must provide an output file with --output (-o).");
        std::process::exit(2);
    };

    if let Err(e) = run(cli, output).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
